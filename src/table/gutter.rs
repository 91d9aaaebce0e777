//! Table gutters: the draggable separators between columns and rows.
//!
//! Gutters are derived data. They are rebuilt from the grid and the cell
//! placement whenever either changes, and never edited in place.

use std::collections::BTreeMap;

use docanno_geometry::{Bound, Point, Rect, is_point_inside_rect};
use serde::{Deserialize, Serialize};

use super::grid::TableGrid;
use crate::model::CellData;

/// Gutter id within one table. Vertical gutters come first, left to right,
/// then horizontal gutters top to bottom.
pub type GutterId = u32;

/// Ordered gutters of one table.
pub type TableGutterMap = BTreeMap<GutterId, TableGutter>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GutterType {
    /// Separates two columns; dragged along x.
    Vertical,
    /// Separates two rows; dragged along y.
    Horizontal,
}

/// The range a gutter may be dragged within.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GutterGap {
    pub left_boundary: f32,
    pub right_boundary: f32,
}

impl GutterGap {
    /// Whether the neighbours leave any room to drag in.
    pub fn has_room(&self) -> bool {
        self.left_boundary <= self.right_boundary
    }

    /// Clamp `position` into the gap. Without room the gutter stays at `origin`.
    pub fn clamp(&self, position: f32, origin: f32) -> f32 {
        if !self.has_room() {
            return origin;
        }
        position.clamp(self.left_boundary, self.right_boundary)
    }
}

/// One segment of a gutter, between two perpendicular edges.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GutterPart {
    pub start: f32,
    pub length: f32,
    /// Hidden where a spanned cell crosses the gutter.
    pub visible: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableGutter {
    pub id: GutterId,
    #[serde(rename = "type")]
    pub gutter_type: GutterType,
    /// Index into the grid's column (vertical) or row (horizontal) edges.
    pub edge_index: usize,
    /// Committed position along the drag axis.
    pub stable_position: f32,
    pub max_gap: GutterGap,
    pub draggable_gutter_width: f32,
    pub visible_gutter_width: f32,
    pub parts: Vec<GutterPart>,
}

impl TableGutter {
    /// Hit area of the gutter: the full gutter length, `draggable_gutter_width` wide.
    pub fn hit_rect(&self) -> Rect {
        let half = self.draggable_gutter_width / 2.0;
        let start = self.parts.first().map_or(0.0, |p| p.start);
        let end = self.parts.last().map_or(start, |p| p.start + p.length);
        match self.gutter_type {
            GutterType::Vertical => Rect::new(
                self.stable_position - half,
                start,
                self.stable_position + half,
                end,
            ),
            GutterType::Horizontal => Rect::new(
                start,
                self.stable_position - half,
                end,
                self.stable_position + half,
            ),
        }
    }

    /// Whether a document-space point grabs this gutter. Hidden parts do not.
    pub fn hit(&self, point: &Point) -> bool {
        if !is_point_inside_rect(point, &self.hit_rect()) {
            return false;
        }
        let along = match self.gutter_type {
            GutterType::Vertical => point.y,
            GutterType::Horizontal => point.x,
        };
        self.parts
            .iter()
            .any(|p| p.visible && along >= p.start && along <= p.start + p.length)
    }

    /// Drawn bounds of the visible parts.
    pub fn visible_bounds(&self) -> Vec<Bound> {
        let half = self.visible_gutter_width / 2.0;
        self.parts
            .iter()
            .filter(|p| p.visible)
            .map(|p| match self.gutter_type {
                GutterType::Vertical => Bound::new(
                    self.stable_position - half,
                    p.start,
                    self.visible_gutter_width,
                    p.length,
                ),
                GutterType::Horizontal => Bound::new(
                    p.start,
                    self.stable_position - half,
                    p.length,
                    self.visible_gutter_width,
                ),
            })
            .collect()
    }
}

/// Build every gutter of a table from its grid and cell placement.
pub fn build_gutter_map(
    grid: &TableGrid,
    cells: &[CellData],
    draggable_gutter_width: f32,
    visible_gutter_width: f32,
) -> TableGutterMap {
    let mut map = TableGutterMap::new();
    let mut next_id: GutterId = 0;

    for edge in 1..grid.col_count() {
        let parts = (0..grid.row_count())
            .map(|row| GutterPart {
                start: grid.row_edges[row],
                length: grid.row_edges[row + 1] - grid.row_edges[row],
                visible: !cells
                    .iter()
                    .any(|c| c.col < edge && c.col_end() > edge && c.row <= row && c.row_end() > row),
            })
            .collect();
        map.insert(
            next_id,
            TableGutter {
                id: next_id,
                gutter_type: GutterType::Vertical,
                edge_index: edge,
                stable_position: grid.col_edges[edge],
                max_gap: GutterGap {
                    left_boundary: grid.col_edges[edge - 1] + draggable_gutter_width,
                    right_boundary: grid.col_edges[edge + 1] - draggable_gutter_width,
                },
                draggable_gutter_width,
                visible_gutter_width,
                parts,
            },
        );
        next_id += 1;
    }

    for edge in 1..grid.row_count() {
        let parts = (0..grid.col_count())
            .map(|col| GutterPart {
                start: grid.col_edges[col],
                length: grid.col_edges[col + 1] - grid.col_edges[col],
                visible: !cells
                    .iter()
                    .any(|c| c.row < edge && c.row_end() > edge && c.col <= col && c.col_end() > col),
            })
            .collect();
        map.insert(
            next_id,
            TableGutter {
                id: next_id,
                gutter_type: GutterType::Horizontal,
                edge_index: edge,
                stable_position: grid.row_edges[edge],
                max_gap: GutterGap {
                    left_boundary: grid.row_edges[edge - 1] + draggable_gutter_width,
                    right_boundary: grid.row_edges[edge + 1] - draggable_gutter_width,
                },
                draggable_gutter_width,
                visible_gutter_width,
                parts,
            },
        );
        next_id += 1;
    }

    map
}

/// The gutter under a document-space point, if any.
pub fn gutter_at(map: &TableGutterMap, point: &Point) -> Option<GutterId> {
    map.values().find(|g| g.hit(point)).map(|g| g.id)
}

// ============================================================================
// Gutter drag
// ============================================================================

/// An in-progress gutter drag. Positions are in document space.
#[derive(Debug, Clone, PartialEq)]
pub struct GutterDrag {
    pub gutter_id: GutterId,
    pub gutter_type: GutterType,
    edge_index: usize,
    origin: f32,
    position: f32,
    gap: GutterGap,
}

impl GutterDrag {
    pub fn begin(gutter: &TableGutter) -> Self {
        log::debug!(
            "Gutter {} ({:?}) drag started at {}",
            gutter.id,
            gutter.gutter_type,
            gutter.stable_position
        );
        Self {
            gutter_id: gutter.id,
            gutter_type: gutter.gutter_type,
            edge_index: gutter.edge_index,
            origin: gutter.stable_position,
            position: gutter.stable_position,
            gap: gutter.max_gap,
        }
    }

    /// Follow the pointer; `delta` is the travel along the drag axis since the
    /// drag began. Returns the clamped live position.
    pub fn track(&mut self, delta: f32) -> f32 {
        self.position = self.gap.clamp(self.origin + delta, self.origin);
        log::trace!("Gutter {} at {}", self.gutter_id, self.position);
        self.position
    }

    pub fn position(&self) -> f32 {
        self.position
    }

    /// The clamped travel actually realized.
    pub fn delta(&self) -> f32 {
        self.position - self.origin
    }

    /// Finish the drag by moving the grid edge. Returns `false` if the gutter
    /// did not move.
    pub fn commit(self, grid: &mut TableGrid) -> bool {
        let edges = match self.gutter_type {
            GutterType::Vertical => &mut grid.col_edges,
            GutterType::Horizontal => &mut grid.row_edges,
        };
        let Some(edge) = edges.get_mut(self.edge_index) else {
            log::warn!("Gutter {} no longer matches the grid", self.gutter_id);
            return false;
        };
        if (self.position - self.origin).abs() < f32::EPSILON {
            return false;
        }
        *edge = self.position;
        log::debug!(
            "Gutter {} committed: {} -> {}",
            self.gutter_id,
            self.origin,
            self.position
        );
        true
    }
}
