//! Table sub-engine: grid layout, gutters, cell selection, merge and split.
//!
//! A table annotation stores its interior separators and its cells; the
//! [`TableGrid`] is rebuilt from those on demand. [`TableEditor`] keeps the
//! derived gutter maps and the transient drag / cell-selection state of the
//! tables on a page.

mod cells;
mod grid;
mod gutter;
mod layout;

use std::collections::BTreeMap;

use docanno_geometry::Point;

pub use cells::{
    CellRange, CellSelection, can_merge, can_split, cell_at, is_rectangular_shape, merge_cells,
    select_cells, split_cells,
};
pub use grid::{TableGrid, apply_grid, cell_extent, fill_uncovered};
pub use gutter::{
    GutterDrag, GutterGap, GutterId, GutterPart, GutterType, TableGutter, TableGutterMap,
    build_gutter_map, gutter_at,
};
pub use layout::{fit_to_bound, initialize};

use crate::model::{Annotation, AnnotationId, BoundType, CellData};

/// Gutter maps and in-progress table interactions for one page.
#[derive(Debug, Clone)]
pub struct TableEditor {
    gutters: BTreeMap<AnnotationId, TableGutterMap>,
    drag: Option<(AnnotationId, GutterDrag)>,
    selection: Option<CellSelection>,
    draggable_gutter_width: f32,
    visible_gutter_width: f32,
}

impl TableEditor {
    pub fn new(draggable_gutter_width: f32, visible_gutter_width: f32) -> Self {
        Self {
            gutters: BTreeMap::new(),
            drag: None,
            selection: None,
            draggable_gutter_width,
            visible_gutter_width,
        }
    }

    /// Recompute the gutters of `table`.
    pub fn refresh(&mut self, table: &Annotation) {
        if table.bound_type != BoundType::Table {
            return;
        }
        let grid = TableGrid::from_table(table);
        let placements: Vec<CellData> = table.table_cells.iter().map(Annotation::cell_data).collect();
        let map = build_gutter_map(
            &grid,
            &placements,
            self.draggable_gutter_width,
            self.visible_gutter_width,
        );
        log::trace!("Table {}: {} gutters", table.id, map.len());
        self.gutters.insert(table.id, map);
    }

    /// Recompute gutters for every table in `annotations`, dropping stale maps.
    pub fn refresh_all<'a>(&mut self, annotations: impl IntoIterator<Item = &'a Annotation>) {
        self.gutters.clear();
        for annotation in annotations {
            self.refresh(annotation);
        }
        let stale = self
            .selection
            .as_ref()
            .is_some_and(|s| !self.gutters.contains_key(&s.table_id));
        if stale {
            self.selection = None;
        }
    }

    pub fn forget(&mut self, table_id: AnnotationId) {
        self.gutters.remove(&table_id);
        if self.selection.as_ref().is_some_and(|s| s.table_id == table_id) {
            self.selection = None;
        }
        if self.drag.as_ref().is_some_and(|(id, _)| *id == table_id) {
            self.drag = None;
        }
    }

    pub fn gutters(&self, table_id: AnnotationId) -> Option<&TableGutterMap> {
        self.gutters.get(&table_id)
    }

    /// The gutter under a document-space point, searching every table.
    pub fn gutter_at(&self, point: &Point) -> Option<(AnnotationId, GutterId)> {
        self.gutters
            .iter()
            .find_map(|(table_id, map)| gutter_at(map, point).map(|g| (*table_id, g)))
    }

    // ------------------------------------------------------------------------
    // Gutter drag
    // ------------------------------------------------------------------------

    pub fn begin_drag(&mut self, table_id: AnnotationId, gutter_id: GutterId) -> bool {
        let Some(gutter) = self.gutters.get(&table_id).and_then(|m| m.get(&gutter_id)) else {
            log::warn!("Table {}: no gutter {}", table_id, gutter_id);
            return false;
        };
        self.drag = Some((table_id, GutterDrag::begin(gutter)));
        true
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// The live drag, for previews.
    pub fn drag(&self) -> Option<(AnnotationId, &GutterDrag)> {
        self.drag.as_ref().map(|(id, drag)| (*id, drag))
    }

    /// Follow the pointer. `dx`/`dy` are document-space travel since the
    /// drag began; only the component along the gutter's axis is used.
    pub fn track_drag(&mut self, dx: f32, dy: f32) -> Option<f32> {
        let (_, drag) = self.drag.as_mut()?;
        let delta = match drag.gutter_type {
            GutterType::Vertical => dx,
            GutterType::Horizontal => dy,
        };
        Some(drag.track(delta))
    }

    pub fn cancel_drag(&mut self) {
        self.drag = None;
    }

    /// Finish the gutter drag on `table`, moving the edge and rebuilding its
    /// cells and gutters. Returns `true` if the table changed.
    pub fn commit_drag(&mut self, table: &mut Annotation) -> bool {
        let Some((table_id, drag)) = self.drag.take() else {
            return false;
        };
        if table_id != table.id {
            log::warn!("Gutter drag belongs to table {}, not {}", table_id, table.id);
            return false;
        }

        let mut grid = TableGrid::from_table(table);
        if !drag.commit(&mut grid) {
            return false;
        }
        apply_grid(table, &grid);
        self.refresh(table);
        if let Some(selection) = self.selection.as_mut().filter(|s| s.table_id == table.id) {
            let range = selection.range;
            if let Some(bound) =
                grid.range_bound(range.row_start, range.row_end, range.col_start, range.col_end)
            {
                selection.bound = bound;
            }
        }
        true
    }

    // ------------------------------------------------------------------------
    // Cell selection
    // ------------------------------------------------------------------------

    /// Select the cells of `table` between two document-space points.
    pub fn select(&mut self, table: &Annotation, start: &Point, end: &Point) -> Option<&CellSelection> {
        let grid = TableGrid::from_table(table);
        self.selection = select_cells(table, &grid, start, end);
        if let Some(selection) = &self.selection {
            log::debug!(
                "Table {}: selected {} cells",
                table.id,
                selection.cell_ids.len()
            );
        }
        self.selection.as_ref()
    }

    pub fn selection(&self) -> Option<&CellSelection> {
        self.selection.as_ref()
    }

    pub fn clear_selection(&mut self) {
        self.selection = None;
    }

    fn selected_placements(&self, table: &Annotation) -> Vec<CellData> {
        let Some(selection) = self.selection.as_ref().filter(|s| s.table_id == table.id) else {
            return Vec::new();
        };
        table
            .table_cells
            .iter()
            .filter(|c| selection.cell_ids.contains(&c.id))
            .map(Annotation::cell_data)
            .collect()
    }

    pub fn can_merge(&self, table: &Annotation) -> bool {
        can_merge(&self.selected_placements(table))
    }

    pub fn can_split(&self, table: &Annotation) -> bool {
        can_split(&self.selected_placements(table))
    }

    /// Merge the selected cells of `table`; the selection collapses onto the
    /// merged cell.
    pub fn merge(&mut self, table: &mut Annotation) -> Option<AnnotationId> {
        let selection = self.selection.as_ref().filter(|s| s.table_id == table.id)?;
        let grid = TableGrid::from_table(table);
        let merged = merge_cells(table, &grid, &selection.cell_ids)?;
        if let Some(selection) = self.selection.as_mut() {
            selection.cell_ids = vec![merged];
        }
        self.refresh(table);
        Some(merged)
    }

    /// Split the spanned cells among the selection; the selection grows to
    /// every resulting cell.
    pub fn split<F>(&mut self, table: &mut Annotation, next_id: &mut F) -> Vec<AnnotationId>
    where
        F: FnMut() -> AnnotationId,
    {
        let Some(selection) = self.selection.as_ref().filter(|s| s.table_id == table.id) else {
            return Vec::new();
        };
        let grid = TableGrid::from_table(table);
        let ids = split_cells(table, &grid, &selection.cell_ids, next_id);
        if ids.is_empty() {
            return ids;
        }
        if let Some(selection) = self.selection.as_mut() {
            let mut kept: Vec<AnnotationId> = selection
                .cell_ids
                .iter()
                .copied()
                .filter(|id| !ids.contains(id))
                .collect();
            kept.extend(ids.iter().copied());
            selection.cell_ids = kept;
        }
        self.refresh(table);
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docanno_geometry::Bound;

    fn laid_out_table(rows: usize, cols: usize) -> Annotation {
        let mut table = Annotation::new(1, BoundType::Table, Bound::new(0.0, 0.0, 90.0, 60.0));
        let mut next = 10;
        initialize(&mut table, rows, cols, &mut || {
            next += 1;
            next
        });
        table
    }

    #[test]
    fn test_gutter_drag_rebuilds_cells() {
        let mut table = laid_out_table(1, 3);
        let mut editor = TableEditor::new(4.0, 1.0);
        editor.refresh(&table);

        assert_eq!(editor.gutter_at(&Point::new(30.0, 10.0)), Some((1, 0)));
        assert!(editor.begin_drag(1, 0));
        assert_eq!(editor.track_drag(5.0, 100.0), Some(35.0));
        assert!(editor.commit_drag(&mut table));
        assert!(!editor.is_dragging());

        assert_eq!(table.table.as_ref().unwrap().cols, vec![35.0, 60.0]);
        let widths: Vec<f32> = table.table_cells.iter().map(|c| c.bound.width).collect();
        assert_eq!(widths, vec![35.0, 25.0, 30.0]);
        assert_eq!(editor.gutters(1).unwrap()[&0].stable_position, 35.0);
    }

    #[test]
    fn test_select_merge_split_cycle() {
        let mut table = laid_out_table(2, 3);
        let mut editor = TableEditor::new(4.0, 1.0);
        editor.refresh(&table);

        editor.select(&table, &Point::new(5.0, 5.0), &Point::new(50.0, 50.0));
        assert!(editor.can_merge(&table));
        assert!(!editor.can_split(&table));

        let merged = editor.merge(&mut table).unwrap();
        assert_eq!(table.table_cells.len(), 3);
        // The merged cell now hides the parts of vertical gutter 0 it crosses
        assert!(editor.gutters(1).unwrap()[&0].parts.iter().all(|p| !p.visible));
        assert!(editor.can_split(&table));

        let mut next = 100;
        let ids = editor.split(&mut table, &mut || {
            next += 1;
            next
        });
        assert_eq!(ids.len(), 4);
        assert_eq!(ids[0], merged);
        assert_eq!(table.table_cells.len(), 6);
    }

    #[test]
    fn test_merge_without_selection_is_none() {
        let mut table = laid_out_table(2, 2);
        let mut editor = TableEditor::new(4.0, 1.0);
        assert!(editor.merge(&mut table).is_none());
        assert!(!editor.can_merge(&table));
    }

    #[test]
    fn test_forget_clears_state() {
        let table = laid_out_table(2, 2);
        let mut editor = TableEditor::new(4.0, 1.0);
        editor.refresh(&table);
        editor.select(&table, &Point::new(5.0, 5.0), &Point::new(5.0, 5.0));
        editor.forget(1);
        assert!(editor.gutters(1).is_none());
        assert!(editor.selection().is_none());
    }
}
