//! Resize and move sessions for existing annotations.
//!
//! Both follow the same contract: `begin` captures the starting geometry,
//! `track` is called on every drag frame and returns the live screen-space
//! preview, `commit` consumes the session and yields the document-space bound
//! exactly once. Nothing is written back to the model mid-drag.

use docanno_geometry::{Bound, Point, Rect, bound_to_rect, rect_to_bound};
use serde::{Deserialize, Serialize};

use crate::model::{Annotation, AnnotationId, BoundType};
use crate::table::fit_to_bound;

/// One of the four resize handles on a selected annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl Corner {
    pub fn all() -> &'static [Corner] {
        &[
            Corner::TopLeft,
            Corner::TopRight,
            Corner::BottomLeft,
            Corner::BottomRight,
        ]
    }

    /// The corner's position on `rect`.
    pub fn position(&self, rect: &Rect) -> Point {
        match self {
            Corner::TopLeft => Point::new(rect.left, rect.top),
            Corner::TopRight => Point::new(rect.right, rect.top),
            Corner::BottomLeft => Point::new(rect.left, rect.bottom),
            Corner::BottomRight => Point::new(rect.right, rect.bottom),
        }
    }

    /// The corner that stays put while this one is dragged.
    pub fn opposite(&self) -> Corner {
        match self {
            Corner::TopLeft => Corner::BottomRight,
            Corner::TopRight => Corner::BottomLeft,
            Corner::BottomLeft => Corner::TopRight,
            Corner::BottomRight => Corner::TopLeft,
        }
    }
}

// ============================================================================
// Resize
// ============================================================================

/// An in-progress corner drag.
#[derive(Debug, Clone, PartialEq)]
pub struct ResizeSession {
    pub annotation_id: AnnotationId,
    pub corner: Corner,
    scale: f32,
    /// Screen-space rect at the start of the drag.
    initial: Rect,
    live: Rect,
}

impl ResizeSession {
    pub fn begin(annotation_id: AnnotationId, bound: &Bound, corner: Corner, scale: f32) -> Self {
        let initial = bound_to_rect(&bound.scaled(scale));
        log::debug!(
            "Resize started on annotation {} from {:?}",
            annotation_id,
            corner
        );
        Self {
            annotation_id,
            corner,
            scale,
            initial,
            live: initial,
        }
    }

    /// Move the dragged corner to `pointer` (screen space, container-local).
    ///
    /// The opposite corner is fixed; dragging past it flips the rect rather
    /// than producing negative sizes.
    pub fn track(&mut self, pointer: Point) -> Rect {
        let fixed = self.corner.opposite().position(&self.initial);
        self.live = Rect::from_points(fixed, pointer);
        self.live
    }

    pub fn preview(&self) -> Rect {
        self.live
    }

    /// Finish the drag; returns the new document-space bound.
    pub fn commit(self) -> Bound {
        let bound = rect_to_bound(&self.live).down_scaled(self.scale);
        log::debug!(
            "Resize committed on annotation {}: {:?}",
            self.annotation_id,
            bound
        );
        bound
    }
}

// ============================================================================
// Move
// ============================================================================

/// An in-progress move, started from the annotation's label.
#[derive(Debug, Clone, PartialEq)]
pub struct MoveSession {
    pub annotation_id: AnnotationId,
    scale: f32,
    /// Screen-space bound at the start of the drag.
    initial: Bound,
    grab: Point,
    live: Bound,
}

impl MoveSession {
    pub fn begin(annotation_id: AnnotationId, bound: &Bound, grab: Point, scale: f32) -> Self {
        let initial = bound.scaled(scale);
        log::debug!("Move started on annotation {}", annotation_id);
        Self {
            annotation_id,
            scale,
            initial,
            grab,
            live: initial,
        }
    }

    /// Offset the initial bound by the pointer's travel since the grab.
    pub fn track(&mut self, pointer: Point) -> Bound {
        let (dx, dy) = pointer.delta_from(&self.grab);
        self.live = self.initial.translated(dx, dy);
        self.live
    }

    pub fn preview(&self) -> Bound {
        self.live
    }

    pub fn commit(self) -> Bound {
        let bound = self.live.down_scaled(self.scale);
        log::debug!(
            "Move committed on annotation {}: {:?}",
            self.annotation_id,
            bound
        );
        bound
    }
}

// ============================================================================
// Commit
// ============================================================================

/// Write a committed bound into `annotation`.
///
/// Tables rescale their grid and cells with the bound; polygons remap every
/// ring point proportionally. Other types just take the new bound.
pub fn reshape(annotation: &mut Annotation, bound: Bound) {
    match annotation.bound_type {
        BoundType::Table => fit_to_bound(annotation, bound),
        BoundType::Polygon => {
            let old = annotation.bound;
            let sx = if old.width > 0.0 { bound.width / old.width } else { 1.0 };
            let sy = if old.height > 0.0 { bound.height / old.height } else { 1.0 };
            for ring in &mut annotation.segments {
                for xy in ring.chunks_exact_mut(2) {
                    xy[0] = bound.x + (xy[0] - old.x) * sx;
                    xy[1] = bound.y + (xy[1] - old.y) * sy;
                }
            }
            annotation.bound = bound;
        }
        _ => annotation.bound = bound,
    }
}
