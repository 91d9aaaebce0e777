//! Deciding which element owns a pointer-down.
//!
//! Resolution happens once per press, against a fixed priority list:
//! gutter handle, then resize handle, then annotation label, then canvas.

use docanno_geometry::{Point, Rect, bound_to_rect, is_point_inside_rect};
use serde::{Deserialize, Serialize};

use crate::edit::Corner;
use crate::model::{Annotation, AnnotationId, BoundType};
use crate::table::{GutterId, TableEditor};

/// The element a press landed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InteractionTarget {
    Gutter {
        table_id: AnnotationId,
        gutter_id: GutterId,
    },
    ResizeHandle {
        annotation_id: AnnotationId,
        corner: Corner,
    },
    Label {
        annotation_id: AnnotationId,
    },
    Canvas,
}

/// Everything target resolution looks at.
#[derive(Debug, Clone, Copy)]
pub struct InteractionContext<'a> {
    pub annotations: &'a [Annotation],
    /// Only the selected annotation shows resize handles.
    pub selected: Option<AnnotationId>,
    pub tables: &'a TableEditor,
    pub scale: f32,
    pub resize_handle_size: f32,
    pub label_height: f32,
}

/// Screen-space square of a resize handle.
pub fn handle_rect(annotation: &Annotation, corner: Corner, scale: f32, size: f32) -> Rect {
    let center = corner.position(&bound_to_rect(&annotation.bound.scaled(scale)));
    let half = size / 2.0;
    Rect::new(center.x - half, center.y - half, center.x + half, center.y + half)
}

/// Screen-space strip above an annotation where its label is drawn.
pub fn label_rect(annotation: &Annotation, scale: f32, label_height: f32) -> Rect {
    let rect = bound_to_rect(&annotation.bound.scaled(scale));
    Rect::new(rect.left, rect.top - label_height, rect.right, rect.top)
}

/// Resolve a screen-space (container-local) press.
pub fn resolve_target(ctx: &InteractionContext<'_>, screen: Point) -> InteractionTarget {
    let document = screen.down_scaled(ctx.scale);

    if let Some((table_id, gutter_id)) = ctx.tables.gutter_at(&document) {
        return InteractionTarget::Gutter {
            table_id,
            gutter_id,
        };
    }

    if let Some(selected) = ctx
        .selected
        .and_then(|id| ctx.annotations.iter().find(|a| a.id == id))
        .filter(|a| a.bound_type.is_resizable())
    {
        let hit = Corner::all().iter().copied().find(|corner| {
            is_point_inside_rect(
                &screen,
                &handle_rect(selected, *corner, ctx.scale, ctx.resize_handle_size),
            )
        });
        if let Some(corner) = hit {
            return InteractionTarget::ResizeHandle {
                annotation_id: selected.id,
                corner,
            };
        }
    }

    if let Some(labelled) = ctx.annotations.iter().find(|a| {
        a.bound_type != BoundType::TableCell
            && is_point_inside_rect(&screen, &label_rect(a, ctx.scale, ctx.label_height))
    }) {
        return InteractionTarget::Label {
            annotation_id: labelled.id,
        };
    }

    InteractionTarget::Canvas
}
