//! Outbound events drained by the host.

use docanno_geometry::Point;
use serde::{Deserialize, Serialize};

use crate::model::{Annotation, AnnotationId, AnnotationPatch};

/// Something the host should react to.
///
/// Events are queued in emission order and handed out by
/// [`crate::engine::AnnotationEngine::drain_events`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum AnnotationEvent {
    /// A new annotation was committed.
    Added { annotation: Annotation },
    /// An existing annotation changed; only the present fields are new.
    Edited { patch: AnnotationPatch },
    Deleted { id: AnnotationId },
    /// Right-click, with the annotation under the pointer if any.
    #[serde(rename_all = "camelCase")]
    ContextMenu {
        annotation_id: Option<AnnotationId>,
        position: Point,
    },
    CopyPressed { selected: Vec<AnnotationId> },
    CutPressed { selected: Vec<AnnotationId> },
    PastePressed,
    UndoPressed,
    RedoPressed,
    Selected { id: AnnotationId },
    EmptyAreaClicked,
}

impl AnnotationEvent {
    /// Short name, used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            AnnotationEvent::Added { .. } => "added",
            AnnotationEvent::Edited { .. } => "edited",
            AnnotationEvent::Deleted { .. } => "deleted",
            AnnotationEvent::ContextMenu { .. } => "contextMenu",
            AnnotationEvent::CopyPressed { .. } => "copyPressed",
            AnnotationEvent::CutPressed { .. } => "cutPressed",
            AnnotationEvent::PastePressed => "pastePressed",
            AnnotationEvent::UndoPressed => "undoPressed",
            AnnotationEvent::RedoPressed => "redoPressed",
            AnnotationEvent::Selected { .. } => "selected",
            AnnotationEvent::EmptyAreaClicked => "emptyAreaClicked",
        }
    }

    /// Whether the event changes the annotation list.
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            AnnotationEvent::Added { .. }
                | AnnotationEvent::Edited { .. }
                | AnnotationEvent::Deleted { .. }
        )
    }
}
