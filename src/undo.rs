//! Undo/Redo history for annotation operations.
//!
//! Command pattern: every committed change is recorded as a [`Command`]
//! holding enough state to reverse itself. Undoing or redoing a command
//! mutates the page's [`AnnotationStore`] and reports the resulting changes as
//! [`AnnotationEvent`]s so the host stays in sync.

use crate::events::AnnotationEvent;
use crate::model::{Annotation, AnnotationId, AnnotationPatch, AnnotationStore};

// ============================================================================
// Command Types
// ============================================================================

/// A command that can be undone and redone.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// An annotation was added
    AddAnnotation {
        /// The annotation that was added
        annotation: Annotation,
    },
    /// An annotation was removed
    RemoveAnnotation {
        /// The annotation that was removed (stored for undo)
        annotation: Annotation,
    },
    /// An annotation was edited (resize, move, table or polygon change, links)
    ModifyAnnotation {
        /// State before the edit
        before: Annotation,
        /// State after the edit
        after: Annotation,
    },
    /// Batch command - groups multiple commands into one undo step
    Batch {
        /// Description of the batch operation
        description: String,
        /// The commands in this batch
        commands: Vec<Command>,
    },
}

impl Command {
    /// Get a human-readable description of this command
    pub fn description(&self) -> String {
        match self {
            Command::AddAnnotation { .. } => "Add annotation".to_string(),
            Command::RemoveAnnotation { .. } => "Delete annotation".to_string(),
            Command::ModifyAnnotation { before, .. } => {
                format!("Edit {}", before.bound_type.name())
            }
            Command::Batch { description, .. } => description.clone(),
        }
    }

    /// Id of the annotation this command touches, for single commands.
    pub fn annotation_id(&self) -> Option<AnnotationId> {
        match self {
            Command::AddAnnotation { annotation } | Command::RemoveAnnotation { annotation } => {
                Some(annotation.id)
            }
            Command::ModifyAnnotation { after, .. } => Some(after.id),
            Command::Batch { .. } => None,
        }
    }
}

// ============================================================================
// Undo Stack
// ============================================================================

/// The undo/redo history stack.
///
/// - `undo_stack`: commands that can be undone (most recent at the end)
/// - `redo_stack`: commands that can be redone (most recent at the end)
///
/// Pushing a new command clears the redo stack.
#[derive(Debug, Clone)]
pub struct UndoStack {
    undo_stack: Vec<Command>,
    redo_stack: Vec<Command>,
    max_history: usize,
}

impl Default for UndoStack {
    fn default() -> Self {
        Self::with_max_history(100)
    }
}

impl UndoStack {
    /// Create a new empty undo stack
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with a custom history limit
    pub fn with_max_history(max_history: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_history,
        }
    }

    /// Push a command to the undo stack.
    pub fn push(&mut self, command: Command) {
        log::debug!("📝 Undo: pushed '{}'", command.description());
        self.undo_stack.push(command);
        self.redo_stack.clear();

        while self.undo_stack.len() > self.max_history {
            self.undo_stack.remove(0);
        }
    }

    /// Check if undo is available
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    /// Check if redo is available
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Pop a command for undoing; it moves to the redo stack.
    pub fn pop_undo(&mut self) -> Option<Command> {
        let cmd = self.undo_stack.pop()?;
        log::debug!("⏪ Undo: '{}'", cmd.description());
        self.redo_stack.push(cmd.clone());
        Some(cmd)
    }

    /// Pop a command for redoing; it moves back to the undo stack.
    pub fn pop_redo(&mut self) -> Option<Command> {
        let cmd = self.redo_stack.pop()?;
        log::debug!("⏩ Redo: '{}'", cmd.description());
        self.undo_stack.push(cmd.clone());
        Some(cmd)
    }

    /// Get the description of the command that would be undone
    pub fn undo_description(&self) -> Option<String> {
        self.undo_stack.last().map(|c| c.description())
    }

    /// Get the description of the command that would be redone
    pub fn redo_description(&self) -> Option<String> {
        self.redo_stack.last().map(|c| c.description())
    }

    /// Clear all history
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        log::debug!("🗑️ Undo history cleared");
    }

    pub fn undo_count(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_count(&self) -> usize {
        self.redo_stack.len()
    }
}

// ============================================================================
// Undo/Redo Execution
// ============================================================================

/// Undo the most recent command against `store`.
/// Returns the resulting events; empty if there was nothing to undo.
pub fn undo_command(stack: &mut UndoStack, store: &mut AnnotationStore) -> Vec<AnnotationEvent> {
    let Some(cmd) = stack.pop_undo() else {
        return Vec::new();
    };
    let mut events = Vec::new();
    apply_undo(&cmd, store, &mut events);
    events
}

/// Redo the most recently undone command against `store`.
pub fn redo_command(stack: &mut UndoStack, store: &mut AnnotationStore) -> Vec<AnnotationEvent> {
    let Some(cmd) = stack.pop_redo() else {
        return Vec::new();
    };
    let mut events = Vec::new();
    apply_redo(&cmd, store, &mut events);
    events
}

fn apply_undo(cmd: &Command, store: &mut AnnotationStore, events: &mut Vec<AnnotationEvent>) {
    match cmd {
        Command::AddAnnotation { annotation } => {
            if store.remove(annotation.id).is_some() {
                events.push(AnnotationEvent::Deleted { id: annotation.id });
                log::debug!("⏪ Undid add annotation {}", annotation.id);
            }
        }
        Command::RemoveAnnotation { annotation } => {
            store.restore(annotation.clone());
            events.push(AnnotationEvent::Added {
                annotation: annotation.clone(),
            });
            log::debug!("⏪ Undid remove annotation {}", annotation.id);
        }
        Command::ModifyAnnotation { before, .. } => {
            replace_state(store, before, events);
            log::debug!("⏪ Undid edit on {}", before.id);
        }
        Command::Batch { commands, .. } => {
            for cmd in commands.iter().rev() {
                apply_undo(cmd, store, events);
            }
        }
    }
}

fn apply_redo(cmd: &Command, store: &mut AnnotationStore, events: &mut Vec<AnnotationEvent>) {
    match cmd {
        Command::AddAnnotation { annotation } => {
            store.restore(annotation.clone());
            events.push(AnnotationEvent::Added {
                annotation: annotation.clone(),
            });
            log::debug!("⏩ Redid add annotation {}", annotation.id);
        }
        Command::RemoveAnnotation { annotation } => {
            if store.remove(annotation.id).is_some() {
                events.push(AnnotationEvent::Deleted { id: annotation.id });
                log::debug!("⏩ Redid remove annotation {}", annotation.id);
            }
        }
        Command::ModifyAnnotation { after, .. } => {
            replace_state(store, after, events);
            log::debug!("⏩ Redid edit on {}", after.id);
        }
        Command::Batch { commands, .. } => {
            for cmd in commands {
                apply_redo(cmd, store, events);
            }
        }
    }
}

fn replace_state(store: &mut AnnotationStore, state: &Annotation, events: &mut Vec<AnnotationEvent>) {
    match store.get_mut(state.id) {
        Some(existing) => {
            *existing = state.clone();
            events.push(AnnotationEvent::Edited {
                patch: AnnotationPatch::full_state(state),
            });
        }
        None => log::warn!("History references missing annotation {}", state.id),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::BoundType;
    use docanno_geometry::Bound;

    fn boxed(id: AnnotationId, x: f32) -> Annotation {
        Annotation::new(id, BoundType::FreeBox, Bound::new(x, 0.0, 10.0, 10.0))
    }

    #[test]
    fn test_undo_stack_basic() {
        let mut stack = UndoStack::new();
        assert!(!stack.can_undo());
        assert!(!stack.can_redo());

        stack.push(Command::AddAnnotation {
            annotation: boxed(1, 0.0),
        });
        assert!(stack.can_undo());
        assert!(!stack.can_redo());

        assert!(stack.pop_undo().is_some());
        assert!(!stack.can_undo());
        assert!(stack.can_redo());

        assert!(stack.pop_redo().is_some());
        assert!(stack.can_undo());
        assert!(!stack.can_redo());
    }

    #[test]
    fn test_push_clears_redo() {
        let mut stack = UndoStack::new();
        stack.push(Command::AddAnnotation {
            annotation: boxed(1, 0.0),
        });
        stack.pop_undo();
        assert!(stack.can_redo());

        stack.push(Command::AddAnnotation {
            annotation: boxed(2, 0.0),
        });
        assert!(!stack.can_redo());
    }

    #[test]
    fn test_max_history() {
        let mut stack = UndoStack::with_max_history(3);
        for i in 0..5 {
            stack.push(Command::AddAnnotation {
                annotation: boxed(i, i as f32),
            });
        }
        assert_eq!(stack.undo_count(), 3);
    }

    #[test]
    fn test_undo_redo_add_emits_events() {
        let mut store = AnnotationStore::new();
        let mut stack = UndoStack::new();
        store.insert(boxed(1, 0.0));
        stack.push(Command::AddAnnotation {
            annotation: boxed(1, 0.0),
        });

        let events = undo_command(&mut stack, &mut store);
        assert_eq!(events, vec![AnnotationEvent::Deleted { id: 1 }]);
        assert!(store.is_empty());

        let events = redo_command(&mut stack, &mut store);
        assert!(matches!(events[0], AnnotationEvent::Added { .. }));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_undo_modify_restores_before() {
        let mut store = AnnotationStore::new();
        let mut stack = UndoStack::new();
        store.insert(boxed(1, 50.0));
        stack.push(Command::ModifyAnnotation {
            before: boxed(1, 0.0),
            after: boxed(1, 50.0),
        });

        let events = undo_command(&mut stack, &mut store);
        assert_eq!(store.get(1).unwrap().bound.x, 0.0);
        match &events[0] {
            AnnotationEvent::Edited { patch } => {
                assert_eq!(patch.bound, Some(Bound::new(0.0, 0.0, 10.0, 10.0)));
            }
            other => panic!("unexpected event {other:?}"),
        }

        redo_command(&mut stack, &mut store);
        assert_eq!(store.get(1).unwrap().bound.x, 50.0);
    }

    #[test]
    fn test_batch_undo_in_reverse() {
        let mut store = AnnotationStore::new();
        let mut stack = UndoStack::new();
        stack.push(Command::Batch {
            description: "Delete 2 annotations".to_string(),
            commands: vec![
                Command::RemoveAnnotation {
                    annotation: boxed(1, 0.0),
                },
                Command::RemoveAnnotation {
                    annotation: boxed(2, 20.0),
                },
            ],
        });

        let events = undo_command(&mut stack, &mut store);
        assert_eq!(events.len(), 2);
        let ids: Vec<AnnotationId> = store.iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![2, 1]);
        assert_eq!(stack.redo_description().as_deref(), Some("Delete 2 annotations"));
    }

    #[test]
    fn test_command_descriptions() {
        let add = Command::AddAnnotation {
            annotation: boxed(1, 0.0),
        };
        assert_eq!(add.description(), "Add annotation");
        assert_eq!(add.annotation_id(), Some(1));

        let modify = Command::ModifyAnnotation {
            before: boxed(1, 0.0),
            after: boxed(1, 5.0),
        };
        assert_eq!(modify.description(), "Edit free-box");
    }
}
