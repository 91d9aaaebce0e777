//! Recorded input scripts, replayed through an [`AnnotationEngine`].
//!
//! A script is a JSON array of steps, for example:
//!
//! ```json
//! [
//!   {"step": "mode", "mode": "free-box"},
//!   {"step": "drag", "from": {"x": 10, "y": 10}, "to": {"x": 80, "y": 40}},
//!   {"step": "key", "key": "z", "ctrl": true}
//! ]
//! ```

use std::path::Path;

use docanno_geometry::Point;
use serde::{Deserialize, Serialize};

use crate::engine::AnnotationEngine;
use crate::error::PageError;
use crate::events::AnnotationEvent;
use crate::image_tools::ToolKind;
use crate::keybindings::{Key, KeyChord};
use crate::model::{Annotation, AnnotationId, BoundType};

/// One recorded input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "camelCase")]
pub enum Step {
    Mode {
        mode: BoundType,
    },
    Category {
        category: Option<String>,
    },
    Scale {
        scale: f32,
    },
    Origin {
        x: f32,
        y: f32,
    },
    Modifiers {
        additive: bool,
    },
    Tool {
        tool: ToolKind,
    },
    Down {
        x: f32,
        y: f32,
    },
    Move {
        x: f32,
        y: f32,
    },
    Up {
        x: f32,
        y: f32,
    },
    /// Press, one move, release.
    Drag {
        from: Point,
        to: Point,
    },
    /// Press and release without moving.
    Click {
        x: f32,
        y: f32,
    },
    ContextMenu {
        x: f32,
        y: f32,
    },
    /// A key chord; `key` is a DOM-style name such as `"z"` or `"Delete"`.
    Key {
        key: String,
        #[serde(default)]
        ctrl: bool,
        #[serde(default)]
        shift: bool,
        #[serde(default)]
        alt: bool,
    },
    Undo,
    Redo,
    InitializeTable {
        table: AnnotationId,
        rows: usize,
        cols: usize,
    },
    MergeCells,
    SplitCells,
}

/// Read a script file.
pub fn load_script(path: &Path) -> Result<Vec<Step>, PageError> {
    if !path.exists() {
        return Err(PageError::NotFound {
            path: path.to_path_buf(),
        });
    }
    let json = std::fs::read_to_string(path)?;
    let steps: Vec<Step> = serde_json::from_str(&json)?;
    log::info!("📜 Loaded {} script steps from {:?}", steps.len(), path);
    Ok(steps)
}

/// Everything a replay produced.
#[derive(Debug, Clone, Serialize)]
pub struct ReplayOutput {
    pub events: Vec<AnnotationEvent>,
    pub annotations: Vec<Annotation>,
}

/// Feed `steps` through `engine`, collecting every emitted event.
pub fn run_script(engine: &mut AnnotationEngine, steps: &[Step]) -> Result<ReplayOutput, PageError> {
    let mut events = Vec::new();
    for (index, step) in steps.iter().enumerate() {
        log::debug!("▶️ Step {}: {:?}", index, step);
        apply_step(engine, index, step)?;
        events.extend(engine.drain_events());
    }
    Ok(ReplayOutput {
        events,
        annotations: engine.annotations().to_vec(),
    })
}

fn apply_step(engine: &mut AnnotationEngine, index: usize, step: &Step) -> Result<(), PageError> {
    match step {
        Step::Mode { mode } => engine.set_mode(*mode),
        Step::Category { category } => engine.set_category(category.clone()),
        Step::Scale { scale } => engine.set_scale(*scale),
        Step::Origin { x, y } => engine.set_origin(Point::new(*x, *y)),
        Step::Modifiers { additive } => engine.set_modifiers(*additive),
        Step::Tool { tool } => engine.activate_tool(*tool),
        Step::Down { x, y } => engine.pointer_down(Point::new(*x, *y)),
        Step::Move { x, y } => engine.pointer_move(Point::new(*x, *y)),
        Step::Up { x, y } => engine.pointer_up(Point::new(*x, *y)),
        Step::Drag { from, to } => {
            engine.pointer_down(*from);
            engine.pointer_move(*to);
            engine.pointer_up(*to);
        }
        Step::Click { x, y } => {
            engine.pointer_down(Point::new(*x, *y));
            engine.pointer_up(Point::new(*x, *y));
        }
        Step::ContextMenu { x, y } => engine.context_menu(Point::new(*x, *y)),
        Step::Key {
            key,
            ctrl,
            shift,
            alt,
        } => {
            let Some(key) = Key::from_name(key) else {
                return Err(PageError::Script {
                    step: index,
                    message: format!("unknown key {:?}", key),
                });
            };
            let chord = KeyChord {
                key,
                ctrl: *ctrl,
                shift: *shift,
                alt: *alt,
            };
            if engine.key_down(chord).is_none() {
                log::warn!("Step {}: key chord is not bound", index);
            }
        }
        Step::Undo => engine.undo(),
        Step::Redo => engine.redo(),
        Step::InitializeTable { table, rows, cols } => {
            if engine.annotation(*table).is_none() {
                return Err(PageError::UnknownAnnotation { id: *table });
            }
            if !engine.initialize_table(*table, *rows, *cols) {
                return Err(PageError::Script {
                    step: index,
                    message: format!("cannot lay out annotation {} as {}x{}", table, rows, cols),
                });
            }
        }
        Step::MergeCells => {
            if engine.merge_cells().is_none() {
                log::warn!("Step {}: selection cannot be merged", index);
            }
        }
        Step::SplitCells => {
            if engine.split_cells().is_empty() {
                log::warn!("Step {}: selection cannot be split", index);
            }
        }
    }
    Ok(())
}
