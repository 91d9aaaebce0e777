//! docanno - document annotation geometry engine
//!
//! Tracks box, free-box, text, table and polygon selections on a zoomable page
//! canvas, turns pointer gestures into normalized annotation bounds, hit-tests
//! overlapping shapes and keeps table grids editable through their gutters.

pub mod config;
pub mod creation;
pub mod edit;
pub mod engine;
pub mod error;
pub mod events;
pub mod export;
pub mod gesture;
pub mod image_tools;
pub mod interaction;
pub mod keybindings;
pub mod links;
pub mod model;
pub mod replay;
pub mod table;
pub mod tokens;
pub mod undo;

pub use config::{ConfigError, EngineConfig, LogLevel};
pub use docanno_geometry as geometry;
pub use engine::{AnnotationEngine, Preview};
pub use error::PageError;
pub use events::AnnotationEvent;
pub use image_tools::ToolKind;
pub use interaction::InteractionTarget;
pub use keybindings::{EditorAction, Key, KeyBindings, KeyChord};
pub use model::{Annotation, AnnotationId, AnnotationPatch, BoundType, PageView};
