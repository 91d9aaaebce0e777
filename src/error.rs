//! Error types for the engine's I/O boundaries.
//!
//! Geometry and editing operations never fail: an invalid gesture simply
//! produces nothing. Errors only arise when reading host-supplied data.

use std::path::PathBuf;
use thiserror::Error;

use crate::model::AnnotationId;

/// Errors that can occur while loading pages, images or input scripts.
#[derive(Error, Debug)]
pub enum PageError {
    /// I/O error during file operations
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing or serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Page image could not be decoded
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// Polygon segment with an odd number of coordinates
    #[error("Invalid segmentation on annotation {id}: {message}")]
    InvalidSegmentation {
        /// The annotation carrying the segment
        id: AnnotationId,
        /// Description of the problem
        message: String,
    },

    /// Input referenced an annotation that is not on the page
    #[error("Unknown annotation: {id}")]
    UnknownAnnotation {
        /// The missing annotation ID
        id: AnnotationId,
    },

    /// A replay script step could not be carried out
    #[error("Script step {step}: {message}")]
    Script {
        /// Zero-based index of the failing step
        step: usize,
        /// Description of the problem
        message: String,
    },

    /// File not found at expected path
    #[error("File not found: {path:?}")]
    NotFound {
        /// Path where the file was expected
        path: PathBuf,
    },
}

impl PageError {
    /// Create an invalid segmentation error.
    pub fn invalid_segmentation(id: AnnotationId, message: impl Into<String>) -> Self {
        Self::InvalidSegmentation {
            id,
            message: message.into(),
        }
    }
}
