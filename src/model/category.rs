//! Category metadata used to label annotations.

use serde::{Deserialize, Serialize};

/// An annotation category supplied by the host application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    /// Unique identifier for the category
    pub id: String,
    /// Display name of the category
    pub name: String,
    /// Hex color, e.g. `#ff8800`
    #[serde(default = "default_color")]
    pub color: String,
}

fn default_color() -> String {
    "#7f7f7f".to_string()
}

impl Category {
    /// Create a new category with the given ID, name, and color.
    pub fn new(id: &str, name: &str, color: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            color: color.to_string(),
        }
    }
}

/// Position of a category in the page's category list.
pub fn category_index(categories: &[Category], id: &str) -> Option<usize> {
    categories.iter().position(|c| c.id == id)
}
