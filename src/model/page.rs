//! The inbound page payload: tokens, annotations and view parameters.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::PageError;
use crate::model::{Annotation, BoundType, Category, PageToken};

fn default_scale() -> f32 {
    1.0
}

/// Pixel size of the rendered page image.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageSize {
    pub width: u32,
    pub height: u32,
}

/// Everything the host hands over for one open page.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageView {
    #[serde(default)]
    pub page_num: u32,
    /// Zoom factor from document to screen space.
    #[serde(default = "default_scale")]
    pub scale: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<PageSize>,
    #[serde(default)]
    pub tokens: Vec<PageToken>,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
    #[serde(default)]
    pub categories: Vec<Category>,
}

impl PageView {
    pub fn new(page_num: u32, scale: f32) -> Self {
        Self {
            page_num,
            scale,
            size: None,
            tokens: Vec::new(),
            annotations: Vec::new(),
            categories: Vec::new(),
        }
    }

    pub fn with_tokens(mut self, tokens: Vec<PageToken>) -> Self {
        self.tokens = tokens;
        self
    }

    pub fn with_annotations(mut self, annotations: Vec<Annotation>) -> Self {
        self.annotations = annotations;
        self
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.size = Some(PageSize { width, height });
        self
    }

    /// Parse and validate a page from JSON.
    pub fn from_json(json: &str) -> Result<Self, PageError> {
        let page: Self = serde_json::from_str(json)?;
        page.validate()?;
        Ok(page)
    }

    /// Read and parse a page file.
    pub fn load(path: &Path) -> Result<Self, PageError> {
        if !path.exists() {
            return Err(PageError::NotFound {
                path: path.to_path_buf(),
            });
        }
        let json = std::fs::read_to_string(path)?;
        let page = Self::from_json(&json)?;
        log::info!(
            "📄 Loaded page {} from {:?}: {} tokens, {} annotations",
            page.page_num,
            path,
            page.tokens.len(),
            page.annotations.len()
        );
        Ok(page)
    }

    /// Reject polygon segments that are not flat `x, y` pairs.
    fn validate(&self) -> Result<(), PageError> {
        for ann in &self.annotations {
            if ann.bound_type != BoundType::Polygon {
                continue;
            }
            for segment in &ann.segments {
                if segment.len() % 2 != 0 {
                    return Err(PageError::invalid_segmentation(
                        ann.id,
                        format!("odd coordinate count {}", segment.len()),
                    ));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_from_json_defaults() {
        let json = r#"{
            "tokens": [{"id": 0, "text": "Total", "x": 10, "y": 10, "width": 40, "height": 12}],
            "annotations": [
                {"id": 3, "boundType": "free-box", "bound": {"x": 0, "y": 0, "width": 5, "height": 5}}
            ]
        }"#;
        let page = PageView::from_json(json).unwrap();
        assert_eq!(page.scale, 1.0);
        assert_eq!(page.page_num, 0);
        assert_eq!(page.tokens[0].text, "Total");
        assert_eq!(page.annotations[0].bound_type, BoundType::FreeBox);
    }

    #[test]
    fn test_page_rejects_odd_segment() {
        let json = r#"{
            "annotations": [
                {"id": 1, "boundType": "polygon", "bound": {"x": 0, "y": 0, "width": 5, "height": 5},
                 "segments": [[0, 0, 5, 0, 5]]}
            ]
        }"#;
        match PageView::from_json(json) {
            Err(PageError::InvalidSegmentation { id, .. }) => assert_eq!(id, 1),
            other => panic!("Expected invalid segmentation, got {:?}", other),
        }
    }
}
