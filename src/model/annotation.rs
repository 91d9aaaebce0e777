//! Annotation data model and the per-page annotation store.
//!
//! Annotations are plain values: their bound is always axis-aligned and in
//! unscaled document coordinates. Table cells live inside their table
//! annotation's `table_cells` list and carry grid placement in `data`.

use docanno_geometry::{Bound, Point, Rect, bound_to_rect, is_point_inside_rect};
use serde::{Deserialize, Serialize};

/// Unique identifier for an annotation.
pub type AnnotationId = u64;

// ============================================================================
// Bound types
// ============================================================================

/// Kind of annotation, doubling as the selection mode that creates it.
///
/// `Chain` and `AllToAll` never appear on stored annotations: they are the
/// link-drawing modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BoundType {
    #[default]
    #[serde(rename = "box")]
    Box,
    #[serde(rename = "free-box")]
    FreeBox,
    #[serde(rename = "table")]
    Table,
    #[serde(rename = "text")]
    Text,
    #[serde(rename = "table_cell")]
    TableCell,
    #[serde(rename = "polygon")]
    Polygon,
    #[serde(rename = "Chain")]
    Chain,
    #[serde(rename = "All to all")]
    AllToAll,
}

impl BoundType {
    pub fn name(&self) -> &'static str {
        match self {
            BoundType::Box => "box",
            BoundType::FreeBox => "free-box",
            BoundType::Table => "table",
            BoundType::Text => "text",
            BoundType::TableCell => "table_cell",
            BoundType::Polygon => "polygon",
            BoundType::Chain => "Chain",
            BoundType::AllToAll => "All to all",
        }
    }

    /// Whether annotations of this type expose corner resize handles.
    pub fn is_resizable(&self) -> bool {
        matches!(
            self,
            BoundType::Box | BoundType::FreeBox | BoundType::Table | BoundType::Polygon
        )
    }

    /// Whether this type draws links instead of creating shapes.
    pub fn is_link(&self) -> bool {
        matches!(self, BoundType::Chain | BoundType::AllToAll)
    }
}

// ============================================================================
// Page tokens
// ============================================================================

/// An OCR/text-extraction token. Supplied by the host, never mutated here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageToken {
    pub id: u32,
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl PageToken {
    pub fn new(id: u32, text: impl Into<String>, x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            id,
            text: text.into(),
            x,
            y,
            width,
            height,
        }
    }

    pub fn bound(&self) -> Bound {
        Bound::new(self.x, self.y, self.width, self.height)
    }

    pub fn rect(&self) -> Rect {
        bound_to_rect(&self.bound())
    }
}

// ============================================================================
// Table payloads
// ============================================================================

/// Interior separator positions of a table, in document coordinates.
///
/// `cols` holds the x of every boundary between two columns, `rows` the y of
/// every boundary between two rows. Outer edges come from the table bound.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AnnotationTable {
    #[serde(default)]
    pub rows: Vec<f32>,
    #[serde(default)]
    pub cols: Vec<f32>,
}

fn one() -> usize {
    1
}

/// Grid placement of a table cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellData {
    pub row: usize,
    pub col: usize,
    #[serde(default = "one")]
    pub rowspan: usize,
    #[serde(default = "one")]
    pub colspan: usize,
}

impl CellData {
    pub fn new(row: usize, col: usize) -> Self {
        Self {
            row,
            col,
            rowspan: 1,
            colspan: 1,
        }
    }

    pub fn with_span(mut self, rowspan: usize, colspan: usize) -> Self {
        self.rowspan = rowspan.max(1);
        self.colspan = colspan.max(1);
        self
    }

    /// One past the last row this cell covers.
    pub fn row_end(&self) -> usize {
        self.row + self.rowspan
    }

    /// One past the last column this cell covers.
    pub fn col_end(&self) -> usize {
        self.col + self.colspan
    }

    pub fn has_span(&self) -> bool {
        self.rowspan > 1 || self.colspan > 1
    }

    /// Whether the unit grid square `(row, col)` lies under this cell.
    pub fn covers(&self, row: usize, col: usize) -> bool {
        row >= self.row && row < self.row_end() && col >= self.col && col < self.col_end()
    }
}

// ============================================================================
// Links
// ============================================================================

/// How a link was drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LinkType {
    #[serde(rename = "Chain")]
    Chain,
    #[serde(rename = "All to all")]
    AllToAll,
}

/// A directed link from the owning annotation to another one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotationLink {
    pub to: AnnotationId,
    pub page_num: u32,
    pub link_type: LinkType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

// ============================================================================
// Annotation
// ============================================================================

/// A single annotation on a document page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Annotation {
    pub id: AnnotationId,
    pub bound_type: BoundType,
    pub bound: Bound,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Constituent tokens of a `text` (or token-snapped `box`) annotation.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tokens: Vec<PageToken>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table: Option<AnnotationTable>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub table_cells: Vec<Annotation>,
    /// COCO-style polygon rings: `[x0, y0, x1, y1, ...]`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub segments: Vec<Vec<f32>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<AnnotationLink>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<CellData>,
}

impl Annotation {
    /// Create a bare annotation of the given type.
    pub fn new(id: AnnotationId, bound_type: BoundType, bound: Bound) -> Self {
        Self {
            id,
            bound_type,
            bound,
            category: None,
            color: None,
            label: None,
            tokens: Vec::new(),
            table: None,
            table_cells: Vec::new(),
            segments: Vec::new(),
            links: Vec::new(),
            data: None,
        }
    }

    /// Create a table cell placed at `data`.
    pub fn cell(id: AnnotationId, bound: Bound, data: CellData) -> Self {
        let mut cell = Self::new(id, BoundType::TableCell, bound);
        cell.data = Some(data);
        cell
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_tokens(mut self, tokens: Vec<PageToken>) -> Self {
        self.tokens = tokens;
        self
    }

    pub fn rect(&self) -> Rect {
        bound_to_rect(&self.bound)
    }

    pub fn area(&self) -> f32 {
        self.bound.area()
    }

    /// Grid placement, defaulting to the origin for cells saved without one.
    pub fn cell_data(&self) -> CellData {
        self.data.unwrap_or_else(|| CellData::new(0, 0))
    }

    /// Whether the point lands on this annotation.
    ///
    /// Text annotations are a flow of disjoint token rects, so they test their
    /// tokens instead of the overall bound.
    pub fn contains(&self, point: &Point) -> bool {
        if self.bound_type == BoundType::Text && !self.tokens.is_empty() {
            return self
                .tokens
                .iter()
                .any(|t| is_point_inside_rect(point, &t.rect()));
        }
        is_point_inside_rect(point, &self.rect())
    }
}

// ============================================================================
// Patches
// ============================================================================

/// Partial update of an annotation, the payload of an edit event.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotationPatch {
    pub id: AnnotationId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bound: Option<Bound>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table: Option<AnnotationTable>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_cells: Option<Vec<Annotation>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub segments: Option<Vec<Vec<f32>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub links: Option<Vec<AnnotationLink>>,
}

impl AnnotationPatch {
    pub fn new(id: AnnotationId) -> Self {
        Self {
            id,
            ..Default::default()
        }
    }

    pub fn with_bound(mut self, bound: Bound) -> Self {
        self.bound = Some(bound);
        self
    }

    /// Patch carrying the full table state of `table`.
    pub fn table_state(table: &Annotation) -> Self {
        Self {
            id: table.id,
            bound: Some(table.bound),
            table: table.table.clone(),
            table_cells: Some(table.table_cells.clone()),
            ..Default::default()
        }
    }

    /// Patch carrying the polygon state of `annotation`.
    pub fn polygon_state(annotation: &Annotation) -> Self {
        Self {
            id: annotation.id,
            bound: Some(annotation.bound),
            segments: Some(annotation.segments.clone()),
            ..Default::default()
        }
    }

    /// Patch restoring every editable field of `annotation`.
    pub fn full_state(annotation: &Annotation) -> Self {
        Self {
            id: annotation.id,
            bound: Some(annotation.bound),
            table: annotation.table.clone(),
            table_cells: Some(annotation.table_cells.clone()),
            segments: Some(annotation.segments.clone()),
            links: Some(annotation.links.clone()),
        }
    }

    /// Write every present field into `annotation`.
    pub fn apply(&self, annotation: &mut Annotation) {
        if let Some(bound) = self.bound {
            annotation.bound = bound;
        }
        if let Some(table) = &self.table {
            annotation.table = Some(table.clone());
        }
        if let Some(cells) = &self.table_cells {
            annotation.table_cells = cells.clone();
        }
        if let Some(segments) = &self.segments {
            annotation.segments = segments.clone();
        }
        if let Some(links) = &self.links {
            annotation.links = links.clone();
        }
    }
}

// ============================================================================
// Annotation Store
// ============================================================================

/// Ordered annotation list of one page.
///
/// Order is significant: it is the render order and breaks hit-test ties.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnnotationStore {
    annotations: Vec<Annotation>,
    next_id: AnnotationId,
}

impl AnnotationStore {
    pub fn new() -> Self {
        Self {
            annotations: Vec::new(),
            next_id: 1,
        }
    }

    /// Build a store from host-supplied annotations, continuing ids after the
    /// largest one seen (cells included).
    pub fn from_annotations(annotations: Vec<Annotation>) -> Self {
        let max_id = annotations
            .iter()
            .flat_map(|a| std::iter::once(a.id).chain(a.table_cells.iter().map(|c| c.id)))
            .max()
            .unwrap_or(0);
        Self {
            annotations,
            next_id: max_id + 1,
        }
    }

    /// Reserve a fresh id.
    pub fn allocate_id(&mut self) -> AnnotationId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Append an annotation, keeping its id.
    pub fn insert(&mut self, annotation: Annotation) {
        if annotation.id >= self.next_id {
            self.next_id = annotation.id + 1;
        }
        self.annotations.push(annotation);
    }

    /// Put back a previously removed annotation, replacing any same-id entry.
    pub fn restore(&mut self, annotation: Annotation) {
        if let Some(existing) = self.get_mut(annotation.id) {
            *existing = annotation;
        } else {
            self.insert(annotation);
        }
    }

    pub fn remove(&mut self, id: AnnotationId) -> Option<Annotation> {
        let index = self.annotations.iter().position(|a| a.id == id)?;
        Some(self.annotations.remove(index))
    }

    pub fn get(&self, id: AnnotationId) -> Option<&Annotation> {
        self.annotations.iter().find(|a| a.id == id)
    }

    pub fn get_mut(&mut self, id: AnnotationId) -> Option<&mut Annotation> {
        self.annotations.iter_mut().find(|a| a.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Annotation> {
        self.annotations.iter()
    }

    pub fn as_slice(&self) -> &[Annotation] {
        &self.annotations
    }

    pub fn len(&self) -> usize {
        self.annotations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.annotations.is_empty()
    }

    pub fn clear(&mut self) {
        self.annotations.clear();
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bound_type_serde_names() {
        let json = serde_json::to_string(&BoundType::FreeBox).unwrap();
        assert_eq!(json, "\"free-box\"");
        let parsed: BoundType = serde_json::from_str("\"All to all\"").unwrap();
        assert_eq!(parsed, BoundType::AllToAll);
        let parsed: BoundType = serde_json::from_str("\"table_cell\"").unwrap();
        assert_eq!(parsed, BoundType::TableCell);
    }

    #[test]
    fn test_cell_data_defaults_span() {
        let data: CellData = serde_json::from_str(r#"{"row": 2, "col": 3}"#).unwrap();
        assert_eq!(data.rowspan, 1);
        assert_eq!(data.colspan, 1);
        assert!(!data.has_span());
        assert!(data.covers(2, 3));
        assert!(!data.covers(2, 4));
    }

    #[test]
    fn test_text_annotation_contains_tests_tokens() {
        let tokens = vec![
            PageToken::new(0, "a", 0.0, 0.0, 10.0, 10.0),
            PageToken::new(1, "b", 50.0, 50.0, 10.0, 10.0),
        ];
        let ann = Annotation::new(1, BoundType::Text, Bound::new(0.0, 0.0, 60.0, 60.0))
            .with_tokens(tokens);

        assert!(ann.contains(&Point::new(5.0, 5.0)));
        // Inside the bound but between the tokens
        assert!(!ann.contains(&Point::new(30.0, 30.0)));
    }

    #[test]
    fn test_store_ids_continue_after_loaded() {
        let mut table = Annotation::new(4, BoundType::Table, Bound::new(0.0, 0.0, 10.0, 10.0));
        table.table_cells.push(Annotation::cell(
            9,
            Bound::new(0.0, 0.0, 10.0, 10.0),
            CellData::new(0, 0),
        ));
        let mut store = AnnotationStore::from_annotations(vec![table]);
        assert_eq!(store.allocate_id(), 10);
        assert_eq!(store.allocate_id(), 11);
    }

    #[test]
    fn test_store_remove_and_restore() {
        let mut store = AnnotationStore::new();
        let id = store.allocate_id();
        store.insert(Annotation::new(id, BoundType::Box, Bound::new(1.0, 2.0, 3.0, 4.0)));
        assert_eq!(store.len(), 1);

        let removed = store.remove(id).unwrap();
        assert!(store.is_empty());

        store.restore(removed.clone());
        assert_eq!(store.get(id), Some(&removed));
    }

    #[test]
    fn test_patch_apply() {
        let mut ann = Annotation::new(1, BoundType::Box, Bound::new(0.0, 0.0, 1.0, 1.0));
        AnnotationPatch::new(1)
            .with_bound(Bound::new(5.0, 5.0, 2.0, 2.0))
            .apply(&mut ann);
        assert_eq!(ann.bound, Bound::new(5.0, 5.0, 2.0, 2.0));
        assert_eq!(ann.bound_type, BoundType::Box);
    }
}
