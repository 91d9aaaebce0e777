//! Turning a finished selection into a new annotation.
//!
//! Selection points arrive in screen space and are downscaled first. Each
//! mode has its own constructor; a constructor that cannot produce a sensible
//! shape returns `None` and nothing is created.

use docanno_geometry::{Bound, Point, Rect, down_scale_coords, rect_to_bound};

use crate::model::{Annotation, AnnotationId, AnnotationTable, BoundType, PageToken};
use crate::tokens::{nearest_token_index, token_slice, tokens_bound, tokens_in_rect};

/// A constructed annotation still waiting for its id.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationDraft {
    pub bound_type: BoundType,
    pub bound: Bound,
    pub tokens: Vec<PageToken>,
    pub table: Option<AnnotationTable>,
}

impl AnnotationDraft {
    fn new(bound_type: BoundType, bound: Bound) -> Self {
        Self {
            bound_type,
            bound,
            tokens: Vec::new(),
            table: None,
        }
    }

    /// Stamp the draft with an id and category.
    pub fn into_annotation(self, id: AnnotationId, category: Option<String>) -> Annotation {
        let mut annotation = Annotation::new(id, self.bound_type, self.bound);
        annotation.tokens = self.tokens;
        annotation.table = self.table;
        annotation.category = category;
        annotation
    }
}

/// Build a draft for `mode` from a screen-space drag.
///
/// `polygon`, `table_cell` and the link modes are not created from a plain
/// drag rectangle and always return `None` here.
pub fn build_annotation(
    mode: BoundType,
    start: Point,
    end: Point,
    scale: f32,
    tokens: &[PageToken],
) -> Option<AnnotationDraft> {
    let points = down_scale_coords(&[start, end], scale);
    let (start, end) = (points[0], points[1]);

    match mode {
        BoundType::Box => box_from_tokens(start, end, tokens),
        BoundType::FreeBox => Some(AnnotationDraft::new(
            BoundType::FreeBox,
            Bound::from_corners(start, end),
        )),
        BoundType::Text => text_from_tokens(start, end, tokens),
        BoundType::Table => {
            let mut draft = AnnotationDraft::new(BoundType::Table, Bound::from_corners(start, end));
            draft.table = Some(AnnotationTable::default());
            Some(draft)
        }
        BoundType::Polygon | BoundType::TableCell | BoundType::Chain | BoundType::AllToAll => None,
    }
}

/// Box snapped to the tokens under the drag rectangle.
fn box_from_tokens(start: Point, end: Point, tokens: &[PageToken]) -> Option<AnnotationDraft> {
    let rect = Rect::from_points(start, end);
    let hits = tokens_in_rect(tokens, &rect);
    if hits.is_empty() {
        log::debug!(
            "Box selection {:?} covers no tokens - nothing created",
            rect_to_bound(&rect)
        );
        return None;
    }

    let bound = tokens_bound(hits.iter().copied())?;
    let mut draft = AnnotationDraft::new(BoundType::Box, bound);
    draft.tokens = hits.into_iter().cloned().collect();
    Some(draft)
}

/// Text span between the tokens nearest to each end of the drag.
fn text_from_tokens(start: Point, end: Point, tokens: &[PageToken]) -> Option<AnnotationDraft> {
    let first = nearest_token_index(tokens, &start)?;
    let last = nearest_token_index(tokens, &end)?;
    let span = token_slice(tokens, first, last);
    let bound = tokens_bound(span.iter())?;

    let mut draft = AnnotationDraft::new(BoundType::Text, bound);
    draft.tokens = span;
    Some(draft)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens() -> Vec<PageToken> {
        (0..10)
            .map(|i| PageToken::new(i, format!("w{i}"), i as f32 * 20.0, 100.0, 15.0, 10.0))
            .collect()
    }

    #[test]
    fn test_box_snaps_to_tokens() {
        // Screen space at scale 2: covers document x 18..62, y 95..115
        let draft = build_annotation(
            BoundType::Box,
            Point::new(36.0, 190.0),
            Point::new(124.0, 230.0),
            2.0,
            &tokens(),
        )
        .unwrap();
        let ids: Vec<u32> = draft.tokens.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(draft.bound, Bound::new(20.0, 100.0, 55.0, 10.0));
    }

    #[test]
    fn test_box_without_tokens_is_none() {
        let draft = build_annotation(
            BoundType::Box,
            Point::new(0.0, 0.0),
            Point::new(50.0, 50.0),
            1.0,
            &tokens(),
        );
        assert!(draft.is_none());
    }

    #[test]
    fn test_free_box_is_raw_rect() {
        let draft = build_annotation(
            BoundType::FreeBox,
            Point::new(100.0, 80.0),
            Point::new(20.0, 40.0),
            2.0,
            &[],
        )
        .unwrap();
        assert_eq!(draft.bound, Bound::new(10.0, 20.0, 40.0, 20.0));
        assert!(draft.tokens.is_empty());
    }

    #[test]
    fn test_text_selects_contiguous_tokens() {
        // Nearest to token 2 (center 47.5,105) and token 7 (center 147.5,105)
        let draft = build_annotation(
            BoundType::Text,
            Point::new(46.0, 90.0),
            Point::new(149.0, 120.0),
            1.0,
            &tokens(),
        )
        .unwrap();
        let ids: Vec<u32> = draft.tokens.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![2, 3, 4, 5, 6, 7]);
        assert_eq!(draft.bound_type, BoundType::Text);
    }

    #[test]
    fn test_text_without_tokens_is_none() {
        let draft = build_annotation(
            BoundType::Text,
            Point::new(0.0, 0.0),
            Point::new(10.0, 10.0),
            1.0,
            &[],
        );
        assert!(draft.is_none());
    }

    #[test]
    fn test_table_starts_empty() {
        let draft = build_annotation(
            BoundType::Table,
            Point::new(0.0, 0.0),
            Point::new(100.0, 60.0),
            1.0,
            &[],
        )
        .unwrap();
        assert_eq!(draft.table, Some(AnnotationTable::default()));
        assert_eq!(draft.bound, Bound::new(0.0, 0.0, 100.0, 60.0));
    }

    #[test]
    fn test_polygon_not_built_from_rect() {
        assert!(
            build_annotation(
                BoundType::Polygon,
                Point::new(0.0, 0.0),
                Point::new(10.0, 10.0),
                1.0,
                &[]
            )
            .is_none()
        );
    }
}
