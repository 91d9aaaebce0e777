//! Token lookups used to snap selections onto page text.

use docanno_geometry::{Bound, Point, Rect, is_intersected, is_point_inside_rect, union_bounds};

use crate::model::PageToken;

/// Tokens whose rect overlaps `rect`, in page order.
pub fn tokens_in_rect<'a>(tokens: &'a [PageToken], rect: &Rect) -> Vec<&'a PageToken> {
    tokens
        .iter()
        .filter(|t| is_intersected(&t.rect(), rect))
        .collect()
}

/// Tight bound around a set of tokens.
pub fn tokens_bound<'a>(tokens: impl IntoIterator<Item = &'a PageToken>) -> Option<Bound> {
    let bounds: Vec<Bound> = tokens.into_iter().map(PageToken::bound).collect();
    union_bounds(bounds.iter())
}

/// Index of the token nearest to `point`.
///
/// A token containing the point wins outright; otherwise the token whose
/// center is closest (Euclidean) is returned. `None` only for an empty list.
pub fn nearest_token_index(tokens: &[PageToken], point: &Point) -> Option<usize> {
    if let Some(index) = tokens
        .iter()
        .position(|t| is_point_inside_rect(point, &t.rect()))
    {
        return Some(index);
    }

    tokens
        .iter()
        .enumerate()
        .map(|(i, t)| (i, t.bound().center().distance_to(point)))
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(i, _)| i)
}

/// The index-contiguous run of tokens between two indices, inclusive and
/// regardless of argument order.
pub fn token_slice(tokens: &[PageToken], a: usize, b: usize) -> Vec<PageToken> {
    let (from, to) = if a <= b { (a, b) } else { (b, a) };
    tokens
        .get(from..=to.min(tokens.len().saturating_sub(1)))
        .map(<[PageToken]>::to_vec)
        .unwrap_or_default()
}
