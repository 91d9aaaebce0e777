//! Property-based invariant tests for the geometry primitives.
//!
//! 1. Intersection is symmetric.
//! 2. Bound/Rect conversion round-trips.
//! 3. Down-scaling undoes scaling for any positive scale.
//! 4. A rect always contains its own corners and center.
//! 5. Containment implies intersection.

use docanno_geometry::{
    Bound, Point, Rect, bound_to_rect, down_scale_coords, is_intersected, is_point_inside_rect,
    is_r2_inside_r1, rect_to_bound, scale_coords,
};
use proptest::prelude::*;

// ── Helpers ─────────────────────────────────────────────────────────────

// Integer-valued coordinates keep f32 arithmetic exact for the round-trip checks.
fn rect_strategy() -> impl Strategy<Value = Rect> {
    (-2000i32..2000, -2000i32..2000, 0i32..2000, 0i32..2000).prop_map(|(l, t, w, h)| {
        Rect::new(l as f32, t as f32, (l + w) as f32, (t + h) as f32)
    })
}

fn bound_strategy() -> impl Strategy<Value = Bound> {
    (-2000i32..2000, -2000i32..2000, 0i32..2000, 0i32..2000)
        .prop_map(|(x, y, w, h)| Bound::new(x as f32, y as f32, w as f32, h as f32))
}

fn point_strategy() -> impl Strategy<Value = Point> {
    (-5000.0f32..5000.0, -5000.0f32..5000.0).prop_map(|(x, y)| Point::new(x, y))
}

proptest! {
    #[test]
    fn intersection_symmetric(a in rect_strategy(), b in rect_strategy()) {
        prop_assert_eq!(is_intersected(&a, &b), is_intersected(&b, &a));
    }

    #[test]
    fn rect_bound_round_trip(r in rect_strategy()) {
        prop_assert_eq!(bound_to_rect(&rect_to_bound(&r)), r);
    }

    #[test]
    fn bound_rect_round_trip(b in bound_strategy()) {
        prop_assert_eq!(rect_to_bound(&bound_to_rect(&b)), b);
    }

    #[test]
    fn down_scale_inverts_scale(
        points in prop::collection::vec(point_strategy(), 0..16),
        scale in 0.1f32..8.0,
    ) {
        let back = down_scale_coords(&scale_coords(&points, scale), scale);
        prop_assert_eq!(back.len(), points.len());
        for (a, b) in points.iter().zip(&back) {
            let tol = 1e-3 * a.x.abs().max(a.y.abs()).max(1.0);
            prop_assert!((a.x - b.x).abs() <= tol, "x drifted: {} vs {}", a.x, b.x);
            prop_assert!((a.y - b.y).abs() <= tol, "y drifted: {} vs {}", a.y, b.y);
        }
    }

    #[test]
    fn rect_contains_corners_and_center(r in rect_strategy()) {
        let b = rect_to_bound(&r);
        prop_assert!(is_point_inside_rect(&Point::new(r.left, r.top), &r));
        prop_assert!(is_point_inside_rect(&Point::new(r.right, r.bottom), &r));
        prop_assert!(is_point_inside_rect(&b.center(), &r));
    }

    #[test]
    fn containment_implies_intersection(a in rect_strategy(), b in rect_strategy()) {
        if is_r2_inside_r1(&a, &b) {
            prop_assert!(is_intersected(&a, &b));
        }
    }
}
