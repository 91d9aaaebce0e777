//! Ramer-Douglas-Peucker simplification for traced contours.

use docanno_geometry::Point;

/// Perpendicular distance from `p` to the segment `a`-`b`.
fn segment_distance(p: &Point, a: &Point, b: &Point) -> f32 {
    let (dx, dy) = (b.x - a.x, b.y - a.y);
    let length_sq = dx * dx + dy * dy;
    if length_sq <= f32::EPSILON {
        return p.distance_to(a);
    }
    let t = (((p.x - a.x) * dx + (p.y - a.y) * dy) / length_sq).clamp(0.0, 1.0);
    p.distance_to(&Point::new(a.x + t * dx, a.y + t * dy))
}

/// Simplify an open polyline, keeping both end points.
pub fn simplify_polyline(points: &[Point], tolerance: f32) -> Vec<Point> {
    if points.len() < 3 {
        return points.to_vec();
    }

    let mut keep = vec![false; points.len()];
    keep[0] = true;
    keep[points.len() - 1] = true;

    let mut stack = vec![(0, points.len() - 1)];
    while let Some((first, last)) = stack.pop() {
        let farthest = (first + 1..last)
            .map(|i| (i, segment_distance(&points[i], &points[first], &points[last])))
            .max_by(|a, b| a.1.total_cmp(&b.1));
        if let Some((index, _)) = farthest.filter(|(_, distance)| *distance > tolerance) {
            keep[index] = true;
            stack.push((first, index));
            stack.push((index, last));
        }
    }

    points
        .iter()
        .zip(keep)
        .filter_map(|(p, k)| k.then_some(*p))
        .collect()
}

/// Simplify a closed ring.
///
/// The ring is cut at its first point and the point farthest from it, and
/// both halves are simplified as polylines.
pub fn simplify_ring(ring: &[Point], tolerance: f32) -> Vec<Point> {
    if ring.len() <= 3 || tolerance <= 0.0 {
        return ring.to_vec();
    }
    let origin = ring[0];
    let Some(split) = (1..ring.len()).max_by(|a, b| {
        ring[*a]
            .distance_to(&origin)
            .total_cmp(&ring[*b].distance_to(&origin))
    }) else {
        return ring.to_vec();
    };

    let mut closed_tail: Vec<Point> = ring[split..].to_vec();
    closed_tail.push(origin);

    let mut simplified = simplify_polyline(&ring[..=split], tolerance);
    let tail = simplify_polyline(&closed_tail, tolerance);
    // Drop the shared split point and the closing origin
    simplified.extend(tail.iter().skip(1).take(tail.len().saturating_sub(2)));
    simplified
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collinear_points_removed() {
        let line: Vec<Point> = (0..=10).map(|i| Point::new(i as f32, 0.0)).collect();
        assert_eq!(
            simplify_polyline(&line, 0.1),
            vec![Point::new(0.0, 0.0), Point::new(10.0, 0.0)]
        );
    }

    #[test]
    fn test_corner_kept() {
        let points = vec![
            Point::new(0.0, 0.0),
            Point::new(5.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 5.0),
            Point::new(10.0, 10.0),
        ];
        let simplified = simplify_polyline(&points, 0.5);
        assert_eq!(simplified.len(), 3);
        assert_eq!(simplified[1], Point::new(10.0, 0.0));
    }

    #[test]
    fn test_ring_reduces_to_corners() {
        let mut ring = Vec::new();
        for x in 0..10 {
            ring.push(Point::new(x as f32, 0.0));
        }
        for y in 0..10 {
            ring.push(Point::new(10.0, y as f32));
        }
        for x in (1..=10).rev() {
            ring.push(Point::new(x as f32, 10.0));
        }
        for y in (1..=10).rev() {
            ring.push(Point::new(0.0, y as f32));
        }
        let simplified = simplify_ring(&ring, 0.5);
        assert_eq!(simplified.len(), 4);
        assert!(simplified.contains(&Point::new(10.0, 10.0)));
        assert!(simplified.contains(&Point::new(0.0, 0.0)));
    }

    #[test]
    fn test_zero_tolerance_is_identity() {
        let ring = vec![
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(2.0, 0.0),
            Point::new(2.0, 2.0),
        ];
        assert_eq!(simplify_ring(&ring, 0.0), ring);
    }
}
