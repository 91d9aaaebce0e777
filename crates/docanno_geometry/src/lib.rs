//! Geometry primitives for the document annotation engine.
//!
//! Two box representations are used side by side:
//! - [`Bound`]: `x/y/width/height`, the form annotations are stored in
//! - [`Rect`]: `left/top/right/bottom`, the form intersection math runs on
//!
//! All values are `f32`. Document space is the unscaled page coordinate
//! system; screen space is document space multiplied by the current zoom
//! `scale`. Every function here is a pure value transform.

use serde::{Deserialize, Serialize};

// ============================================================================
// Point
// ============================================================================

/// A 2D point.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const ZERO: Point = Point { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    pub fn distance_to(&self, other: &Point) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// This point moved by `(dx, dy)`.
    pub fn offset(&self, dx: f32, dy: f32) -> Point {
        Point::new(self.x + dx, self.y + dy)
    }

    /// Component-wise difference `self - other`.
    pub fn delta_from(&self, other: &Point) -> (f32, f32) {
        (self.x - other.x, self.y - other.y)
    }

    pub fn scaled(&self, scale: f32) -> Point {
        Point::new(self.x * scale, self.y * scale)
    }

    pub fn down_scaled(&self, scale: f32) -> Point {
        Point::new(self.x / scale, self.y / scale)
    }
}

// ============================================================================
// Bound
// ============================================================================

/// Axis-aligned box stored as origin plus size.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Bound {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Bound {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Normalized bound spanned by two arbitrary corner points.
    pub fn from_corners(p1: Point, p2: Point) -> Self {
        Self {
            x: p1.x.min(p2.x),
            y: p1.y.min(p2.y),
            width: (p1.x - p2.x).abs(),
            height: (p1.y - p2.y).abs(),
        }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn area(&self) -> f32 {
        self.width * self.height
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn top_left(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn bottom_right(&self) -> Point {
        Point::new(self.right(), self.bottom())
    }

    /// Inclusive point containment.
    pub fn contains(&self, point: &Point) -> bool {
        is_point_inside_rect(point, &bound_to_rect(self))
    }

    pub fn translated(&self, dx: f32, dy: f32) -> Bound {
        Bound::new(self.x + dx, self.y + dy, self.width, self.height)
    }

    /// Smallest bound covering both `self` and `other`.
    pub fn union(&self, other: &Bound) -> Bound {
        let left = self.x.min(other.x);
        let top = self.y.min(other.y);
        let right = self.right().max(other.right());
        let bottom = self.bottom().max(other.bottom());
        Bound::new(left, top, right - left, bottom - top)
    }

    /// Screen-space version of a document-space bound.
    pub fn scaled(&self, scale: f32) -> Bound {
        Bound::new(
            self.x * scale,
            self.y * scale,
            self.width * scale,
            self.height * scale,
        )
    }

    /// Document-space version of a screen-space bound.
    pub fn down_scaled(&self, scale: f32) -> Bound {
        Bound::new(
            self.x / scale,
            self.y / scale,
            self.width / scale,
            self.height / scale,
        )
    }
}

/// Tight bound around every bound yielded by `bounds`, `None` when empty.
pub fn union_bounds<'a>(bounds: impl IntoIterator<Item = &'a Bound>) -> Option<Bound> {
    bounds
        .into_iter()
        .fold(None, |acc: Option<Bound>, b| match acc {
            Some(acc) => Some(acc.union(b)),
            None => Some(*b),
        })
}

/// Bounding box of a point cloud, `None` when empty.
pub fn points_bound(points: &[Point]) -> Option<Bound> {
    let first = points.first()?;
    let mut min_x = first.x;
    let mut min_y = first.y;
    let mut max_x = first.x;
    let mut max_y = first.y;

    for p in &points[1..] {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }

    Some(Bound::new(min_x, min_y, max_x - min_x, max_y - min_y))
}

// ============================================================================
// Rect
// ============================================================================

/// Axis-aligned box stored as its four edges.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl Rect {
    pub fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Rect spanned by two corner points, normalized so `left <= right`.
    pub fn from_points(p1: Point, p2: Point) -> Self {
        Self {
            left: p1.x.min(p2.x),
            top: p1.y.min(p2.y),
            right: p1.x.max(p2.x),
            bottom: p1.y.max(p2.y),
        }
    }

    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }

    /// Swap edges so that `left <= right` and `top <= bottom`.
    pub fn normalized(&self) -> Rect {
        Rect {
            left: self.left.min(self.right),
            top: self.top.min(self.bottom),
            right: self.left.max(self.right),
            bottom: self.top.max(self.bottom),
        }
    }
}

pub fn bound_to_rect(bound: &Bound) -> Rect {
    Rect {
        left: bound.x,
        top: bound.y,
        right: bound.x + bound.width,
        bottom: bound.y + bound.height,
    }
}

pub fn rect_to_bound(rect: &Rect) -> Bound {
    Bound {
        x: rect.left,
        y: rect.top,
        width: rect.right - rect.left,
        height: rect.bottom - rect.top,
    }
}

// ============================================================================
// Predicates
// ============================================================================

/// Whether two rects overlap. Touching edges count as overlap.
pub fn is_intersected(r1: &Rect, r2: &Rect) -> bool {
    !(r2.left > r1.right || r2.right < r1.left || r2.top > r1.bottom || r2.bottom < r1.top)
}

/// Inclusive point-in-rect test.
pub fn is_point_inside_rect(point: &Point, rect: &Rect) -> bool {
    point.x >= rect.left && point.x <= rect.right && point.y >= rect.top && point.y <= rect.bottom
}

/// Whether `r2` lies entirely within `r1` (edges inclusive).
pub fn is_r2_inside_r1(r1: &Rect, r2: &Rect) -> bool {
    r2.left >= r1.left && r2.right <= r1.right && r2.top >= r1.top && r2.bottom <= r1.bottom
}

// ============================================================================
// Scale conversions
// ============================================================================

/// Document space to screen space.
pub fn scale_coords(points: &[Point], scale: f32) -> Vec<Point> {
    points.iter().map(|p| p.scaled(scale)).collect()
}

/// Screen space to document space.
pub fn down_scale_coords(points: &[Point], scale: f32) -> Vec<Point> {
    points.iter().map(|p| p.down_scaled(scale)).collect()
}
