//! Raster masks: the working surface for polygon boolean operations.
//!
//! Polygons are rasterized into a page-sized binary mask, combined pixel-wise,
//! and traced back into rings with `imageproc`'s contour finder.

use docanno_geometry::Point;
use image::{GrayImage, Luma};
use imageproc::contours::find_contours;
use imageproc::drawing::{draw_filled_circle_mut, draw_polygon_mut};
use imageproc::point::Point as PixelPoint;

use super::simplify::simplify_ring;

const ON: Luma<u8> = Luma([255]);
const OFF: Luma<u8> = Luma([0]);

/// A binary page-sized mask.
#[derive(Debug, Clone, PartialEq)]
pub struct Mask {
    image: GrayImage,
}

impl Mask {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: GrayImage::new(width.max(1), height.max(1)),
        }
    }

    /// Rasterize rings with even-odd semantics: a pixel is set when it lies
    /// inside an odd number of rings, so inner rings cut holes.
    pub fn from_rings(width: u32, height: u32, rings: &[Vec<Point>]) -> Self {
        let mut mask = Self::new(width, height);
        for ring in rings {
            let Some(polygon) = pixel_polygon(ring) else {
                continue;
            };
            let mut layer = GrayImage::new(mask.width(), mask.height());
            draw_polygon_mut(&mut layer, &polygon, ON);
            for (dst, src) in mask.image.pixels_mut().zip(layer.pixels()) {
                if src[0] > 0 {
                    dst[0] = if dst[0] > 0 { 0 } else { 255 };
                }
            }
        }
        mask
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn get(&self, x: u32, y: u32) -> bool {
        x < self.width() && y < self.height() && self.image.get_pixel(x, y)[0] > 0
    }

    pub fn set(&mut self, x: u32, y: u32) {
        if x < self.width() && y < self.height() {
            self.image.put_pixel(x, y, ON);
        }
    }

    pub fn count(&self) -> usize {
        self.image.pixels().filter(|p| p[0] > 0).count()
    }

    pub fn is_empty(&self) -> bool {
        self.image.pixels().all(|p| p[0] == 0)
    }

    pub fn stamp_circle(&mut self, center: Point, radius: u32) {
        draw_filled_circle_mut(
            &mut self.image,
            (center.x.round() as i32, center.y.round() as i32),
            radius as i32,
            ON,
        );
    }

    /// Stamp circles along a polyline, densely enough to leave no gaps.
    pub fn stamp_stroke(&mut self, stroke: &[Point], radius: u32) {
        let step = (radius as f32 / 2.0).max(1.0);
        let mut previous: Option<Point> = None;
        for point in stroke {
            if let Some(from) = previous {
                let distance = from.distance_to(point);
                let steps = (distance / step).ceil() as usize;
                for i in 1..steps {
                    let t = i as f32 / steps as f32;
                    self.stamp_circle(
                        Point::new(from.x + (point.x - from.x) * t, from.y + (point.y - from.y) * t),
                        radius,
                    );
                }
            }
            self.stamp_circle(*point, radius);
            previous = Some(*point);
        }
    }

    pub fn union(&mut self, other: &Mask) {
        for (dst, src) in self.image.pixels_mut().zip(other.image.pixels()) {
            if src[0] > 0 {
                *dst = ON;
            }
        }
    }

    pub fn subtract(&mut self, other: &Mask) {
        for (dst, src) in self.image.pixels_mut().zip(other.image.pixels()) {
            if src[0] > 0 {
                *dst = OFF;
            }
        }
    }

    /// Trace the mask back into rings, outer borders and hole borders alike,
    /// simplified with `tolerance`. Degenerate rings are dropped.
    pub fn to_rings(&self, tolerance: f32) -> Vec<Vec<Point>> {
        find_contours::<i32>(&self.image)
            .into_iter()
            .filter_map(|contour| {
                let ring: Vec<Point> = contour
                    .points
                    .iter()
                    .map(|p| Point::new(p.x as f32, p.y as f32))
                    .collect();
                let ring = simplify_ring(&ring, tolerance);
                (ring.len() >= 3).then_some(ring)
            })
            .collect()
    }
}

/// Integer polygon for `imageproc`, without a closing duplicate point.
fn pixel_polygon(ring: &[Point]) -> Option<Vec<PixelPoint<i32>>> {
    let mut polygon: Vec<PixelPoint<i32>> = Vec::with_capacity(ring.len());
    for point in ring {
        let pixel = PixelPoint::new(point.x.round() as i32, point.y.round() as i32);
        if polygon.last() != Some(&pixel) {
            polygon.push(pixel);
        }
    }
    while polygon.len() > 1 && polygon.first() == polygon.last() {
        polygon.pop();
    }
    (polygon.len() >= 3).then_some(polygon)
}
