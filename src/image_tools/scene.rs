//! Owned scene of polygon shapes with a separate selection set.

use std::collections::{BTreeMap, BTreeSet};

use docanno_geometry::{Bound, Point, points_bound};

use crate::model::{Annotation, AnnotationId, BoundType};

/// A polygon made of one or more rings, filled with the even-odd rule.
#[derive(Debug, Clone, PartialEq)]
pub struct PolygonShape {
    pub id: AnnotationId,
    pub rings: Vec<Vec<Point>>,
}

impl PolygonShape {
    pub fn new(id: AnnotationId, rings: Vec<Vec<Point>>) -> Self {
        Self { id, rings }
    }

    /// Read COCO-style flat segments (`[x0, y0, x1, y1, ...]`).
    pub fn from_segments(id: AnnotationId, segments: &[Vec<f32>]) -> Self {
        let rings = segments
            .iter()
            .map(|segment| {
                segment
                    .chunks_exact(2)
                    .map(|xy| Point::new(xy[0], xy[1]))
                    .collect::<Vec<Point>>()
            })
            .filter(|ring| ring.len() >= 3)
            .collect();
        Self { id, rings }
    }

    pub fn to_segments(&self) -> Vec<Vec<f32>> {
        self.rings
            .iter()
            .map(|ring| ring.iter().flat_map(|p| [p.x, p.y]).collect())
            .collect()
    }

    pub fn bound(&self) -> Option<Bound> {
        let points: Vec<Point> = self.rings.iter().flatten().copied().collect();
        points_bound(&points)
    }

    pub fn is_empty(&self) -> bool {
        self.rings.is_empty()
    }

    /// Even-odd point-in-polygon over all rings.
    pub fn contains(&self, point: &Point) -> bool {
        let crossings = self
            .rings
            .iter()
            .filter(|ring| ring_contains(ring, point))
            .count();
        crossings % 2 == 1
    }

    /// The stored annotation form of this shape.
    pub fn to_annotation(&self) -> Option<Annotation> {
        let mut annotation = Annotation::new(self.id, BoundType::Polygon, self.bound()?);
        annotation.segments = self.to_segments();
        Some(annotation)
    }
}

/// Crossing test of `point` against a single closed ring.
pub(crate) fn ring_contains(ring: &[Point], point: &Point) -> bool {
    let mut inside = false;
    let mut j = ring.len().wrapping_sub(1);
    for i in 0..ring.len() {
        let (a, b) = (ring[i], ring[j]);
        if (a.y > point.y) != (b.y > point.y)
            && point.x < (b.x - a.x) * (point.y - a.y) / (b.y - a.y) + a.x
        {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Polygon shapes keyed by annotation id, plus which of them are selected.
#[derive(Debug, Clone, Default)]
pub struct Scene {
    shapes: BTreeMap<AnnotationId, PolygonShape>,
    selection: BTreeSet<AnnotationId>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild the scene from the polygon annotations of a page, keeping the
    /// selection of shapes that still exist.
    pub fn load<'a>(&mut self, annotations: impl IntoIterator<Item = &'a Annotation>) {
        self.shapes = annotations
            .into_iter()
            .filter(|a| a.bound_type == BoundType::Polygon)
            .map(|a| (a.id, PolygonShape::from_segments(a.id, &a.segments)))
            .collect();
        let shapes = &self.shapes;
        self.selection.retain(|id| shapes.contains_key(id));
    }

    pub fn insert(&mut self, shape: PolygonShape) {
        self.shapes.insert(shape.id, shape);
    }

    pub fn remove(&mut self, id: AnnotationId) -> Option<PolygonShape> {
        self.selection.remove(&id);
        self.shapes.remove(&id)
    }

    pub fn get(&self, id: AnnotationId) -> Option<&PolygonShape> {
        self.shapes.get(&id)
    }

    pub fn get_mut(&mut self, id: AnnotationId) -> Option<&mut PolygonShape> {
        self.shapes.get_mut(&id)
    }

    pub fn shapes(&self) -> impl Iterator<Item = &PolygonShape> {
        self.shapes.values()
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    /// Topmost (most recently created) shape containing `point`.
    pub fn shape_at(&self, point: &Point) -> Option<AnnotationId> {
        self.shapes
            .values()
            .rev()
            .find(|s| s.contains(point))
            .map(|s| s.id)
    }

    // ------------------------------------------------------------------------
    // Selection
    // ------------------------------------------------------------------------

    pub fn selection(&self) -> &BTreeSet<AnnotationId> {
        &self.selection
    }

    pub fn is_selected(&self, id: AnnotationId) -> bool {
        self.selection.contains(&id)
    }

    /// The single selected shape, if exactly one is selected.
    pub fn single_selected(&self) -> Option<AnnotationId> {
        match self.selection.len() {
            1 => self.selection.first().copied(),
            _ => None,
        }
    }

    /// The selected shape with the lowest id.
    pub fn first_selected(&self) -> Option<AnnotationId> {
        self.selection.first().copied()
    }

    pub fn select_only(&mut self, id: AnnotationId) {
        self.selection.clear();
        if self.shapes.contains_key(&id) {
            self.selection.insert(id);
        }
    }

    pub fn toggle(&mut self, id: AnnotationId) {
        if !self.selection.remove(&id) && self.shapes.contains_key(&id) {
            self.selection.insert(id);
        }
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(id: AnnotationId, x: f32, size: f32) -> PolygonShape {
        PolygonShape::new(
            id,
            vec![vec![
                Point::new(x, 0.0),
                Point::new(x + size, 0.0),
                Point::new(x + size, size),
                Point::new(x, size),
            ]],
        )
    }

    #[test]
    fn test_segments_roundtrip_and_bound() {
        let shape = PolygonShape::from_segments(3, &[vec![0.0, 0.0, 10.0, 0.0, 10.0, 5.0]]);
        assert_eq!(shape.rings[0].len(), 3);
        assert_eq!(shape.to_segments(), vec![vec![0.0, 0.0, 10.0, 0.0, 10.0, 5.0]]);
        assert_eq!(shape.bound(), Some(Bound::new(0.0, 0.0, 10.0, 5.0)));

        let annotation = shape.to_annotation().unwrap();
        assert_eq!(annotation.bound_type, BoundType::Polygon);
        assert_eq!(annotation.segments.len(), 1);
    }

    #[test]
    fn test_even_odd_containment() {
        let mut shape = square(1, 0.0, 30.0);
        shape.rings.push(square(1, 10.0, 10.0).rings[0].clone());
        assert!(shape.contains(&Point::new(5.0, 5.0)));
        // Inside the inner ring, which is a hole
        assert!(!shape.contains(&Point::new(15.0, 5.0)));
        assert!(!shape.contains(&Point::new(40.0, 5.0)));
    }

    #[test]
    fn test_selection_is_separate() {
        let mut scene = Scene::new();
        scene.insert(square(1, 0.0, 10.0));
        scene.insert(square(2, 5.0, 10.0));

        assert_eq!(scene.shape_at(&Point::new(7.0, 5.0)), Some(2));
        scene.select_only(1);
        scene.toggle(2);
        assert_eq!(scene.first_selected(), Some(1));
        assert_eq!(scene.single_selected(), None);
        scene.toggle(1);
        assert_eq!(scene.single_selected(), Some(2));

        scene.remove(2);
        assert!(scene.selection().is_empty());
        scene.select_only(99);
        assert!(scene.selection().is_empty());
    }

    #[test]
    fn test_load_keeps_live_selection() {
        let mut scene = Scene::new();
        let a = square(1, 0.0, 10.0).to_annotation().unwrap();
        let b = square(2, 20.0, 10.0).to_annotation().unwrap();
        scene.load([&a, &b]);
        scene.select_only(1);
        scene.toggle(2);

        scene.load([&a]);
        assert_eq!(scene.len(), 1);
        assert_eq!(scene.selection().iter().copied().collect::<Vec<_>>(), vec![1]);
    }
}
