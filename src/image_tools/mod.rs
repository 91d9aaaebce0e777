//! Image polygon tools: pen, brush, eraser, magic wand and select.
//!
//! Exactly one tool is active at a time. Switching tools runs the old tool's
//! deactivate step (discarding any unfinished stroke) before the new one is
//! activated. All tools work on the owned [`Scene`]; every change is reported
//! as a [`SceneChange`] so the engine can mirror it into the annotation list.
//!
//! Coordinates are document space, which for image pages is the image's pixel
//! grid.

mod mask;
mod scene;
mod simplify;
mod wand;

use docanno_geometry::Point;
use image::RgbaImage;
use serde::{Deserialize, Serialize};

pub use mask::Mask;
pub use scene::{PolygonShape, Scene};
pub(crate) use scene::ring_contains;
pub use simplify::{simplify_polyline, simplify_ring};
pub use wand::flood_fill;

use crate::model::{Annotation, AnnotationId};

/// Simplification applied to brush and eraser results (pixels).
const STROKE_TOLERANCE: f32 = 1.0;

/// Minimum spacing between recorded pen points (pixels).
const PEN_POINT_SPACING: f32 = 1.0;

/// Which tool is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolKind {
    #[default]
    Select,
    Pen,
    Brush,
    Eraser,
    Wand,
}

impl ToolKind {
    pub fn name(&self) -> &'static str {
        match self {
            ToolKind::Select => "Select",
            ToolKind::Pen => "Pen",
            ToolKind::Brush => "Brush",
            ToolKind::Eraser => "Eraser",
            ToolKind::Wand => "Wand",
        }
    }

    pub fn all() -> &'static [ToolKind] {
        &[
            ToolKind::Select,
            ToolKind::Pen,
            ToolKind::Brush,
            ToolKind::Eraser,
            ToolKind::Wand,
        ]
    }
}

/// The active tool together with its in-progress state.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ActiveTool {
    #[default]
    Select,
    Pen { points: Vec<Point> },
    Brush { stroke: Vec<Point> },
    Eraser { stroke: Vec<Point> },
    Wand,
}

impl ActiveTool {
    fn activate(kind: ToolKind) -> Self {
        match kind {
            ToolKind::Select => ActiveTool::Select,
            ToolKind::Pen => ActiveTool::Pen { points: Vec::new() },
            ToolKind::Brush => ActiveTool::Brush { stroke: Vec::new() },
            ToolKind::Eraser => ActiveTool::Eraser { stroke: Vec::new() },
            ToolKind::Wand => ActiveTool::Wand,
        }
    }

    pub fn kind(&self) -> ToolKind {
        match self {
            ActiveTool::Select => ToolKind::Select,
            ActiveTool::Pen { .. } => ToolKind::Pen,
            ActiveTool::Brush { .. } => ToolKind::Brush,
            ActiveTool::Eraser { .. } => ToolKind::Eraser,
            ActiveTool::Wand => ToolKind::Wand,
        }
    }

    /// Points of the unfinished pen path or stroke.
    pub fn pending(&self) -> &[Point] {
        match self {
            ActiveTool::Pen { points } => points,
            ActiveTool::Brush { stroke } | ActiveTool::Eraser { stroke } => stroke,
            ActiveTool::Select | ActiveTool::Wand => &[],
        }
    }

    fn pending_mut(&mut self) -> Option<&mut Vec<Point>> {
        match self {
            ActiveTool::Pen { points } => Some(points),
            ActiveTool::Brush { stroke } | ActiveTool::Eraser { stroke } => Some(stroke),
            ActiveTool::Select | ActiveTool::Wand => None,
        }
    }
}

/// A change the tools made to the scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneChange {
    Created(AnnotationId),
    Updated(AnnotationId),
    Removed(AnnotationId),
}

/// Tool parameters, taken from the engine configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToolSettings {
    pub brush_radius: u32,
    pub wand_threshold: u8,
    pub wand_deviation: f32,
}

/// The image tool state of one page.
#[derive(Debug, Clone)]
pub struct ImageTools {
    tool: ActiveTool,
    scene: Scene,
    image: Option<RgbaImage>,
    page_size: Option<(u32, u32)>,
    settings: ToolSettings,
}

impl ImageTools {
    pub fn new(settings: ToolSettings) -> Self {
        Self {
            tool: ActiveTool::default(),
            scene: Scene::new(),
            image: None,
            page_size: None,
            settings,
        }
    }

    pub fn set_image(&mut self, image: RgbaImage) {
        self.page_size = Some((image.width(), image.height()));
        self.image = Some(image);
    }

    pub fn set_page_size(&mut self, width: u32, height: u32) {
        if self.image.is_none() {
            self.page_size = Some((width, height));
        }
    }

    pub fn image(&self) -> Option<&RgbaImage> {
        self.image.as_ref()
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn tool(&self) -> &ActiveTool {
        &self.tool
    }

    /// Mirror the polygon annotations of the page into the scene.
    pub fn load<'a>(&mut self, annotations: impl IntoIterator<Item = &'a Annotation>) {
        self.scene.load(annotations);
    }

    /// Switch tools: deactivate the current one, then activate `kind`.
    pub fn activate(&mut self, kind: ToolKind) {
        let previous = self.tool.kind();
        self.deactivate();
        self.tool = ActiveTool::activate(kind);
        log::debug!("🛠️ Tool switched: {} -> {}", previous.name(), kind.name());
    }

    fn deactivate(&mut self) {
        let pending = self.tool.pending().len();
        if pending > 0 {
            log::debug!(
                "{} deactivated, discarding {} pending points",
                self.tool.kind().name(),
                pending
            );
        }
        self.tool = ActiveTool::Select;
    }

    /// Abandon the current stroke or path without committing it.
    pub fn cancel(&mut self) {
        if let Some(points) = self.tool.pending_mut() {
            points.clear();
        }
    }

    // ------------------------------------------------------------------------
    // Pointer input (document space)
    // ------------------------------------------------------------------------

    pub fn pointer_down(&mut self, point: Point) {
        if let Some(points) = self.tool.pending_mut() {
            points.clear();
            points.push(point);
        }
    }

    pub fn pointer_move(&mut self, point: Point) {
        let spacing = match self.tool {
            ActiveTool::Pen { .. } => PEN_POINT_SPACING,
            _ => 0.0,
        };
        if let Some(points) = self.tool.pending_mut() {
            let far_enough = points
                .last()
                .is_none_or(|last| last.distance_to(&point) > spacing);
            if far_enough {
                points.push(point);
            }
        }
    }

    /// Finish the gesture. `additive` toggles instead of replacing the
    /// selection for the select tool.
    pub fn pointer_up<F>(&mut self, point: Point, additive: bool, next_id: &mut F) -> Vec<SceneChange>
    where
        F: FnMut() -> AnnotationId,
    {
        self.pointer_move(point);
        match &mut self.tool {
            ActiveTool::Select => {
                self.select_at(&point, additive);
                Vec::new()
            }
            ActiveTool::Pen { points } => {
                let path = std::mem::take(points);
                self.finish_pen(path, next_id)
            }
            ActiveTool::Brush { stroke } => {
                let stroke = std::mem::take(stroke);
                self.finish_brush(&stroke, next_id)
            }
            ActiveTool::Eraser { stroke } => {
                let stroke = std::mem::take(stroke);
                self.finish_eraser(&stroke)
            }
            ActiveTool::Wand => self.wand_at(point, next_id),
        }
    }

    // ------------------------------------------------------------------------
    // Keyboard
    // ------------------------------------------------------------------------

    pub fn clear_selection(&mut self) {
        self.cancel();
        self.scene.clear_selection();
        log::debug!("Selection cleared");
    }

    /// Remove every selected shape; one change per removed id.
    pub fn delete_selected(&mut self) -> Vec<SceneChange> {
        let ids: Vec<AnnotationId> = self.scene.selection().iter().copied().collect();
        ids.into_iter()
            .filter_map(|id| self.scene.remove(id).map(|_| SceneChange::Removed(id)))
            .collect()
    }

    // ------------------------------------------------------------------------
    // Tool implementations
    // ------------------------------------------------------------------------

    fn select_at(&mut self, point: &Point, additive: bool) {
        match (self.scene.shape_at(point), additive) {
            (Some(id), true) => self.scene.toggle(id),
            (Some(id), false) => self.scene.select_only(id),
            (None, false) => self.scene.clear_selection(),
            (None, true) => {}
        }
    }

    fn finish_pen<F>(&mut self, mut path: Vec<Point>, next_id: &mut F) -> Vec<SceneChange>
    where
        F: FnMut() -> AnnotationId,
    {
        path.dedup();
        if path.len() < 3 {
            log::debug!("Pen path with {} points discarded", path.len());
            return Vec::new();
        }
        let id = next_id();
        self.scene.insert(PolygonShape::new(id, vec![path]));
        self.scene.select_only(id);
        log::info!("✏️ Pen created polygon {}", id);
        vec![SceneChange::Created(id)]
    }

    fn finish_brush<F>(&mut self, stroke: &[Point], next_id: &mut F) -> Vec<SceneChange>
    where
        F: FnMut() -> AnnotationId,
    {
        if stroke.is_empty() {
            return Vec::new();
        }
        let (width, height) = self.canvas_size(stroke);
        let mut mask = Mask::new(width, height);
        mask.stamp_stroke(stroke, self.settings.brush_radius);

        if let Some(id) = self.scene.single_selected() {
            let Some(shape) = self.scene.get_mut(id) else {
                return Vec::new();
            };
            let mut combined = Mask::from_rings(width, height, &shape.rings);
            combined.union(&mask);
            shape.rings = combined.to_rings(STROKE_TOLERANCE);
            log::info!("🖌️ Brush extended polygon {}", id);
            return vec![SceneChange::Updated(id)];
        }

        let rings = mask.to_rings(STROKE_TOLERANCE);
        if rings.is_empty() {
            return Vec::new();
        }
        let id = next_id();
        self.scene.insert(PolygonShape::new(id, rings));
        self.scene.select_only(id);
        log::info!("🖌️ Brush created polygon {}", id);
        vec![SceneChange::Created(id)]
    }

    /// Erase from the first selected shape only.
    fn finish_eraser(&mut self, stroke: &[Point]) -> Vec<SceneChange> {
        let Some(id) = self.scene.first_selected() else {
            log::debug!("Eraser stroke with nothing selected");
            return Vec::new();
        };
        if stroke.is_empty() {
            return Vec::new();
        }
        let (width, height) = self.canvas_size(stroke);
        let Some(shape) = self.scene.get_mut(id) else {
            return Vec::new();
        };

        let mut stroke_mask = Mask::new(width, height);
        stroke_mask.stamp_stroke(stroke, self.settings.brush_radius);
        let mut remaining = Mask::from_rings(width, height, &shape.rings);
        remaining.subtract(&stroke_mask);

        let rings = if remaining.is_empty() {
            Vec::new()
        } else {
            remaining.to_rings(STROKE_TOLERANCE)
        };
        if rings.is_empty() {
            self.scene.remove(id);
            log::info!("🧽 Eraser removed polygon {}", id);
            return vec![SceneChange::Removed(id)];
        }
        shape.rings = rings;
        log::info!("🧽 Eraser trimmed polygon {}", id);
        vec![SceneChange::Updated(id)]
    }

    fn wand_at<F>(&mut self, point: Point, next_id: &mut F) -> Vec<SceneChange>
    where
        F: FnMut() -> AnnotationId,
    {
        let Some(image) = self.image.as_ref() else {
            log::warn!("Wand used without a page image");
            return Vec::new();
        };
        let Some(mask) = flood_fill(image, point, self.settings.wand_threshold) else {
            return Vec::new();
        };
        let rings = mask.to_rings(self.settings.wand_deviation);
        if rings.is_empty() {
            return Vec::new();
        }
        let id = next_id();
        self.scene.insert(PolygonShape::new(id, rings));
        self.scene.select_only(id);
        log::info!("🪄 Wand created polygon {}", id);
        vec![SceneChange::Created(id)]
    }

    /// Mask size: the page, or failing that, whatever covers the scene and
    /// the stroke.
    fn canvas_size(&self, stroke: &[Point]) -> (u32, u32) {
        if let Some(size) = self.page_size {
            return size;
        }
        let margin = self.settings.brush_radius as f32 + 2.0;
        let (mut width, mut height) = (1.0_f32, 1.0_f32);
        for p in stroke.iter().chain(self.scene.shapes().flat_map(|s| s.rings.iter().flatten())) {
            width = width.max(p.x + margin);
            height = height.max(p.y + margin);
        }
        (width.ceil() as u32, height.ceil() as u32)
    }
}
