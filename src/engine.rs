//! The annotation engine: pointer and keyboard input in, annotation events out.
//!
//! [`AnnotationEngine`] owns the annotation list of one page together with
//! every piece of transient interaction state (gesture, resize/move sessions,
//! table gutters and cell selection, image tools, undo history). Hosts feed it
//! container-local pointer input and drain [`AnnotationEvent`]s after each
//! call.

use docanno_geometry::{Bound, Point, Rect};
use image::RgbaImage;

use crate::config::EngineConfig;
use crate::creation::build_annotation;
use crate::edit::{MoveSession, ResizeSession, reshape};
use crate::events::AnnotationEvent;
use crate::export::{CocoDataset, export_page};
use crate::gesture::{GestureEvent, GestureTracker};
use crate::hit_test::hit_test;
use crate::image_tools::{ImageTools, SceneChange, ToolKind, ToolSettings};
use crate::interaction::{InteractionContext, InteractionTarget, resolve_target};
use crate::keybindings::{EditorAction, KeyChord};
use crate::links::build_links;
use crate::model::{
    Annotation, AnnotationId, AnnotationPatch, AnnotationStore, BoundType, PageView,
};
use crate::table::{CellSelection, GutterId, TableEditor, initialize};
use crate::undo::{Command, UndoStack, redo_command, undo_command};

// ============================================================================
// Preview
// ============================================================================

/// What the host should draw for the interaction in progress.
///
/// Rects and bounds are screen space; gutter positions and pending tool
/// points are document space.
#[derive(Debug, Clone, PartialEq)]
pub enum Preview {
    Idle,
    /// Rubber band of a creation, link or cell-selection drag.
    Selection(Rect),
    Resize {
        annotation_id: AnnotationId,
        rect: Rect,
    },
    Move {
        annotation_id: AnnotationId,
        bound: Bound,
    },
    Gutter {
        table_id: AnnotationId,
        gutter_id: GutterId,
        position: f32,
    },
    /// Unfinished pen path or brush/eraser stroke.
    Path(Vec<Point>),
}

// ============================================================================
// Engine
// ============================================================================

pub struct AnnotationEngine {
    config: EngineConfig,
    /// Page metadata; its annotation list lives in `store`.
    page: PageView,
    store: AnnotationStore,
    mode: BoundType,
    category: Option<String>,
    selected: Option<AnnotationId>,
    /// Shift held: the select tool toggles instead of replacing.
    additive: bool,

    gesture: GestureTracker,
    /// Owner of the current press, resolved once on pointer-down.
    target: InteractionTarget,
    press: Point,
    resize: Option<ResizeSession>,
    moving: Option<MoveSession>,

    tables: TableEditor,
    image_tools: ImageTools,
    history: UndoStack,
    events: Vec<AnnotationEvent>,
}

impl AnnotationEngine {
    /// Take ownership of a page's annotations.
    pub fn from_page(mut page: PageView, config: EngineConfig) -> Self {
        let store = AnnotationStore::from_annotations(std::mem::take(&mut page.annotations));

        let mut tables = TableEditor::new(config.draggable_gutter_width, config.visible_gutter_width);
        tables.refresh_all(store.iter());

        let mut image_tools = ImageTools::new(ToolSettings {
            brush_radius: config.brush_radius,
            wand_threshold: config.wand_threshold,
            wand_deviation: config.wand_deviation,
        });
        if let Some(size) = page.size {
            image_tools.set_page_size(size.width, size.height);
        }
        image_tools.load(store.iter());

        log::info!(
            "🚀 Engine ready for page {}: {} annotations, {} tokens",
            page.page_num,
            store.len(),
            page.tokens.len()
        );

        Self {
            gesture: GestureTracker::new(config.click_distance),
            history: UndoStack::with_max_history(config.max_history),
            config,
            page,
            store,
            mode: BoundType::default(),
            category: None,
            selected: None,
            additive: false,
            target: InteractionTarget::Canvas,
            press: Point::ZERO,
            resize: None,
            moving: None,
            tables,
            image_tools,
            events: Vec::new(),
        }
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn page(&self) -> &PageView {
        &self.page
    }

    pub fn annotations(&self) -> &[Annotation] {
        self.store.as_slice()
    }

    pub fn annotation(&self, id: AnnotationId) -> Option<&Annotation> {
        self.store.get(id)
    }

    pub fn mode(&self) -> BoundType {
        self.mode
    }

    pub fn selected(&self) -> Option<AnnotationId> {
        self.selected
    }

    pub fn tables(&self) -> &TableEditor {
        &self.tables
    }

    pub fn image_tools(&self) -> &ImageTools {
        &self.image_tools
    }

    pub fn history(&self) -> &UndoStack {
        &self.history
    }

    pub fn cell_selection(&self) -> Option<&CellSelection> {
        self.tables.selection()
    }

    /// Hand over every event emitted since the last call.
    pub fn drain_events(&mut self) -> Vec<AnnotationEvent> {
        std::mem::take(&mut self.events)
    }

    // ------------------------------------------------------------------------
    // View state
    // ------------------------------------------------------------------------

    /// Switch the creation mode. Any gesture in progress is dropped.
    pub fn set_mode(&mut self, mode: BoundType) {
        if mode == self.mode {
            return;
        }
        self.cancel_interaction();
        if self.mode == BoundType::Polygon {
            self.image_tools.cancel();
        }
        if mode != BoundType::TableCell {
            self.tables.clear_selection();
        }
        log::debug!("✏️ Mode: {} -> {}", self.mode.name(), mode.name());
        self.mode = mode;
    }

    /// Category stamped onto newly created annotations.
    pub fn set_category(&mut self, category: Option<String>) {
        self.category = category;
    }

    pub fn set_scale(&mut self, scale: f32) {
        if scale <= 0.0 {
            log::warn!("Ignoring non-positive scale {}", scale);
            return;
        }
        self.page.scale = scale;
    }

    /// Client-space offset of the page container.
    pub fn set_origin(&mut self, origin: Point) {
        self.gesture.set_origin(origin);
    }

    pub fn set_modifiers(&mut self, additive: bool) {
        self.additive = additive;
    }

    pub fn set_image(&mut self, image: RgbaImage) {
        log::debug!("Page image set: {}x{}", image.width(), image.height());
        self.image_tools.set_image(image);
    }

    pub fn activate_tool(&mut self, kind: ToolKind) {
        self.image_tools.activate(kind);
    }

    // ------------------------------------------------------------------------
    // Pointer input
    // ------------------------------------------------------------------------

    pub fn pointer_down(&mut self, client: Point) {
        self.cancel_sessions();
        let local = self.gesture.pointer_down(client);
        self.press = local;
        let scale = self.page.scale;

        if self.mode == BoundType::Polygon {
            self.target = InteractionTarget::Canvas;
            self.image_tools.pointer_down(local.down_scaled(scale));
            return;
        }

        let ctx = InteractionContext {
            annotations: self.store.as_slice(),
            selected: self.selected,
            tables: &self.tables,
            scale,
            resize_handle_size: self.config.resize_handle_size,
            label_height: self.config.label_height,
        };
        self.target = resolve_target(&ctx, local);
        log::debug!("Pointer down on {:?}", self.target);

        match self.target {
            InteractionTarget::Gutter {
                table_id,
                gutter_id,
            } => {
                self.tables.begin_drag(table_id, gutter_id);
            }
            InteractionTarget::ResizeHandle {
                annotation_id,
                corner,
            } => {
                self.resize = self
                    .store
                    .get(annotation_id)
                    .map(|a| ResizeSession::begin(annotation_id, &a.bound, corner, scale));
            }
            InteractionTarget::Label { annotation_id } => {
                self.moving = self
                    .store
                    .get(annotation_id)
                    .filter(|a| a.bound_type.is_resizable())
                    .map(|a| MoveSession::begin(annotation_id, &a.bound, local, scale));
            }
            InteractionTarget::Canvas => {}
        }
    }

    pub fn pointer_move(&mut self, client: Point) {
        let event = self.gesture.pointer_move(client);
        let local = self.gesture.to_local(client);
        let scale = self.page.scale;

        if self.mode == BoundType::Polygon {
            if self.gesture.is_active() {
                self.image_tools.pointer_move(local.down_scaled(scale));
            }
            return;
        }

        // Nothing moves until the press has become a drag
        if event.is_none() {
            return;
        }
        log::trace!("Pointer move to ({:.1}, {:.1})", local.x, local.y);

        match self.target {
            InteractionTarget::Gutter { .. } => {
                let (dx, dy) = local.delta_from(&self.press);
                self.tables.track_drag(dx / scale, dy / scale);
            }
            InteractionTarget::ResizeHandle { .. } => {
                if let Some(session) = self.resize.as_mut() {
                    session.track(local);
                }
            }
            InteractionTarget::Label { .. } => {
                if let Some(session) = self.moving.as_mut() {
                    session.track(local);
                }
            }
            InteractionTarget::Canvas => {}
        }
    }

    pub fn pointer_up(&mut self, client: Point) {
        let event = self.gesture.pointer_up(client);
        let local = self.gesture.to_local(client);
        let target = std::mem::replace(&mut self.target, InteractionTarget::Canvas);

        if self.mode == BoundType::Polygon {
            if event.is_some() {
                self.finish_tool(local.down_scaled(self.page.scale));
            }
            return;
        }

        let Some(event) = event else {
            return;
        };

        match target {
            InteractionTarget::Gutter { table_id, .. } => self.finish_gutter(table_id, event),
            InteractionTarget::ResizeHandle { annotation_id, .. } => {
                if let (Some(mut session), GestureEvent::DragEnd { end, .. }) =
                    (self.resize.take(), event)
                {
                    session.track(end);
                    self.commit_bound(annotation_id, session.commit());
                }
            }
            InteractionTarget::Label { annotation_id } => {
                let session = self.moving.take();
                match (session, event) {
                    (Some(mut session), GestureEvent::DragEnd { end, .. }) => {
                        session.track(end);
                        self.commit_bound(annotation_id, session.commit());
                    }
                    _ => self.select(annotation_id),
                }
            }
            InteractionTarget::Canvas => match event {
                GestureEvent::Click(point) => self.click(point),
                GestureEvent::DragEnd { start, end } => self.finish_drag(start, end),
                GestureEvent::DragStart { .. } | GestureEvent::DragMove { .. } => {}
            },
        }
    }

    /// Right-click at a client-space point.
    pub fn context_menu(&mut self, client: Point) {
        let local = self.gesture.to_local(client);
        let annotation_id = hit_test(self.store.as_slice(), &local.down_scaled(self.page.scale));
        self.emit(AnnotationEvent::ContextMenu {
            annotation_id,
            position: local,
        });
    }

    /// What to draw for the current interaction.
    pub fn preview(&self) -> Preview {
        if let Some(session) = &self.resize {
            return Preview::Resize {
                annotation_id: session.annotation_id,
                rect: session.preview(),
            };
        }
        if let Some(session) = &self.moving {
            return Preview::Move {
                annotation_id: session.annotation_id,
                bound: session.preview(),
            };
        }
        if let Some((table_id, drag)) = self.tables.drag() {
            return Preview::Gutter {
                table_id,
                gutter_id: drag.gutter_id,
                position: drag.position(),
            };
        }
        let pending = self.image_tools.tool().pending();
        if self.mode == BoundType::Polygon && !pending.is_empty() {
            return Preview::Path(pending.to_vec());
        }
        match self.gesture.selection_points().as_slice() {
            [start, current] if self.gesture.is_dragging() => {
                Preview::Selection(Rect::from_points(*start, *current))
            }
            _ => Preview::Idle,
        }
    }

    // ------------------------------------------------------------------------
    // Keyboard
    // ------------------------------------------------------------------------

    /// Handle a key chord; returns the action it was bound to.
    pub fn key_down(&mut self, chord: KeyChord) -> Option<EditorAction> {
        let action = self.config.keybindings.action_for(chord)?;
        log::debug!("⌨️ {}", action.name());
        match action {
            EditorAction::Copy => {
                let selected = self.selected_ids();
                self.emit(AnnotationEvent::CopyPressed { selected });
            }
            EditorAction::Cut => {
                let selected = self.selected_ids();
                self.emit(AnnotationEvent::CutPressed { selected });
            }
            EditorAction::Paste => self.emit(AnnotationEvent::PastePressed),
            EditorAction::Undo => self.emit(AnnotationEvent::UndoPressed),
            EditorAction::Redo => self.emit(AnnotationEvent::RedoPressed),
            EditorAction::Delete => self.delete_selected(),
            EditorAction::Escape => {
                self.cancel_interaction();
                self.image_tools.clear_selection();
                self.tables.clear_selection();
                self.selected = None;
            }
        }
        Some(action)
    }

    /// Ids the copy/cut events refer to: the polygon selection in polygon
    /// mode, otherwise the selected annotation.
    fn selected_ids(&self) -> Vec<AnnotationId> {
        if self.mode == BoundType::Polygon {
            return self.image_tools.scene().selection().iter().copied().collect();
        }
        self.selected.into_iter().collect()
    }

    fn delete_selected(&mut self) {
        if self.mode == BoundType::Polygon {
            let changes = self.image_tools.delete_selected();
            self.apply_scene_changes(changes);
            return;
        }
        let Some(id) = self.selected.take() else {
            return;
        };
        let Some(annotation) = self.store.remove(id) else {
            log::warn!("Selected annotation {} no longer exists", id);
            return;
        };
        log::info!("🗑️ Deleted {} {}", annotation.bound_type.name(), id);
        self.history.push(Command::RemoveAnnotation { annotation });
        self.emit(AnnotationEvent::Deleted { id });
        self.sync_derived();
    }

    // ------------------------------------------------------------------------
    // Undo / redo
    // ------------------------------------------------------------------------

    pub fn undo(&mut self) {
        let events = undo_command(&mut self.history, &mut self.store);
        self.after_history(events);
    }

    pub fn redo(&mut self) {
        let events = redo_command(&mut self.history, &mut self.store);
        self.after_history(events);
    }

    fn after_history(&mut self, events: Vec<AnnotationEvent>) {
        if events.is_empty() {
            return;
        }
        self.cancel_interaction();
        self.tables.clear_selection();
        if self.selected.is_some_and(|id| self.store.get(id).is_none()) {
            self.selected = None;
        }
        self.sync_derived();
        for event in events {
            self.emit(event);
        }
    }

    // ------------------------------------------------------------------------
    // Table commands
    // ------------------------------------------------------------------------

    /// Lay out a table as `rows` x `cols`.
    pub fn initialize_table(&mut self, table_id: AnnotationId, rows: usize, cols: usize) -> bool {
        let Some(mut table) = self.table_snapshot(table_id) else {
            return false;
        };
        let before = table.clone();
        let store = &mut self.store;
        if !initialize(&mut table, rows, cols, &mut || store.allocate_id()) {
            return false;
        }
        self.commit_modify(before, table);
        true
    }

    pub fn can_merge(&self) -> bool {
        self.selected_table()
            .is_some_and(|table| self.tables.can_merge(table))
    }

    pub fn can_split(&self) -> bool {
        self.selected_table()
            .is_some_and(|table| self.tables.can_split(table))
    }

    /// Merge the selected cells. `None` if the selection cannot be merged.
    pub fn merge_cells(&mut self) -> Option<AnnotationId> {
        let table_id = self.tables.selection()?.table_id;
        let mut table = self.table_snapshot(table_id)?;
        let before = table.clone();
        let merged = self.tables.merge(&mut table)?;
        self.commit_modify(before, table);
        Some(merged)
    }

    /// Split the spanned cells of the selection; returns every resulting cell.
    pub fn split_cells(&mut self) -> Vec<AnnotationId> {
        let Some(table_id) = self.tables.selection().map(|s| s.table_id) else {
            return Vec::new();
        };
        let Some(mut table) = self.table_snapshot(table_id) else {
            return Vec::new();
        };
        let before = table.clone();
        let store = &mut self.store;
        let ids = self.tables.split(&mut table, &mut || store.allocate_id());
        if !ids.is_empty() {
            self.commit_modify(before, table);
        }
        ids
    }

    fn selected_table(&self) -> Option<&Annotation> {
        self.store.get(self.tables.selection()?.table_id)
    }

    fn table_snapshot(&self, table_id: AnnotationId) -> Option<Annotation> {
        let table = self
            .store
            .get(table_id)
            .filter(|a| a.bound_type == BoundType::Table);
        if table.is_none() {
            log::warn!("No table with id {}", table_id);
        }
        table.cloned()
    }

    // ------------------------------------------------------------------------
    // Export
    // ------------------------------------------------------------------------

    pub fn export_coco(&self) -> CocoDataset {
        export_page(&self.page, self.store.as_slice())
    }

    // ------------------------------------------------------------------------
    // Gesture completion
    // ------------------------------------------------------------------------

    fn click(&mut self, screen: Point) {
        let document = screen.down_scaled(self.page.scale);
        if self.mode == BoundType::TableCell && self.select_cells(document, document) {
            return;
        }
        match hit_test(self.store.as_slice(), &document) {
            Some(id) => self.select(id),
            None => {
                self.selected = None;
                self.tables.clear_selection();
                self.emit(AnnotationEvent::EmptyAreaClicked);
            }
        }
    }

    fn select(&mut self, id: AnnotationId) {
        self.selected = Some(id);
        self.emit(AnnotationEvent::Selected { id });
    }

    fn finish_drag(&mut self, start: Point, end: Point) {
        let scale = self.page.scale;
        match self.mode {
            BoundType::Chain | BoundType::AllToAll => {
                let rect = Rect::from_points(start.down_scaled(scale), end.down_scaled(scale));
                self.link(&rect);
            }
            BoundType::TableCell => {
                self.select_cells(start.down_scaled(scale), end.down_scaled(scale));
            }
            mode => {
                let Some(draft) = build_annotation(mode, start, end, scale, &self.page.tokens) else {
                    return;
                };
                let id = self.store.allocate_id();
                let annotation = draft.into_annotation(id, self.category.clone());
                log::info!("➕ Added {} {} at {:?}", mode.name(), id, annotation.bound);
                self.store.insert(annotation.clone());
                self.tables.refresh(&annotation);
                self.history.push(Command::AddAnnotation {
                    annotation: annotation.clone(),
                });
                self.selected = Some(id);
                self.emit(AnnotationEvent::Added { annotation });
            }
        }
    }

    /// Select cells of the table under `start`. Returns `false` if there is
    /// no table there.
    fn select_cells(&mut self, start: Point, end: Point) -> bool {
        let Some(table) = self
            .store
            .iter()
            .find(|a| a.bound_type == BoundType::Table && a.bound.contains(&start))
        else {
            return false;
        };
        self.tables.select(table, &start, &end);
        true
    }

    fn link(&mut self, rect: &Rect) {
        let patches = build_links(
            self.mode,
            rect,
            self.store.as_slice(),
            self.page.page_num,
            self.category.as_deref(),
        );
        let mut commands = Vec::with_capacity(patches.len());
        for patch in patches {
            let Some(annotation) = self.store.get_mut(patch.id) else {
                continue;
            };
            let before = annotation.clone();
            patch.apply(annotation);
            commands.push(Command::ModifyAnnotation {
                before,
                after: annotation.clone(),
            });
            self.emit(AnnotationEvent::Edited { patch });
        }
        if !commands.is_empty() {
            log::info!("🔗 Linked {} annotations", commands.len());
        }
        self.record(commands, "Link annotations");
    }

    fn finish_gutter(&mut self, table_id: AnnotationId, event: GestureEvent) {
        let GestureEvent::DragEnd { end, .. } = event else {
            self.tables.cancel_drag();
            return;
        };
        let Some(mut table) = self.table_snapshot(table_id) else {
            self.tables.cancel_drag();
            return;
        };
        // The release point wins over the last move
        let scale = self.page.scale;
        let (dx, dy) = end.delta_from(&self.press);
        self.tables.track_drag(dx / scale, dy / scale);
        let before = table.clone();
        if self.tables.commit_drag(&mut table) {
            log::debug!("Table {}: gutter drag committed", table_id);
            self.commit_modify(before, table);
        }
    }

    fn finish_tool(&mut self, point: Point) {
        let store = &mut self.store;
        let changes = self
            .image_tools
            .pointer_up(point, self.additive, &mut || store.allocate_id());
        self.apply_scene_changes(changes);
    }

    /// Mirror image tool changes into the annotation list.
    fn apply_scene_changes(&mut self, changes: Vec<SceneChange>) {
        let mut commands = Vec::with_capacity(changes.len());
        for change in changes {
            match change {
                SceneChange::Created(id) => {
                    let Some(mut annotation) =
                        self.image_tools.scene().get(id).and_then(|s| s.to_annotation())
                    else {
                        continue;
                    };
                    annotation.category = self.category.clone();
                    log::info!("➕ Added polygon {}", id);
                    self.store.insert(annotation.clone());
                    commands.push(Command::AddAnnotation {
                        annotation: annotation.clone(),
                    });
                    self.emit(AnnotationEvent::Added { annotation });
                }
                SceneChange::Updated(id) => {
                    let Some(shape) = self.image_tools.scene().get(id) else {
                        continue;
                    };
                    let (Some(bound), Some(annotation)) = (shape.bound(), self.store.get_mut(id))
                    else {
                        log::warn!("Polygon {} has no annotation to update", id);
                        continue;
                    };
                    let before = annotation.clone();
                    annotation.bound = bound;
                    annotation.segments = shape.to_segments();
                    let after = annotation.clone();
                    self.emit(AnnotationEvent::Edited {
                        patch: AnnotationPatch::polygon_state(&after),
                    });
                    commands.push(Command::ModifyAnnotation { before, after });
                }
                SceneChange::Removed(id) => {
                    if let Some(annotation) = self.store.remove(id) {
                        log::info!("🗑️ Deleted polygon {}", id);
                        commands.push(Command::RemoveAnnotation { annotation });
                        self.emit(AnnotationEvent::Deleted { id });
                    }
                }
            }
        }
        self.record(commands, "Polygon edit");
    }

    // ------------------------------------------------------------------------
    // Commit helpers
    // ------------------------------------------------------------------------

    fn commit_bound(&mut self, id: AnnotationId, bound: Bound) {
        let Some(mut annotation) = self.store.get(id).cloned() else {
            log::warn!("Annotation {} vanished during edit", id);
            return;
        };
        let before = annotation.clone();
        reshape(&mut annotation, bound);
        if annotation != before {
            self.commit_modify(before, annotation);
        }
    }

    /// Store `after`, record the edit and emit its patch.
    fn commit_modify(&mut self, before: Annotation, after: Annotation) {
        let Some(slot) = self.store.get_mut(after.id) else {
            log::warn!("Annotation {} vanished during edit", after.id);
            return;
        };
        *slot = after.clone();
        let patch = match after.bound_type {
            BoundType::Table => AnnotationPatch::table_state(&after),
            BoundType::Polygon => AnnotationPatch::polygon_state(&after),
            _ => AnnotationPatch::new(after.id).with_bound(after.bound),
        };
        log::info!("✏️ Edited {} {}", after.bound_type.name(), after.id);
        self.history.push(Command::ModifyAnnotation { before, after });
        self.emit(AnnotationEvent::Edited { patch });
        self.sync_derived();
    }

    fn record(&mut self, mut commands: Vec<Command>, description: &str) {
        if commands.len() > 1 {
            self.history.push(Command::Batch {
                description: description.to_string(),
                commands,
            });
        } else if let Some(command) = commands.pop() {
            self.history.push(command);
        }
    }

    /// Rebuild gutters and the polygon scene from the annotation list.
    fn sync_derived(&mut self) {
        self.tables.refresh_all(self.store.iter());
        self.image_tools.load(self.store.iter());
    }

    fn emit(&mut self, event: AnnotationEvent) {
        log::debug!("📤 {}", event.name());
        self.events.push(event);
    }

    fn cancel_sessions(&mut self) {
        self.resize = None;
        self.moving = None;
        self.tables.cancel_drag();
    }

    fn cancel_interaction(&mut self) {
        self.cancel_sessions();
        self.gesture.reset();
        self.target = InteractionTarget::Canvas;
    }
}
