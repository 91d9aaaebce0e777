//! End-to-end tests driving the engine through pointer and keyboard input.

use docanno::geometry::{Bound, Point};
use docanno::model::{AnnotationTable, CellData, PageToken};
use docanno::{
    Annotation, AnnotationEngine, AnnotationEvent, BoundType, EngineConfig, Key, KeyChord, PageView,
    ToolKind,
};
use image::{Rgba, RgbaImage};

fn engine_with(page: PageView) -> AnnotationEngine {
    AnnotationEngine::from_page(page, EngineConfig::default())
}

fn row_of_tokens(count: u32) -> Vec<PageToken> {
    (0..count)
        .map(|i| PageToken::new(i, format!("t{}", i), 10.0 + i as f32 * 30.0, 10.0, 20.0, 10.0))
        .collect()
}

fn drag(engine: &mut AnnotationEngine, from: (f32, f32), to: (f32, f32)) {
    engine.pointer_down(Point::new(from.0, from.1));
    engine.pointer_move(Point::new(to.0, to.1));
    engine.pointer_up(Point::new(to.0, to.1));
}

fn click(engine: &mut AnnotationEngine, at: (f32, f32)) {
    engine.pointer_down(Point::new(at.0, at.1));
    engine.pointer_up(Point::new(at.0, at.1));
}

fn added(events: &[AnnotationEvent]) -> Vec<&Annotation> {
    events
        .iter()
        .filter_map(|e| match e {
            AnnotationEvent::Added { annotation } => Some(annotation),
            _ => None,
        })
        .collect()
}

fn empty_table(id: u64, bound: Bound) -> Annotation {
    let mut table = Annotation::new(id, BoundType::Table, bound);
    table.table = Some(AnnotationTable::default());
    table
}

fn cell_at(table: &Annotation, row: usize, col: usize) -> &Annotation {
    table
        .table_cells
        .iter()
        .find(|c| c.data.is_some_and(|d| d.row == row && d.col == col))
        .unwrap()
}

// ============================================================================
// Selection and hit-testing
// ============================================================================

#[test]
fn test_smaller_overlapping_annotation_is_hit() {
    let page = PageView::new(1, 1.0).with_annotations(vec![
        Annotation::new(1, BoundType::FreeBox, Bound::new(0.0, 0.0, 10.0, 10.0)),
        Annotation::new(2, BoundType::FreeBox, Bound::new(0.0, 0.0, 10.0, 5.0)),
    ]);
    let mut engine = engine_with(page);
    click(&mut engine, (2.0, 2.0));
    assert_eq!(engine.drain_events(), vec![AnnotationEvent::Selected { id: 2 }]);
    assert_eq!(engine.selected(), Some(2));
}

#[test]
fn test_short_drag_is_click_on_empty_area() {
    let mut engine = engine_with(PageView::new(1, 1.0));
    engine.set_mode(BoundType::FreeBox);
    drag(&mut engine, (10.0, 10.0), (12.0, 11.0));
    assert_eq!(engine.drain_events(), vec![AnnotationEvent::EmptyAreaClicked]);
    assert!(engine.annotations().is_empty());
}

// ============================================================================
// Creation
// ============================================================================

#[test]
fn test_text_snap_takes_contiguous_tokens() {
    let mut engine = engine_with(PageView::new(1, 1.0).with_tokens(row_of_tokens(10)));
    engine.set_mode(BoundType::Text);
    // Inside token 2, then inside token 7
    drag(&mut engine, (75.0, 15.0), (225.0, 15.0));

    let events = engine.drain_events();
    let annotations = added(&events);
    assert_eq!(annotations.len(), 1);
    let ids: Vec<u32> = annotations[0].tokens.iter().map(|t| t.id).collect();
    assert_eq!(ids, vec![2, 3, 4, 5, 6, 7]);
}

#[test]
fn test_box_over_no_tokens_adds_nothing() {
    let mut engine = engine_with(PageView::new(1, 1.0).with_tokens(row_of_tokens(4)));
    engine.set_mode(BoundType::Box);
    drag(&mut engine, (300.0, 300.0), (400.0, 400.0));
    assert!(added(&engine.drain_events()).is_empty());
    assert!(engine.annotations().is_empty());
}

#[test]
fn test_box_snaps_to_tokens() {
    let mut engine = engine_with(PageView::new(1, 1.0).with_tokens(row_of_tokens(4)));
    engine.set_mode(BoundType::Box);
    drag(&mut engine, (5.0, 5.0), (65.0, 30.0));
    let events = engine.drain_events();
    let annotations = added(&events);
    assert_eq!(annotations[0].bound, Bound::new(10.0, 10.0, 50.0, 10.0));
}

#[test]
fn test_scaled_drag_is_stored_unscaled() {
    let mut engine = engine_with(PageView::new(1, 2.0));
    engine.set_mode(BoundType::FreeBox);
    drag(&mut engine, (20.0, 20.0), (60.0, 60.0));
    assert_eq!(
        engine.annotations()[0].bound,
        Bound::new(10.0, 10.0, 20.0, 20.0)
    );
}

#[test]
fn test_chain_links_consecutive_annotations() {
    let page = PageView::new(4, 1.0).with_annotations(vec![
        Annotation::new(1, BoundType::FreeBox, Bound::new(0.0, 0.0, 10.0, 10.0)),
        Annotation::new(2, BoundType::FreeBox, Bound::new(20.0, 0.0, 10.0, 10.0)),
        Annotation::new(3, BoundType::FreeBox, Bound::new(40.0, 0.0, 10.0, 10.0)),
    ]);
    let mut engine = engine_with(page);
    engine.set_mode(BoundType::Chain);
    drag(&mut engine, (1.0, 2.0), (45.0, 8.0));

    let events = engine.drain_events();
    assert_eq!(events.len(), 2);
    assert_eq!(engine.annotation(1).unwrap().links[0].to, 2);
    assert_eq!(engine.annotation(2).unwrap().links[0].to, 3);
    assert_eq!(engine.annotation(2).unwrap().links[0].page_num, 4);
    assert!(engine.annotation(3).unwrap().links.is_empty());

    // One undo step reverts the whole link gesture
    engine.undo();
    assert!(engine.annotations().iter().all(|a| a.links.is_empty()));
}

// ============================================================================
// Resize and move
// ============================================================================

#[test]
fn test_resize_selected_from_corner_handle() {
    let page = PageView::new(1, 1.0).with_annotations(vec![Annotation::new(
        1,
        BoundType::FreeBox,
        Bound::new(50.0, 50.0, 100.0, 100.0),
    )]);
    let mut engine = engine_with(page);
    click(&mut engine, (100.0, 100.0));
    engine.drain_events();

    drag(&mut engine, (150.0, 150.0), (200.0, 180.0));
    assert_eq!(
        engine.annotation(1).unwrap().bound,
        Bound::new(50.0, 50.0, 150.0, 130.0)
    );
    let events = engine.drain_events();
    assert!(matches!(events.as_slice(), [AnnotationEvent::Edited { patch }] if patch.id == 1));

    engine.undo();
    assert_eq!(
        engine.annotation(1).unwrap().bound,
        Bound::new(50.0, 50.0, 100.0, 100.0)
    );
}

#[test]
fn test_move_from_label() {
    let page = PageView::new(1, 1.0).with_annotations(vec![Annotation::new(
        1,
        BoundType::FreeBox,
        Bound::new(50.0, 50.0, 100.0, 100.0),
    )]);
    let mut engine = engine_with(page);
    // The label strip sits just above the top edge
    drag(&mut engine, (60.0, 40.0), (80.0, 60.0));
    assert_eq!(
        engine.annotation(1).unwrap().bound,
        Bound::new(70.0, 70.0, 100.0, 100.0)
    );
}

#[test]
fn test_handles_need_selection() {
    let page = PageView::new(1, 1.0).with_annotations(vec![Annotation::new(
        1,
        BoundType::FreeBox,
        Bound::new(50.0, 50.0, 100.0, 100.0),
    )]);
    let mut engine = engine_with(page);
    engine.set_mode(BoundType::FreeBox);
    // Not selected: the corner is plain canvas and the drag creates a box
    drag(&mut engine, (150.0, 150.0), (200.0, 180.0));
    assert_eq!(engine.annotations().len(), 2);
    assert_eq!(
        engine.annotation(1).unwrap().bound,
        Bound::new(50.0, 50.0, 100.0, 100.0)
    );
}

// ============================================================================
// Tables
// ============================================================================

fn table_engine() -> AnnotationEngine {
    let page = PageView::new(1, 1.0)
        .with_annotations(vec![empty_table(1, Bound::new(0.0, 0.0, 200.0, 100.0))]);
    let mut engine = engine_with(page);
    assert!(engine.initialize_table(1, 2, 2));
    engine.drain_events();
    engine
}

#[test]
fn test_initialize_table_emits_edit() {
    let page = PageView::new(1, 1.0)
        .with_annotations(vec![empty_table(1, Bound::new(0.0, 0.0, 200.0, 100.0))]);
    let mut engine = engine_with(page);
    assert!(engine.initialize_table(1, 2, 3));

    let table = engine.annotation(1).unwrap();
    assert_eq!(table.table_cells.len(), 6);
    let events = engine.drain_events();
    assert!(matches!(
        events.as_slice(),
        [AnnotationEvent::Edited { patch }] if patch.table_cells.as_ref().is_some_and(|c| c.len() == 6)
    ));
    assert_eq!(engine.tables().gutters(1).unwrap().len(), 3);
}

#[test]
fn test_merge_and_split_through_cell_mode() {
    let mut engine = table_engine();
    engine.set_mode(BoundType::TableCell);
    drag(&mut engine, (50.0, 25.0), (150.0, 75.0));

    assert_eq!(engine.cell_selection().unwrap().cell_ids.len(), 4);
    assert!(engine.can_merge());
    assert!(!engine.can_split());

    let merged = engine.merge_cells().unwrap();
    let table = engine.annotation(1).unwrap();
    assert_eq!(table.table_cells.len(), 1);
    let cell = &table.table_cells[0];
    assert_eq!(cell.id, merged);
    assert_eq!(cell.data, Some(CellData::new(0, 0).with_span(2, 2)));
    assert_eq!(cell.bound, Bound::new(0.0, 0.0, 200.0, 100.0));

    assert!(engine.can_split());
    let pieces = engine.split_cells();
    assert_eq!(pieces.len(), 4);
    assert_eq!(engine.annotation(1).unwrap().table_cells.len(), 4);

    // Undo the split, then the merge
    engine.undo();
    assert_eq!(engine.annotation(1).unwrap().table_cells.len(), 1);
    engine.undo();
    assert_eq!(engine.annotation(1).unwrap().table_cells.len(), 4);
}

#[test]
fn test_single_row_selection_is_not_splittable() {
    let mut engine = table_engine();
    engine.set_mode(BoundType::TableCell);
    drag(&mut engine, (50.0, 25.0), (150.0, 25.0));
    assert_eq!(engine.cell_selection().unwrap().cell_ids.len(), 2);
    assert!(engine.can_merge());
    assert!(!engine.can_split());
    assert!(engine.split_cells().is_empty());
}

#[test]
fn test_gutter_drag_moves_column_edge() {
    let mut engine = table_engine();
    drag(&mut engine, (100.0, 25.0), (130.0, 25.0));

    let table = engine.annotation(1).unwrap();
    assert_eq!(cell_at(table, 0, 0).bound.width, 130.0);
    assert_eq!(cell_at(table, 1, 1).bound.x, 130.0);
    assert_eq!(cell_at(table, 1, 1).bound.width, 70.0);
    assert!(matches!(
        engine.drain_events().as_slice(),
        [AnnotationEvent::Edited { patch }] if patch.id == 1
    ));
    assert!(engine.annotations().len() == 1);
}

#[test]
fn test_gutter_flick_without_moves_commits() {
    let mut engine = table_engine();
    engine.pointer_down(Point::new(100.0, 25.0));
    engine.pointer_up(Point::new(130.0, 25.0));

    let table = engine.annotation(1).unwrap();
    assert_eq!(table.table.as_ref().unwrap().cols, vec![130.0]);
    assert_eq!(engine.drain_events().len(), 1);
}

#[test]
fn test_gutter_commits_release_point() {
    let mut engine = table_engine();
    engine.pointer_down(Point::new(100.0, 25.0));
    engine.pointer_move(Point::new(110.0, 25.0));
    engine.pointer_up(Point::new(140.0, 25.0));

    let table = engine.annotation(1).unwrap();
    assert_eq!(table.table.as_ref().unwrap().cols, vec![140.0]);
    assert_eq!(cell_at(table, 0, 0).bound.width, 140.0);
}

#[test]
fn test_gutter_drag_is_clamped() {
    let mut engine = table_engine();
    drag(&mut engine, (100.0, 25.0), (400.0, 25.0));
    let table = engine.annotation(1).unwrap();
    let width = cell_at(table, 0, 0).bound.width;
    assert!(width < 200.0);
    assert!(width > 100.0);
}

#[test]
fn test_resizing_table_rescales_grid() {
    let mut engine = table_engine();
    click(&mut engine, (20.0, 20.0));
    engine.drain_events();
    assert_eq!(engine.selected(), Some(1));

    drag(&mut engine, (200.0, 100.0), (400.0, 200.0));
    let table = engine.annotation(1).unwrap();
    assert_eq!(table.bound, Bound::new(0.0, 0.0, 400.0, 200.0));
    assert_eq!(cell_at(table, 1, 1).bound, Bound::new(200.0, 100.0, 200.0, 100.0));
}

#[test]
fn test_collapsed_table_survives_move() {
    let mut engine = table_engine();
    click(&mut engine, (20.0, 20.0));
    // Drag the bottom-right handle onto the top edge
    drag(&mut engine, (200.0, 100.0), (200.0, 0.0));
    let table = engine.annotation(1).unwrap();
    assert_eq!(table.bound.height, 0.0);
    assert_eq!(table.table_cells.len(), 4);

    // Move it by its label
    drag(&mut engine, (20.0, -10.0), (40.0, -10.0));
    let table = engine.annotation(1).unwrap();
    assert_eq!(table.bound, Bound::new(20.0, 0.0, 200.0, 0.0));
    assert_eq!(table.table_cells.len(), 4);
    assert_eq!(table.table.as_ref().unwrap().rows, vec![0.0]);
}

// ============================================================================
// Keyboard
// ============================================================================

#[test]
fn test_copy_reports_selection() {
    let page = PageView::new(1, 1.0).with_annotations(vec![Annotation::new(
        7,
        BoundType::FreeBox,
        Bound::new(0.0, 0.0, 50.0, 50.0),
    )]);
    let mut engine = engine_with(page);
    click(&mut engine, (10.0, 10.0));
    engine.drain_events();

    engine.key_down(KeyChord::ctrl('c'));
    engine.key_down(KeyChord::ctrl('v'));
    engine.key_down(KeyChord::ctrl_shift('z'));
    assert_eq!(
        engine.drain_events(),
        vec![
            AnnotationEvent::CopyPressed { selected: vec![7] },
            AnnotationEvent::PastePressed,
            AnnotationEvent::RedoPressed,
        ]
    );
}

#[test]
fn test_unbound_chord_is_ignored() {
    let mut engine = engine_with(PageView::new(1, 1.0));
    assert_eq!(engine.key_down(KeyChord::plain(Key::Char('Q'))), None);
    assert!(engine.drain_events().is_empty());
}

// ============================================================================
// Image polygon tools
// ============================================================================

fn polygon_engine() -> AnnotationEngine {
    let mut engine = engine_with(PageView::new(1, 1.0).with_size(120, 120));
    engine.set_mode(BoundType::Polygon);
    engine
}

fn pen_square(engine: &mut AnnotationEngine) {
    engine.activate_tool(ToolKind::Pen);
    engine.pointer_down(Point::new(10.0, 10.0));
    engine.pointer_move(Point::new(60.0, 10.0));
    engine.pointer_move(Point::new(60.0, 60.0));
    engine.pointer_up(Point::new(10.0, 60.0));
}

#[test]
fn test_pen_creates_polygon() {
    let mut engine = polygon_engine();
    pen_square(&mut engine);

    let events = engine.drain_events();
    let annotations = added(&events);
    assert_eq!(annotations.len(), 1);
    assert_eq!(annotations[0].bound_type, BoundType::Polygon);
    assert_eq!(annotations[0].bound, Bound::new(10.0, 10.0, 50.0, 50.0));
    assert_eq!(annotations[0].segments[0].len(), 8);
}

#[test]
fn test_select_then_delete_polygon() {
    let mut engine = polygon_engine();
    pen_square(&mut engine);
    let id = engine.annotations()[0].id;
    engine.drain_events();

    engine.activate_tool(ToolKind::Select);
    click(&mut engine, (100.0, 100.0));
    assert!(engine.image_tools().scene().selection().is_empty());
    click(&mut engine, (30.0, 30.0));
    assert!(engine.image_tools().scene().is_selected(id));

    engine.key_down(KeyChord::plain(Key::Delete));
    assert_eq!(engine.drain_events(), vec![AnnotationEvent::Deleted { id }]);
    assert!(engine.annotations().is_empty());
}

#[test]
fn test_brush_extends_selected_polygon() {
    let mut engine = polygon_engine();
    pen_square(&mut engine);
    let id = engine.annotations()[0].id;
    engine.drain_events();

    engine.activate_tool(ToolKind::Brush);
    drag(&mut engine, (60.0, 35.0), (100.0, 35.0));

    let events = engine.drain_events();
    assert!(matches!(
        events.as_slice(),
        [AnnotationEvent::Edited { patch }] if patch.id == id
    ));
    let bound = engine.annotation(id).unwrap().bound;
    assert!(bound.right() > 100.0);
    assert_eq!(engine.annotations().len(), 1);
}

#[test]
fn test_eraser_trims_selected_polygon() {
    let mut engine = polygon_engine();
    pen_square(&mut engine);
    let id = engine.annotations()[0].id;
    engine.drain_events();

    engine.activate_tool(ToolKind::Eraser);
    // Wipe out the right half
    drag(&mut engine, (50.0, 0.0), (50.0, 70.0));
    let bound = engine.annotation(id).unwrap().bound;
    assert!(bound.right() < 45.0);
    assert!(matches!(
        engine.drain_events().as_slice(),
        [AnnotationEvent::Edited { .. }]
    ));

    engine.undo();
    assert_eq!(
        engine.annotation(id).unwrap().bound,
        Bound::new(10.0, 10.0, 50.0, 50.0)
    );
}

#[test]
fn test_wand_traces_dark_region() {
    let mut engine = polygon_engine();
    engine.set_image(RgbaImage::from_fn(120, 120, |x, y| {
        if (20..50).contains(&x) && (30..60).contains(&y) {
            Rgba([20, 20, 20, 255])
        } else {
            Rgba([245, 245, 245, 255])
        }
    }));
    engine.activate_tool(ToolKind::Wand);
    click(&mut engine, (35.0, 45.0));

    let events = engine.drain_events();
    let annotations = added(&events);
    assert_eq!(annotations.len(), 1);
    let bound = annotations[0].bound;
    assert_eq!((bound.x, bound.y), (20.0, 30.0));
    assert!(bound.width >= 28.0 && bound.width <= 30.0);
}

#[test]
fn test_wand_without_image_does_nothing() {
    let mut engine = polygon_engine();
    engine.activate_tool(ToolKind::Wand);
    click(&mut engine, (35.0, 45.0));
    assert!(engine.drain_events().is_empty());
}

// ============================================================================
// Export
// ============================================================================

#[test]
fn test_export_after_edits() {
    let mut engine = polygon_engine();
    pen_square(&mut engine);
    let coco = engine.export_coco();
    assert_eq!(coco.images[0].width, 120);
    assert_eq!(coco.annotations.len(), 1);
    assert_eq!(coco.annotations[0].area, 2500.0);
}
