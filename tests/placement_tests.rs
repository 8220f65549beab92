use approx::assert_relative_eq;
use chart_annotations::core::{HeadlessSurface, PixelPoint, Point, Viewport, VisibleRange};
use chart_annotations::interaction::{IdGenerator, InteractionMode, InteractionState};
use chart_annotations::{
    AnnotationEngine, DrawingController, DrawingKind, DrawingTool, DrawingType, InputFocus,
    InteractionOutcome, Key, OverlayConfig,
};

fn engine() -> AnnotationEngine<HeadlessSurface> {
    let surface = HeadlessSurface::with_ranges(
        Viewport::new(1000, 500),
        VisibleRange::new(0.0, 1000.0),
        0.0,
        100.0,
    )
    .expect("surface");
    AnnotationEngine::new(surface, OverlayConfig::default()).expect("engine")
}

#[test]
fn two_clicks_place_a_trendline() {
    let mut engine = engine();
    engine.set_tool(DrawingTool::Draw(DrawingType::TrendLine));

    assert_eq!(
        engine.pointer_down(100.0, 250.0),
        InteractionOutcome::PlacementProgress { points: 1 }
    );
    engine.pointer_up(100.0, 250.0);
    assert_eq!(engine.interaction_mode(), InteractionMode::Placing);

    engine.pointer_move(180.0, 220.0);
    assert_eq!(
        engine.pointer_down(200.0, 200.0),
        InteractionOutcome::Created("drawing-1".to_owned())
    );
    assert_eq!(
        engine.drawing("drawing-1").map(|d| d.kind.clone()),
        Some(DrawingKind::TrendLine {
            start: Point::new(100, 50.0),
            end: Point::new(200, 60.0),
        })
    );
    assert_eq!(engine.tool(), DrawingTool::Select);
    assert_eq!(
        engine.selected_drawing().map(|d| d.id.as_str()),
        Some("drawing-1")
    );
}

#[test]
fn click_drag_release_places_a_rectangle() {
    let mut engine = engine();
    engine.set_tool(DrawingTool::Draw(DrawingType::Rectangle));

    engine.pointer_down(100.0, 100.0);
    engine.pointer_move(250.0, 300.0);
    assert_eq!(
        engine.pointer_up(300.0, 400.0),
        InteractionOutcome::Created("drawing-1".to_owned())
    );
    assert_eq!(
        engine.drawing("drawing-1").map(|d| d.kind.clone()),
        Some(DrawingKind::Rectangle {
            start: Point::new(100, 80.0),
            end: Point::new(300, 20.0),
        })
    );
}

#[test]
fn jitter_below_drag_threshold_is_still_a_click() {
    let mut engine = engine();
    engine.set_tool(DrawingTool::Draw(DrawingType::Ray));

    engine.pointer_down(100.0, 100.0);
    assert_eq!(
        engine.pointer_up(101.0, 101.0),
        InteractionOutcome::PlacementProgress { points: 1 }
    );
    assert_eq!(engine.interaction_mode(), InteractionMode::Placing);
}

#[test]
fn new_channel_gets_a_pixel_based_initial_offset() {
    let mut engine = engine();
    engine.set_tool(DrawingTool::Draw(DrawingType::Channel));
    engine.pointer_down(100.0, 250.0);
    engine.pointer_up(100.0, 250.0);
    engine.pointer_down(300.0, 200.0);

    let Some(DrawingKind::Channel { offset, .. }) =
        engine.drawing("drawing-1").map(|d| d.kind.clone())
    else {
        panic!("channel created");
    };
    // 40 px below price 50 on a 5 px-per-unit scale.
    assert_relative_eq!(offset, -8.0, epsilon = 1e-9);
}

#[test]
fn fib_and_text_use_configured_defaults() {
    let mut config = OverlayConfig::default();
    config.default_fib_levels = vec![0.0, 0.5, 1.0];
    config.default_text_label = "note".to_owned();
    let surface = HeadlessSurface::with_ranges(
        Viewport::new(1000, 500),
        VisibleRange::new(0.0, 1000.0),
        0.0,
        100.0,
    )
    .expect("surface");
    let mut engine = AnnotationEngine::new(surface, config).expect("engine");

    engine.set_tool(DrawingTool::Draw(DrawingType::Text));
    assert_eq!(
        engine.pointer_down(10.0, 10.0),
        InteractionOutcome::Created("drawing-1".to_owned())
    );
    let Some(DrawingKind::Text { label, .. }) = engine.drawing("drawing-1").map(|d| d.kind.clone())
    else {
        panic!("text created");
    };
    assert_eq!(label, "note");

    engine.set_tool(DrawingTool::Draw(DrawingType::Fib));
    engine.pointer_down(100.0, 100.0);
    engine.pointer_up(100.0, 100.0);
    engine.pointer_down(200.0, 300.0);
    let Some(DrawingKind::Fib { levels, .. }) = engine.drawing("drawing-2").map(|d| d.kind.clone())
    else {
        panic!("fib created");
    };
    assert_eq!(levels, vec![0.0, 0.5, 1.0]);
}

#[test]
fn brush_collects_pointer_samples_until_finished() {
    let mut engine = engine();
    engine.set_tool(DrawingTool::Draw(DrawingType::Brush));

    engine.pointer_down(10.0, 10.0);
    engine.pointer_move(20.0, 20.0);
    engine.pointer_move(30.0, 25.0);
    engine.pointer_up(30.0, 25.0);
    // Hovering after release adds nothing.
    engine.pointer_move(60.0, 60.0);

    assert_eq!(
        engine.finish_placement(),
        InteractionOutcome::Created("drawing-1".to_owned())
    );
    let Some(DrawingKind::Brush { points }) = engine.drawing("drawing-1").map(|d| d.kind.clone())
    else {
        panic!("brush created");
    };
    assert_eq!(points.len(), 3);
    assert_eq!(points[2].time, 30);
}

#[test]
fn switching_tools_abandons_placement() {
    let mut engine = engine();
    engine.set_tool(DrawingTool::Draw(DrawingType::Measure));
    engine.pointer_down(100.0, 100.0);
    engine.pointer_up(100.0, 100.0);

    engine.set_tool(DrawingTool::Draw(DrawingType::HLine));
    assert_eq!(engine.interaction_mode(), InteractionMode::Idle);
    assert!(engine.drawings().is_empty());
}

#[test]
fn escape_discards_placement_without_creating() {
    let mut engine = engine();
    engine.set_tool(DrawingTool::Draw(DrawingType::Arrow));
    engine.pointer_down(100.0, 100.0);
    engine.pointer_up(100.0, 100.0);

    assert_eq!(
        engine.key_down(Key::Escape, InputFocus::Chart),
        InteractionOutcome::PlacementDiscarded
    );
    assert!(engine.drawings().is_empty());
    assert_eq!(engine.tool(), DrawingTool::Draw(DrawingType::Arrow));
}

#[test]
fn eraser_removes_topmost_hit() {
    let mut engine = engine();
    engine.set_tool(DrawingTool::Draw(DrawingType::HLine));
    engine.pointer_down(10.0, 250.0);
    engine.set_tool(DrawingTool::Eraser);

    assert_eq!(
        engine.pointer_down(600.0, 252.0),
        InteractionOutcome::Removed("drawing-1".to_owned())
    );
    assert!(engine.drawings().is_empty());
    assert!(engine.selected_drawing().is_none());
}

#[derive(Debug, Default)]
struct PrefixedIds(u32);

impl IdGenerator for PrefixedIds {
    fn next_id(&mut self, drawing_type: DrawingType) -> String {
        self.0 += 1;
        format!("{drawing_type:?}-{}", self.0).to_lowercase()
    }
}

#[test]
fn custom_id_generator_names_new_drawings() {
    let surface = HeadlessSurface::with_ranges(
        Viewport::new(1000, 500),
        VisibleRange::new(0.0, 1000.0),
        0.0,
        100.0,
    )
    .expect("surface");
    let mut drawings = DrawingController::new();
    let mut state = InteractionState::default().with_id_generator(PrefixedIds::default());
    state.set_tool(DrawingTool::Draw(DrawingType::VLine));

    assert_eq!(
        state.pointer_down(&mut drawings, &surface, PixelPoint::new(400.0, 10.0)),
        InteractionOutcome::Created("vline-1".to_owned())
    );
    assert_eq!(
        drawings.get("vline-1").map(|d| d.kind.clone()),
        Some(DrawingKind::VLine { time: 400 })
    );
}
