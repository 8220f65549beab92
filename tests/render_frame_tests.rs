use approx::assert_relative_eq;
use chart_annotations::core::{Candle, HeadlessSurface, Point, Viewport, VisibleRange};
use chart_annotations::render::{NullRenderer, TextHAlign};
use chart_annotations::script::{HLineElement, MarkerElement, MarkerPosition};
use chart_annotations::{
    AnnotationEngine, ChartScript, Drawing, DrawingKind, DrawingTool, DrawingType, InputFocus,
    Key, OverlayConfig,
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

fn trendline(id: &str) -> Drawing {
    Drawing::new(
        id,
        DrawingKind::TrendLine {
            start: Point::new(100, 50.0),
            end: Point::new(200, 60.0),
        },
    )
}

#[test]
fn drawings_project_through_the_surface() {
    let mut engine = engine();
    engine.add_drawing(trendline("t")).expect("add");

    let frame = engine.build_frame().expect("frame");
    assert_eq!(frame.lines.len(), 1);
    assert!(frame.rects.is_empty());
    let line = frame.lines[0];
    assert_relative_eq!(line.x1, 100.0);
    assert_relative_eq!(line.y1, 250.0);
    assert_relative_eq!(line.x2, 200.0);
    assert_relative_eq!(line.y2, 200.0);
}

#[test]
fn selection_adds_resize_handles() {
    let mut engine = engine();
    engine.add_drawing(trendline("t")).expect("add");
    assert!(engine.select_drawing(Some("t")));

    let frame = engine.build_frame().expect("frame");
    assert_eq!(frame.rects.len(), 2);
    let handle = frame.rects[0];
    assert_relative_eq!(handle.x + handle.width * 0.5, 100.0);
    assert_relative_eq!(handle.y + handle.height * 0.5, 250.0);
}

#[test]
fn hidden_drawings_render_nothing_even_when_selected() {
    let mut engine = engine();
    engine.add_drawing(trendline("t")).expect("add");
    engine.select_drawing(Some("t"));
    engine.set_drawing_visible("t", false).expect("hide");

    let frame = engine.build_frame().expect("frame");
    assert!(frame.is_empty());
}

#[test]
fn arrows_add_two_head_strokes() {
    let mut engine = engine();
    engine
        .add_drawing(Drawing::new(
            "a",
            DrawingKind::Arrow {
                start: Point::new(100, 50.0),
                end: Point::new(300, 50.0),
            },
        ))
        .expect("add");

    let frame = engine.build_frame().expect("frame");
    assert_eq!(frame.lines.len(), 3);
    // Both barbs point back from the tip at x=300.
    for barb in &frame.lines[1..] {
        assert_relative_eq!(barb.x1, 300.0);
        assert!(barb.x2 < 300.0);
    }
}

#[test]
fn measure_box_carries_a_stats_label() {
    let mut engine = engine();
    engine
        .add_drawing(Drawing::new(
            "m",
            DrawingKind::Measure {
                start: Point::new(100, 50.0),
                end: Point::new(300, 60.0),
            },
        ))
        .expect("add");

    let frame = engine.build_frame().expect("frame");
    assert_eq!(frame.rects.len(), 1);
    assert_eq!(frame.texts.len(), 1);
    assert_eq!(frame.texts[0].text, "+10.00 (+20.00%) 200s");
}

#[test]
fn script_elements_render_beneath_drawings() {
    let mut engine = engine();
    engine.add_drawing(trendline("t")).expect("add");
    let mut pivot = HLineElement::new("pivot", 80.0);
    pivot.label = Some("PDH".to_owned());
    engine
        .upsert_script(ChartScript::new("lv", "Levels").with_element(pivot))
        .expect("script");

    let frame = engine.build_frame().expect("frame");
    assert_eq!(frame.lines.len(), 2);
    // Script line first, spanning the full width at price 80.
    assert_relative_eq!(frame.lines[0].y1, 100.0);
    assert_relative_eq!(frame.lines[0].x2, 1000.0);

    assert_eq!(frame.texts.len(), 1);
    assert_eq!(frame.texts[0].text, "PDH");
    assert_eq!(frame.texts[0].h_align, TextHAlign::Right);
}

#[test]
fn placement_preview_follows_the_pointer() {
    let mut engine = engine();
    engine.set_tool(DrawingTool::Draw(DrawingType::TrendLine));
    engine.pointer_down(100.0, 250.0);
    engine.pointer_up(100.0, 250.0);
    engine.pointer_move(300.0, 200.0);

    let frame = engine.build_frame().expect("frame");
    assert_eq!(frame.lines.len(), 1);
    assert_relative_eq!(frame.lines[0].x1, 100.0);
    assert_relative_eq!(frame.lines[0].x2, 300.0);
    assert_relative_eq!(frame.lines[0].y2, 200.0);
    assert!(engine.drawings().is_empty());

    engine.key_down(Key::Escape, InputFocus::Chart);
    assert!(engine.build_frame().expect("frame").is_empty());
}

#[test]
fn null_renderer_counts_primitives() {
    let mut engine = engine();
    engine.add_drawing(trendline("t")).expect("add");
    engine
        .add_drawing(Drawing::new(
            "r",
            DrawingKind::Rectangle {
                start: Point::new(400, 20.0),
                end: Point::new(600, 40.0),
            },
        ))
        .expect("add");
    engine
        .add_drawing(Drawing::new(
            "b",
            DrawingKind::Brush {
                points: vec![
                    Point::new(700, 10.0),
                    Point::new(710, 12.0),
                    Point::new(720, 11.0),
                ],
            },
        ))
        .expect("add");

    let mut renderer = NullRenderer::default();
    assert_eq!(engine.render(&mut renderer), Ok(true));
    assert_eq!(renderer.frames_rendered, 1);
    assert_eq!(renderer.last_line_count, 1);
    assert_eq!(renderer.last_rect_count, 1);
    assert_eq!(renderer.last_polyline_count, 1);
    assert_eq!(renderer.last_text_count, 0);
}

#[test]
fn marker_with_empty_text_renders_without_a_label() {
    let mut engine = engine();
    engine.set_candles(vec![
        Candle::new(100, 50.0, 60.0, 40.0, 55.0, 1.0).expect("candle"),
    ]);
    engine
        .upsert_script(
            ChartScript::new("sig", "Signals")
                .with_element(MarkerElement::new("m", 100, MarkerPosition::AboveBar).with_text("")),
        )
        .expect("script");
    engine.on_animation_frame();

    let mut renderer = NullRenderer::default();
    assert_eq!(engine.render(&mut renderer), Ok(true));
    assert_eq!(renderer.last_rect_count, 1);
    assert_eq!(renderer.last_text_count, 0);
}
