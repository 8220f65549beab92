use chart_annotations::core::{PixelPoint, Point, Viewport, ViewportTransform, VisibleRange};
use chart_annotations::drawing::{
    Drawing, DrawingController, DrawingGeometry, DrawingKind, HitTester, TextMetrics,
    drawing_geometry, fib_level_price, handle_at, resize_handles,
};
use approx::assert_relative_eq;

fn transform() -> ViewportTransform {
    ViewportTransform::new(
        Viewport::new(1000, 500),
        VisibleRange::new(0.0, 1000.0),
        0.0,
        100.0,
    )
    .expect("valid transform")
}

fn trendline(id: &str) -> Drawing {
    Drawing::new(
        id,
        DrawingKind::TrendLine {
            start: Point::new(100, 50.0),
            end: Point::new(300, 50.0),
        },
    )
}

#[test]
fn hline_threshold_is_inclusive() {
    let t = transform();
    let tester = HitTester::new(8.0);
    let hline = Drawing::new("h", DrawingKind::HLine { price: 50.0 });

    assert!(tester.hit(&hline, &t, PixelPoint::new(500.0, 258.0)));
    assert!(tester.hit(&hline, &t, PixelPoint::new(10.0, 242.0)));
    assert!(!tester.hit(&hline, &t, PixelPoint::new(500.0, 259.0)));
}

#[test]
fn trendline_hit_uses_segment_not_infinite_line() {
    let t = transform();
    let tester = HitTester::default();
    let line = trendline("t");

    assert!(tester.hit(&line, &t, PixelPoint::new(200.0, 255.0)));
    assert!(!tester.hit(&line, &t, PixelPoint::new(400.0, 250.0)));
}

#[test]
fn extension_makes_the_extended_part_hittable() {
    let t = transform();
    let tester = HitTester::default();
    let line = trendline("t").with_extension(false, true);

    assert!(tester.hit(&line, &t, PixelPoint::new(900.0, 250.0)));
    assert!(!tester.hit(&line, &t, PixelPoint::new(20.0, 250.0)));
}

#[test]
fn rectangle_hits_anywhere_inside() {
    let t = transform();
    let tester = HitTester::default();
    let rect = Drawing::new(
        "r",
        DrawingKind::Rectangle {
            start: Point::new(100, 80.0),
            end: Point::new(300, 20.0),
        },
    );

    assert!(tester.hit(&rect, &t, PixelPoint::new(200.0, 250.0)));
    assert!(!tester.hit(&rect, &t, PixelPoint::new(350.0, 250.0)));
}

#[test]
fn fib_levels_measure_from_start() {
    let start = Point::new(100, 100.0);
    let end = Point::new(200, 0.0);
    assert_relative_eq!(fib_level_price(start, end, 0.0), 100.0);
    assert_relative_eq!(fib_level_price(start, end, 0.618), 38.2, epsilon = 1e-9);
    assert_relative_eq!(fib_level_price(start, end, 1.0), 0.0);

    let t = transform();
    let fib = Drawing::new(
        "f",
        DrawingKind::Fib {
            start: Point::new(100, 80.0),
            end: Point::new(300, 40.0),
            levels: vec![0.0, 0.5, 1.0],
        },
    );
    // Level 0.5 sits at price 60 -> y = 200.
    assert!(HitTester::default().hit(&fib, &t, PixelPoint::new(250.0, 202.0)));
    assert!(!HitTester::default().hit(&fib, &t, PixelPoint::new(350.0, 200.0)));
}

#[test]
fn fib_anchor_is_a_vertical_line_at_the_start() {
    let t = transform();
    let fib = Drawing::new(
        "f",
        DrawingKind::Fib {
            start: Point::new(100, 80.0),
            end: Point::new(300, 40.0),
            levels: vec![0.0, 1.0],
        },
    );
    let Some(DrawingGeometry::Fib { anchor_line, .. }) =
        drawing_geometry(&fib, &t, TextMetrics::default())
    else {
        panic!("expected fib geometry");
    };
    assert_relative_eq!(anchor_line.start.x, 100.0);
    assert_relative_eq!(anchor_line.end.x, 100.0);
    assert_relative_eq!(anchor_line.start.y, 100.0);
    assert_relative_eq!(anchor_line.end.y, 300.0);

    let tester = HitTester::default();
    // Midway down the anchor, between the two levels.
    assert!(tester.hit(&fib, &t, PixelPoint::new(100.0, 200.0)));
    assert!(tester.hit(&fib, &t, PixelPoint::new(107.0, 200.0)));
    // Midway along the old diagonal, far from every line.
    assert!(!tester.hit(&fib, &t, PixelPoint::new(200.0, 200.0)));
}

#[test]
fn text_bounds_start_at_left_baseline() {
    let t = transform();
    let text = Drawing::new(
        "x",
        DrawingKind::Text {
            point: Point::new(100, 50.0),
            label: "ABCD".to_owned(),
            font_size: 10.0,
        },
    );
    let metrics = TextMetrics::default();
    let Some(DrawingGeometry::Text { bounds, .. }) = drawing_geometry(&text, &t, metrics) else {
        panic!("expected text geometry");
    };
    assert_relative_eq!(bounds.left, 100.0);
    assert_relative_eq!(bounds.bottom, 250.0);
    assert_relative_eq!(bounds.right, 100.0 + 4.0 * 10.0 * metrics.char_width_ratio);
    assert_relative_eq!(bounds.top, 250.0 - 10.0 * metrics.line_height_ratio);

    let tester = HitTester::default();
    assert!(tester.hit(&text, &t, PixelPoint::new(110.0, 245.0)));
    assert!(!tester.hit(&text, &t, PixelPoint::new(110.0, 255.0)));
}

#[test]
fn short_brush_has_no_geometry() {
    let t = transform();
    let brush = Drawing::new(
        "b",
        DrawingKind::Brush {
            points: vec![Point::new(10, 10.0)],
        },
    );
    assert_eq!(drawing_geometry(&brush, &t, TextMetrics::default()), None);
    assert!(!HitTester::default().hit(&brush, &t, PixelPoint::new(10.0, 450.0)));
}

#[test]
fn brush_hits_along_any_stroke_segment() {
    let t = transform();
    let brush = Drawing::new(
        "b",
        DrawingKind::Brush {
            points: vec![
                Point::new(100, 50.0),
                Point::new(200, 50.0),
                Point::new(200, 30.0),
            ],
        },
    );
    // Pixels: (100,250) -> (200,250) -> (200,350).
    let tester = HitTester::default();
    assert!(tester.hit(&brush, &t, PixelPoint::new(150.0, 255.0)));
    assert!(tester.hit(&brush, &t, PixelPoint::new(195.0, 300.0)));
    assert!(!tester.hit(&brush, &t, PixelPoint::new(150.0, 300.0)));
    assert!(!tester.hit(&brush, &t, PixelPoint::new(90.0 - tester.threshold_px, 250.0)));
}

#[test]
fn unresolvable_transform_means_no_hit() {
    let mut t = transform();
    t.dispose();
    let hline = Drawing::new("h", DrawingKind::HLine { price: 50.0 });
    assert!(!HitTester::default().hit(&hline, &t, PixelPoint::new(500.0, 250.0)));
}

#[test]
fn topmost_visible_drawing_wins() {
    let t = transform();
    let mut drawings = DrawingController::new();
    drawings.add(trendline("below")).expect("add below");
    drawings.add(trendline("above")).expect("add above");
    drawings
        .add(trendline("hidden").hidden())
        .expect("add hidden");

    let hit = drawings
        .topmost_hit(&HitTester::default(), &t, PixelPoint::new(200.0, 250.0))
        .map(|drawing| drawing.id.as_str());
    assert_eq!(hit, Some("above"));
}

#[test]
fn rectangle_handles_follow_screen_corner_order() {
    let t = transform();
    let rect = Drawing::new(
        "r",
        DrawingKind::Rectangle {
            start: Point::new(100, 20.0),
            end: Point::new(300, 80.0),
        },
    );
    let handles = resize_handles(&rect, &t).expect("handles");
    assert_eq!(
        handles.as_slice(),
        &[
            PixelPoint::new(100.0, 100.0),
            PixelPoint::new(300.0, 100.0),
            PixelPoint::new(300.0, 400.0),
            PixelPoint::new(100.0, 400.0),
        ]
    );
    assert_eq!(handle_at(&rect, &t, PixelPoint::new(303.0, 398.0), 6.0), Some(2));
    assert_eq!(handle_at(&rect, &t, PixelPoint::new(200.0, 250.0), 6.0), None);
}

#[test]
fn channel_exposes_offset_handle() {
    let t = transform();
    let channel = Drawing::new(
        "c",
        DrawingKind::Channel {
            start: Point::new(100, 50.0),
            end: Point::new(300, 60.0),
            offset: -10.0,
        },
    );
    let handles = resize_handles(&channel, &t).expect("handles");
    assert_eq!(handles.len(), 3);
    assert_eq!(handles[2], PixelPoint::new(100.0, 300.0));
    // Between the two lines counts as a hit.
    assert!(HitTester::default().hit(&channel, &t, PixelPoint::new(200.0, 260.0)));
}
