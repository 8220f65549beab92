use chart_annotations::core::{HeadlessSurface, Viewport, VisibleRange};
use chart_annotations::{AnnotationEngine, AnnotationError, DrawingStyle, OverlayConfig};

#[test]
fn config_json_round_trip() {
    let config = OverlayConfig::default()
        .with_hit_threshold(9.0)
        .with_default_style(DrawingStyle {
            color: "#ff9800".to_owned(),
            line_width: 3.0,
            ..DrawingStyle::default()
        });

    let json = config.to_json_pretty().expect("serialize");
    let restored = OverlayConfig::from_json_str(&json).expect("parse");
    assert_eq!(restored, config);
}

#[test]
fn missing_fields_fall_back_to_defaults() {
    let restored =
        OverlayConfig::from_json_str(r#"{ "hit_threshold_px": 4.5 }"#).expect("parse");
    assert_eq!(restored.hit_threshold_px, 4.5);
    assert_eq!(
        restored,
        OverlayConfig {
            hit_threshold_px: 4.5,
            ..OverlayConfig::default()
        }
    );
}

#[test]
fn malformed_json_is_a_serialization_error() {
    assert!(matches!(
        OverlayConfig::from_json_str("{ not json"),
        Err(AnnotationError::Serialization(_))
    ));
}

#[test]
fn validate_rejects_out_of_range_values() {
    let cases = [
        OverlayConfig::default().with_hit_threshold(0.0),
        OverlayConfig::default().with_hit_threshold(f64::INFINITY),
        OverlayConfig {
            min_brush_points: 1,
            ..OverlayConfig::default()
        },
        OverlayConfig {
            drag_threshold_px: -1.0,
            ..OverlayConfig::default()
        },
        OverlayConfig::default().with_default_style(DrawingStyle {
            color: "blue".to_owned(),
            ..DrawingStyle::default()
        }),
        OverlayConfig {
            default_fib_levels: vec![0.0, f64::NAN],
            ..OverlayConfig::default()
        },
    ];

    for config in cases {
        assert!(
            matches!(config.validate(), Err(AnnotationError::InvalidData(_))),
            "expected rejection for {config:?}"
        );
    }
}

#[test]
fn invalid_values_in_json_are_rejected_after_parse() {
    assert!(matches!(
        OverlayConfig::from_json_str(r#"{ "min_brush_points": 0 }"#),
        Err(AnnotationError::InvalidData(_))
    ));
}

#[test]
fn engine_refuses_invalid_config() {
    let surface = HeadlessSurface::with_ranges(
        Viewport::new(1000, 500),
        VisibleRange::new(0.0, 1000.0),
        0.0,
        100.0,
    )
    .expect("surface");

    let result = AnnotationEngine::new(surface, OverlayConfig::default().with_hit_threshold(-2.0));
    assert!(matches!(result, Err(AnnotationError::InvalidData(_))));
}

#[test]
fn set_config_keeps_previous_config_on_error() {
    let surface = HeadlessSurface::with_ranges(
        Viewport::new(1000, 500),
        VisibleRange::new(0.0, 1000.0),
        0.0,
        100.0,
    )
    .expect("surface");
    let mut engine = AnnotationEngine::new(surface, OverlayConfig::default()).expect("engine");

    assert!(engine
        .set_config(OverlayConfig::default().with_hit_threshold(0.0))
        .is_err());
    assert_eq!(engine.config(), &OverlayConfig::default());

    engine
        .set_config(OverlayConfig::default().with_hit_threshold(12.0))
        .expect("valid config");
    assert_eq!(engine.config().hit_threshold_px, 12.0);
}
