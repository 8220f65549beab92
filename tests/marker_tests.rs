use approx::assert_relative_eq;
use chart_annotations::core::{Candle, Viewport, ViewportTransform, VisibleRange};
use chart_annotations::script::{
    MarkerElement, MarkerPlacementConfig, MarkerPosition, MarkerSide, place_markers,
};

fn transform() -> ViewportTransform {
    ViewportTransform::new(
        Viewport::new(1000, 500),
        VisibleRange::new(0.0, 1000.0),
        0.0,
        100.0,
    )
    .expect("transform")
}

fn candles() -> Vec<Candle> {
    vec![
        Candle::new(400, 50.0, 55.0, 45.0, 52.0, 1.0).expect("candle"),
        Candle::new(500, 52.0, 60.0, 40.0, 58.0, 1.0).expect("candle"),
    ]
}

#[test]
fn anchor_price_follows_marker_position() {
    let markers = [
        MarkerElement::new("above", 500, MarkerPosition::AboveBar),
        MarkerElement::new("below", 500, MarkerPosition::BelowBar),
        MarkerElement::new("in", 500, MarkerPosition::InBar),
    ];
    let placed = place_markers(
        &markers,
        &candles(),
        &transform(),
        MarkerPlacementConfig::default(),
    )
    .expect("placement");

    let price = |id: &str| {
        placed
            .iter()
            .find(|marker| marker.id == id)
            .map(|marker| marker.price)
    };
    assert_eq!(price("above"), Some(60.0));
    assert_eq!(price("below"), Some(40.0));
    assert_eq!(price("in"), Some(58.0));
}

#[test]
fn nearest_candle_is_used_between_bars() {
    let markers = [MarkerElement::new("m", 430, MarkerPosition::AboveBar)];
    let placed = place_markers(
        &markers,
        &candles(),
        &transform(),
        MarkerPlacementConfig::default(),
    )
    .expect("placement");
    assert_eq!(placed[0].price, 55.0);
}

#[test]
fn overlapping_markers_stack_into_lanes_per_side() {
    let markers = [
        MarkerElement::new("a", 500, MarkerPosition::AboveBar),
        MarkerElement::new("b", 500, MarkerPosition::AboveBar),
        MarkerElement::new("c", 500, MarkerPosition::BelowBar),
    ];
    let config = MarkerPlacementConfig::default();
    let placed = place_markers(&markers, &candles(), &transform(), config).expect("placement");

    let a = placed.iter().find(|m| m.id == "a").expect("a");
    let b = placed.iter().find(|m| m.id == "b").expect("b");
    let c = placed.iter().find(|m| m.id == "c").expect("c");

    assert_eq!(a.side, MarkerSide::Above);
    assert_eq!((a.lane, b.lane, c.lane), (0, 1, 0));
    // High 60 sits at y=200; lanes step upward away from the bar.
    assert_relative_eq!(a.y, 200.0 - config.vertical_offset_px);
    assert_relative_eq!(b.y, 200.0 - config.vertical_offset_px - 30.0);
    // Low 40 sits at y=300.
    assert_relative_eq!(c.y, 300.0 + config.vertical_offset_px);
}

#[test]
fn separated_markers_share_a_lane() {
    let markers = [
        MarkerElement::new("left", 400, MarkerPosition::AboveBar),
        MarkerElement::new("right", 500, MarkerPosition::AboveBar),
    ];
    let placed = place_markers(
        &markers,
        &candles(),
        &transform(),
        MarkerPlacementConfig::default(),
    )
    .expect("placement");
    assert!(placed.iter().all(|marker| marker.lane == 0));
}

#[test]
fn labels_widen_the_footprint_and_carry_text() {
    let markers = [
        MarkerElement::new("a", 500, MarkerPosition::AboveBar).with_text("BUY"),
        // 20px apart: clear of a bare marker, but inside the labelled span.
        MarkerElement::new("b", 520, MarkerPosition::AboveBar).with_text("BUY"),
    ];
    let placed = place_markers(
        &markers,
        &candles(),
        &transform(),
        MarkerPlacementConfig::default(),
    )
    .expect("placement");

    let label = placed[0].label.as_ref().expect("label");
    assert_eq!(label.text, "BUY");
    assert_relative_eq!(label.width_px, 3.0 * 7.0 + 2.0 * 6.0);
    assert_eq!(placed[1].lane, 1);
}

#[test]
fn markers_without_candles_are_skipped() {
    let markers = [MarkerElement::new("a", 500, MarkerPosition::InBar)];
    let placed = place_markers(&markers, &[], &transform(), MarkerPlacementConfig::default())
        .expect("placement");
    assert!(placed.is_empty());
}

#[test]
fn invalid_config_is_rejected() {
    let config = MarkerPlacementConfig {
        lane_gap_px: f64::NAN,
        ..MarkerPlacementConfig::default()
    };
    assert!(place_markers(&[], &candles(), &transform(), config).is_err());
}

#[test]
fn empty_text_places_a_bare_marker() {
    let markers = [MarkerElement::new("m", 500, MarkerPosition::AboveBar).with_text("")];
    let placed = place_markers(
        &markers,
        &candles(),
        &transform(),
        MarkerPlacementConfig::default(),
    )
    .expect("placement");
    assert_eq!(placed.len(), 1);
    assert!(placed[0].label.is_none());
}

#[test]
fn markers_outside_the_visible_range_are_skipped() {
    let markers = [
        MarkerElement::new("far-left", -5000, MarkerPosition::AboveBar),
        MarkerElement::new("far-right", 7000, MarkerPosition::BelowBar),
        MarkerElement::new("edge", 0, MarkerPosition::AboveBar).with_text("OPEN"),
    ];
    let placed = place_markers(
        &markers,
        &candles(),
        &transform(),
        MarkerPlacementConfig::default(),
    )
    .expect("placement");
    let ids: Vec<&str> = placed.iter().map(|marker| marker.id.as_str()).collect();
    assert_eq!(ids, ["edge"]);
    let label = placed[0].label.as_ref().expect("label");
    assert_relative_eq!(label.left_px, 0.0);
}
