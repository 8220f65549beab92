use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use crate::core::{Candle, CoordinateTransform};
use crate::error::{AnnotationError, AnnotationResult};
use crate::script::model::{MarkerElement, MarkerPosition};

/// Side of the bar a marker stacks away from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MarkerSide {
    Above,
    Below,
    Center,
}

impl From<MarkerPosition> for MarkerSide {
    fn from(position: MarkerPosition) -> Self {
        match position {
            MarkerPosition::AboveBar => Self::Above,
            MarkerPosition::BelowBar => Self::Below,
            MarkerPosition::InBar => Self::Center,
        }
    }
}

/// Pixel metrics for marker glyphs, labels and lane stacking.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MarkerPlacementConfig {
    pub marker_size_px: f64,
    pub label_char_width_px: f64,
    pub label_height_px: f64,
    pub label_horizontal_padding_px: f64,
    pub marker_label_gap_px: f64,
    pub lane_gap_px: f64,
    pub min_horizontal_gap_px: f64,
    pub vertical_offset_px: f64,
}

impl Default for MarkerPlacementConfig {
    fn default() -> Self {
        Self {
            marker_size_px: 8.0,
            label_char_width_px: 7.0,
            label_height_px: 14.0,
            label_horizontal_padding_px: 6.0,
            marker_label_gap_px: 4.0,
            lane_gap_px: 4.0,
            min_horizontal_gap_px: 2.0,
            vertical_offset_px: 6.0,
        }
    }
}

impl MarkerPlacementConfig {
    pub fn validate(self) -> AnnotationResult<Self> {
        let named = [
            ("marker_size_px", self.marker_size_px),
            ("label_char_width_px", self.label_char_width_px),
            ("label_height_px", self.label_height_px),
            ("label_horizontal_padding_px", self.label_horizontal_padding_px),
            ("marker_label_gap_px", self.marker_label_gap_px),
            ("lane_gap_px", self.lane_gap_px),
            ("min_horizontal_gap_px", self.min_horizontal_gap_px),
            ("vertical_offset_px", self.vertical_offset_px),
        ];
        match named
            .iter()
            .find(|(_, value)| !value.is_finite() || *value <= 0.0)
        {
            Some((name, _)) => Err(AnnotationError::InvalidData(format!(
                "marker config `{name}` must be finite and > 0"
            ))),
            None => Ok(self),
        }
    }

    /// Vertical distance between two stacked lanes: glyph, gap, label, gap.
    fn lane_step(self) -> f64 {
        self.marker_size_px + self.marker_label_gap_px + self.label_height_px + self.lane_gap_px
    }

    fn label_width(self, text: &str) -> f64 {
        text.chars().count() as f64 * self.label_char_width_px
            + 2.0 * self.label_horizontal_padding_px
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerLabelGeometry {
    pub text: String,
    pub left_px: f64,
    pub top_px: f64,
    pub width_px: f64,
    pub height_px: f64,
}

/// Marker resolved to pixels for one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacedMarker {
    pub id: String,
    pub time: i64,
    /// Candle price the marker hangs off (high, low or close).
    pub price: f64,
    pub side: MarkerSide,
    pub lane: usize,
    pub x: f64,
    pub y: f64,
    pub label: Option<MarkerLabelGeometry>,
}

/// Projects script markers next to their nearest candle and stacks
/// overlapping ones into lanes.
///
/// Placement order is stable by x, then marker id. Markers that cannot be
/// projected this frame (no candles, off-surface, unresolved scale) are
/// skipped. Only an invalid `config` is an error.
pub fn place_markers(
    markers: &[MarkerElement],
    candles: &[Candle],
    transform: &dyn CoordinateTransform,
    config: MarkerPlacementConfig,
) -> AnnotationResult<Vec<PlacedMarker>> {
    let config = config.validate()?;
    let Some(viewport) = transform.viewport() else {
        return Ok(Vec::new());
    };
    let width = viewport.width_px();

    let mut projected: Vec<Projected<'_>> = markers
        .iter()
        .enumerate()
        .filter_map(|(order, marker)| {
            let candle = nearest_candle(candles, marker.time)?;
            let price = match marker.position {
                MarkerPosition::AboveBar => candle.high,
                MarkerPosition::BelowBar => candle.low,
                MarkerPosition::InBar => candle.close,
            };
            let bar_y = transform.price_to_pixel_y(price)?;
            let label_width = marker
                .text
                .as_deref()
                .filter(|text| !text.is_empty())
                .map(|text| config.label_width(text));
            let footprint = Footprint::new(
                transform.time_to_pixel_x(marker.time)?,
                config.marker_size_px.max(label_width.unwrap_or(0.0)),
                width,
            )?;
            Some(Projected {
                order,
                marker,
                price,
                bar_y,
                footprint,
                label_width,
            })
        })
        .collect();

    projected.sort_by(|a, b| {
        OrderedFloat(a.footprint.x)
            .cmp(&OrderedFloat(b.footprint.x))
            .then_with(|| a.marker.id.cmp(&b.marker.id))
            .then_with(|| a.order.cmp(&b.order))
    });

    let mut lanes = SideLanes::new(config.min_horizontal_gap_px);
    Ok(projected
        .into_iter()
        .map(|item| {
            let side = MarkerSide::from(item.marker.position);
            let lane = lanes.side(side).claim(item.footprint);
            let y = lane_y(side, item.bar_y, lane, config);
            let label = item
                .marker
                .text
                .as_ref()
                .zip(item.label_width)
                .map(|(text, label_width)| MarkerLabelGeometry {
                    text: text.clone(),
                    left_px: item.footprint.x - 0.5 * label_width,
                    top_px: label_top(side, y, config),
                    width_px: label_width,
                    height_px: config.label_height_px,
                });
            PlacedMarker {
                id: item.marker.id.clone(),
                time: item.marker.time,
                price: item.price,
                side,
                lane,
                x: item.footprint.x,
                y,
                label,
            }
        })
        .collect())
}

#[derive(Debug)]
struct Projected<'a> {
    order: usize,
    marker: &'a MarkerElement,
    price: f64,
    bar_y: f64,
    footprint: Footprint,
    label_width: Option<f64>,
}

/// Horizontal extent of a marker and its label, kept inside the viewport.
#[derive(Debug, Clone, Copy)]
struct Footprint {
    x: f64,
    half_width: f64,
}

impl Footprint {
    /// `None` when the anchor itself lies outside `[0, viewport_width]`.
    fn new(raw_x: f64, width: f64, viewport_width: f64) -> Option<Self> {
        if !(0.0..=viewport_width).contains(&raw_x) {
            return None;
        }
        let half_width = 0.5 * width;
        let x = if viewport_width <= width {
            0.5 * viewport_width
        } else {
            raw_x.clamp(half_width, viewport_width - half_width)
        };
        Some(Self { x, half_width })
    }

    fn left(self) -> f64 {
        self.x - self.half_width
    }

    fn right(self) -> f64 {
        self.x + self.half_width
    }
}

/// Right edge of the last footprint per lane; first lane with room wins.
#[derive(Debug)]
struct LaneStack {
    right_edges: Vec<f64>,
    min_gap: f64,
}

impl LaneStack {
    fn claim(&mut self, footprint: Footprint) -> usize {
        let free = self
            .right_edges
            .iter()
            .position(|edge| footprint.left() >= edge + self.min_gap);
        match free {
            Some(lane) => {
                self.right_edges[lane] = footprint.right();
                lane
            }
            None => {
                self.right_edges.push(footprint.right());
                self.right_edges.len() - 1
            }
        }
    }
}

#[derive(Debug)]
struct SideLanes {
    above: LaneStack,
    below: LaneStack,
    center: LaneStack,
}

impl SideLanes {
    fn new(min_gap: f64) -> Self {
        let stack = || LaneStack {
            right_edges: Vec::new(),
            min_gap,
        };
        Self {
            above: stack(),
            below: stack(),
            center: stack(),
        }
    }

    fn side(&mut self, side: MarkerSide) -> &mut LaneStack {
        match side {
            MarkerSide::Above => &mut self.above,
            MarkerSide::Below => &mut self.below,
            MarkerSide::Center => &mut self.center,
        }
    }
}

fn nearest_candle(candles: &[Candle], time: i64) -> Option<&Candle> {
    candles
        .iter()
        .filter(|candle| candle.is_finite())
        .min_by_key(|candle| candle.time.abs_diff(time))
}

fn lane_y(side: MarkerSide, bar_y: f64, lane: usize, config: MarkerPlacementConfig) -> f64 {
    let stacked = lane as f64 * config.lane_step();
    match side {
        MarkerSide::Above => bar_y - config.vertical_offset_px - stacked,
        MarkerSide::Below => bar_y + config.vertical_offset_px + stacked,
        MarkerSide::Center => bar_y + stacked,
    }
}

/// Labels sit outside the glyph: above it for `Above`, below otherwise.
fn label_top(side: MarkerSide, y: f64, config: MarkerPlacementConfig) -> f64 {
    let glyph_half = 0.5 * config.marker_size_px;
    match side {
        MarkerSide::Above => y - glyph_half - config.marker_label_gap_px - config.label_height_px,
        MarkerSide::Below | MarkerSide::Center => y + glyph_half + config.marker_label_gap_px,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn footprint(x: f64, half_width: f64) -> Footprint {
        Footprint { x, half_width }
    }

    #[test]
    fn lanes_reuse_the_first_slot_with_enough_gap() {
        let mut lanes = LaneStack {
            right_edges: Vec::new(),
            min_gap: 2.0,
        };
        assert_eq!(lanes.claim(footprint(5.0, 5.0)), 0);
        assert_eq!(lanes.claim(footprint(10.0, 5.0)), 1);
        assert_eq!(lanes.claim(footprint(16.0, 4.0)), 0);
    }

    #[test]
    fn footprint_wider_than_viewport_centers() {
        let wide = Footprint::new(10.0, 120.0, 100.0).expect("on surface");
        assert_eq!(wide.x, 50.0);
        let edge = Footprint::new(2.0, 10.0, 100.0).expect("on surface");
        assert_eq!(edge.left(), 0.0);
    }

    #[test]
    fn footprint_anchored_off_surface_is_dropped() {
        assert!(Footprint::new(-0.5, 10.0, 100.0).is_none());
        assert!(Footprint::new(100.5, 10.0, 100.0).is_none());
        assert!(Footprint::new(f64::NAN, 10.0, 100.0).is_none());
    }
}
