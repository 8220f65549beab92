//! Pixel geometry extraction and cursor hit-testing for drawings.
//!
//! Every function short-circuits to `None` / `false` as soon as one
//! coordinate conversion fails; nothing here allocates for line-like types.

use serde::{Deserialize, Serialize};
use smallvec::{SmallVec, smallvec};

use crate::core::{CoordinateTransform, PixelPoint, Point, Viewport};
use crate::drawing::model::{AnchorAxes, Drawing, DrawingKind};

pub const DEFAULT_HIT_THRESHOLD_PX: f64 = 8.0;
pub const DEFAULT_HANDLE_RADIUS_PX: f64 = 6.0;

pub type PixelAnchors = SmallVec<[PixelPoint; 4]>;

/// Estimation of rendered label size from character count and font size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextMetrics {
    pub char_width_ratio: f64,
    pub line_height_ratio: f64,
}

impl Default for TextMetrics {
    fn default() -> Self {
        Self {
            char_width_ratio: 0.6,
            line_height_ratio: 1.2,
        }
    }
}

impl TextMetrics {
    /// Estimated `(width, height)` of a single-line label.
    #[must_use]
    pub fn label_size(self, label: &str, font_size: f64) -> (f64, f64) {
        let chars = label.chars().count().max(1) as f64;
        (
            chars * font_size * self.char_width_ratio,
            font_size * self.line_height_ratio,
        )
    }
}

/// Axis-aligned pixel rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PixelRect {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl PixelRect {
    #[must_use]
    pub fn from_corners(a: PixelPoint, b: PixelPoint) -> Self {
        Self {
            left: a.x.min(b.x),
            top: a.y.min(b.y),
            right: a.x.max(b.x),
            bottom: a.y.max(b.y),
        }
    }

    #[must_use]
    pub fn contains(self, point: PixelPoint) -> bool {
        point.x >= self.left && point.x <= self.right && point.y >= self.top && point.y <= self.bottom
    }

    #[must_use]
    pub fn width(self) -> f64 {
        self.right - self.left
    }

    #[must_use]
    pub fn height(self) -> f64 {
        self.bottom - self.top
    }

    /// Corners in handle order: top-left, top-right, bottom-right, bottom-left.
    #[must_use]
    pub fn corners(self) -> [PixelPoint; 4] {
        [
            PixelPoint::new(self.left, self.top),
            PixelPoint::new(self.right, self.top),
            PixelPoint::new(self.right, self.bottom),
            PixelPoint::new(self.left, self.bottom),
        ]
    }
}

/// Pixel segment between two points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PixelSegment {
    pub start: PixelPoint,
    pub end: PixelPoint,
}

impl PixelSegment {
    #[must_use]
    pub const fn new(start: PixelPoint, end: PixelPoint) -> Self {
        Self { start, end }
    }

    #[must_use]
    pub fn distance_to(self, point: PixelPoint) -> f64 {
        distance_to_segment(point, self.start, self.end)
    }
}

/// One horizontal ratio line of a fib drawing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FibLevelLine {
    pub ratio: f64,
    pub price: f64,
    pub line: PixelSegment,
}

/// Resolved pixel shape of a drawing for the current frame.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawingGeometry {
    /// `hline` spanning the full surface width.
    Horizontal(PixelSegment),
    /// `vline` spanning the full surface height.
    Vertical(PixelSegment),
    /// Line-like types after applying extensions; `arrow_head` marks `end`.
    Line {
        segment: PixelSegment,
        anchors: [PixelPoint; 2],
        arrow_head: bool,
    },
    Channel {
        first: PixelSegment,
        second: PixelSegment,
    },
    Box {
        rect: PixelRect,
        anchors: [PixelPoint; 2],
    },
    Fib {
        /// Vertical at the start anchor, spanning both anchor prices.
        anchor_line: PixelSegment,
        levels: SmallVec<[FibLevelLine; 8]>,
    },
    Text {
        anchor: PixelPoint,
        bounds: PixelRect,
    },
    Polyline(Vec<PixelPoint>),
}

/// Perpendicular distance from `point` to segment `a..b`, clamped to the segment.
#[must_use]
pub fn distance_to_segment(point: PixelPoint, a: PixelPoint, b: PixelPoint) -> f64 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let length_sq = dx * dx + dy * dy;
    if length_sq <= f64::EPSILON {
        return point.distance_to(a);
    }
    let t = (((point.x - a.x) * dx + (point.y - a.y) * dy) / length_sq).clamp(0.0, 1.0);
    point.distance_to(PixelPoint::new(a.x + t * dx, a.y + t * dy))
}

/// Even-odd point-in-polygon test.
#[must_use]
pub fn point_in_polygon(point: PixelPoint, polygon: &[PixelPoint]) -> bool {
    let mut inside = false;
    let mut j = polygon.len().wrapping_sub(1);
    for (i, current) in polygon.iter().enumerate() {
        let previous = polygon[j];
        if (current.y > point.y) != (previous.y > point.y) {
            let cross_x =
                (previous.x - current.x) * (point.y - current.y) / (previous.y - current.y)
                    + current.x;
            if point.x < cross_x {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// Pixel anchors in handle order, used to capture a move gesture.
///
/// Single-axis anchors (`hline`, `vline`) leave the unused axis at zero.
#[must_use]
pub fn pixel_anchors(kind: &DrawingKind, transform: &dyn CoordinateTransform) -> Option<PixelAnchors> {
    let axes = kind.anchor_axes();
    kind.anchors()
        .into_iter()
        .map(|anchor| anchor_to_pixel(anchor, axes, transform))
        .collect()
}

fn anchor_to_pixel(
    anchor: Point,
    axes: AnchorAxes,
    transform: &dyn CoordinateTransform,
) -> Option<PixelPoint> {
    match axes {
        AnchorAxes::Both => transform.point_to_pixel(anchor),
        AnchorAxes::PriceOnly => Some(PixelPoint::new(0.0, transform.price_to_pixel_y(anchor.price)?)),
        AnchorAxes::TimeOnly => Some(PixelPoint::new(transform.time_to_pixel_x(anchor.time)?, 0.0)),
    }
}

/// Converts pixel anchors back to domain anchors; fails if any conversion fails.
#[must_use]
pub fn domain_anchors(
    pixels: &[PixelPoint],
    axes: AnchorAxes,
    transform: &dyn CoordinateTransform,
) -> Option<SmallVec<[Point; 4]>> {
    pixels
        .iter()
        .map(|pixel| pixel_to_anchor(*pixel, axes, transform))
        .collect()
}

/// Converts one cursor position to a domain point along the axes `axes` uses.
#[must_use]
pub fn pixel_to_anchor(
    pixel: PixelPoint,
    axes: AnchorAxes,
    transform: &dyn CoordinateTransform,
) -> Option<Point> {
    match axes {
        AnchorAxes::Both => transform.pixel_to_point(pixel),
        AnchorAxes::PriceOnly => Some(Point::new(0, transform.pixel_y_to_price(pixel.y)?)),
        AnchorAxes::TimeOnly => Some(Point::new(transform.pixel_x_to_time(pixel.x)?, 0.0)),
    }
}

/// Extends the ray `origin -> through` past `through` until it leaves the viewport.
fn extend_to_edge(origin: PixelPoint, through: PixelPoint, viewport: Viewport) -> PixelPoint {
    let dx = through.x - origin.x;
    let dy = through.y - origin.y;
    if dx.abs() <= f64::EPSILON && dy.abs() <= f64::EPSILON {
        return through;
    }

    let mut t_exit = f64::INFINITY;
    if dx.abs() > f64::EPSILON {
        let edge = if dx > 0.0 { viewport.width_px() } else { 0.0 };
        t_exit = t_exit.min((edge - origin.x) / dx);
    }
    if dy.abs() > f64::EPSILON {
        let edge = if dy > 0.0 { viewport.height_px() } else { 0.0 };
        t_exit = t_exit.min((edge - origin.y) / dy);
    }
    // Never shorten the drawn segment.
    let t = t_exit.max(1.0);
    PixelPoint::new(origin.x + dx * t, origin.y + dy * t)
}

fn extended_segment(
    start: PixelPoint,
    end: PixelPoint,
    (extend_left, extend_right): (bool, bool),
    viewport: Viewport,
) -> PixelSegment {
    // "left"/"right" refer to screen order of the two anchors.
    let start_is_left = start.x <= end.x;
    let (mut left, mut right) = if start_is_left { (start, end) } else { (end, start) };
    let (orig_left, orig_right) = (left, right);
    if extend_right {
        right = extend_to_edge(orig_left, orig_right, viewport);
    }
    if extend_left {
        left = extend_to_edge(orig_right, orig_left, viewport);
    }
    if start_is_left {
        PixelSegment::new(left, right)
    } else {
        PixelSegment::new(right, left)
    }
}

fn ray_segment(start: PixelPoint, end: PixelPoint, extend_back: bool, viewport: Viewport) -> PixelSegment {
    let far = extend_to_edge(start, end, viewport);
    let near = if extend_back {
        extend_to_edge(end, start, viewport)
    } else {
        start
    };
    PixelSegment::new(near, far)
}

/// Resolves the full pixel shape of a drawing for this frame.
#[must_use]
pub fn drawing_geometry(
    drawing: &Drawing,
    transform: &dyn CoordinateTransform,
    metrics: TextMetrics,
) -> Option<DrawingGeometry> {
    let viewport = transform.viewport()?;
    let geometry = match &drawing.kind {
        DrawingKind::HLine { price } => {
            let y = transform.price_to_pixel_y(*price)?;
            DrawingGeometry::Horizontal(PixelSegment::new(
                PixelPoint::new(0.0, y),
                PixelPoint::new(viewport.width_px(), y),
            ))
        }
        DrawingKind::VLine { time } => {
            let x = transform.time_to_pixel_x(*time)?;
            DrawingGeometry::Vertical(PixelSegment::new(
                PixelPoint::new(x, 0.0),
                PixelPoint::new(x, viewport.height_px()),
            ))
        }
        DrawingKind::Ray { start, end } => {
            let a = transform.point_to_pixel(*start)?;
            let b = transform.point_to_pixel(*end)?;
            DrawingGeometry::Line {
                segment: ray_segment(a, b, drawing.extend_left, viewport),
                anchors: [a, b],
                arrow_head: false,
            }
        }
        DrawingKind::TrendLine { start, end }
        | DrawingKind::Arrow { start, end }
        | DrawingKind::ExtendedLine { start, end }
        | DrawingKind::Ruler { start, end } => {
            let a = transform.point_to_pixel(*start)?;
            let b = transform.point_to_pixel(*end)?;
            DrawingGeometry::Line {
                segment: extended_segment(a, b, drawing.extension(), viewport),
                anchors: [a, b],
                arrow_head: matches!(drawing.kind, DrawingKind::Arrow { .. }),
            }
        }
        DrawingKind::Channel { start, end, offset } => {
            let a = transform.point_to_pixel(*start)?;
            let b = transform.point_to_pixel(*end)?;
            let c = transform.point_to_pixel(Point::new(start.time, start.price + offset))?;
            let d = transform.point_to_pixel(Point::new(end.time, end.price + offset))?;
            DrawingGeometry::Channel {
                first: PixelSegment::new(a, b),
                second: PixelSegment::new(c, d),
            }
        }
        DrawingKind::Rectangle { start, end } | DrawingKind::Measure { start, end } => {
            let a = transform.point_to_pixel(*start)?;
            let b = transform.point_to_pixel(*end)?;
            DrawingGeometry::Box {
                rect: PixelRect::from_corners(a, b),
                anchors: [a, b],
            }
        }
        DrawingKind::Fib { start, end, levels } => {
            let a = transform.point_to_pixel(*start)?;
            let b = transform.point_to_pixel(*end)?;
            let (left, right) = (a.x.min(b.x), a.x.max(b.x));
            let mut lines = SmallVec::<[FibLevelLine; 8]>::new();
            for ratio in levels {
                let price = fib_level_price(*start, *end, *ratio);
                let y = transform.price_to_pixel_y(price)?;
                lines.push(FibLevelLine {
                    ratio: *ratio,
                    price,
                    line: PixelSegment::new(PixelPoint::new(left, y), PixelPoint::new(right, y)),
                });
            }
            DrawingGeometry::Fib {
                anchor_line: PixelSegment::new(a, PixelPoint::new(a.x, b.y)),
                levels: lines,
            }
        }
        DrawingKind::Text {
            point,
            label,
            font_size,
        } => {
            let anchor = transform.point_to_pixel(*point)?;
            let (width, height) = metrics.label_size(label, *font_size);
            // Anchor sits on the label's left baseline.
            DrawingGeometry::Text {
                anchor,
                bounds: PixelRect {
                    left: anchor.x,
                    top: anchor.y - height,
                    right: anchor.x + width,
                    bottom: anchor.y,
                },
            }
        }
        DrawingKind::Brush { points } => {
            if points.len() < 2 {
                return None;
            }
            let pixels = points
                .iter()
                .map(|point| transform.point_to_pixel(*point))
                .collect::<Option<Vec<_>>>()?;
            DrawingGeometry::Polyline(pixels)
        }
    };
    Some(geometry)
}

/// Price of fib ratio `ratio`, measured from `start` towards `end`.
#[must_use]
pub fn fib_level_price(start: Point, end: Point, ratio: f64) -> f64 {
    start.price + (end.price - start.price) * ratio
}

impl DrawingGeometry {
    /// `true` when `cursor` is within `threshold` pixels of the shape.
    #[must_use]
    pub fn hit(&self, cursor: PixelPoint, threshold: f64) -> bool {
        match self {
            Self::Horizontal(segment) | Self::Vertical(segment) => {
                segment.distance_to(cursor) <= threshold
            }
            Self::Line { segment, .. } => segment.distance_to(cursor) <= threshold,
            Self::Channel { first, second } => {
                if first.distance_to(cursor) <= threshold || second.distance_to(cursor) <= threshold
                {
                    return true;
                }
                let quad = [first.start, first.end, second.end, second.start];
                point_in_polygon(cursor, &quad)
            }
            Self::Box { rect, .. } => rect.contains(cursor),
            Self::Fib {
                anchor_line,
                levels,
            } => {
                anchor_line.distance_to(cursor) <= threshold
                    || levels
                        .iter()
                        .any(|level| level.line.distance_to(cursor) <= threshold)
            }
            Self::Text { bounds, .. } => bounds.contains(cursor),
            Self::Polyline(points) => points
                .windows(2)
                .any(|pair| distance_to_segment(cursor, pair[0], pair[1]) <= threshold),
        }
    }
}

/// Resize handles in index order for the drawing's type.
///
/// Box types expose corners `0=TL, 1=TR, 2=BR, 3=BL`; channels add the start
/// of the parallel line as handle `2`; brushes have no handles.
#[must_use]
pub fn resize_handles(drawing: &Drawing, transform: &dyn CoordinateTransform) -> Option<PixelAnchors> {
    let viewport = transform.viewport()?;
    let handles = match &drawing.kind {
        DrawingKind::HLine { price } => smallvec![PixelPoint::new(
            viewport.width_px() * 0.5,
            transform.price_to_pixel_y(*price)?
        )],
        DrawingKind::VLine { time } => smallvec![PixelPoint::new(
            transform.time_to_pixel_x(*time)?,
            viewport.height_px() * 0.5
        )],
        DrawingKind::Rectangle { start, end } | DrawingKind::Measure { start, end } => {
            let rect = PixelRect::from_corners(
                transform.point_to_pixel(*start)?,
                transform.point_to_pixel(*end)?,
            );
            rect.corners().into_iter().collect()
        }
        DrawingKind::Channel { start, end, offset } => smallvec![
            transform.point_to_pixel(*start)?,
            transform.point_to_pixel(*end)?,
            transform.point_to_pixel(Point::new(start.time, start.price + offset))?,
        ],
        DrawingKind::Brush { .. } => SmallVec::new(),
        other => pixel_anchors(other, transform)?,
    };
    Some(handles)
}

/// Index of the resize handle under `cursor`, if any.
#[must_use]
pub fn handle_at(
    drawing: &Drawing,
    transform: &dyn CoordinateTransform,
    cursor: PixelPoint,
    radius: f64,
) -> Option<usize> {
    resize_handles(drawing, transform)?
        .iter()
        .position(|handle| handle.distance_to(cursor) <= radius)
}

/// Stateless hit-tester configured with threshold and text metrics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HitTester {
    pub threshold_px: f64,
    pub text_metrics: TextMetrics,
}

impl Default for HitTester {
    fn default() -> Self {
        Self {
            threshold_px: DEFAULT_HIT_THRESHOLD_PX,
            text_metrics: TextMetrics::default(),
        }
    }
}

impl HitTester {
    #[must_use]
    pub fn new(threshold_px: f64) -> Self {
        Self {
            threshold_px,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn hit(&self, drawing: &Drawing, transform: &dyn CoordinateTransform, cursor: PixelPoint) -> bool {
        drawing_geometry(drawing, transform, self.text_metrics)
            .is_some_and(|geometry| geometry.hit(cursor, self.threshold_px))
    }

    /// Index of the topmost (last) visible drawing under the cursor.
    #[must_use]
    pub fn topmost(
        &self,
        drawings: &[Drawing],
        transform: &dyn CoordinateTransform,
        cursor: PixelPoint,
    ) -> Option<usize> {
        drawings
            .iter()
            .rposition(|drawing| drawing.visible && self.hit(drawing, transform, cursor))
    }
}
