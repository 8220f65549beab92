use serde::{Deserialize, Serialize};
use smallvec::{SmallVec, smallvec};

use crate::core::{LineStyle, Point};
use crate::error::{AnnotationError, AnnotationResult};

pub const DEFAULT_DRAWING_COLOR: &str = "#2962ff";
pub const DEFAULT_FIB_LEVELS: [f64; 7] = [0.0, 0.236, 0.382, 0.5, 0.618, 0.786, 1.0];

/// Tag of the 13 drawing variants, as used on the wire and by drawing tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DrawingType {
    HLine,
    VLine,
    TrendLine,
    Ray,
    Arrow,
    ExtendedLine,
    Channel,
    Rectangle,
    Fib,
    Measure,
    Text,
    Ruler,
    Brush,
}

impl DrawingType {
    /// Anchors a placement gesture needs before the drawing exists.
    ///
    /// `None` means open-ended (brush strokes end explicitly).
    #[must_use]
    pub fn placement_points(self) -> Option<usize> {
        match self {
            Self::HLine | Self::VLine | Self::Text => Some(1),
            Self::Brush => None,
            _ => Some(2),
        }
    }

    /// Two-point line types honoring `extendLeft` / `extendRight`.
    #[must_use]
    pub fn supports_extension(self) -> bool {
        matches!(
            self,
            Self::TrendLine | Self::Ray | Self::Arrow | Self::ExtendedLine
        )
    }

    /// Area types honoring `fillColor` / `fillOpacity`.
    #[must_use]
    pub fn supports_fill(self) -> bool {
        matches!(
            self,
            Self::Rectangle | Self::Channel | Self::Fib | Self::Measure
        )
    }
}

/// Which domain axes a drawing's anchors carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnchorAxes {
    Both,
    PriceOnly,
    TimeOnly,
}

/// Per-variant geometry. Serialized with a `type` tag next to the common fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum DrawingKind {
    HLine {
        price: f64,
    },
    VLine {
        time: i64,
    },
    TrendLine {
        start: Point,
        end: Point,
    },
    Ray {
        start: Point,
        end: Point,
    },
    Arrow {
        start: Point,
        end: Point,
    },
    ExtendedLine {
        start: Point,
        end: Point,
    },
    Channel {
        start: Point,
        end: Point,
        offset: f64,
    },
    Rectangle {
        start: Point,
        end: Point,
    },
    Fib {
        start: Point,
        end: Point,
        levels: Vec<f64>,
    },
    Measure {
        start: Point,
        end: Point,
    },
    #[serde(rename_all = "camelCase")]
    Text {
        point: Point,
        label: String,
        font_size: f64,
    },
    Ruler {
        start: Point,
        end: Point,
    },
    Brush {
        points: Vec<Point>,
    },
}

impl DrawingKind {
    #[must_use]
    pub fn drawing_type(&self) -> DrawingType {
        match self {
            Self::HLine { .. } => DrawingType::HLine,
            Self::VLine { .. } => DrawingType::VLine,
            Self::TrendLine { .. } => DrawingType::TrendLine,
            Self::Ray { .. } => DrawingType::Ray,
            Self::Arrow { .. } => DrawingType::Arrow,
            Self::ExtendedLine { .. } => DrawingType::ExtendedLine,
            Self::Channel { .. } => DrawingType::Channel,
            Self::Rectangle { .. } => DrawingType::Rectangle,
            Self::Fib { .. } => DrawingType::Fib,
            Self::Measure { .. } => DrawingType::Measure,
            Self::Text { .. } => DrawingType::Text,
            Self::Ruler { .. } => DrawingType::Ruler,
            Self::Brush { .. } => DrawingType::Brush,
        }
    }

    /// Builds the geometry for a completed placement gesture.
    ///
    /// Returns `None` when `points` does not match what the type needs.
    #[must_use]
    pub fn from_placement(
        drawing_type: DrawingType,
        points: &[Point],
        defaults: &PlacementDefaults,
    ) -> Option<Self> {
        let first = *points.first()?;
        let two = || -> Option<(Point, Point)> {
            match points {
                [start, end] => Some((*start, *end)),
                _ => None,
            }
        };
        let kind = match drawing_type {
            DrawingType::HLine => Self::HLine { price: first.price },
            DrawingType::VLine => Self::VLine { time: first.time },
            DrawingType::Text => Self::Text {
                point: first,
                label: defaults.text_label.clone(),
                font_size: defaults.font_size,
            },
            DrawingType::Brush => {
                if points.len() < 2 {
                    return None;
                }
                Self::Brush {
                    points: points.to_vec(),
                }
            }
            DrawingType::TrendLine => {
                let (start, end) = two()?;
                Self::TrendLine { start, end }
            }
            DrawingType::Ray => {
                let (start, end) = two()?;
                Self::Ray { start, end }
            }
            DrawingType::Arrow => {
                let (start, end) = two()?;
                Self::Arrow { start, end }
            }
            DrawingType::ExtendedLine => {
                let (start, end) = two()?;
                Self::ExtendedLine { start, end }
            }
            DrawingType::Channel => {
                let (start, end) = two()?;
                Self::Channel {
                    start,
                    end,
                    offset: defaults.channel_offset,
                }
            }
            DrawingType::Rectangle => {
                let (start, end) = two()?;
                Self::Rectangle { start, end }
            }
            DrawingType::Fib => {
                let (start, end) = two()?;
                Self::Fib {
                    start,
                    end,
                    levels: defaults.fib_levels.clone(),
                }
            }
            DrawingType::Measure => {
                let (start, end) = two()?;
                Self::Measure { start, end }
            }
            DrawingType::Ruler => {
                let (start, end) = two()?;
                Self::Ruler { start, end }
            }
        };
        Some(kind)
    }

    #[must_use]
    pub fn anchor_axes(&self) -> AnchorAxes {
        match self {
            Self::HLine { .. } => AnchorAxes::PriceOnly,
            Self::VLine { .. } => AnchorAxes::TimeOnly,
            _ => AnchorAxes::Both,
        }
    }

    /// Domain anchors in handle order. Single-axis types fill the unused axis
    /// with zero.
    #[must_use]
    pub fn anchors(&self) -> SmallVec<[Point; 4]> {
        match self {
            Self::HLine { price } => smallvec![Point::new(0, *price)],
            Self::VLine { time } => smallvec![Point::new(*time, 0.0)],
            Self::TrendLine { start, end }
            | Self::Ray { start, end }
            | Self::Arrow { start, end }
            | Self::ExtendedLine { start, end }
            | Self::Channel { start, end, .. }
            | Self::Rectangle { start, end }
            | Self::Fib { start, end, .. }
            | Self::Measure { start, end }
            | Self::Ruler { start, end } => smallvec![*start, *end],
            Self::Text { point, .. } => smallvec![*point],
            Self::Brush { points } => points.iter().copied().collect(),
        }
    }

    /// Overwrites every anchor at once; `anchors` must match [`Self::anchors`].
    pub fn set_anchors(&mut self, anchors: &[Point]) -> AnnotationResult<()> {
        let expected = self.anchors().len();
        if anchors.len() != expected {
            return Err(AnnotationError::InvalidData(format!(
                "expected {expected} anchors, got {}",
                anchors.len()
            )));
        }
        for (index, anchor) in anchors.iter().enumerate() {
            self.set_anchor(index, *anchor);
        }
        Ok(())
    }

    /// Assigns one anchor by index. Returns `false` for unknown indices.
    pub fn set_anchor(&mut self, index: usize, point: Point) -> bool {
        match self {
            Self::HLine { price } if index == 0 => {
                *price = point.price;
                true
            }
            Self::VLine { time } if index == 0 => {
                *time = point.time;
                true
            }
            Self::Text { point: anchor, .. } if index == 0 => {
                *anchor = point;
                true
            }
            Self::TrendLine { start, end }
            | Self::Ray { start, end }
            | Self::Arrow { start, end }
            | Self::ExtendedLine { start, end }
            | Self::Channel { start, end, .. }
            | Self::Rectangle { start, end }
            | Self::Fib { start, end, .. }
            | Self::Measure { start, end }
            | Self::Ruler { start, end } => match index {
                0 => {
                    *start = point;
                    true
                }
                1 => {
                    *end = point;
                    true
                }
                _ => false,
            },
            Self::Brush { points } => match points.get_mut(index) {
                Some(slot) => {
                    *slot = point;
                    true
                }
                None => false,
            },
            _ => false,
        }
    }

    /// Applies a resize handle drag: `point` is the cursor in domain space.
    ///
    /// Corner handles on box types use the screen order `0=TL, 1=TR, 2=BR,
    /// 3=BL`; the channel's handle `2` moves the parallel line.
    pub fn resize_handle(&mut self, handle: usize, point: Point) -> bool {
        match self {
            Self::Rectangle { start, end } | Self::Measure { start, end } => {
                resize_corner(start, end, handle, point)
            }
            Self::Channel { start, offset, .. } if handle == 2 => {
                *offset = point.price - start.price;
                true
            }
            Self::Brush { .. } => false,
            _ => self.set_anchor(handle, point),
        }
    }

    fn validate(&self) -> AnnotationResult<()> {
        for anchor in self.anchors() {
            anchor.validate()?;
        }
        match self {
            Self::Channel { offset, .. } if !offset.is_finite() => Err(
                AnnotationError::InvalidData("channel offset must be finite".to_owned()),
            ),
            Self::Fib { levels, .. } if levels.iter().any(|level| !level.is_finite()) => Err(
                AnnotationError::InvalidData("fib levels must be finite".to_owned()),
            ),
            Self::Text { font_size, .. } if !font_size.is_finite() || *font_size <= 0.0 => Err(
                AnnotationError::InvalidData("text font size must be finite and > 0".to_owned()),
            ),
            Self::Brush { points } if points.is_empty() => Err(AnnotationError::InvalidData(
                "brush stroke needs at least one point".to_owned(),
            )),
            _ => Ok(()),
        }
    }
}

fn resize_corner(start: &mut Point, end: &mut Point, handle: usize, point: Point) -> bool {
    let (is_left, is_top) = match handle {
        0 => (true, true),
        1 => (false, true),
        2 => (false, false),
        3 => (true, false),
        _ => return false,
    };

    // Keep the drawing's own orientation: edit whichever anchor owns the edge.
    let start_owns_x = if is_left {
        start.time <= end.time
    } else {
        start.time > end.time
    };
    if start_owns_x {
        start.time = point.time;
    } else {
        end.time = point.time;
    }

    let start_owns_y = if is_top {
        start.price >= end.price
    } else {
        start.price < end.price
    };
    if start_owns_y {
        start.price = point.price;
    } else {
        end.price = point.price;
    }
    true
}

/// Stroke settings shared by every drawing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawingStyle {
    pub color: String,
    pub line_width: f64,
    #[serde(default)]
    pub line_style: LineStyle,
}

impl Default for DrawingStyle {
    fn default() -> Self {
        Self {
            color: DEFAULT_DRAWING_COLOR.to_owned(),
            line_width: 1.0,
            line_style: LineStyle::Solid,
        }
    }
}

/// Values applied to drawings created by placement gestures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PlacementDefaults {
    pub style: DrawingStyle,
    pub text_label: String,
    pub font_size: f64,
    pub channel_offset: f64,
    pub fib_levels: Vec<f64>,
}

impl Default for PlacementDefaults {
    fn default() -> Self {
        Self {
            style: DrawingStyle::default(),
            text_label: "Text".to_owned(),
            font_size: 14.0,
            channel_offset: 0.0,
            fib_levels: DEFAULT_FIB_LEVELS.to_vec(),
        }
    }
}

/// User-placed chart annotation: common fields plus a per-type payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Drawing {
    pub id: String,
    #[serde(flatten)]
    pub kind: DrawingKind,
    #[serde(flatten)]
    pub style: DrawingStyle,
    #[serde(default)]
    pub locked: bool,
    #[serde(default = "default_visible")]
    pub visible: bool,
    #[serde(default)]
    pub extend_left: bool,
    #[serde(default)]
    pub extend_right: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill_opacity: Option<f64>,
}

fn default_visible() -> bool {
    true
}

impl Drawing {
    #[must_use]
    pub fn new(id: impl Into<String>, kind: DrawingKind) -> Self {
        Self {
            id: id.into(),
            kind,
            style: DrawingStyle::default(),
            locked: false,
            visible: true,
            extend_left: false,
            extend_right: false,
            fill_color: None,
            fill_opacity: None,
        }
    }

    #[must_use]
    pub fn with_style(mut self, style: DrawingStyle) -> Self {
        self.style = style;
        self
    }

    #[must_use]
    pub fn with_extension(mut self, extend_left: bool, extend_right: bool) -> Self {
        self.extend_left = extend_left;
        self.extend_right = extend_right;
        self
    }

    #[must_use]
    pub fn with_fill(mut self, color: impl Into<String>, opacity: f64) -> Self {
        self.fill_color = Some(color.into());
        self.fill_opacity = Some(opacity);
        self
    }

    #[must_use]
    pub fn locked(mut self) -> Self {
        self.locked = true;
        self
    }

    #[must_use]
    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    #[must_use]
    pub fn drawing_type(&self) -> DrawingType {
        self.kind.drawing_type()
    }

    #[must_use]
    pub fn anchors(&self) -> SmallVec<[Point; 4]> {
        self.kind.anchors()
    }

    pub fn set_anchor(&mut self, index: usize, point: Point) -> bool {
        self.kind.set_anchor(index, point)
    }

    /// Moves the drawing as a whole to `anchors`, given in [`Self::anchors`] order.
    pub fn translate_to(&mut self, anchors: &[Point]) -> AnnotationResult<()> {
        self.kind.set_anchors(anchors)
    }

    /// Effective `(left, right)` extension flags for this drawing's type.
    #[must_use]
    pub fn extension(&self) -> (bool, bool) {
        match self.drawing_type() {
            DrawingType::Ray => (self.extend_left, true),
            DrawingType::ExtendedLine => (true, true),
            t if t.supports_extension() => (self.extend_left, self.extend_right),
            _ => (false, false),
        }
    }

    /// Fill color and opacity when the type supports area fills.
    #[must_use]
    pub fn fill(&self) -> Option<(&str, f64)> {
        if !self.drawing_type().supports_fill() {
            return None;
        }
        let color = self.fill_color.as_deref()?;
        Some((color, self.fill_opacity.unwrap_or(0.2).clamp(0.0, 1.0)))
    }

    pub fn validate(&self) -> AnnotationResult<()> {
        if self.id.is_empty() {
            return Err(AnnotationError::InvalidData(
                "drawing id must not be empty".to_owned(),
            ));
        }
        if !self.style.line_width.is_finite() || self.style.line_width <= 0.0 {
            return Err(AnnotationError::InvalidData(
                "drawing line width must be finite and > 0".to_owned(),
            ));
        }
        if let Some(opacity) = self.fill_opacity {
            if !opacity.is_finite() {
                return Err(AnnotationError::InvalidData(
                    "fill opacity must be finite".to_owned(),
                ));
            }
        }
        self.kind.validate()
    }
}

/// Summary shown by `measure` and `ruler` drawings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MeasureStats {
    pub price_change: f64,
    /// `None` when the start price is zero.
    pub percent_change: Option<f64>,
    pub time_span_seconds: i64,
    /// `None` without a known bar interval.
    pub bar_count: Option<i64>,
}

impl MeasureStats {
    #[must_use]
    pub fn between(start: Point, end: Point, bar_interval: Option<i64>) -> Self {
        let price_change = end.price - start.price;
        let percent_change = (start.price != 0.0).then(|| price_change * 100.0 / start.price);
        let time_span_seconds = end.time.saturating_sub(start.time);
        let bar_count = bar_interval
            .filter(|interval| *interval > 0)
            .map(|interval| time_span_seconds / interval);
        Self {
            price_change,
            percent_change,
            time_span_seconds,
            bar_count,
        }
    }

    /// Compact label, e.g. `+10.00 (+5.00%) 12 bars`.
    #[must_use]
    pub fn label(&self) -> String {
        let mut text = format!("{:+.2}", self.price_change);
        if let Some(percent) = self.percent_change {
            text.push_str(&format!(" ({percent:+.2}%)"));
        }
        match self.bar_count {
            Some(bars) => text.push_str(&format!(" {bars} bars")),
            None => text.push_str(&format!(" {}s", self.time_span_seconds)),
        }
        text
    }
}
