use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::core::primitives::{datetime_to_unix_seconds, decimal_to_f64};
use crate::error::{AnnotationError, AnnotationResult};

/// Drawable area of the chart surface in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    #[must_use]
    pub fn is_valid(self) -> bool {
        self.width > 0 && self.height > 0
    }

    #[must_use]
    pub fn width_px(self) -> f64 {
        f64::from(self.width)
    }

    #[must_use]
    pub fn height_px(self) -> f64 {
        f64::from(self.height)
    }

    #[must_use]
    pub fn contains(self, point: PixelPoint) -> bool {
        (0.0..=self.width_px()).contains(&point.x) && (0.0..=self.height_px()).contains(&point.y)
    }
}

/// Domain coordinate: unix seconds on the time axis, price on the value axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub time: i64,
    pub price: f64,
}

impl Point {
    #[must_use]
    pub const fn new(time: i64, price: f64) -> Self {
        Self { time, price }
    }

    pub fn from_decimal_time(time: DateTime<Utc>, price: Decimal) -> AnnotationResult<Self> {
        let price = decimal_to_f64(price, "price")?;
        Ok(Self {
            time: datetime_to_unix_seconds(time),
            price,
        })
    }

    pub fn validate(self) -> AnnotationResult<Self> {
        if !self.price.is_finite() {
            return Err(AnnotationError::InvalidData(
                "point price must be finite".to_owned(),
            ));
        }
        Ok(self)
    }
}

/// Pixel coordinate on the chart surface (origin top-left, y grows downwards).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PixelPoint {
    pub x: f64,
    pub y: f64,
}

impl PixelPoint {
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    #[must_use]
    pub fn offset(self, dx: f64, dy: f64) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    #[must_use]
    pub fn distance_to(self, other: Self) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Visible time window reported by the chart surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VisibleRange {
    pub from: f64,
    pub to: f64,
}

impl VisibleRange {
    #[must_use]
    pub const fn new(from: f64, to: f64) -> Self {
        Self { from, to }
    }

    #[must_use]
    pub fn span(self) -> f64 {
        self.to - self.from
    }
}

/// Stroke pattern shared by drawings, script elements and native series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineStyle {
    #[default]
    Solid,
    Dashed,
    Dotted,
}

/// One `(time, value)` sample of a derived series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesSample {
    pub time: i64,
    pub value: f64,
}

impl SeriesSample {
    #[must_use]
    pub const fn new(time: i64, value: f64) -> Self {
        Self { time, value }
    }
}
