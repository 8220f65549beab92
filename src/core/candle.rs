use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::core::primitives::{datetime_to_unix_seconds, decimal_to_f64};
use crate::error::{AnnotationError, AnnotationResult};

/// OHLCV candle consumed by chart-script generators.
///
/// Fields stay public so hosts can hand over raw feeds; generators skip
/// candles that fail [`Candle::is_finite`] instead of rejecting the series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub time: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    #[serde(default)]
    pub volume: f64,
}

impl Candle {
    /// Builds a validated candle.
    ///
    /// Invariants:
    /// - all prices and volume are finite, volume is non-negative
    /// - `low <= high`
    /// - `open` and `close` are within `[low, high]`
    pub fn new(
        time: i64,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
    ) -> AnnotationResult<Self> {
        let candle = Self {
            time,
            open,
            high,
            low,
            close,
            volume,
        };

        if !candle.is_finite() {
            return Err(AnnotationError::InvalidData(
                "candle values must be finite".to_owned(),
            ));
        }
        if volume < 0.0 {
            return Err(AnnotationError::InvalidData(
                "candle volume must be >= 0".to_owned(),
            ));
        }
        if low > high {
            return Err(AnnotationError::InvalidData(
                "candle low must be <= high".to_owned(),
            ));
        }
        if open < low || open > high || close < low || close > high {
            return Err(AnnotationError::InvalidData(
                "candle open/close must be within low/high range".to_owned(),
            ));
        }

        Ok(candle)
    }

    /// Converts strongly-typed temporal/decimal input into a validated candle.
    pub fn from_decimal_time(
        time: DateTime<Utc>,
        open: Decimal,
        high: Decimal,
        low: Decimal,
        close: Decimal,
        volume: Decimal,
    ) -> AnnotationResult<Self> {
        Self::new(
            datetime_to_unix_seconds(time),
            decimal_to_f64(open, "open")?,
            decimal_to_f64(high, "high")?,
            decimal_to_f64(low, "low")?,
            decimal_to_f64(close, "close")?,
            decimal_to_f64(volume, "volume")?,
        )
    }

    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.open.is_finite()
            && self.high.is_finite()
            && self.low.is_finite()
            && self.close.is_finite()
            && self.volume.is_finite()
    }
}

/// Smallest positive spacing between consecutive candles, used as bar interval.
#[must_use]
pub fn infer_bar_interval(candles: &[Candle]) -> Option<i64> {
    candles
        .windows(2)
        .map(|pair| pair[1].time.saturating_sub(pair[0].time))
        .filter(|delta| *delta > 0)
        .min()
}
