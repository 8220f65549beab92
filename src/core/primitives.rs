use chrono::{DateTime, NaiveDate, Timelike, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use crate::error::{AnnotationError, AnnotationResult};

pub fn decimal_to_f64(value: Decimal, field_name: &str) -> AnnotationResult<f64> {
    value.to_f64().ok_or_else(|| {
        AnnotationError::InvalidData(format!("{field_name} cannot be represented as f64"))
    })
}

#[must_use]
pub fn datetime_to_unix_seconds(time: DateTime<Utc>) -> i64 {
    time.timestamp()
}

/// UTC calendar date of a unix timestamp, `None` when out of chrono's range.
#[must_use]
pub fn utc_date(time: i64) -> Option<NaiveDate> {
    DateTime::<Utc>::from_timestamp(time, 0).map(|dt| dt.date_naive())
}

/// UTC wall-clock `(hour, minute, second)` of a unix timestamp.
#[must_use]
pub fn utc_wall_clock(time: i64) -> Option<(u32, u32, u32)> {
    DateTime::<Utc>::from_timestamp(time, 0).map(|dt| (dt.hour(), dt.minute(), dt.second()))
}
