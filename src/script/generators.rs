//! Pure generators turning a candle series into script elements.
//!
//! Generators never fail: empty, short or malformed input yields an empty
//! contribution.

use std::collections::{BTreeMap, HashSet};

use chrono::NaiveDate;
use tracing::trace;

use crate::core::Candle;
use crate::core::primitives::{utc_date, utc_wall_clock};
use crate::script::model::{HLineElement, PrevDayLevelsConfig, SessionVlinesConfig, VLineElement};

/// One vline per candle whose UTC wall clock reads `hour:minute`; seconds
/// are ignored.
///
/// At most one vline is emitted per timestamp.
#[must_use]
pub fn session_vlines(
    script_id: &str,
    config: &SessionVlinesConfig,
    candles: &[Candle],
) -> Vec<VLineElement> {
    if config.hour >= 24 || config.minute >= 60 {
        trace!(hour = config.hour, minute = config.minute, "session time out of range");
        return Vec::new();
    }

    let mut seen = HashSet::new();
    candles
        .iter()
        .filter(|candle| {
            utc_wall_clock(candle.time)
                .is_some_and(|(hour, minute, _)| (hour, minute) == (config.hour, config.minute))
        })
        .filter(|candle| seen.insert(candle.time))
        .map(|candle| VLineElement {
            id: format!(
                "{script_id}-session-{:02}{:02}-{}",
                config.hour, config.minute, candle.time
            ),
            time: candle.time,
            label: config.label.clone(),
            color: config.color.clone(),
            line_style: config.style.unwrap_or_default(),
        })
        .collect()
}

/// Open/high/low/close of one UTC calendar day.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DayLevels {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

#[derive(Debug, Clone, Copy)]
struct DayAccumulator {
    first_time: i64,
    last_time: i64,
    levels: DayLevels,
}

/// Groups candles by UTC date, skipping candles with non-finite prices.
#[must_use]
pub fn daily_levels(candles: &[Candle]) -> Vec<DayLevels> {
    let mut days: BTreeMap<NaiveDate, DayAccumulator> = BTreeMap::new();
    for candle in candles.iter().filter(|candle| candle.is_finite()) {
        let Some(date) = utc_date(candle.time) else {
            continue;
        };
        days.entry(date)
            .and_modify(|day| {
                day.levels.high = day.levels.high.max(candle.high);
                day.levels.low = day.levels.low.min(candle.low);
                if candle.time < day.first_time {
                    day.first_time = candle.time;
                    day.levels.open = candle.open;
                }
                if candle.time >= day.last_time {
                    day.last_time = candle.time;
                    day.levels.close = candle.close;
                }
            })
            .or_insert(DayAccumulator {
                first_time: candle.time,
                last_time: candle.time,
                levels: DayLevels {
                    date,
                    open: candle.open,
                    high: candle.high,
                    low: candle.low,
                    close: candle.close,
                },
            });
    }
    days.into_values().map(|day| day.levels).collect()
}

/// PDH/PDL/PDO/PDC levels of the most recent completed UTC day.
///
/// The last day in the series is treated as in progress, so fewer than two
/// distinct days emit nothing.
#[must_use]
pub fn prev_day_levels(
    script_id: &str,
    config: &PrevDayLevelsConfig,
    candles: &[Candle],
) -> Vec<HLineElement> {
    let days = daily_levels(candles);
    let Some(previous) = days.len().checked_sub(2).and_then(|index| days.get(index)) else {
        return Vec::new();
    };

    [
        ("pdh", "PDH", previous.high),
        ("pdl", "PDL", previous.low),
        ("pdo", "PDO", previous.open),
        ("pdc", "PDC", previous.close),
    ]
    .into_iter()
    .map(|(suffix, label, price)| HLineElement {
        id: format!("{script_id}-{suffix}"),
        price,
        label: Some(label.to_owned()),
        color: config.color.clone(),
        line_style: config.style.unwrap_or_default(),
    })
    .collect()
}
