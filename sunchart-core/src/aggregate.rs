//! Turns localized instants into chart rows.

use crate::timezone::LocalizedInstant;
use chrono::{NaiveDate, Timelike};
use serde::Serialize;

pub const SECONDS_PER_DAY: u32 = 86_400;

/// One chart point: a local calendar date and a local time of day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AggregatedRow {
    pub date: NaiveDate,
    /// In `[0, 86399]`.
    pub seconds_since_midnight: u32,
}

impl AggregatedRow {
    pub fn from_localized(localized: &LocalizedInstant) -> Self {
        let time = localized.time();
        Self {
            date: localized.date(),
            seconds_since_midnight: time.hour() * 3600 + time.minute() * 60 + time.second(),
        }
    }

    /// `HH:MM:SS` rendering of the time of day.
    pub fn time_of_day(&self) -> String {
        format_hms(self.seconds_since_midnight)
    }
}

/// One row per input, in input order. No filtering, deduplication or sorting.
pub fn aggregate(localized: &[LocalizedInstant]) -> Vec<AggregatedRow> {
    localized.iter().map(AggregatedRow::from_localized).collect()
}

/// Format seconds since midnight as `HH:MM:SS`, wrapping at one day.
pub fn format_hms(seconds: u32) -> String {
    let s = seconds % SECONDS_PER_DAY;
    format!("{:02}:{:02}:{:02}", s / 3600, (s % 3600) / 60, s % 60)
}
