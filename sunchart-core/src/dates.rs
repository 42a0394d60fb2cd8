//! Inclusive calendar date ranges and boundary date parsing.
//!
//! Dates arrive from the user as `MM-DD-YYYY` (or `MM/DD/YYYY`) strings and
//! are parsed once, up front, before any network activity.

use crate::error::SunchartError;
use chrono::NaiveDate;
use std::fmt;
use std::iter::FusedIterator;

/// Format accepted for user-supplied dates after slash normalization.
pub const INPUT_DATE_FORMAT: &str = "%m-%d-%Y";

/// Which end of the range a date string was given for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateBound {
    Start,
    End,
}

impl fmt::Display for DateBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DateBound::Start => write!(f, "start"),
            DateBound::End => write!(f, "end"),
        }
    }
}

/// Parse a boundary date in `MM-DD-YYYY` or `MM/DD/YYYY` form.
pub fn parse_input_date(input: &str, bound: DateBound) -> Result<NaiveDate, SunchartError> {
    let normalized = input.trim().replace('/', "-");
    NaiveDate::parse_from_str(&normalized, INPUT_DATE_FORMAT).map_err(|_| {
        SunchartError::DateFormat {
            bound,
            input: input.to_string(),
        }
    })
}

/// An inclusive range of calendar dates.
///
/// `start > end` is allowed and yields no dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Parse both bounds from user input. The start bound is checked first.
    pub fn parse(start: &str, end: &str) -> Result<Self, SunchartError> {
        let start = parse_input_date(start, DateBound::Start)?;
        let end = parse_input_date(end, DateBound::End)?;
        Ok(Self::new(start, end))
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Number of dates in the range, `(end - start).days + 1`, or 0 when reversed.
    pub fn len(&self) -> usize {
        if self.end < self.start {
            0
        } else {
            (self.end - self.start).num_days() as usize + 1
        }
    }

    pub fn is_empty(&self) -> bool {
        self.end < self.start
    }

    /// Iterate the dates in order. Each call starts from `start` again.
    pub fn iter(&self) -> DateRangeIter {
        DateRangeIter {
            next: (!self.is_empty()).then_some(self.start),
            end: self.end,
        }
    }
}

impl IntoIterator for DateRange {
    type Item = NaiveDate;
    type IntoIter = DateRangeIter;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl IntoIterator for &DateRange {
    type Item = NaiveDate;
    type IntoIter = DateRangeIter;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Lazy iterator over a [`DateRange`].
#[derive(Debug, Clone)]
pub struct DateRangeIter {
    next: Option<NaiveDate>,
    end: NaiveDate,
}

impl Iterator for DateRangeIter {
    type Item = NaiveDate;

    fn next(&mut self) -> Option<NaiveDate> {
        let current = self.next?;
        self.next = if current < self.end {
            current.succ_opt()
        } else {
            None
        };
        Some(current)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self
            .next
            .map(|d| (self.end - d).num_days() as usize + 1)
            .unwrap_or(0);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for DateRangeIter {}
impl FusedIterator for DateRangeIter {}

/// Enumerate `start..=end` day by day.
pub fn enumerate(start: NaiveDate, end: NaiveDate) -> DateRangeIter {
    DateRange::new(start, end).iter()
}
