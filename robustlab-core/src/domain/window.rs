//! Calendar date windows.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Inclusive calendar window `[start, end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Window of `lookback_days` calendar days ending at `as_of`.
    ///
    /// The start saturates at `NaiveDate::MIN` instead of overflowing.
    pub fn ending_at(as_of: NaiveDate, lookback_days: u32) -> Self {
        Self {
            start: as_of
                .checked_sub_signed(Duration::days(i64::from(lookback_days)))
                .unwrap_or(NaiveDate::MIN),
            end: as_of,
        }
    }

    /// Window of `days` calendar days starting at `start`.
    ///
    /// The end saturates at `NaiveDate::MAX` instead of overflowing.
    pub fn starting_at(start: NaiveDate, days: u32) -> Self {
        Self {
            start,
            end: start
                .checked_add_signed(Duration::days(i64::from(days)))
                .unwrap_or(NaiveDate::MAX),
        }
    }

    /// Literal calendar span in days (end - start). Never negative.
    pub fn calendar_days(&self) -> i64 {
        (self.end - self.start).num_days().max(0)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }
}

impl fmt::Display for DateWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", self.start, self.end)
    }
}
