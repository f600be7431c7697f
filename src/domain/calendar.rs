//! Fixed-frequency calendars.

use chrono::{Datelike, NaiveDate, Weekday};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Frequency {
    /// Monday through Friday. Exchange holidays are not removed.
    #[default]
    BusinessDay,
    /// Every calendar day.
    Daily,
}

impl Frequency {
    pub fn includes(&self, date: NaiveDate) -> bool {
        match self {
            Frequency::Daily => true,
            Frequency::BusinessDay => !matches!(date.weekday(), Weekday::Sat | Weekday::Sun),
        }
    }
}

impl FromStr for Frequency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "b" | "business" | "business_day" | "businessday" => Ok(Frequency::BusinessDay),
            "d" | "daily" | "calendar" => Ok(Frequency::Daily),
            other => Err(format!(
                "unknown frequency '{other}' (expected 'business' or 'daily')"
            )),
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Frequency::BusinessDay => f.write_str("business"),
            Frequency::Daily => f.write_str("daily"),
        }
    }
}

/// Every point of `frequency` in `[start, end]`, both ends inclusive.
/// Empty when `start > end`.
pub fn calendar_points(start: NaiveDate, end: NaiveDate, frequency: Frequency) -> Vec<NaiveDate> {
    if start > end {
        return Vec::new();
    }
    start
        .iter_days()
        .take_while(|d| *d <= end)
        .filter(|d| frequency.includes(*d))
        .collect()
}
