//! Calendar normalization with forward-fill.
//!
//! A raw series is truncated to `[start, end]`, reindexed onto the full
//! calendar of the requested frequency, and gaps are filled from the nearest
//! earlier calendar point that holds a value. Observations dated off the
//! calendar (weekends under business-day frequency) are dropped by the
//! reindex and never feed the fill. Points before the first observation stay
//! unset.

use crate::domain::calendar::{calendar_points, Frequency};
use crate::domain::error::TsbatchError;
use crate::domain::raw_series::RawSeries;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// What to do with unset points ahead of the first observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LeadingGapPolicy {
    #[default]
    Fail,
    Trim,
}

impl FromStr for LeadingGapPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "fail" => Ok(LeadingGapPolicy::Fail),
            "trim" => Ok(LeadingGapPolicy::Trim),
            other => Err(format!(
                "unknown leading gap policy '{other}' (expected 'fail' or 'trim')"
            )),
        }
    }
}

impl fmt::Display for LeadingGapPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LeadingGapPolicy::Fail => f.write_str("fail"),
            LeadingGapPolicy::Trim => f.write_str("trim"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NormalizeConfig {
    pub date_column: String,
    pub value_column: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub frequency: Frequency,
    pub leading_gap: LeadingGapPolicy,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedSeries {
    pub dates: Vec<NaiveDate>,
    pub values: Vec<Option<f64>>,
}

impl NormalizedSeries {
    pub fn empty() -> Self {
        Self {
            dates: Vec::new(),
            values: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Number of unset points ahead of the first value.
    pub fn leading_gap(&self) -> usize {
        self.values.iter().take_while(|v| v.is_none()).count()
    }

    /// Plain values for numeric routines, with leading gaps handled per `policy`.
    pub fn dense(&self, policy: LeadingGapPolicy) -> Result<Vec<f64>, TsbatchError> {
        let gap = self.leading_gap();
        if gap > 0 && policy == LeadingGapPolicy::Fail {
            return Err(TsbatchError::InsufficientData {
                reason: format!(
                    "{gap} of {} calendar points precede the first observation (from {})",
                    self.len(),
                    self.dates[0]
                ),
            });
        }
        // Forward-fill leaves no gaps after the first value.
        Ok(self.values[gap..].iter().flatten().copied().collect())
    }
}

/// Reindex `raw`'s `value_column` onto the calendar of `frequency` in `[start, end]`.
pub fn normalize(
    raw: &RawSeries,
    value_column: &str,
    start: NaiveDate,
    end: NaiveDate,
    frequency: Frequency,
) -> Result<NormalizedSeries, TsbatchError> {
    let column = raw.column(value_column)?;
    if start > end {
        return Ok(NormalizedSeries::empty());
    }

    // Later rows overwrite earlier ones on duplicate dates.
    let observed: HashMap<NaiveDate, Option<f64>> = column
        .into_iter()
        .filter(|(date, _)| *date >= start && *date <= end)
        .collect();

    let dates = calendar_points(start, end, frequency);
    let mut values = Vec::with_capacity(dates.len());
    let mut last: Option<f64> = None;
    for date in &dates {
        // Non-finite values are gaps, not observations.
        if let Some(Some(v)) = observed.get(date) {
            if v.is_finite() {
                last = Some(*v);
            }
        }
        values.push(last);
    }

    if !dates.is_empty() && values.iter().all(Option::is_none) {
        return Err(TsbatchError::InsufficientData {
            reason: format!(
                "no '{value_column}' observations in {} between {start} and {end} ({frequency})",
                raw.source
            ),
        });
    }

    Ok(NormalizedSeries { dates, values })
}
