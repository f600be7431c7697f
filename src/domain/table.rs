//! Long-form result table: one row per aligned metric index per series.

use crate::domain::analysis::MetricSet;
use crate::domain::error::TsbatchError;

#[derive(Debug, Clone)]
pub struct MetricRow {
    pub label: String,
    pub values: Vec<f64>,
}

/// NaN marks an undefined metric value, so two NaN cells compare equal.
impl PartialEq for MetricRow {
    fn eq(&self, other: &Self) -> bool {
        self.label == other.label
            && self.values.len() == other.values.len()
            && self
                .values
                .iter()
                .zip(&other.values)
                .all(|(a, b)| a == b || (a.is_nan() && b.is_nan()))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CombinedTable {
    pub metric_names: Vec<String>,
    pub label_column: String,
    pub rows: Vec<MetricRow>,
}

impl CombinedTable {
    pub fn new(label_column: impl Into<String>) -> Self {
        Self {
            metric_names: Vec::new(),
            label_column: label_column.into(),
            rows: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Header row: metric names followed by the label column.
    pub fn header(&self) -> Vec<String> {
        let mut header = self.metric_names.clone();
        header.push(self.label_column.clone());
        header
    }

    /// Append one row per aligned index of `metrics`, tagged with `label`.
    ///
    /// The first appended set fixes the column names; later sets must match
    /// them exactly. Returns the number of rows appended.
    pub fn append(&mut self, label: &str, metrics: &MetricSet) -> Result<usize, TsbatchError> {
        let len = metrics.aligned_len()?;
        let names = metrics.names();
        if self.metric_names.is_empty() {
            self.metric_names = names;
        } else if self.metric_names != names {
            return Err(TsbatchError::MetricSchemaMismatch {
                expected: self.metric_names.clone(),
                actual: names,
            });
        }

        self.rows.reserve(len);
        for i in 0..len {
            self.rows.push(MetricRow {
                label: label.to_string(),
                values: metrics.metrics.iter().map(|m| m.values[i]).collect(),
            });
        }
        Ok(len)
    }

    /// Row counts per label, in first-appearance order.
    pub fn label_counts(&self) -> Vec<(String, usize)> {
        let mut counts: Vec<(String, usize)> = Vec::new();
        for row in &self.rows {
            match counts.last_mut() {
                Some((label, n)) if *label == row.label => *n += 1,
                _ => counts.push((row.label.clone(), 1)),
            }
        }
        counts
    }
}
