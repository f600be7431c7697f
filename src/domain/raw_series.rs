//! Raw price series as read from a source, before calendar alignment.

use crate::domain::error::TsbatchError;
use chrono::NaiveDate;

/// One source row: its date and one optional value per numeric column.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRow {
    pub date: NaiveDate,
    pub values: Vec<Option<f64>>,
}

/// Rows in source order. Not sorted and not deduplicated.
#[derive(Debug, Clone, PartialEq)]
pub struct RawSeries {
    pub source: String,
    pub columns: Vec<String>,
    pub rows: Vec<RawRow>,
}

impl RawSeries {
    pub fn new(source: impl Into<String>, columns: Vec<String>) -> Self {
        Self {
            source: source.into(),
            columns,
            rows: Vec::new(),
        }
    }

    pub fn push(&mut self, date: NaiveDate, values: Vec<Option<f64>>) {
        self.rows.push(RawRow { date, values });
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, column: &str) -> Result<usize, TsbatchError> {
        self.columns
            .iter()
            .position(|c| c == column)
            .ok_or_else(|| TsbatchError::MissingColumn {
                source_name: self.source.clone(),
                column: column.to_string(),
            })
    }

    /// (date, value) pairs for one column, in source order.
    pub fn column(&self, column: &str) -> Result<Vec<(NaiveDate, Option<f64>)>, TsbatchError> {
        let idx = self.column_index(column)?;
        Ok(self
            .rows
            .iter()
            .map(|row| (row.date, row.values.get(idx).copied().flatten()))
            .collect())
    }
}
