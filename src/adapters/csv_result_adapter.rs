//! CSV output for combined tables and normalized series.
//!
//! Output is serialized in memory, written to a temporary sibling file and
//! renamed into place, so a failed write never leaves a truncated result.

use crate::domain::error::TsbatchError;
use crate::domain::normalize::NormalizedSeries;
use crate::domain::table::{CombinedTable, MetricRow};
use crate::ports::result_port::ResultPort;
use std::fs;
use std::path::Path;
use tracing::debug;

#[derive(Debug, Default)]
pub struct CsvResultAdapter;

impl CsvResultAdapter {
    pub fn new() -> Self {
        Self
    }

    /// Serialize a table to CSV bytes: header, then one line per row.
    /// Undefined (NaN) metric values are written as empty cells.
    pub fn to_bytes(table: &CombinedTable) -> Result<Vec<u8>, TsbatchError> {
        let mut wtr = csv::Writer::from_writer(Vec::new());
        wtr.write_record(table.header()).map_err(serialize_err)?;
        for row in &table.rows {
            let mut record: Vec<String> = row
                .values
                .iter()
                .map(|v| if v.is_nan() { String::new() } else { v.to_string() })
                .collect();
            record.push(row.label.clone());
            wtr.write_record(&record).map_err(serialize_err)?;
        }
        wtr.into_inner().map_err(|e| TsbatchError::Write {
            path: "<memory>".into(),
            reason: e.to_string(),
        })
    }

    /// `Date,<value_column>` rows; unset points are empty cells.
    pub fn normalized_to_bytes(
        series: &NormalizedSeries,
        value_column: &str,
    ) -> Result<Vec<u8>, TsbatchError> {
        let mut wtr = csv::Writer::from_writer(Vec::new());
        wtr.write_record(["Date", value_column])
            .map_err(serialize_err)?;
        for (date, value) in series.dates.iter().zip(&series.values) {
            let cell = value.map(|v| v.to_string()).unwrap_or_default();
            wtr.write_record([date.format("%Y-%m-%d").to_string(), cell])
                .map_err(serialize_err)?;
        }
        wtr.into_inner().map_err(|e| TsbatchError::Write {
            path: "<memory>".into(),
            reason: e.to_string(),
        })
    }

    pub fn write_normalized(
        &self,
        series: &NormalizedSeries,
        value_column: &str,
        path: &Path,
    ) -> Result<(), TsbatchError> {
        let bytes = Self::normalized_to_bytes(series, value_column)?;
        write_atomic(path, &bytes)
    }

    /// Read a table written by [`ResultPort::write`]. `label_column` names the
    /// label column; every other column is a metric.
    pub fn read(path: &Path, label_column: &str) -> Result<CombinedTable, TsbatchError> {
        let source_name = path.display().to_string();
        let csv_err = |e: csv::Error| TsbatchError::Csv {
            source_name: source_name.clone(),
            reason: e.to_string(),
        };

        let mut rdr = csv::Reader::from_path(path).map_err(|e| match e.kind() {
            csv::ErrorKind::Io(io) if io.kind() == std::io::ErrorKind::NotFound => {
                TsbatchError::FileNotFound {
                    path: source_name.clone(),
                }
            }
            _ => csv_err(e),
        })?;
        let headers: Vec<String> = rdr.headers().map_err(csv_err)?.iter().map(String::from).collect();
        let label_idx = headers
            .iter()
            .position(|h| h == label_column)
            .ok_or_else(|| TsbatchError::MissingColumn {
                source_name: source_name.clone(),
                column: label_column.to_string(),
            })?;

        let mut table = CombinedTable::new(label_column);
        table.metric_names = headers
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != label_idx)
            .map(|(_, h)| h.clone())
            .collect();

        for (n, result) in rdr.records().enumerate() {
            let record = result.map_err(csv_err)?;
            let mut values = Vec::with_capacity(table.metric_names.len());
            for (i, cell) in record.iter().enumerate() {
                if i == label_idx {
                    continue;
                }
                let value = if cell.trim().is_empty() {
                    f64::NAN
                } else {
                    cell.parse::<f64>().map_err(|_| TsbatchError::ValueParse {
                        source_name: source_name.clone(),
                        row: n + 2,
                        column: headers[i].clone(),
                        value: cell.to_string(),
                    })?
                };
                values.push(value);
            }
            table.rows.push(MetricRow {
                label: record.get(label_idx).unwrap_or_default().to_string(),
                values,
            });
        }
        Ok(table)
    }
}

fn serialize_err(e: csv::Error) -> TsbatchError {
    TsbatchError::Write {
        path: "<memory>".into(),
        reason: e.to_string(),
    }
}

/// Write `bytes` to a temporary file next to `path`, then rename over `path`.
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), TsbatchError> {
    let write_err = |e: std::io::Error| TsbatchError::Write {
        path: path.display().to_string(),
        reason: e.to_string(),
    };

    let file_name = path
        .file_name()
        .ok_or_else(|| TsbatchError::Write {
            path: path.display().to_string(),
            reason: "destination is not a file path".into(),
        })?
        .to_string_lossy();
    let tmp = path.with_file_name(format!(".{file_name}.tmp"));

    if let Err(e) = fs::write(&tmp, bytes).and_then(|()| fs::rename(&tmp, path)) {
        let _ = fs::remove_file(&tmp);
        return Err(write_err(e));
    }
    debug!(path = %path.display(), bytes = bytes.len(), "wrote file");
    Ok(())
}

impl ResultPort for CsvResultAdapter {
    fn write(&self, table: &CombinedTable, path: &Path) -> Result<(), TsbatchError> {
        let bytes = Self::to_bytes(table)?;
        write_atomic(path, &bytes)
    }
}
