//! CSV file series adapter.

use crate::domain::error::TsbatchError;
use crate::domain::raw_series::RawSeries;
use crate::ports::series_port::SeriesPort;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

pub struct CsvSeriesAdapter {
    base_path: PathBuf,
}

impl CsvSeriesAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, source: &str) -> PathBuf {
        let path = Path::new(source);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_path.join(path)
        }
    }
}

/// `YYYY-MM-DD`, or a timestamp whose date part is kept.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S")
                .ok()
                .map(|dt| dt.date())
        })
        .or_else(|| {
            DateTime::parse_from_rfc3339(value)
                .ok()
                .map(|dt| dt.date_naive())
        })
}

const MISSING_MARKERS: [&str; 4] = ["null", "nan", "na", "n/a"];

/// Empty cells, missing markers and non-finite numbers are missing observations.
fn parse_cell(value: &str) -> Result<Option<f64>, ()> {
    let value = value.trim();
    if value.is_empty()
        || MISSING_MARKERS
            .iter()
            .any(|m| value.eq_ignore_ascii_case(m))
    {
        return Ok(None);
    }
    let parsed = value.parse::<f64>().map_err(|_| ())?;
    Ok(parsed.is_finite().then_some(parsed))
}

impl SeriesPort for CsvSeriesAdapter {
    fn load(
        &self,
        source: &str,
        date_column: &str,
        value_column: &str,
    ) -> Result<RawSeries, TsbatchError> {
        let path = self.csv_path(source);
        let source_name = path.display().to_string();
        let content = fs::read_to_string(&path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => TsbatchError::FileNotFound {
                path: source_name.clone(),
            },
            _ => TsbatchError::Io(e),
        })?;

        let csv_err = |e: csv::Error| TsbatchError::Csv {
            source_name: source_name.clone(),
            reason: e.to_string(),
        };

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let headers: Vec<String> = rdr
            .headers()
            .map_err(csv_err)?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        let missing = |column: &str| TsbatchError::MissingColumn {
            source_name: source_name.clone(),
            column: column.to_string(),
        };
        let date_idx = headers
            .iter()
            .position(|h| h == date_column)
            .ok_or_else(|| missing(date_column))?;
        if !headers.iter().any(|h| h == value_column) {
            return Err(missing(value_column));
        }

        let value_indices: Vec<usize> = (0..headers.len()).filter(|i| *i != date_idx).collect();
        let columns = value_indices.iter().map(|&i| headers[i].clone()).collect();
        let mut raw = RawSeries::new(source_name.clone(), columns);

        for (n, result) in rdr.records().enumerate() {
            let record = result.map_err(csv_err)?;
            // Header is line 1.
            let row = n + 2;

            let date_str = record.get(date_idx).unwrap_or_default();
            let date = parse_date(date_str).ok_or_else(|| TsbatchError::DateParse {
                source_name: source_name.clone(),
                row,
                value: date_str.to_string(),
            })?;

            let mut values = Vec::with_capacity(value_indices.len());
            for &i in &value_indices {
                let cell = record.get(i).unwrap_or_default();
                let value = match parse_cell(cell) {
                    Ok(v) => v,
                    Err(()) if headers[i] == value_column => {
                        return Err(TsbatchError::ValueParse {
                            source_name: source_name.clone(),
                            row,
                            column: value_column.to_string(),
                            value: cell.to_string(),
                        });
                    }
                    Err(()) => None,
                };
                values.push(value);
            }
            raw.push(date, values);
        }

        debug!(source = %source_name, rows = raw.len(), "read csv series");
        Ok(raw)
    }
}
