#![allow(dead_code)]

use chrono::NaiveDate;
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tsbatch::domain::analysis::{AnalysisParams, Metric, MetricSet};
use tsbatch::domain::batch::BatchConfig;
use tsbatch::domain::calendar::Frequency;
use tsbatch::domain::error::TsbatchError;
use tsbatch::domain::normalize::{LeadingGapPolicy, NormalizeConfig};
use tsbatch::domain::raw_series::RawSeries;
use tsbatch::domain::sources::SeriesSource;
use tsbatch::domain::table::CombinedTable;
use tsbatch::ports::result_port::ResultPort;
use tsbatch::ports::series_port::SeriesPort;

pub struct MockSeriesPort {
    pub data: HashMap<String, RawSeries>,
    pub errors: HashMap<String, String>,
    pub loads: RefCell<Vec<String>>,
}

impl MockSeriesPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
            loads: RefCell::new(Vec::new()),
        }
    }

    pub fn with_closes(mut self, source: &str, points: &[(&str, f64)]) -> Self {
        let mut raw = RawSeries::new(source, vec!["Close".into()]);
        for (d, close) in points {
            raw.push(date_str(d), vec![Some(*close)]);
        }
        self.data.insert(source.to_string(), raw);
        self
    }

    pub fn with_raw(mut self, source: &str, raw: RawSeries) -> Self {
        self.data.insert(source.to_string(), raw);
        self
    }

    pub fn with_error(mut self, source: &str, reason: &str) -> Self {
        self.errors.insert(source.to_string(), reason.to_string());
        self
    }
}

impl SeriesPort for MockSeriesPort {
    fn load(
        &self,
        source: &str,
        _date_column: &str,
        value_column: &str,
    ) -> Result<RawSeries, TsbatchError> {
        self.loads.borrow_mut().push(source.to_string());
        if let Some(reason) = self.errors.get(source) {
            return Err(TsbatchError::Csv {
                source_name: source.to_string(),
                reason: reason.clone(),
            });
        }
        let raw = self
            .data
            .get(source)
            .cloned()
            .ok_or_else(|| TsbatchError::FileNotFound {
                path: source.to_string(),
            })?;
        raw.column_index(value_column)?;
        Ok(raw)
    }
}

/// Records every write instead of touching the filesystem.
pub struct RecordingResultPort {
    pub writes: RefCell<Vec<(PathBuf, CombinedTable)>>,
}

impl RecordingResultPort {
    pub fn new() -> Self {
        Self {
            writes: RefCell::new(Vec::new()),
        }
    }
}

impl ResultPort for RecordingResultPort {
    fn write(&self, table: &CombinedTable, path: &Path) -> Result<(), TsbatchError> {
        self.writes
            .borrow_mut()
            .push((path.to_path_buf(), table.clone()));
        Ok(())
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn date_str(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

pub fn normalize_config(start: &str, end: &str, frequency: Frequency) -> NormalizeConfig {
    NormalizeConfig {
        date_column: "Date".into(),
        value_column: "Close".into(),
        start: date_str(start),
        end: date_str(end),
        frequency,
        leading_gap: LeadingGapPolicy::Fail,
    }
}

pub fn batch_config(sources: &[(&str, &str)], normalize: NormalizeConfig) -> BatchConfig {
    BatchConfig {
        sources: sources
            .iter()
            .map(|(path, label)| SeriesSource::new(*path, *label))
            .collect(),
        normalize,
        params: AnalysisParams::default(),
        label_column: "stock".into(),
    }
}

/// One row per input point with two metrics: the value and its running index.
pub fn pe_fim_fake(series: &[f64], _params: &AnalysisParams) -> Result<MetricSet, TsbatchError> {
    Ok(MetricSet::new(vec![
        Metric::new("pe", series.to_vec()),
        Metric::new("fim", (0..series.len()).map(|i| i as f64).collect()),
    ]))
}

/// Returns sequences of different lengths.
pub fn mismatched_fake(series: &[f64], _params: &AnalysisParams) -> Result<MetricSet, TsbatchError> {
    Ok(MetricSet::new(vec![
        Metric::new("pe", series.to_vec()),
        Metric::new("fim", vec![0.0; series.len() + 1]),
    ]))
}

/// Writes a CSV price file with `Date,Close` columns.
pub fn write_close_csv(dir: &Path, name: &str, points: &[(&str, f64)]) -> PathBuf {
    let mut content = String::from("Date,Open,High,Low,Close,Adj Close,Volume\n");
    for (d, close) in points {
        content.push_str(&format!("{d},{close},{close},{close},{close},{close},1000\n"));
    }
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}
