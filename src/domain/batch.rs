//! Multi-series batch statistics runner.
//!
//! Series are processed one at a time in input order:
//! load, normalize, analyze, then append to the combined table. The first
//! failure aborts the run and no table is returned, so callers never write
//! partial output.

use crate::domain::analysis::{Analysis, AnalysisParams};
use crate::domain::error::{Stage, TsbatchError};
use crate::domain::normalize::{normalize, NormalizeConfig};
use crate::domain::sources::SeriesSource;
use crate::domain::table::CombinedTable;
use crate::ports::series_port::SeriesPort;
use tracing::{debug, info};

pub const DEFAULT_LABEL_COLUMN: &str = "stock";

#[derive(Debug, Clone, PartialEq)]
pub struct BatchConfig {
    pub sources: Vec<SeriesSource>,
    pub normalize: NormalizeConfig,
    pub params: AnalysisParams,
    pub label_column: String,
}

/// Load, normalize and analyze one source into plain values for the analysis.
pub fn prepare_series(
    series_port: &dyn SeriesPort,
    source: &SeriesSource,
    config: &NormalizeConfig,
) -> Result<Vec<f64>, TsbatchError> {
    let raw = series_port
        .load(&source.path, &config.date_column, &config.value_column)
        .map_err(|e| e.in_series(&source.label, Stage::Load))?;
    debug!(label = %source.label, rows = raw.len(), "loaded raw series");

    let normalized = normalize(
        &raw,
        &config.value_column,
        config.start,
        config.end,
        config.frequency,
    )
    .and_then(|n| n.dense(config.leading_gap))
    .and_then(|values| {
        // An empty calendar (start after end) leaves nothing to analyze.
        if values.is_empty() {
            Err(TsbatchError::InsufficientData {
                reason: format!(
                    "no calendar points between {} and {}",
                    config.start, config.end
                ),
            })
        } else {
            Ok(values)
        }
    })
    .map_err(|e| e.in_series(&source.label, Stage::Normalize))?;
    debug!(label = %source.label, points = normalized.len(), "normalized series");

    Ok(normalized)
}

pub fn run_batch(
    config: &BatchConfig,
    series_port: &dyn SeriesPort,
    analysis: &dyn Analysis,
) -> Result<CombinedTable, TsbatchError> {
    let mut table = CombinedTable::new(config.label_column.clone());

    for source in &config.sources {
        let values = prepare_series(series_port, source, &config.normalize)?;

        let rows = analysis
            .analyze(&values, &config.params)
            .and_then(|metrics| table.append(&source.label, &metrics))
            .map_err(|e| e.in_series(&source.label, Stage::Analyze))?;

        info!(
            label = %source.label,
            points = values.len(),
            rows,
            analysis = analysis.name(),
            "series processed"
        );
    }

    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::analysis::{Metric, MetricSet};
    use crate::domain::calendar::Frequency;
    use crate::domain::normalize::LeadingGapPolicy;
    use crate::domain::raw_series::RawSeries;
    use chrono::NaiveDate;
    use std::cell::RefCell;
    use std::collections::HashMap;

    struct MapPort {
        series: HashMap<String, RawSeries>,
        calls: RefCell<Vec<String>>,
    }

    impl MapPort {
        fn new() -> Self {
            Self {
                series: HashMap::new(),
                calls: RefCell::new(Vec::new()),
            }
        }

        fn with(mut self, path: &str, points: &[(u32, f64)]) -> Self {
            let mut raw = RawSeries::new(path, vec!["Close".into()]);
            for (day, value) in points {
                raw.push(d(*day), vec![Some(*value)]);
            }
            self.series.insert(path.to_string(), raw);
            self
        }
    }

    impl SeriesPort for MapPort {
        fn load(&self, source: &str, _: &str, value_column: &str) -> Result<RawSeries, TsbatchError> {
            self.calls.borrow_mut().push(source.to_string());
            let raw = self
                .series
                .get(source)
                .cloned()
                .ok_or_else(|| TsbatchError::FileNotFound {
                    path: source.to_string(),
                })?;
            raw.column_index(value_column)?;
            Ok(raw)
        }
    }

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 4, day).unwrap()
    }

    fn config(sources: &[(&str, &str)]) -> BatchConfig {
        BatchConfig {
            sources: sources
                .iter()
                .map(|(p, l)| SeriesSource::new(*p, *l))
                .collect(),
            normalize: NormalizeConfig {
                date_column: "Date".into(),
                value_column: "Close".into(),
                start: d(10),
                end: d(12),
                frequency: Frequency::Daily,
                leading_gap: LeadingGapPolicy::Fail,
            },
            params: AnalysisParams::default(),
            label_column: DEFAULT_LABEL_COLUMN.into(),
        }
    }

    fn echo(series: &[f64], _: &AnalysisParams) -> Result<MetricSet, TsbatchError> {
        Ok(MetricSet::new(vec![
            Metric::new("value", series.to_vec()),
            Metric::new("double", series.iter().map(|v| v * 2.0).collect()),
        ]))
    }

    #[test]
    fn rows_are_tagged_and_ordered_by_input() {
        let port = MapPort::new()
            .with("a.csv", &[(10, 1.0), (11, 2.0), (12, 3.0)])
            .with("b.csv", &[(10, 7.0)]);
        let table = run_batch(&config(&[("a.csv", "A"), ("b.csv", "B")]), &port, &echo).unwrap();

        assert_eq!(table.len(), 6);
        assert_eq!(table.header(), vec!["value", "double", "stock"]);
        let labels: Vec<_> = table.rows.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, vec!["A", "A", "A", "B", "B", "B"]);
        assert_eq!(table.rows[3].values, vec![7.0, 14.0]);
        assert_eq!(table.rows[5].values, vec![7.0, 14.0]);
    }

    #[test]
    fn stops_at_first_failing_series() {
        let port = MapPort::new()
            .with("a.csv", &[(10, 1.0)])
            .with("c.csv", &[(10, 1.0)]);
        let err = run_batch(
            &config(&[("a.csv", "A"), ("missing.csv", "B"), ("c.csv", "C")]),
            &port,
            &echo,
        )
        .unwrap_err();

        match &err {
            TsbatchError::Series { label, stage, .. } => {
                assert_eq!(label, "B");
                assert_eq!(*stage, Stage::Load);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(matches!(err.root(), TsbatchError::FileNotFound { .. }));
        assert_eq!(*port.calls.borrow(), vec!["a.csv", "missing.csv"]);
    }

    #[test]
    fn mismatched_metric_lengths_abort_the_run() {
        let port = MapPort::new().with("a.csv", &[(10, 1.0)]);
        let bad = |series: &[f64], _: &AnalysisParams| {
            Ok::<_, TsbatchError>(MetricSet::new(vec![
                Metric::new("pe", series.to_vec()),
                Metric::new("fim", vec![0.0]),
            ]))
        };
        let err = run_batch(&config(&[("a.csv", "A")]), &port, &bad).unwrap_err();

        assert!(matches!(
            err,
            TsbatchError::Series {
                stage: Stage::Analyze,
                ..
            }
        ));
        assert!(matches!(err.root(), TsbatchError::MetricLengthMismatch { .. }));
    }

    #[test]
    fn leading_gap_fails_under_default_policy() {
        let port = MapPort::new().with("a.csv", &[(11, 1.0)]);
        let err = run_batch(&config(&[("a.csv", "A")]), &port, &echo).unwrap_err();
        assert!(matches!(
            err,
            TsbatchError::Series {
                stage: Stage::Normalize,
                ..
            }
        ));
        assert!(matches!(err.root(), TsbatchError::InsufficientData { .. }));
    }

    #[test]
    fn leading_gap_trimmed_when_configured() {
        let port = MapPort::new().with("a.csv", &[(11, 1.0)]);
        let mut cfg = config(&[("a.csv", "A")]);
        cfg.normalize.leading_gap = LeadingGapPolicy::Trim;
        let table = run_batch(&cfg, &port, &echo).unwrap();
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn reversed_range_is_insufficient_data() {
        let port = MapPort::new().with("a.csv", &[(10, 1.0)]);
        let mut cfg = config(&[("a.csv", "A")]);
        cfg.normalize.start = d(12);
        cfg.normalize.end = d(10);
        let err = run_batch(&cfg, &port, &echo).unwrap_err();
        assert!(matches!(err.root(), TsbatchError::InsufficientData { .. }));
        assert_eq!(err.exit_status(), 4);
    }

    #[test]
    fn empty_source_list_gives_empty_table() {
        let port = MapPort::new();
        let table = run_batch(&config(&[]), &port, &echo).unwrap();
        assert!(table.is_empty());
        assert_eq!(table.label_column, "stock");
    }
}
