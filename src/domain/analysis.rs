//! Pluggable per-series analysis routines.
//!
//! The batch runner treats an analysis as a black box: a numeric sequence
//! plus [`AnalysisParams`] in, a set of named metric sequences out. Entropy
//! and bootstrap routines live outside this crate and plug in through
//! [`Analysis`]. [`WindowedMoments`] is the built-in routine.

use crate::domain::error::TsbatchError;
use crate::domain::stats::moments;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnalysisParams {
    /// Points per block.
    pub block_length: usize,
    /// Fraction of a block shared with the next one, in `[0, 1)`.
    pub overlap: f64,
    /// Resample count for bootstrap-style routines.
    pub sample_size: usize,
    /// Embedding dimension for ordinal-pattern routines.
    pub embedding_dimension: usize,
}

impl Default for AnalysisParams {
    fn default() -> Self {
        Self {
            block_length: 10,
            overlap: 0.1,
            sample_size: 100,
            embedding_dimension: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Metric {
    pub name: String,
    pub values: Vec<f64>,
}

impl Metric {
    pub fn new(name: impl Into<String>, values: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }
}

/// Named metric sequences in a fixed column order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MetricSet {
    pub metrics: Vec<Metric>,
}

impl MetricSet {
    pub fn new(metrics: Vec<Metric>) -> Self {
        Self { metrics }
    }

    pub fn names(&self) -> Vec<String> {
        self.metrics.iter().map(|m| m.name.clone()).collect()
    }

    /// Common length of all sequences. Fails if any two differ.
    pub fn aligned_len(&self) -> Result<usize, TsbatchError> {
        let first = self.metrics.first().ok_or(TsbatchError::EmptyMetricSet)?;
        let expected = first.values.len();
        for metric in &self.metrics[1..] {
            if metric.values.len() != expected {
                return Err(TsbatchError::MetricLengthMismatch {
                    expected_metric: first.name.clone(),
                    expected,
                    metric: metric.name.clone(),
                    actual: metric.values.len(),
                });
            }
        }
        Ok(expected)
    }
}

pub trait Analysis {
    fn name(&self) -> &str;

    fn analyze(&self, series: &[f64], params: &AnalysisParams) -> Result<MetricSet, TsbatchError>;
}

impl<F> Analysis for F
where
    F: Fn(&[f64], &AnalysisParams) -> Result<MetricSet, TsbatchError>,
{
    fn name(&self) -> &str {
        "custom"
    }

    fn analyze(&self, series: &[f64], params: &AnalysisParams) -> Result<MetricSet, TsbatchError> {
        self(series, params)
    }
}

/// Mean, standard deviation, skewness and excess kurtosis per block.
///
/// Blocks hold `block_length` points and advance by
/// `max(1, round(block_length * (1 - overlap)))`. A trailing partial block is
/// dropped, so a series shorter than one block yields empty sequences.
#[derive(Debug, Clone, Copy, Default)]
pub struct WindowedMoments;

impl WindowedMoments {
    pub const NAME: &'static str = "moments";

    pub fn step(params: &AnalysisParams) -> usize {
        let step = (params.block_length as f64 * (1.0 - params.overlap)).round() as usize;
        step.max(1)
    }
}

impl Analysis for WindowedMoments {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn analyze(&self, series: &[f64], params: &AnalysisParams) -> Result<MetricSet, TsbatchError> {
        if params.block_length == 0 {
            return Err(TsbatchError::Analysis {
                reason: "block_length must be at least 1".into(),
            });
        }
        let step = Self::step(params);

        let mut means = Vec::new();
        let mut std_devs = Vec::new();
        let mut skews = Vec::new();
        let mut kurts = Vec::new();

        let mut start = 0;
        while start + params.block_length <= series.len() {
            let (m, sd, skew, kurt) = moments(&series[start..start + params.block_length]);
            means.push(m);
            std_devs.push(sd);
            skews.push(skew);
            kurts.push(kurt);
            start += step;
        }

        Ok(MetricSet::new(vec![
            Metric::new("mean", means),
            Metric::new("std_dev", std_devs),
            Metric::new("skewness", skews),
            Metric::new("kurtosis", kurts),
        ]))
    }
}

/// Look up a built-in analysis by name.
pub fn builtin(name: &str) -> Option<Box<dyn Analysis>> {
    match name.trim().to_lowercase().as_str() {
        WindowedMoments::NAME => Some(Box::new(WindowedMoments)),
        _ => None,
    }
}
