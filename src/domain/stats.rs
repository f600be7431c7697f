//! Descriptive statistics for a numeric series.
//!
//! Standard deviation is the population form (divide by n). Skewness and
//! kurtosis are the biased moment estimators, kurtosis reported as excess
//! over the normal distribution.

use crate::domain::error::TsbatchError;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Descriptive {
    pub mean: f64,
    pub median: f64,
    pub std_dev: f64,
    pub kurtosis: f64,
    pub skewness: f64,
}

pub fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

pub fn median(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// k-th central moment around `mean`.
fn central_moment(values: &[f64], mean: f64, k: i32) -> f64 {
    values.iter().map(|v| (v - mean).powi(k)).sum::<f64>() / values.len() as f64
}

/// Mean, population std dev, skewness and excess kurtosis without the median sort.
pub fn moments(values: &[f64]) -> (f64, f64, f64, f64) {
    let m = mean(values);
    let m2 = central_moment(values, m, 2);
    let m3 = central_moment(values, m, 3);
    let m4 = central_moment(values, m, 4);

    let (skewness, kurtosis) = if m2 > 0.0 {
        (m3 / m2.powf(1.5), m4 / (m2 * m2) - 3.0)
    } else {
        (f64::NAN, f64::NAN)
    };
    (m, m2.sqrt(), skewness, kurtosis)
}

pub fn describe(values: &[f64]) -> Result<Descriptive, TsbatchError> {
    if values.is_empty() {
        return Err(TsbatchError::InsufficientData {
            reason: "cannot describe an empty series".into(),
        });
    }
    let (mean, std_dev, skewness, kurtosis) = moments(values);
    Ok(Descriptive {
        mean,
        median: median(values),
        std_dev,
        kurtosis,
        skewness,
    })
}

/// Two-column `Statistic,Value` table.
#[derive(Debug, Clone, PartialEq)]
pub struct StatisticsTable {
    pub rows: Vec<(&'static str, f64)>,
}

impl From<&Descriptive> for StatisticsTable {
    fn from(d: &Descriptive) -> Self {
        Self {
            rows: vec![
                ("Mean", d.mean),
                ("Median", d.median),
                ("Standard Deviation", d.std_dev),
                ("Kurtosis", d.kurtosis),
                ("Skewness", d.skewness),
            ],
        }
    }
}

impl StatisticsTable {
    pub fn to_csv(&self) -> Result<String, TsbatchError> {
        let mut wtr = csv::Writer::from_writer(Vec::new());
        let write_err = |e: csv::Error| TsbatchError::Write {
            path: "<statistics table>".into(),
            reason: e.to_string(),
        };
        wtr.write_record(["Statistic", "Value"]).map_err(write_err)?;
        for (name, value) in &self.rows {
            wtr.write_record([name.to_string(), value.to_string()])
                .map_err(write_err)?;
        }
        let bytes = wtr.into_inner().map_err(|e| TsbatchError::Write {
            path: "<statistics table>".into(),
            reason: e.to_string(),
        })?;
        String::from_utf8(bytes).map_err(|e| TsbatchError::Write {
            path: "<statistics table>".into(),
            reason: e.to_string(),
        })
    }
}
