//! Yahoo Finance chart JSON to OHLCV CSV conversion.

use crate::domain::error::TsbatchError;
use chrono::DateTime;
use serde::Deserialize;

pub const CSV_HEADER: [&str; 7] = ["Date", "Open", "High", "Low", "Close", "Adj Close", "Volume"];

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: Meta,
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Meta {
    exchange_name: String,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<Quote>,
    #[serde(default)]
    adjclose: Vec<AdjClose>,
}

#[derive(Debug, Default, Deserialize)]
struct Quote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct AdjClose {
    #[serde(default)]
    adjclose: Vec<Option<f64>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartRow {
    pub date: String,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: Option<f64>,
    pub adj_close: Option<f64>,
    pub volume: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartCsv {
    pub exchange_name: String,
    pub rows: Vec<ChartRow>,
}

impl ChartCsv {
    /// Default output file name, `<exchangeName>.csv`.
    pub fn default_file_name(&self) -> String {
        format!("{}.csv", self.exchange_name)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, TsbatchError> {
        fn cell(v: Option<f64>) -> String {
            v.map(|v| v.to_string()).unwrap_or_default()
        }

        let write_err = |e: csv::Error| TsbatchError::Write {
            path: self.default_file_name(),
            reason: e.to_string(),
        };
        let mut wtr = csv::Writer::from_writer(Vec::new());
        wtr.write_record(CSV_HEADER).map_err(write_err)?;
        for row in &self.rows {
            wtr.write_record([
                row.date.clone(),
                cell(row.open),
                cell(row.high),
                cell(row.low),
                cell(row.close),
                cell(row.adj_close),
                cell(row.volume),
            ])
            .map_err(write_err)?;
        }
        wtr.into_inner().map_err(|e| TsbatchError::Write {
            path: self.default_file_name(),
            reason: e.to_string(),
        })
    }
}

fn format_err(reason: impl Into<String>) -> TsbatchError {
    TsbatchError::ChartFormat {
        reason: reason.into(),
    }
}

pub fn convert_chart_json(json: &str) -> Result<ChartCsv, TsbatchError> {
    let response: ChartResponse = serde_json::from_str(json)?;
    let result = response
        .chart
        .result
        .and_then(|r| r.into_iter().next())
        .ok_or_else(|| format_err("chart.result is empty"))?;

    let quote = result
        .indicators
        .quote
        .into_iter()
        .next()
        .ok_or_else(|| format_err("indicators.quote is empty"))?;
    let adjclose = result
        .indicators
        .adjclose
        .into_iter()
        .next()
        .map(|a| a.adjclose)
        .unwrap_or_default();

    let at = |series: &[Option<f64>], i: usize| series.get(i).copied().flatten();

    let mut rows = Vec::with_capacity(result.timestamp.len());
    for (i, &ts) in result.timestamp.iter().enumerate() {
        let date = DateTime::from_timestamp(ts, 0)
            .ok_or_else(|| format_err(format!("timestamp {ts} out of range")))?
            .format("%Y-%m-%d")
            .to_string();
        rows.push(ChartRow {
            date,
            open: at(&quote.open, i),
            high: at(&quote.high, i),
            low: at(&quote.low, i),
            close: at(&quote.close, i),
            adj_close: at(&adjclose, i),
            volume: at(&quote.volume, i),
        });
    }

    Ok(ChartCsv {
        exchange_name: result.meta.exchange_name,
        rows,
    })
}
