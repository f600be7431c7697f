//! Source lists for a batch run.
//!
//! A list is written as `path|label` entries separated by commas, e.g.
//! `BTC-USD.csv|BTC, SNP.csv|S&P 500`. An entry without `|` is labelled with
//! its file stem.

use crate::domain::error::TsbatchError;
use std::collections::HashSet;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesSource {
    pub path: String,
    pub label: String,
}

impl SeriesSource {
    pub fn new(path: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            label: label.into(),
        }
    }
}

fn parse_entry(entry: &str) -> Result<SeriesSource, TsbatchError> {
    let invalid = |reason: &str| TsbatchError::InvalidSource {
        entry: entry.to_string(),
        reason: reason.to_string(),
    };

    let (path, label) = match entry.split_once('|') {
        Some((path, label)) => (path.trim(), label.trim().to_string()),
        None => {
            let path = entry.trim();
            let stem = Path::new(path)
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            (path, stem)
        }
    };

    if path.is_empty() {
        return Err(invalid("empty path"));
    }
    if label.is_empty() {
        return Err(invalid("empty label"));
    }
    Ok(SeriesSource::new(path, label))
}

pub fn parse_sources(input: &str) -> Result<Vec<SeriesSource>, TsbatchError> {
    let mut sources = Vec::new();
    let mut seen = HashSet::new();

    for token in input.split(',') {
        if token.trim().is_empty() {
            return Err(TsbatchError::InvalidSource {
                entry: token.to_string(),
                reason: "empty entry in source list".into(),
            });
        }
        let source = parse_entry(token)?;
        if !seen.insert(source.label.clone()) {
            return Err(TsbatchError::InvalidSource {
                entry: token.trim().to_string(),
                reason: format!("duplicate label '{}'", source.label),
            });
        }
        sources.push(source);
    }

    Ok(sources)
}
