//! Configuration validation.
//!
//! Validates all config fields before a batch runs.

use crate::domain::calendar::Frequency;
use crate::domain::error::TsbatchError;
use crate::domain::normalize::LeadingGapPolicy;
use crate::domain::sources::parse_sources;
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;

pub fn validate_batch_config(config: &dyn ConfigPort) -> Result<(), TsbatchError> {
    validate_dates(config)?;
    validate_frequency(config)?;
    validate_leading_gap(config)?;
    validate_columns(config)?;
    validate_analysis(config)?;
    validate_sources(config)?;
    validate_output(config)?;
    Ok(())
}

fn invalid(section: &str, key: &str, reason: impl Into<String>) -> TsbatchError {
    TsbatchError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}

pub fn parse_date(value: Option<&str>, section: &str, key: &str) -> Result<NaiveDate, TsbatchError> {
    let value = value.ok_or_else(|| TsbatchError::ConfigMissing {
        section: section.to_string(),
        key: key.to_string(),
    })?;
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| invalid(section, key, "invalid date format (expected YYYY-MM-DD)"))
}

fn validate_dates(config: &dyn ConfigPort) -> Result<(), TsbatchError> {
    let start = config.get_string("series", "start_date");
    let end = config.get_string("series", "end_date");
    parse_date(start.as_deref(), "series", "start_date")?;
    parse_date(end.as_deref(), "series", "end_date")?;
    // start > end is allowed: every series normalizes to empty.
    Ok(())
}

fn validate_frequency(config: &dyn ConfigPort) -> Result<(), TsbatchError> {
    if let Some(value) = config.get_string("series", "frequency") {
        value
            .parse::<Frequency>()
            .map_err(|reason| invalid("series", "frequency", reason))?;
    }
    Ok(())
}

fn validate_leading_gap(config: &dyn ConfigPort) -> Result<(), TsbatchError> {
    if let Some(value) = config.get_string("series", "leading_gap") {
        value
            .parse::<LeadingGapPolicy>()
            .map_err(|reason| invalid("series", "leading_gap", reason))?;
    }
    Ok(())
}

fn validate_columns(config: &dyn ConfigPort) -> Result<(), TsbatchError> {
    for key in ["date_column", "value_column"] {
        if let Some(value) = config.get_string("series", key) {
            if value.trim().is_empty() {
                return Err(invalid("series", key, format!("{key} must not be empty")));
            }
        }
    }
    Ok(())
}

fn validate_analysis(config: &dyn ConfigPort) -> Result<(), TsbatchError> {
    let block_length = config.get_int("analysis", "block_length", 10)?;
    if block_length < 1 {
        return Err(invalid(
            "analysis",
            "block_length",
            "block_length must be at least 1",
        ));
    }

    let overlap = config.get_double("analysis", "overlap", 0.1)?;
    if !(0.0..1.0).contains(&overlap) {
        return Err(invalid(
            "analysis",
            "overlap",
            "overlap must be in [0, 1)",
        ));
    }

    let sample_size = config.get_int("analysis", "sample_size", 100)?;
    if sample_size < 1 {
        return Err(invalid(
            "analysis",
            "sample_size",
            "sample_size must be at least 1",
        ));
    }

    let embedding_dimension = config.get_int("analysis", "embedding_dimension", 3)?;
    if embedding_dimension < 2 {
        return Err(invalid(
            "analysis",
            "embedding_dimension",
            "embedding_dimension must be at least 2",
        ));
    }
    Ok(())
}

fn validate_sources(config: &dyn ConfigPort) -> Result<(), TsbatchError> {
    let value = config
        .get_string("batch", "sources")
        .ok_or_else(|| TsbatchError::ConfigMissing {
            section: "batch".to_string(),
            key: "sources".to_string(),
        })?;
    if value.trim().is_empty() {
        return Err(invalid("batch", "sources", "at least one source is required"));
    }
    parse_sources(&value)?;
    Ok(())
}

fn validate_output(config: &dyn ConfigPort) -> Result<(), TsbatchError> {
    for key in ["path", "label_column"] {
        if let Some(value) = config.get_string("output", key) {
            if value.trim().is_empty() {
                return Err(invalid("output", key, format!("{key} must not be empty")));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct MockConfig {
        values: HashMap<(String, String), String>,
    }

    impl MockConfig {
        fn new() -> Self {
            Self {
                values: HashMap::new(),
            }
        }

        fn set(mut self, section: &str, key: &str, value: &str) -> Self {
            self.values
                .insert((section.to_string(), key.to_string()), value.to_string());
            self
        }

        fn valid() -> Self {
            Self::new()
                .set("series", "start_date", "2020-04-10")
                .set("series", "end_date", "2024-07-25")
                .set("batch", "sources", "BTC-USD.csv|BTC, ETH-USD.csv|ETH")
        }
    }

    impl ConfigPort for MockConfig {
        fn get_string(&self, section: &str, key: &str) -> Option<String> {
            self.values
                .get(&(section.to_string(), key.to_string()))
                .cloned()
        }

        fn get_int(&self, section: &str, key: &str, default: i64) -> Result<i64, TsbatchError> {
            self.get_string(section, key)
                .map_or(Ok(default), |v| v.parse().map_err(|_| invalid(section, key, "not an integer")))
        }

        fn get_double(&self, section: &str, key: &str, default: f64) -> Result<f64, TsbatchError> {
            self.get_string(section, key)
                .map_or(Ok(default), |v| v.parse().map_err(|_| invalid(section, key, "not a number")))
        }
    }

    fn invalid_key(err: TsbatchError) -> String {
        match err {
            TsbatchError::ConfigInvalid { key, .. } => key,
            other => panic!("expected ConfigInvalid, got {other}"),
        }
    }

    #[test]
    fn minimal_config_is_valid() {
        assert!(validate_batch_config(&MockConfig::valid()).is_ok());
    }

    #[test]
    fn missing_start_date() {
        let config = MockConfig::new()
            .set("series", "end_date", "2024-07-25")
            .set("batch", "sources", "a.csv|A");
        let err = validate_batch_config(&config).unwrap_err();
        assert!(matches!(err, TsbatchError::ConfigMissing { key, .. } if key == "start_date"));
    }

    #[test]
    fn malformed_end_date() {
        let config = MockConfig::valid().set("series", "end_date", "25/07/2024");
        assert_eq!(invalid_key(validate_batch_config(&config).unwrap_err()), "end_date");
    }

    #[test]
    fn reversed_dates_are_allowed() {
        let config = MockConfig::valid()
            .set("series", "start_date", "2024-07-25")
            .set("series", "end_date", "2020-04-10");
        assert!(validate_batch_config(&config).is_ok());
    }

    #[test]
    fn unknown_frequency() {
        let config = MockConfig::valid().set("series", "frequency", "hourly");
        assert_eq!(invalid_key(validate_batch_config(&config).unwrap_err()), "frequency");
    }

    #[test]
    fn unknown_leading_gap_policy() {
        let config = MockConfig::valid().set("series", "leading_gap", "zero");
        assert_eq!(
            invalid_key(validate_batch_config(&config).unwrap_err()),
            "leading_gap"
        );
    }

    #[test]
    fn blank_value_column() {
        let config = MockConfig::valid().set("series", "value_column", "  ");
        assert_eq!(
            invalid_key(validate_batch_config(&config).unwrap_err()),
            "value_column"
        );
    }

    #[test]
    fn zero_block_length() {
        let config = MockConfig::valid().set("analysis", "block_length", "0");
        assert_eq!(
            invalid_key(validate_batch_config(&config).unwrap_err()),
            "block_length"
        );
    }

    #[test]
    fn non_numeric_block_length() {
        let config = MockConfig::valid().set("analysis", "block_length", "ten");
        assert_eq!(
            invalid_key(validate_batch_config(&config).unwrap_err()),
            "block_length"
        );
    }

    #[test]
    fn overlap_of_one_is_rejected() {
        let config = MockConfig::valid().set("analysis", "overlap", "1.0");
        assert_eq!(invalid_key(validate_batch_config(&config).unwrap_err()), "overlap");
    }

    #[test]
    fn negative_overlap_is_rejected() {
        let config = MockConfig::valid().set("analysis", "overlap", "-0.1");
        assert_eq!(invalid_key(validate_batch_config(&config).unwrap_err()), "overlap");
    }

    #[test]
    fn zero_sample_size() {
        let config = MockConfig::valid().set("analysis", "sample_size", "0");
        assert_eq!(
            invalid_key(validate_batch_config(&config).unwrap_err()),
            "sample_size"
        );
    }

    #[test]
    fn embedding_dimension_below_two() {
        let config = MockConfig::valid().set("analysis", "embedding_dimension", "1");
        assert_eq!(
            invalid_key(validate_batch_config(&config).unwrap_err()),
            "embedding_dimension"
        );
    }

    #[test]
    fn missing_sources() {
        let config = MockConfig::new()
            .set("series", "start_date", "2020-04-10")
            .set("series", "end_date", "2024-07-25");
        let err = validate_batch_config(&config).unwrap_err();
        assert!(matches!(err, TsbatchError::ConfigMissing { key, .. } if key == "sources"));
    }

    #[test]
    fn duplicate_source_label() {
        let config = MockConfig::valid().set("batch", "sources", "a.csv|A, b.csv|A");
        let err = validate_batch_config(&config).unwrap_err();
        assert!(matches!(err, TsbatchError::InvalidSource { .. }));
    }

    #[test]
    fn blank_label_column() {
        let config = MockConfig::valid().set("output", "label_column", "");
        assert_eq!(
            invalid_key(validate_batch_config(&config).unwrap_err()),
            "label_column"
        );
    }
}
