//! Domain error types.

use std::fmt;

/// Pipeline stage a per-series failure happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Load,
    Normalize,
    Analyze,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Load => "load",
            Stage::Normalize => "normalize",
            Stage::Analyze => "analyze",
        };
        f.write_str(name)
    }
}

/// Top-level error type for tsbatch.
#[derive(Debug, thiserror::Error)]
pub enum TsbatchError {
    #[error("file not found: {path}")]
    FileNotFound { path: String },

    #[error("missing column '{column}' in {source_name}")]
    MissingColumn { source_name: String, column: String },

    #[error("unparseable date '{value}' in {source_name} at row {row}")]
    DateParse {
        source_name: String,
        row: usize,
        value: String,
    },

    #[error("invalid value '{value}' for column '{column}' in {source_name} at row {row}")]
    ValueParse {
        source_name: String,
        row: usize,
        column: String,
        value: String,
    },

    #[error("CSV error in {source_name}: {reason}")]
    Csv { source_name: String, reason: String },

    #[error("insufficient data: {reason}")]
    InsufficientData { reason: String },

    #[error(
        "metric length mismatch: '{expected_metric}' has {expected} values, '{metric}' has {actual}"
    )]
    MetricLengthMismatch {
        expected_metric: String,
        expected: usize,
        metric: String,
        actual: usize,
    },

    #[error("metric names {actual:?} do not match table columns {expected:?}")]
    MetricSchemaMismatch {
        expected: Vec<String>,
        actual: Vec<String>,
    },

    #[error("analysis returned no metrics")]
    EmptyMetricSet,

    #[error("analysis failed: {reason}")]
    Analysis { reason: String },

    #[error("failed to write {path}: {reason}")]
    Write { path: String, reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("invalid source entry '{entry}': {reason}")]
    InvalidSource { entry: String, reason: String },

    #[error("unexpected chart JSON layout: {reason}")]
    ChartFormat { reason: String },

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("series '{label}' failed during {stage}: {source}")]
    Series {
        label: String,
        stage: Stage,
        #[source]
        source: Box<TsbatchError>,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl TsbatchError {
    /// Attach series label and stage to an error raised while processing one series.
    pub fn in_series(self, label: &str, stage: Stage) -> Self {
        TsbatchError::Series {
            label: label.to_string(),
            stage,
            source: Box::new(self),
        }
    }

    /// The underlying error with any series context stripped.
    pub fn root(&self) -> &TsbatchError {
        match self {
            TsbatchError::Series { source, .. } => source.root(),
            other => other,
        }
    }

    /// Process exit status for this error.
    pub fn exit_status(&self) -> u8 {
        match self {
            TsbatchError::Series { source, .. } => source.exit_status(),
            TsbatchError::Io(_) | TsbatchError::Write { .. } => 1,
            TsbatchError::ConfigParse { .. }
            | TsbatchError::ConfigMissing { .. }
            | TsbatchError::ConfigInvalid { .. }
            | TsbatchError::InvalidSource { .. } => 2,
            TsbatchError::FileNotFound { .. }
            | TsbatchError::MissingColumn { .. }
            | TsbatchError::DateParse { .. }
            | TsbatchError::ValueParse { .. }
            | TsbatchError::Csv { .. } => 3,
            TsbatchError::InsufficientData { .. } => 4,
            TsbatchError::MetricLengthMismatch { .. }
            | TsbatchError::MetricSchemaMismatch { .. }
            | TsbatchError::EmptyMetricSet
            | TsbatchError::Analysis { .. } => 5,
            TsbatchError::ChartFormat { .. } | TsbatchError::Json(_) => 6,
        }
    }
}

impl From<&TsbatchError> for std::process::ExitCode {
    fn from(err: &TsbatchError) -> Self {
        std::process::ExitCode::from(err.exit_status())
    }
}
