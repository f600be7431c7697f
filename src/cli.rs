//! CLI definition and dispatch.

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{debug, info};

use crate::adapters::csv_result_adapter::CsvResultAdapter;
use crate::adapters::csv_series_adapter::CsvSeriesAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::yahoo_json_adapter::convert_chart_json;
use crate::domain::analysis::{self, Analysis, AnalysisParams, WindowedMoments};
use crate::domain::batch::{self, BatchConfig, DEFAULT_LABEL_COLUMN};
use crate::domain::calendar::Frequency;
use crate::domain::config_validation::{parse_date, validate_batch_config};
use crate::domain::error::TsbatchError;
use crate::domain::normalize::{normalize, LeadingGapPolicy, NormalizeConfig, NormalizedSeries};
use crate::domain::sources::{parse_sources, SeriesSource};
use crate::domain::stats::{describe, StatisticsTable};
use crate::domain::table::CombinedTable;
use crate::ports::config_port::ConfigPort;
use crate::ports::result_port::ResultPort;
use crate::ports::series_port::SeriesPort;

pub const DEFAULT_OUTPUT: &str = "combined_results.csv";

#[derive(Parser, Debug)]
#[command(
    name = "tsbatch",
    about = "Calendar-normalized batch statistics over price series"
)]
pub struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Options shared by commands that read and normalize one series.
#[derive(Args, Debug, Clone)]
pub struct SeriesArgs {
    #[arg(short, long)]
    pub input: PathBuf,
    #[arg(long)]
    pub start: NaiveDate,
    #[arg(long)]
    pub end: NaiveDate,
    #[arg(long, default_value = "business")]
    pub frequency: Frequency,
    #[arg(long, default_value = "Date")]
    pub date_column: String,
    #[arg(long, default_value = "Close")]
    pub value_column: String,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the batch statistics pipeline from a config file
    Batch {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Write one series reindexed onto a regular calendar
    Normalize {
        #[command(flatten)]
        series: SeriesArgs,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print descriptive statistics for one normalized series
    Stats {
        #[command(flatten)]
        series: SeriesArgs,
    },
    /// Convert Yahoo Finance chart JSON to CSV
    Convert {
        #[arg(short, long)]
        input: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Validate a batch configuration without running it
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    crate::logging::init(cli.verbose);

    let result = match cli.command {
        Command::Batch { config, output } => run_batch_command(&config, output.as_deref()),
        Command::Normalize { series, output } => run_normalize(&series, output.as_deref()),
        Command::Stats { series } => run_stats(&series),
        Command::Convert { input, output } => run_convert(&input, output.as_deref()),
        Command::Validate { config } => run_validate(&config),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, TsbatchError> {
    FileConfigAdapter::from_file(path)
}

fn parse_setting<T>(config: &dyn ConfigPort, section: &str, key: &str) -> Result<Option<T>, TsbatchError>
where
    T: std::str::FromStr<Err = String>,
{
    config
        .get_string(section, key)
        .map(|v| {
            v.parse::<T>().map_err(|reason| TsbatchError::ConfigInvalid {
                section: section.to_string(),
                key: key.to_string(),
                reason,
            })
        })
        .transpose()
}

fn non_negative_int(config: &dyn ConfigPort, key: &str, default: usize) -> Result<usize, TsbatchError> {
    let value = config.get_int("analysis", key, default as i64)?;
    usize::try_from(value).map_err(|_| TsbatchError::ConfigInvalid {
        section: "analysis".into(),
        key: key.into(),
        reason: format!("{key} must be non-negative"),
    })
}

pub fn build_analysis_params(config: &dyn ConfigPort) -> Result<AnalysisParams, TsbatchError> {
    let defaults = AnalysisParams::default();
    Ok(AnalysisParams {
        block_length: non_negative_int(config, "block_length", defaults.block_length)?,
        overlap: config.get_double("analysis", "overlap", defaults.overlap)?,
        sample_size: non_negative_int(config, "sample_size", defaults.sample_size)?,
        embedding_dimension: non_negative_int(
            config,
            "embedding_dimension",
            defaults.embedding_dimension,
        )?,
    })
}

pub fn build_batch_config(config: &dyn ConfigPort) -> Result<BatchConfig, TsbatchError> {
    let start = parse_date(
        config.get_string("series", "start_date").as_deref(),
        "series",
        "start_date",
    )?;
    let end = parse_date(
        config.get_string("series", "end_date").as_deref(),
        "series",
        "end_date",
    )?;

    let sources_str = config
        .get_string("batch", "sources")
        .ok_or_else(|| TsbatchError::ConfigMissing {
            section: "batch".into(),
            key: "sources".into(),
        })?;

    Ok(BatchConfig {
        sources: parse_sources(&sources_str)?,
        normalize: NormalizeConfig {
            date_column: config
                .get_string("series", "date_column")
                .unwrap_or_else(|| "Date".to_string()),
            value_column: config
                .get_string("series", "value_column")
                .unwrap_or_else(|| "Close".to_string()),
            start,
            end,
            frequency: parse_setting(config, "series", "frequency")?.unwrap_or_default(),
            leading_gap: parse_setting(config, "series", "leading_gap")?.unwrap_or_default(),
        },
        params: build_analysis_params(config)?,
        label_column: config
            .get_string("output", "label_column")
            .unwrap_or_else(|| DEFAULT_LABEL_COLUMN.to_string()),
    })
}

pub fn resolve_analysis(config: &dyn ConfigPort) -> Result<Box<dyn Analysis>, TsbatchError> {
    let name = config
        .get_string("analysis", "name")
        .unwrap_or_else(|| WindowedMoments::NAME.to_string());
    analysis::builtin(&name).ok_or_else(|| TsbatchError::ConfigInvalid {
        section: "analysis".into(),
        key: "name".into(),
        reason: format!("unknown analysis '{name}' (available: {})", WindowedMoments::NAME),
    })
}

/// Relative paths in a config file are taken from the file's directory.
pub fn resolve_relative(config_path: &Path, value: &str) -> PathBuf {
    let path = Path::new(value);
    if path.is_absolute() {
        return path.to_path_buf();
    }
    config_path
        .parent()
        .unwrap_or_else(|| Path::new(""))
        .join(path)
}

/// Run the batch and write the table. Nothing is written unless every series succeeds.
pub fn run_batch_pipeline(
    batch_config: &BatchConfig,
    series_port: &dyn SeriesPort,
    analysis: &dyn Analysis,
    result_port: &dyn ResultPort,
    output: &Path,
) -> Result<CombinedTable, TsbatchError> {
    info!(
        series = batch_config.sources.len(),
        start = %batch_config.normalize.start,
        end = %batch_config.normalize.end,
        frequency = %batch_config.normalize.frequency,
        analysis = analysis.name(),
        "running batch"
    );

    let table = batch::run_batch(batch_config, series_port, analysis)?;
    result_port.write(&table, output)?;

    for (label, rows) in table.label_counts() {
        info!(label = %label, rows, "summary");
    }
    info!(rows = table.len(), path = %output.display(), "results written");
    Ok(table)
}

fn run_batch_command(config_path: &Path, output_override: Option<&Path>) -> Result<(), TsbatchError> {
    info!("loading config from {}", config_path.display());
    let config = load_config(config_path)?;
    validate_batch_config(&config)?;

    let batch_config = build_batch_config(&config)?;
    let analysis = resolve_analysis(&config)?;

    let data_dir = config
        .get_string("series", "data_dir")
        .unwrap_or_else(|| ".".to_string());
    let series_port = CsvSeriesAdapter::new(resolve_relative(config_path, &data_dir));

    let output = match output_override {
        Some(p) => p.to_path_buf(),
        None => resolve_relative(
            config_path,
            &config
                .get_string("output", "path")
                .unwrap_or_else(|| DEFAULT_OUTPUT.to_string()),
        ),
    };

    run_batch_pipeline(
        &batch_config,
        &series_port,
        analysis.as_ref(),
        &CsvResultAdapter::new(),
        &output,
    )?;
    Ok(())
}

/// Load and normalize a single file named on the command line.
pub fn load_normalized(args: &SeriesArgs) -> Result<NormalizedSeries, TsbatchError> {
    let port = CsvSeriesAdapter::new(PathBuf::new());
    let source = args.input.display().to_string();
    let raw = port.load(&source, &args.date_column, &args.value_column)?;
    debug!(source = %source, rows = raw.len(), "loaded series");
    normalize(&raw, &args.value_column, args.start, args.end, args.frequency)
}

fn run_normalize(args: &SeriesArgs, output: Option<&Path>) -> Result<(), TsbatchError> {
    let series = load_normalized(args)?;
    info!(
        points = series.len(),
        leading_gap = series.leading_gap(),
        "normalized {}",
        args.input.display()
    );

    let adapter = CsvResultAdapter::new();
    match output {
        Some(path) => {
            adapter.write_normalized(&series, &args.value_column, path)?;
            info!(path = %path.display(), "normalized series written");
        }
        None => {
            let bytes = CsvResultAdapter::normalized_to_bytes(&series, &args.value_column)?;
            print!("{}", String::from_utf8_lossy(&bytes));
        }
    }
    Ok(())
}

fn run_stats(args: &SeriesArgs) -> Result<(), TsbatchError> {
    let series = load_normalized(args)?;
    let values = series.dense(LeadingGapPolicy::Trim)?;
    let table = StatisticsTable::from(&describe(&values)?);
    print!("{}", table.to_csv()?);
    Ok(())
}

fn run_convert(input: &Path, output: Option<&Path>) -> Result<(), TsbatchError> {
    let json = fs::read_to_string(input).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => TsbatchError::FileNotFound {
            path: input.display().to_string(),
        },
        _ => TsbatchError::Io(e),
    })?;
    let chart = convert_chart_json(&json)?;

    let output = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(chart.default_file_name()));
    fs::write(&output, chart.to_bytes()?).map_err(|e| TsbatchError::Write {
        path: output.display().to_string(),
        reason: e.to_string(),
    })?;
    info!(rows = chart.rows.len(), "data has been written to {}", output.display());
    Ok(())
}

fn run_validate(config_path: &Path) -> Result<(), TsbatchError> {
    info!("validating {}", config_path.display());
    let config = load_config(config_path)?;
    validate_batch_config(&config)?;
    let batch_config = build_batch_config(&config)?;
    let analysis = resolve_analysis(&config)?;

    let n = &batch_config.normalize;
    eprintln!("Series:");
    eprintln!("  range:     {} to {} ({})", n.start, n.end, n.frequency);
    eprintln!("  columns:   {} / {}", n.date_column, n.value_column);
    eprintln!("  leading gap: {}", n.leading_gap);
    eprintln!("\nAnalysis: {}", analysis.name());
    eprintln!(
        "  block_length={} overlap={} sample_size={} embedding_dimension={}",
        batch_config.params.block_length,
        batch_config.params.overlap,
        batch_config.params.sample_size,
        batch_config.params.embedding_dimension
    );
    eprintln!("\nSources:");
    for SeriesSource { path, label } in &batch_config.sources {
        eprintln!("  {label}: {path}");
    }
    eprintln!("\nConfiguration is valid.");
    Ok(())
}
