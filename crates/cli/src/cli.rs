//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Stream QC - temporal integrity checks for multi-sensor recordings
#[derive(Parser, Debug)]
#[command(
    name = "stream-qc",
    author,
    version,
    about = "Temporal integrity checks for multi-sensor timestamp recordings",
    long_about = "Detects dropped frames, timestamp anomalies and stream desynchronization\n\
                  in recorded multi-sensor sessions, and condenses them into per-session\n\
                  quality scores with ASCII bucket tables."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "STREAM_QC_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "STREAM_QC_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Analyze one recording and print its report
    Analyze(AnalyzeArgs),

    /// Analyze every recording below a directory
    SummarizeDir(SummarizeDirArgs),

    /// Show streams, counts and classification of a recording
    Info(InfoArgs),

    /// Validate a configuration file without analyzing anything
    CheckConfig(CheckConfigArgs),
}

/// Arguments for the `analyze` command
#[derive(Parser, Debug, Clone)]
pub struct AnalyzeArgs {
    /// Recording file (.jsonl) or directory holding samples.jsonl
    pub recording: PathBuf,

    /// Configuration file (TOML or JSON); built-in defaults when omitted
    #[arg(short, long, env = "STREAM_QC_CONFIG")]
    pub config: Option<PathBuf>,

    /// Report title (defaults to the recording name)
    #[arg(long)]
    pub title: Option<String>,

    /// Amount of per-stream detail in the text report
    #[arg(long, value_enum, default_value = "compact", env = "STREAM_QC_DETAIL")]
    pub detail: DetailLevel,

    /// Output the report as JSON
    #[arg(long)]
    pub json: bool,

    /// Write Prometheus text metrics to this file
    #[arg(long, env = "STREAM_QC_METRICS_OUT")]
    pub metrics_out: Option<PathBuf>,
}

/// Arguments for the `summarize-dir` command
#[derive(Parser, Debug, Clone)]
pub struct SummarizeDirArgs {
    /// Directory whose subdirectories hold recordings
    pub dir: PathBuf,

    /// Configuration file (TOML or JSON); built-in defaults when omitted
    #[arg(short, long, env = "STREAM_QC_CONFIG")]
    pub config: Option<PathBuf>,

    /// Maximum number of recordings analyzed concurrently
    #[arg(short, long, default_value = "4", env = "STREAM_QC_JOBS")]
    pub jobs: usize,

    /// Amount of per-stream detail in the text reports
    #[arg(long, value_enum, default_value = "compact", env = "STREAM_QC_DETAIL")]
    pub detail: DetailLevel,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Recording file (.jsonl) or directory holding samples.jsonl
    pub recording: PathBuf,

    /// Configuration file used for classification
    #[arg(short, long, env = "STREAM_QC_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `check-config` command
#[derive(Parser, Debug)]
pub struct CheckConfigArgs {
    /// Configuration file to validate; checks the built-in defaults when omitted
    #[arg(short, long, env = "STREAM_QC_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => Self::Json,
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Compact => Self::Compact,
        }
    }
}

/// Report detail level
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum DetailLevel {
    /// Scores, tables and warnings
    #[default]
    Compact,
    /// Adds per-stream statistics
    Full,
    /// Adds raw index lists
    Dump,
}
