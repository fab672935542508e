//! # Stream QC CLI
//!
//! 命令行接口入口点。
//!
//! 提供：
//! - 单个录制分析与报告输出
//! - 目录批量分析 (tokio 阻塞线程池并发)
//! - 录制信息与配置校验

mod cli;
mod commands;
mod error;
mod report;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use cli::{Cli, Commands};
use commands::{run_analyze, run_check_config, run_info, run_summarize_dir};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Initialize logging based on CLI options
    let metrics_text = matches!(&cli.command, Commands::Analyze(args) if args.metrics_out.is_some());
    let metrics = init_observability(&cli, metrics_text)?;

    info!(version = env!("CARGO_PKG_VERSION"), "Stream QC starting");

    // Execute command
    let result = match &cli.command {
        Commands::Analyze(args) => run_analyze(args, metrics.as_ref()),
        Commands::SummarizeDir(args) => run_summarize_dir(args).await,
        Commands::Info(args) => run_info(args),
        Commands::CheckConfig(args) => run_check_config(args),
    };

    if let Err(ref e) = result {
        tracing::error!(error = %e, "Command failed");
    }

    result
}

/// Initialize tracing (and the metrics recorder when requested)
fn init_observability(
    cli: &Cli,
    metrics_text: bool,
) -> Result<Option<observability::PrometheusHandle>> {
    let default_log_level = if cli.quiet {
        "warn"
    } else {
        match cli.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    observability::init_with_config(observability::ObservabilityConfig {
        log_format: cli.log_format.into(),
        metrics_text,
        default_log_level: default_log_level.to_string(),
    })
}
