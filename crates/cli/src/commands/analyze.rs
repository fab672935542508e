//! `analyze` command implementation.

use anyhow::{Context, Result};
use observability::PrometheusHandle;
use tracing::info;

use super::{analyze_recording, recording_title};
use crate::cli::AnalyzeArgs;
use crate::report;

/// Execute the `analyze` command
pub fn run_analyze(args: &AnalyzeArgs, metrics: Option<&PrometheusHandle>) -> Result<()> {
    let config = config_loader::ConfigLoader::load_or_default(args.config.as_deref())
        .context("Failed to load configuration")?;

    let title = args
        .title
        .clone()
        .unwrap_or_else(|| recording_title(&args.recording));
    info!(recording = %args.recording.display(), title = %title, "Analyzing recording");

    let session = analyze_recording(&args.recording, &config, title)?;

    if args.json {
        let json = report::render_json(&session).context("Failed to serialize report")?;
        println!("{json}");
    } else {
        print!("{}", report::render_text(&session, args.detail));
    }

    if let (Some(path), Some(handle)) = (&args.metrics_out, metrics) {
        std::fs::write(path, handle.render())
            .with_context(|| format!("Failed to write metrics to {}", path.display()))?;
        info!(path = %path.display(), "Metrics written");
    }

    Ok(())
}
