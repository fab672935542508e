//! Command implementations.

mod analyze;
mod check_config;
mod info;
mod summarize_dir;

pub use analyze::run_analyze;
pub use check_config::run_check_config;
pub use info::run_info;
pub use summarize_dir::run_summarize_dir;

use std::path::Path;

use contracts::{RecordingReader, SessionReport, ValidationConfig};
use integrity_engine::SessionAnalyzer;
use recording::JsonlRecordingReader;
use tracing::{info, warn};

use crate::error::CliError;

/// Title of a recording: its directory name for `dir/samples.jsonl`, else the file stem
pub(crate) fn recording_title(path: &Path) -> String {
    let is_samples_file =
        path.file_name().and_then(|n| n.to_str()) == Some(recording::SAMPLES_FILE);
    let name = if path.is_dir() {
        path.file_name()
    } else if is_samples_file {
        path.parent().and_then(Path::file_name)
    } else {
        path.file_stem()
    };
    name.map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Read, plan and analyze one recording
pub(crate) fn analyze_recording(
    path: &Path,
    config: &ValidationConfig,
    title: String,
) -> Result<SessionReport, CliError> {
    let reader = JsonlRecordingReader;
    let recording = reader
        .read(path)
        .map_err(|e| CliError::recording_read(path.display().to_string(), e))?;

    observability::record_recording_loaded(
        reader.format_name(),
        recording.stream_ids().len(),
        recording.failures.iter().filter(|f| f.failure.is_failed()).count(),
    );

    if recording.is_empty() {
        warn!(recording = %path.display(), "Recording holds no timestamped samples");
    }

    let plan = config_loader::build_plan(config, &recording.stream_ids());
    info!(
        recording = %path.display(),
        drop_checks = plan.drop_checks.len(),
        pair_checks = plan.pair_checks.len(),
        group_check = plan.group_check.is_some(),
        "Analysis planned"
    );

    Ok(SessionAnalyzer::new(plan).analyze(&recording, title))
}
