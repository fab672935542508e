//! `summarize-dir` command implementation.
//!
//! Recordings are analyzed on tokio's blocking pool, at most `--jobs` at a
//! time, and reported in discovery order. A failing recording is reported and
//! skipped; the remaining recordings still run.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use contracts::{SessionReport, ValidationConfig};
use observability::SessionMetricsAggregator;
use tokio::sync::Semaphore;
use tracing::{info, warn};

use super::{analyze_recording, recording_title};
use crate::cli::SummarizeDirArgs;
use crate::error::CliError;
use crate::report;

/// Execute the `summarize-dir` command
pub async fn run_summarize_dir(args: &SummarizeDirArgs) -> Result<()> {
    let config = config_loader::ConfigLoader::load_or_default(args.config.as_deref())
        .context("Failed to load configuration")?;

    let paths = recording::discover_recordings(&args.dir)
        .with_context(|| format!("Failed to scan {}", args.dir.display()))?;
    if paths.is_empty() {
        warn!(dir = %args.dir.display(), "No recordings found");
        return Ok(());
    }
    info!(
        dir = %args.dir.display(),
        recordings = paths.len(),
        jobs = args.jobs,
        "Summarizing recordings"
    );

    let results = analyze_all(paths, Arc::new(config), args.jobs).await;

    let mut aggregator = SessionMetricsAggregator::new();
    let mut failed = 0usize;
    for (path, result) in &results {
        match result {
            Ok(session) => {
                aggregator.update(session);
                print!("{}", report::render_text(session, args.detail));
                println!();
            }
            Err(e) => {
                failed += 1;
                warn!(recording = %path.display(), error = %e, "Recording skipped");
                println!("Skipped {}: {e}\n", path.display());
            }
        }
    }

    print!("{}", aggregator.summary());
    if failed > 0 {
        println!("Failed recordings: {failed}");
    }

    Ok(())
}

/// Analyze every recording with bounded concurrency, results in input order
pub(crate) async fn analyze_all(
    paths: Vec<PathBuf>,
    config: Arc<ValidationConfig>,
    jobs: usize,
) -> Vec<(PathBuf, Result<SessionReport, CliError>)> {
    let permits = Arc::new(Semaphore::new(jobs.max(1)));

    let handles: Vec<_> = paths
        .into_iter()
        .map(|path| {
            let permits = Arc::clone(&permits);
            let config = Arc::clone(&config);
            let task_path = path.clone();
            let handle = tokio::spawn(async move {
                let _permit = permits
                    .acquire_owned()
                    .await
                    .map_err(|e| CliError::task_join(task_path.display().to_string(), e.to_string()))?;
                let blocking_path = task_path.clone();
                tokio::task::spawn_blocking(move || {
                    let title = recording_title(&blocking_path);
                    analyze_recording(&blocking_path, &config, title)
                })
                .await
                .map_err(|e| CliError::task_join(task_path.display().to_string(), e.to_string()))?
            });
            (path, handle)
        })
        .collect();

    let mut results = Vec::with_capacity(handles.len());
    for (path, handle) in handles {
        let result = match handle.await {
            Ok(result) => result,
            Err(e) => Err(CliError::task_join(path.display().to_string(), e.to_string())),
        };
        results.push((path, result));
    }
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_recording(dir: &std::path::Path, name: &str, frames: i64) {
        let session = dir.join(name);
        std::fs::create_dir(&session).unwrap();
        let mut file = std::fs::File::create(session.join(recording::SAMPLES_FILE)).unwrap();
        for i in 0..frames {
            writeln!(
                file,
                r#"{{"stream":"/front_stereo_camera/left/image_compressed","acqtime_ns":{}}}"#,
                i * 33_333_333
            )
            .unwrap();
        }
    }

    #[tokio::test]
    async fn test_analyze_all_keeps_order() {
        let dir = tempfile::tempdir().unwrap();
        write_recording(dir.path(), "a", 50);
        write_recording(dir.path(), "b", 80);
        write_recording(dir.path(), "c", 20);

        let paths = recording::discover_recordings(dir.path()).unwrap();
        let results = analyze_all(paths, Arc::new(ValidationConfig::default()), 2).await;

        let titles: Vec<_> = results
            .iter()
            .map(|(_, r)| r.as_ref().unwrap().title.clone())
            .collect();
        assert_eq!(titles, ["a", "b", "c"]);
        let counts: Vec<_> = results
            .iter()
            .map(|(_, r)| r.as_ref().unwrap().drop_reports[0].report.total_samples)
            .collect();
        assert_eq!(counts, [50, 80, 20]);
    }

    #[tokio::test]
    async fn test_analyze_all_continues_past_failures() {
        let dir = tempfile::tempdir().unwrap();
        write_recording(dir.path(), "good", 30);

        let paths = vec![
            dir.path().join("missing").join(recording::SAMPLES_FILE),
            dir.path().join("good").join(recording::SAMPLES_FILE),
        ];
        let results = analyze_all(paths, Arc::new(ValidationConfig::default()), 1).await;

        assert!(matches!(results[0].1, Err(CliError::RecordingRead { .. })));
        assert!(results[1].1.is_ok());
    }
}
