//! `info` command implementation.

use anyhow::{Context, Result};
use contracts::{Recording, RecordingReader, StreamCategory, ValidationConfig};
use recording::JsonlRecordingReader;
use serde::Serialize;
use tracing::info;

use crate::cli::InfoArgs;

/// Recording info for JSON output
#[derive(Serialize)]
struct RecordingInfo {
    source: String,
    streams: Vec<StreamInfo>,
    unattributed_errors: usize,
}

#[derive(Serialize)]
struct StreamInfo {
    stream_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    category: Option<StreamCategory>,
    samples: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    first_ns: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_ns: Option<i64>,
    failed_samples: usize,
    missing_acqtime: usize,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(recording = %args.recording.display(), "Loading recording info");

    let config = config_loader::ConfigLoader::load_or_default(args.config.as_deref())
        .context("Failed to load configuration")?;
    let recording = JsonlRecordingReader
        .read(&args.recording)
        .with_context(|| format!("Failed to read {}", args.recording.display()))?;

    let info = build_recording_info(&recording, &config);
    if args.json {
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize recording info")?;
        println!("{json}");
    } else {
        print_recording_info(&info);
    }

    Ok(())
}

fn build_recording_info(recording: &Recording, config: &ValidationConfig) -> RecordingInfo {
    let streams = recording
        .stream_ids()
        .into_iter()
        .map(|id| {
            let series = recording.stream(&id);
            let range = series.and_then(|s| s.time_range());
            let failure = recording.failure(&id).cloned().unwrap_or_default();
            StreamInfo {
                category: config.classify(&id),
                samples: series.map_or(0, |s| s.len()),
                first_ns: range.map(|(first, _)| first),
                last_ns: range.map(|(_, last)| last),
                failed_samples: failure.failed_samples,
                missing_acqtime: failure.missing_acqtime,
                stream_id: id.to_string(),
            }
        })
        .collect();

    RecordingInfo {
        source: recording.source.clone(),
        streams,
        unattributed_errors: recording.unattributed_errors,
    }
}

fn print_recording_info(info: &RecordingInfo) {
    println!("Recording: {}", info.source);
    println!("\nStreams ({}):", info.streams.len());
    for stream in &info.streams {
        let category = stream
            .category
            .map_or_else(|| "unclassified".to_string(), |c| c.to_string());
        print!("  {} [{}] samples: {}", stream.stream_id, category, stream.samples);
        if let (Some(first), Some(last)) = (stream.first_ns, stream.last_ns) {
            print!(", span: {:.3} s", (last - first) as f64 / 1e9);
        }
        if stream.failed_samples > 0 || stream.missing_acqtime > 0 {
            print!(
                ", failed: {}, missing acqtime: {}",
                stream.failed_samples, stream.missing_acqtime
            );
        }
        println!();
    }
    if info.unattributed_errors > 0 {
        println!("\nUnattributed lines: {}", info.unattributed_errors);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{StreamFailure, StreamFailureEntry, TimeSeries};

    #[test]
    fn test_build_recording_info() {
        let mut recording = Recording::from_streams(
            "mem",
            vec![
                TimeSeries::new("/front_stereo_camera/left/image_compressed", vec![0, 10, 20]),
                TimeSeries::new("/unknown/topic", vec![5]),
            ],
        );
        recording.failures.push(StreamFailureEntry {
            stream_id: "/broken".into(),
            failure: StreamFailure {
                failed_samples: 2,
                missing_acqtime: 0,
                first_error: Some("bad".to_string()),
            },
        });

        let info = build_recording_info(&recording, &ValidationConfig::default());
        assert_eq!(info.streams.len(), 3);
        assert_eq!(info.streams[0].category, Some(StreamCategory::Camera));
        assert_eq!(info.streams[0].last_ns, Some(20));
        assert_eq!(info.streams[1].category, None);
        assert_eq!(info.streams[2].samples, 0);
        assert_eq!(info.streams[2].failed_samples, 2);
    }
}
