//! JSONL Recording Reader - 读取逐行 JSON 时间戳录制
//!
//! 每行一个样本：
//! `{"stream": "/front_stereo_camera/left/image_raw", "acqtime_ns": 1700000000000, "log_time_ns": 1700000000150}`

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use contracts::{
    AnalysisError, CaptureTime, Recording, RecordingReader, StreamFailure, StreamFailureEntry,
    TimeSeries,
};
use metrics::counter;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

/// Sample file expected inside a recording directory.
pub const SAMPLES_FILE: &str = "samples.jsonl";

/// JSONL 中的样本记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleRecord {
    pub stream: String,
    /// Capture time; `null` when the sample carries no acquisition stamp
    pub acqtime_ns: Option<CaptureTime>,
    /// Time the sample was logged by the recorder
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_time_ns: Option<i64>,
}

/// Reader for JSON-lines timestamp recordings.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonlRecordingReader;

/// Per-stream state while reading.
#[derive(Default)]
struct StreamAccumulator {
    samples: Vec<CaptureTime>,
    failure: StreamFailure,
}

/// Streams in order of first appearance.
#[derive(Default)]
struct Accumulators {
    order: Vec<String>,
    by_name: HashMap<String, StreamAccumulator>,
    unattributed_errors: usize,
}

impl Accumulators {
    fn stream(&mut self, name: &str) -> &mut StreamAccumulator {
        if !self.by_name.contains_key(name) {
            self.order.push(name.to_string());
        }
        self.by_name.entry(name.to_string()).or_default()
    }

    fn push_line(&mut self, line: &[u8]) {
        let Ok(text) = std::str::from_utf8(line) else {
            self.unattributed_errors += 1;
            return;
        };
        let text = text.trim();
        if text.is_empty() {
            return;
        }

        let value: serde_json::Value = match serde_json::from_str(text) {
            Ok(value @ serde_json::Value::Object(_)) => value,
            _ => {
                self.unattributed_errors += 1;
                return;
            }
        };
        let Some(name) = value.get("stream").and_then(|s| s.as_str()).map(str::to_string) else {
            self.unattributed_errors += 1;
            return;
        };

        let stream = self.stream(&name);
        match serde_json::from_value::<SampleRecord>(value) {
            Ok(SampleRecord {
                acqtime_ns: Some(t),
                ..
            }) => stream.samples.push(t),
            Ok(_) => stream.failure.missing_acqtime += 1,
            Err(e) => {
                stream.failure.failed_samples += 1;
                stream.failure.first_error.get_or_insert_with(|| e.to_string());
            }
        }
    }

    fn finish(mut self, source: String) -> Recording {
        let mut recording = Recording {
            source,
            unattributed_errors: self.unattributed_errors,
            ..Default::default()
        };

        for name in self.order {
            let Some(acc) = self.by_name.remove(&name) else {
                continue;
            };
            if acc.failure != StreamFailure::default() {
                if acc.failure.is_failed() {
                    warn!(
                        stream_id = %name,
                        failed = acc.failure.failed_samples,
                        first_error = acc.failure.first_error.as_deref().unwrap_or_default(),
                        "stream has undeserializable samples"
                    );
                }
                recording.failures.push(StreamFailureEntry {
                    stream_id: name.as_str().into(),
                    failure: acc.failure,
                });
            }
            if !acc.samples.is_empty() {
                recording.streams.push(TimeSeries::new(name, acc.samples));
            }
        }

        recording
    }
}

impl JsonlRecordingReader {
    /// Resolve a recording path: a `.jsonl` file or a directory holding [`SAMPLES_FILE`].
    fn resolve(path: &Path) -> Result<PathBuf, AnalysisError> {
        let file = if path.is_dir() {
            path.join(SAMPLES_FILE)
        } else {
            path.to_path_buf()
        };
        if !file.is_file() {
            return Err(AnalysisError::RecordingNotFound {
                path: file.display().to_string(),
            });
        }
        Ok(file)
    }

    /// Accumulate every line of `reader`; returns the recording and the line count.
    ///
    /// # Errors
    /// `RecordingParse` when the underlying stream fails mid-file.
    fn read_lines<R: BufRead>(reader: R, path: &Path) -> Result<(Recording, usize), AnalysisError> {
        let mut acc = Accumulators::default();
        let mut lines = 0usize;
        for line in reader.split(b'\n') {
            let line = line.map_err(|e| AnalysisError::RecordingParse {
                path: path.display().to_string(),
                line: lines + 1,
                message: e.to_string(),
            })?;
            acc.push_line(&line);
            lines += 1;
        }
        Ok((acc.finish(path.display().to_string()), lines))
    }
}

impl RecordingReader for JsonlRecordingReader {
    fn format_name(&self) -> &'static str {
        "jsonl"
    }

    #[instrument(name = "jsonl_read", skip(self), fields(path = %path.display()))]
    fn read(&self, path: &Path) -> Result<Recording, AnalysisError> {
        let file_path = Self::resolve(path)?;
        let reader = BufReader::new(File::open(&file_path)?);
        let (recording, lines) = Self::read_lines(reader, path)?;

        counter!("stream_qc_recording_lines_total").increment(lines as u64);
        if recording.unattributed_errors > 0 {
            warn!(
                lines = recording.unattributed_errors,
                "lines could not be attributed to a stream"
            );
        }
        info!(
            streams = recording.streams.len(),
            failed_streams = recording.failures.iter().filter(|f| f.failure.is_failed()).count(),
            lines,
            "Loaded recording"
        );

        Ok(recording)
    }
}

/// Every `*.jsonl` file in each immediate subdirectory of `dir`, sorted.
///
/// # Errors
/// `RecordingNotFound` when `dir` is not a directory.
pub fn discover_recordings(dir: &Path) -> Result<Vec<PathBuf>, AnalysisError> {
    if !dir.is_dir() {
        return Err(AnalysisError::RecordingNotFound {
            path: dir.display().to_string(),
        });
    }

    let mut found = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let subdir = entry?.path();
        if !subdir.is_dir() {
            continue;
        }
        for file in std::fs::read_dir(&subdir)? {
            let file = file?.path();
            let is_jsonl = file.extension().and_then(|e| e.to_str()) == Some("jsonl");
            if is_jsonl && file.is_file() {
                found.push(file);
            }
        }
    }
    found.sort();

    debug!(dir = %dir.display(), recordings = found.len(), "discovered recordings");
    Ok(found)
}
