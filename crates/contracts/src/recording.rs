//! Recording - what the reader collaborator hands to the engine
//!
//! A recording is an in-memory snapshot: per-stream timestamp series plus the
//! deserialization failures met while extracting them.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::{AnalysisError, TimeSeries};

/// Extraction failures of one stream.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamFailure {
    /// Samples that could not be deserialized
    pub failed_samples: usize,
    /// Samples without a capture timestamp
    pub missing_acqtime: usize,
    /// First deserialization error met, if any
    pub first_error: Option<String>,
}

impl StreamFailure {
    /// Whether the stream had undeserializable content.
    pub fn is_failed(&self) -> bool {
        self.failed_samples > 0
    }
}

/// Per-stream failure entry, kept in stream appearance order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamFailureEntry {
    pub stream_id: crate::StreamId,
    pub failure: StreamFailure,
}

/// Timestamp streams extracted from one recording.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Recording {
    /// Source the recording was read from (path or label)
    pub source: String,
    /// Streams in order of first appearance
    pub streams: Vec<TimeSeries>,
    pub failures: Vec<StreamFailureEntry>,
    /// Lines that could not be attributed to any stream
    pub unattributed_errors: usize,
}

impl Recording {
    pub fn from_streams(source: impl Into<String>, streams: Vec<TimeSeries>) -> Self {
        Self {
            source: source.into(),
            streams,
            failures: Vec::new(),
            unattributed_errors: 0,
        }
    }

    pub fn stream(&self, stream_id: &str) -> Option<&TimeSeries> {
        self.streams.iter().find(|s| s.stream_id == stream_id)
    }

    pub fn failure(&self, stream_id: &str) -> Option<&StreamFailure> {
        self.failures
            .iter()
            .find(|f| f.stream_id == stream_id)
            .map(|f| &f.failure)
    }

    /// Ids of every stream seen, including streams with only failed samples.
    pub fn stream_ids(&self) -> Vec<crate::StreamId> {
        let mut ids: Vec<crate::StreamId> =
            self.streams.iter().map(|s| s.stream_id.clone()).collect();
        for entry in &self.failures {
            if !ids.contains(&entry.stream_id) {
                ids.push(entry.stream_id.clone());
            }
        }
        ids
    }

    pub fn is_empty(&self) -> bool {
        self.streams.iter().all(TimeSeries::is_empty)
    }
}

/// Reader collaborator: turns a recording on disk into a [`Recording`].
///
/// Implementations report undeserializable streams through
/// [`Recording::failures`] instead of dropping them.
pub trait RecordingReader: Send + Sync {
    /// Short format name for diagnostics
    fn format_name(&self) -> &'static str;

    /// Read the recording at `path`.
    fn read(&self, path: &Path) -> Result<Recording, AnalysisError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stream_ids_include_failed_only_streams() {
        let mut recording = Recording::from_streams(
            "mem",
            vec![TimeSeries::new("/a", vec![1, 2]), TimeSeries::new("/b", vec![])],
        );
        recording.failures.push(StreamFailureEntry {
            stream_id: "/c".into(),
            failure: StreamFailure {
                failed_samples: 3,
                missing_acqtime: 0,
                first_error: Some("bad".into()),
            },
        });

        let ids = recording.stream_ids();
        assert_eq!(ids, vec!["/a".into(), "/b".into(), crate::StreamId::from("/c")]);
        assert!(recording.failure("/c").is_some_and(StreamFailure::is_failed));
        assert!(recording.stream("/c").is_none());
        assert!(!recording.is_empty());
    }
}
