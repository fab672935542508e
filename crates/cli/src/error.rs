//! Error types for CLI operations.

use contracts::AnalysisError;
use thiserror::Error;

/// Per-recording failure, reported without aborting a directory summary
#[derive(Error, Debug)]
pub enum CliError {
    /// Recording could not be read
    #[error("Failed to read recording {path}: {source}")]
    RecordingRead {
        path: String,
        #[source]
        source: AnalysisError,
    },

    /// Analysis task panicked or was cancelled
    #[error("Analysis task for {path} did not complete: {message}")]
    TaskJoin { path: String, message: String },
}

impl CliError {
    pub fn recording_read(path: impl Into<String>, source: AnalysisError) -> Self {
        Self::RecordingRead {
            path: path.into(),
            source,
        }
    }

    pub fn task_join(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::TaskJoin {
            path: path.into(),
            message: message.into(),
        }
    }
}

