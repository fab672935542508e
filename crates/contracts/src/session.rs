//! Session-level scores and the assembled session report.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::{
    DropReport, GroupSyncReport, MergedBuckets, PairSyncReport, ProfileSource, StreamCategory,
    StreamId,
};

/// Four independent quality scores in [0, 100].
///
/// `None` means "not applicable": the contributing report set was empty.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionScores {
    pub drop_score: Option<f64>,
    pub bucket_score: Option<f64>,
    pub intra_sync_score: Option<f64>,
    pub inter_sync_score: Option<f64>,
}

impl SessionScores {
    pub fn is_empty(&self) -> bool {
        self.drop_score.is_none()
            && self.bucket_score.is_none()
            && self.intra_sync_score.is_none()
            && self.inter_sync_score.is_none()
    }

    /// `(label, score)` pairs in report order.
    pub fn entries(&self) -> [(&'static str, Option<f64>); 4] {
        [
            ("Camera Drop Q Score", self.drop_score),
            ("Camera Bucket Q Score", self.bucket_score),
            ("Intra Camera Sync Q Score", self.intra_sync_score),
            ("Inter Camera Sync Q Score", self.inter_sync_score),
        ]
    }
}

/// Renders a score with one decimal, or `N/A`.
pub struct ScoreDisplay(pub Option<f64>);

impl fmt::Display for ScoreDisplay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(score) => write!(f, "{score:.1}"),
            None => f.write_str("N/A"),
        }
    }
}

impl fmt::Display for SessionScores {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (label, score) in self.entries() {
            writeln!(f, "{label}: {}", ScoreDisplay(score))?;
        }
        Ok(())
    }
}

/// Kind of a session finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingKind {
    DuplicateTimestamps,
    BackwardTimestamps,
    LargeDrops,
    DefaultProfile,
    StreamAbsent,
    DeserializationFailure,
    CheckSkipped,
    CheckFailed,
}

/// Human-readable warning attached to a session report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub kind: FindingKind,
    /// Stream or check the finding refers to
    pub subject: String,
    pub message: String,
}

impl Finding {
    pub fn new(kind: FindingKind, subject: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            subject: subject.into(),
            message: message.into(),
        }
    }
}

/// Drop report tagged with the classification that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamDropReport {
    pub category: StreamCategory,
    pub profile_source: ProfileSource,
    pub report: DropReport,
}

/// Everything one analysis run produced for a recording session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionReport {
    pub title: String,
    /// Category whose drop reports feed the drop and bucket scores
    pub score_category: StreamCategory,
    pub drop_reports: Vec<StreamDropReport>,
    pub pair_reports: Vec<PairSyncReport>,
    pub group_report: Option<GroupSyncReport>,
    pub scores: SessionScores,
    /// OR-merge of the scored streams' drop tables
    pub merged_drop_table: Option<MergedBuckets>,
    /// OR-merge of the pair-sync tables
    pub merged_sync_table: Option<MergedBuckets>,
    pub findings: Vec<Finding>,
    /// Captured sample count of every stream in the recording
    pub stream_counts: BTreeMap<StreamId, usize>,
    /// Streams with deserialization failures
    pub failed_streams: Vec<StreamId>,
}

impl SessionReport {
    /// Whether any stream was analyzed at all.
    ///
    /// A session without data reports "no data found" instead of scores.
    pub fn has_data(&self) -> bool {
        !self.drop_reports.is_empty() || !self.pair_reports.is_empty() || self.group_report.is_some()
    }

    pub fn findings_of(&self, kind: FindingKind) -> impl Iterator<Item = &Finding> {
        self.findings.iter().filter(move |f| f.kind == kind)
    }
}
