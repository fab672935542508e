//! AnalysisPlan - which checks run over which streams
//!
//! Built by the config loader from a `ValidationConfig` and the stream ids of a
//! recording; consumed by the session analyzer.

use serde::{Deserialize, Serialize};

use crate::{FrequencyProfile, ProfileSource, StreamCategory, StreamId, DEFAULT_BUCKET_COUNT};

/// Drop analysis of one stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DropCheck {
    pub stream_id: StreamId,
    pub category: StreamCategory,
    pub profile: FrequencyProfile,
    pub profile_source: ProfileSource,
}

/// Nearest-neighbour sync between two streams.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairCheck {
    pub name: String,
    pub left: StreamId,
    pub right: StreamId,
    pub tolerance_ns: f64,
}

/// Index-aligned sync across a group of streams.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupCheck {
    pub name: String,
    pub members: Vec<StreamId>,
    pub tolerance_ns: f64,
    pub nominal_frequency_hz: f64,
}

/// Full set of checks for one recording.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisPlan {
    pub bucket_count: usize,
    /// Category whose drop reports are scored
    pub score_category: StreamCategory,
    pub drop_checks: Vec<DropCheck>,
    pub pair_checks: Vec<PairCheck>,
    pub group_check: Option<GroupCheck>,
    /// Streams matching no classification rule
    pub unclassified: Vec<StreamId>,
    /// Checks that were configured but could not be planned, with the reason
    pub skipped_checks: Vec<(String, String)>,
}

impl Default for AnalysisPlan {
    fn default() -> Self {
        Self {
            bucket_count: DEFAULT_BUCKET_COUNT,
            score_category: StreamCategory::Camera,
            drop_checks: Vec::new(),
            pair_checks: Vec::new(),
            group_check: None,
            unclassified: Vec::new(),
            skipped_checks: Vec::new(),
        }
    }
}

impl AnalysisPlan {
    pub fn is_empty(&self) -> bool {
        self.drop_checks.is_empty() && self.pair_checks.is_empty() && self.group_check.is_none()
    }

    pub fn category_of(&self, stream_id: &str) -> Option<StreamCategory> {
        self.drop_checks
            .iter()
            .find(|c| c.stream_id == stream_id)
            .map(|c| c.category)
    }
}
