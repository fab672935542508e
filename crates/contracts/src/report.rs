//! Per-stream and per-check analysis reports.
//!
//! All reports are value objects: produced once by an analyzer, never mutated.
//! Statistics that cannot be computed (empty series, no transitions) are `None`.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{CaptureTime, FrequencyProfile, StreamId};

/// Default number of buckets in a bucket table.
pub const DEFAULT_BUCKET_COUNT: usize = 64;

const BAD_MARK: char = 'x';
const GOOD_MARK: char = '.';

/// Fixed-width histogram of "bad" index windows.
///
/// Serialized as its ASCII form, e.g. `"..x....x"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct BucketTable {
    buckets: Vec<bool>,
}

impl BucketTable {
    /// A table with every bucket clear.
    pub fn clear(width: usize) -> Self {
        Self {
            buckets: vec![false; width],
        }
    }

    pub fn from_flags(buckets: Vec<bool>) -> Self {
        Self { buckets }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.buckets.len()
    }

    #[inline]
    pub fn is_bad(&self, bucket: usize) -> bool {
        self.buckets.get(bucket).copied().unwrap_or(false)
    }

    /// Mark a bucket bad; out-of-range buckets are ignored.
    pub fn mark(&mut self, bucket: usize) {
        if let Some(slot) = self.buckets.get_mut(bucket) {
            *slot = true;
        }
    }

    pub fn bad_count(&self) -> usize {
        self.buckets.iter().filter(|b| **b).count()
    }

    pub fn flags(&self) -> &[bool] {
        &self.buckets
    }

    /// ASCII rendering, one character per bucket.
    pub fn to_ascii(&self) -> String {
        self.buckets
            .iter()
            .map(|bad| if *bad { BAD_MARK } else { GOOD_MARK })
            .collect()
    }
}

impl fmt::Display for BucketTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_ascii())
    }
}

impl From<BucketTable> for String {
    fn from(table: BucketTable) -> Self {
        table.to_ascii()
    }
}

impl TryFrom<String> for BucketTable {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value
            .chars()
            .map(|c| match c {
                BAD_MARK => Ok(true),
                GOOD_MARK => Ok(false),
                other => Err(format!("invalid bucket mark '{other}'")),
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Self::from_flags)
    }
}

/// OR-merge of several bucket tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergedBuckets {
    /// Number of bad buckets in the merged table
    pub fail_count: usize,
    pub table: BucketTable,
}

/// Interval statistics of a stream against its nominal period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JitterStats {
    /// Number of transitions the statistics cover
    pub sample_count: usize,
    pub mean_interval_ms: f64,
    /// `None` when the mean interval is not positive
    pub mean_frequency_hz: Option<f64>,
    /// `None` when the median interval is not positive
    pub median_frequency_hz: Option<f64>,
    /// Mean |interval - nominal period|
    pub mean_abs_error_ms: f64,
    /// Median |interval - nominal period|
    pub median_abs_error_ms: f64,
    /// Max |interval - nominal period|
    pub max_abs_error_ms: f64,
    /// Sample standard deviation of the intervals, `None` below two transitions
    pub std_ms: Option<f64>,
}

/// Gap above the large-drop threshold inside the interior window of a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LargeDrop {
    /// Index of the sample closing the gap
    pub index: usize,
    pub gap_ns: i64,
}

/// Capture-rate integrity of a single stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DropReport {
    pub stream_id: StreamId,
    pub profile: FrequencyProfile,

    /// Samples analyzed (after warm-up samples were skipped)
    pub total_samples: usize,
    pub skipped_leading_samples: usize,

    /// Frames inferred missing, multi-frame gaps attributed in full
    pub num_frames_dropped: u64,
    pub percent_frames_dropped: Option<f64>,

    /// Indices (into the full series) of samples closing an anomalous interval
    pub removed_indices: Vec<usize>,
    pub removed_timestamps: Vec<CaptureTime>,
    pub percent_indices_removed: Option<f64>,

    pub backward_indices: Vec<usize>,
    pub duplicate_indices: Vec<usize>,
    pub large_drops: Vec<LargeDrop>,

    pub largest_gap_ms: Option<f64>,
    /// Largest gap among `large_drops`
    pub largest_gap_interior_ms: Option<f64>,

    /// Statistics over all intervals
    pub jitter_all: Option<JitterStats>,
    /// Statistics with anomalous intervals excluded
    pub jitter_filtered: Option<JitterStats>,

    pub bucket_table: Option<BucketTable>,
}

impl DropReport {
    #[inline]
    pub fn num_removed(&self) -> usize {
        self.removed_indices.len()
    }

    #[inline]
    pub fn num_backward(&self) -> usize {
        self.backward_indices.len()
    }

    #[inline]
    pub fn num_duplicates(&self) -> usize {
        self.duplicate_indices.len()
    }

    pub fn mean_frequency_hz(&self) -> Option<f64> {
        self.jitter_all.as_ref().and_then(|j| j.mean_frequency_hz)
    }
}

/// Nearest-neighbour synchronization between two streams.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairSyncReport {
    pub name: String,
    pub stream_a: StreamId,
    pub stream_b: StreamId,
    /// Longer of the two streams; the bucket table spans its index range
    pub reference_stream: StreamId,
    pub tolerance_ns: f64,

    /// Per sample of `a`: index of the nearest sample of `b`
    pub nearest_indices: Vec<usize>,
    /// Per sample of `a`: |t_a - t_b(nearest)|
    pub differences_ns: Vec<u64>,

    /// Indices of `a` within tolerance
    pub matched_indices: Vec<usize>,
    /// Indices of `a` beyond tolerance or without any counterpart
    pub desynced_indices: Vec<usize>,
    pub desynced_timestamps: Vec<CaptureTime>,

    pub num_desynced_frames: usize,
    pub percent_desynced_frames: Option<f64>,
    pub average_difference_ns: Option<f64>,
    pub max_difference_ns: Option<u64>,

    pub bucket_table: Option<BucketTable>,
}

/// Same-index differences between two members of a sync group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairDifference {
    pub stream_a: StreamId,
    pub stream_b: StreamId,
    /// Indices compared (length of the shorter stream)
    pub compared: usize,
    pub mean_ns: Option<f64>,
    pub max_ns: Option<u64>,
    pub desynced_indices: Vec<usize>,
}

/// Frame offset of a group member relative to the reference stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamOffset {
    pub stream_id: StreamId,
    /// round((t_stream[i] - t_reference[i]) / nominal period), per shared index
    pub frame_offsets: Vec<i64>,
    /// Most frequent offset; a non-zero value means constant misalignment
    pub dominant_offset: Option<i64>,
}

/// Index-aligned synchronization across a group of co-triggered streams.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupSyncReport {
    pub name: String,
    pub tolerance_ns: f64,
    pub nominal_frequency_hz: f64,

    /// Longest stream; index range of the report
    pub reference_stream: StreamId,
    pub reference_length: usize,

    pub pairs: Vec<PairDifference>,
    pub offsets: Vec<StreamOffset>,

    /// Sorted union of every desynced index, trailing indices of short streams included
    pub desynced_indices: Vec<usize>,
    pub desynced_timestamps: Vec<CaptureTime>,
    pub num_desynced_frames: usize,
    pub percent_desynced_frames: Option<f64>,
    /// Mean of the per-pair mean differences
    pub average_difference_ns: Option<f64>,
    pub max_difference_ns: Option<u64>,

    pub bucket_table: Option<BucketTable>,
}
