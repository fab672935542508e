//! Nearest-neighbour synchronization between two independently clocked streams.

use contracts::{
    AnalysisError, CaptureTime, PairSyncReport, TimeSeries, DEFAULT_BUCKET_COUNT,
};
use tracing::{debug, instrument};

use crate::bucket;
use crate::stats::{mean_ns, percent};

/// Matches every sample of `a` to its nearest sample of `b`.
#[derive(Debug, Clone, Copy)]
pub struct PairSyncChecker {
    bucket_count: usize,
}

impl Default for PairSyncChecker {
    fn default() -> Self {
        Self::new(DEFAULT_BUCKET_COUNT)
    }
}

/// Sorted distinct capture times of a stream, each with its first index.
///
/// Built once per check; every lookup is a binary search, so input order of the
/// searched stream does not matter.
struct NearestIndex {
    runs: Vec<(CaptureTime, usize)>,
}

impl NearestIndex {
    fn build(samples: &[CaptureTime]) -> Self {
        let mut runs: Vec<(CaptureTime, usize)> =
            samples.iter().copied().zip(0..).collect();
        runs.sort_unstable();
        // Sorted by (time, index): the first entry of a run has the smallest index
        runs.dedup_by_key(|(t, _)| *t);
        Self { runs }
    }

    /// Nearest sample to `t` as (index, |difference|); equal distances resolve to
    /// the smaller index.
    fn nearest(&self, t: CaptureTime) -> Option<(usize, u64)> {
        let pos = self.runs.partition_point(|(time, _)| *time < t);
        let before = pos.checked_sub(1).and_then(|i| self.runs.get(i));
        let after = self.runs.get(pos);

        [before, after]
            .into_iter()
            .flatten()
            .map(|(time, index)| (t.abs_diff(*time), *index))
            .min()
            .map(|(diff, index)| (index, diff))
    }
}

impl PairSyncChecker {
    pub fn new(bucket_count: usize) -> Self {
        Self { bucket_count }
    }

    /// Check `a` against `b`, naming the report after both streams.
    pub fn check(
        &self,
        a: &TimeSeries,
        b: &TimeSeries,
        tolerance_ns: f64,
    ) -> Result<PairSyncReport, AnalysisError> {
        let name = format!("{} <-> {}", a.stream_id, b.stream_id);
        self.check_named(name, a, b, tolerance_ns)
    }

    /// Check `a` against `b`.
    ///
    /// Sample `i` of `a` is desynced when its nearest sample of `b` is more than
    /// `tolerance_ns` away, or when `b` has no samples at all.
    ///
    /// # Errors
    /// `Precondition` when `tolerance_ns` is negative or NaN.
    #[instrument(
        level = "debug",
        name = "pair_sync_check",
        skip(self, name, a, b),
        fields(a = %a.stream_id, b = %b.stream_id, len_a = a.len(), len_b = b.len())
    )]
    pub fn check_named(
        &self,
        name: impl Into<String>,
        a: &TimeSeries,
        b: &TimeSeries,
        tolerance_ns: f64,
    ) -> Result<PairSyncReport, AnalysisError> {
        if !(tolerance_ns >= 0.0) {
            return Err(AnalysisError::precondition(format!(
                "tolerance_ns must be >= 0, got {tolerance_ns}"
            )));
        }

        let index = NearestIndex::build(b.samples());
        let mut nearest_indices = Vec::with_capacity(a.len());
        let mut differences_ns = Vec::with_capacity(a.len());
        let mut matched_indices = Vec::new();
        let mut desynced_indices = Vec::new();
        let mut desynced_timestamps = Vec::new();

        for (i, &t) in a.samples().iter().enumerate() {
            match index.nearest(t) {
                Some((nearest, diff)) => {
                    nearest_indices.push(nearest);
                    differences_ns.push(diff);
                    if diff as f64 > tolerance_ns {
                        desynced_indices.push(i);
                        desynced_timestamps.push(t);
                    } else {
                        matched_indices.push(i);
                    }
                }
                None => {
                    desynced_indices.push(i);
                    desynced_timestamps.push(t);
                }
            }
        }

        let reference_stream = if b.len() > a.len() {
            b.stream_id.clone()
        } else {
            a.stream_id.clone()
        };
        let span = a.len().max(b.len());
        let num_desynced_frames = desynced_indices.len();

        debug!(
            desynced = num_desynced_frames,
            reference = %reference_stream,
            "pair sync complete"
        );

        Ok(PairSyncReport {
            name: name.into(),
            stream_a: a.stream_id.clone(),
            stream_b: b.stream_id.clone(),
            reference_stream,
            tolerance_ns,
            num_desynced_frames,
            percent_desynced_frames: percent(num_desynced_frames as u64, a.len() as u64),
            average_difference_ns: mean_ns(&differences_ns),
            max_difference_ns: differences_ns.iter().max().copied(),
            bucket_table: bucket::summarize(
                span,
                desynced_indices.iter().copied(),
                self.bucket_count,
            )
            .ok(),
            nearest_indices,
            differences_ns,
            matched_indices,
            desynced_indices,
            desynced_timestamps,
        })
    }
}
