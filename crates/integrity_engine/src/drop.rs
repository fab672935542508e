//! Per-stream drop analysis against a nominal sampling frequency.

use contracts::{
    AnalysisError, CaptureTime, DropReport, FrequencyProfile, LargeDrop, TimeSeries,
    DEFAULT_BUCKET_COUNT, NANOS_PER_MILLI,
};
use tracing::{debug, instrument};

use crate::bucket;
use crate::stats::{jitter_stats, percent};

/// Detects missed, backward, duplicate and large-gap samples in one stream.
#[derive(Debug, Clone, Copy)]
pub struct DropAnalyzer {
    bucket_count: usize,
}

impl Default for DropAnalyzer {
    fn default() -> Self {
        Self::new(DEFAULT_BUCKET_COUNT)
    }
}

/// Classification of every interval of the analyzed range.
#[derive(Default)]
struct IntervalScan {
    removed_indices: Vec<usize>,
    removed_timestamps: Vec<CaptureTime>,
    /// Intervals within tolerance
    filtered: Vec<i64>,
    backward_indices: Vec<usize>,
    duplicate_indices: Vec<usize>,
    frames_dropped: u64,
}

impl DropAnalyzer {
    pub fn new(bucket_count: usize) -> Self {
        Self { bucket_count }
    }

    /// Analyze `series` against `profile`.
    ///
    /// Interval `k` of the analyzed range closes the sample at index
    /// `skipped + k + 1`; every reported index refers to the full series.
    ///
    /// # Errors
    /// `Precondition` when the profile is invalid (e.g. non-positive frequency).
    #[instrument(
        level = "debug",
        name = "drop_analyze",
        skip(self, series, profile),
        fields(stream_id = %series.stream_id, samples = series.len())
    )]
    pub fn analyze(
        &self,
        series: &TimeSeries,
        profile: &FrequencyProfile,
    ) -> Result<DropReport, AnalysisError> {
        profile.validate()?;

        let skipped = profile.skip_leading_samples.min(series.len());
        let samples = &series.samples()[skipped..];
        let intervals: Vec<i64> = samples
            .windows(2)
            .map(|pair| pair[1].saturating_sub(pair[0]))
            .collect();

        let period = profile.nominal_period_ns();
        let scan = Self::scan_intervals(samples, &intervals, skipped, profile);
        let large_drops = Self::large_drops(samples, &intervals, skipped, profile);

        let total_samples = samples.len();
        let removed = scan.removed_indices.len();

        debug!(
            frames_dropped = scan.frames_dropped,
            removed,
            backward = scan.backward_indices.len(),
            duplicates = scan.duplicate_indices.len(),
            large_drops = large_drops.len(),
            "drop analysis complete"
        );

        Ok(DropReport {
            stream_id: series.stream_id.clone(),
            profile: *profile,
            total_samples,
            skipped_leading_samples: skipped,
            num_frames_dropped: scan.frames_dropped,
            percent_frames_dropped: percent(
                scan.frames_dropped,
                (total_samples as u64).saturating_add(scan.frames_dropped),
            ),
            percent_indices_removed: percent(removed as u64, total_samples as u64),
            largest_gap_ms: intervals.iter().max().map(|gap| *gap as f64 / NANOS_PER_MILLI),
            largest_gap_interior_ms: large_drops
                .iter()
                .map(|d| d.gap_ns)
                .max()
                .map(|gap| gap as f64 / NANOS_PER_MILLI),
            jitter_all: jitter_stats(&intervals, period),
            jitter_filtered: jitter_stats(&scan.filtered, period),
            bucket_table: bucket::summarize(
                series.len(),
                scan.removed_indices.iter().copied(),
                self.bucket_count,
            )
            .ok(),
            removed_indices: scan.removed_indices,
            removed_timestamps: scan.removed_timestamps,
            backward_indices: scan.backward_indices,
            duplicate_indices: scan.duplicate_indices,
            large_drops,
        })
    }

    fn scan_intervals(
        samples: &[CaptureTime],
        intervals: &[i64],
        skipped: usize,
        profile: &FrequencyProfile,
    ) -> IntervalScan {
        let period = profile.nominal_period_ns();
        let threshold = profile.threshold_ns();
        let mut scan = IntervalScan::default();

        for (k, &dt) in intervals.iter().enumerate() {
            let index = skipped + k + 1;
            let deviation = (dt as f64 - period).abs();

            if deviation > threshold {
                scan.removed_indices.push(index);
                scan.removed_timestamps.push(samples[k + 1]);
                // A gap of (n + 1) periods hides n frames
                let hidden = ((deviation / period).round() as u64).max(1);
                scan.frames_dropped = scan.frames_dropped.saturating_add(hidden);
            } else {
                scan.filtered.push(dt);
            }

            // Order violations are reported regardless of tolerance
            if dt < 0 {
                scan.backward_indices.push(index);
            } else if dt == 0 {
                scan.duplicate_indices.push(index);
            }
        }

        scan
    }

    /// Gaps longer than the consecutive-drop limit, away from startup and shutdown.
    fn large_drops(
        samples: &[CaptureTime],
        intervals: &[i64],
        skipped: usize,
        profile: &FrequencyProfile,
    ) -> Vec<LargeDrop> {
        let Some(limit) = profile.consecutive_drop_limit() else {
            return Vec::new();
        };
        let (Some(first), Some(last)) = (samples.iter().min(), samples.iter().max()) else {
            return Vec::new();
        };

        let threshold = (f64::from(limit) + 1.0) * profile.nominal_period_ns() - profile.threshold_ns();
        let window_start = first.saturating_add(profile.startup_margin_ns);
        let window_end = last.saturating_sub(profile.startup_margin_ns);

        intervals
            .iter()
            .enumerate()
            .filter_map(|(k, &gap_ns)| {
                let closing = samples[k + 1];
                let interior = closing > window_start && closing < window_end;
                (interior && gap_ns as f64 > threshold).then_some(LargeDrop {
                    index: skipped + k + 1,
                    gap_ns,
                })
            })
            .collect()
    }
}
