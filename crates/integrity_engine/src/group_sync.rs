//! Index-aligned synchronization across a group of co-triggered streams.

use std::collections::{BTreeMap, BTreeSet};

use contracts::{
    AnalysisError, GroupSyncReport, PairDifference, StreamOffset, TimeSeries,
    DEFAULT_BUCKET_COUNT, NANOS_PER_SECOND,
};
use tracing::{debug, instrument};

use crate::bucket;
use crate::stats::{mean, mean_ns, percent};

/// Compares same-index samples of every pair of group members.
#[derive(Debug, Clone, Copy)]
pub struct GroupSyncChecker {
    bucket_count: usize,
}

impl Default for GroupSyncChecker {
    fn default() -> Self {
        Self::new(DEFAULT_BUCKET_COUNT)
    }
}

impl GroupSyncChecker {
    pub fn new(bucket_count: usize) -> Self {
        Self { bucket_count }
    }

    pub fn check(
        &self,
        streams: &[&TimeSeries],
        tolerance_ns: f64,
        nominal_frequency_hz: f64,
    ) -> Result<GroupSyncReport, AnalysisError> {
        self.check_named("group_sync", streams, tolerance_ns, nominal_frequency_hz)
    }

    /// Check a group of at least two streams.
    ///
    /// The longest stream (first one on ties) is the reference timeline. Index `i`
    /// is desynced when any pair differs by more than `tolerance_ns` at `i`, or when
    /// a member stopped before `i`.
    ///
    /// # Errors
    /// - `InsufficientStreams` with fewer than two streams
    /// - `Precondition` for a negative tolerance or non-positive frequency
    #[instrument(
        level = "debug",
        name = "group_sync_check",
        skip(self, name, streams),
        fields(members = streams.len())
    )]
    pub fn check_named(
        &self,
        name: impl Into<String>,
        streams: &[&TimeSeries],
        tolerance_ns: f64,
        nominal_frequency_hz: f64,
    ) -> Result<GroupSyncReport, AnalysisError> {
        if streams.len() < 2 {
            return Err(AnalysisError::InsufficientStreams {
                required: 2,
                actual: streams.len(),
            });
        }
        if !(tolerance_ns >= 0.0) {
            return Err(AnalysisError::precondition(format!(
                "tolerance_ns must be >= 0, got {tolerance_ns}"
            )));
        }
        if !(nominal_frequency_hz.is_finite() && nominal_frequency_hz > 0.0) {
            return Err(AnalysisError::precondition(format!(
                "nominal_frequency_hz must be > 0, got {nominal_frequency_hz}"
            )));
        }

        let reference = streams
            .iter()
            .enumerate()
            .max_by_key(|(position, series)| (series.len(), std::cmp::Reverse(*position)))
            .map(|(_, series)| *series)
            .ok_or_else(|| AnalysisError::precondition("empty sync group"))?;
        let reference_length = reference.len();

        let mut desynced = BTreeSet::new();
        let mut pairs = Vec::new();
        for (i, a) in streams.iter().enumerate() {
            for b in &streams[i + 1..] {
                let pair = Self::compare(a, b, tolerance_ns);
                desynced.extend(pair.desynced_indices.iter().copied());
                pairs.push(pair);
            }
        }

        // A member that stopped early is out of sync for the remainder
        for series in streams {
            desynced.extend(series.len()..reference_length);
        }

        let period = NANOS_PER_SECOND / nominal_frequency_hz;
        let offsets: Vec<StreamOffset> = streams
            .iter()
            .map(|series| Self::frame_offsets(series, reference, period))
            .collect();

        let pair_means: Vec<f64> = pairs.iter().filter_map(|p| p.mean_ns).collect();
        let desynced_indices: Vec<usize> = desynced.into_iter().collect();
        let desynced_timestamps = desynced_indices
            .iter()
            .filter_map(|i| reference.samples().get(*i).copied())
            .collect();
        let num_desynced_frames = desynced_indices.len();

        debug!(
            reference = %reference.stream_id,
            reference_length,
            desynced = num_desynced_frames,
            "group sync complete"
        );

        Ok(GroupSyncReport {
            name: name.into(),
            tolerance_ns,
            nominal_frequency_hz,
            reference_stream: reference.stream_id.clone(),
            reference_length,
            average_difference_ns: mean(&pair_means),
            max_difference_ns: pairs.iter().filter_map(|p| p.max_ns).max(),
            percent_desynced_frames: percent(
                num_desynced_frames as u64,
                reference_length as u64,
            ),
            bucket_table: bucket::summarize(
                reference_length,
                desynced_indices.iter().copied(),
                self.bucket_count,
            )
            .ok(),
            pairs,
            offsets,
            desynced_indices,
            desynced_timestamps,
            num_desynced_frames,
        })
    }

    fn compare(a: &TimeSeries, b: &TimeSeries, tolerance_ns: f64) -> PairDifference {
        let differences: Vec<u64> = a
            .samples()
            .iter()
            .zip(b.samples())
            .map(|(ta, tb)| ta.abs_diff(*tb))
            .collect();

        PairDifference {
            stream_a: a.stream_id.clone(),
            stream_b: b.stream_id.clone(),
            compared: differences.len(),
            mean_ns: mean_ns(&differences),
            max_ns: differences.iter().max().copied(),
            desynced_indices: differences
                .iter()
                .enumerate()
                .filter(|(_, diff)| **diff as f64 > tolerance_ns)
                .map(|(i, _)| i)
                .collect(),
        }
    }

    fn frame_offsets(series: &TimeSeries, reference: &TimeSeries, period: f64) -> StreamOffset {
        let frame_offsets: Vec<i64> = series
            .samples()
            .iter()
            .zip(reference.samples())
            .map(|(t, t_ref)| {
                let diff = i128::from(*t) - i128::from(*t_ref);
                (diff as f64 / period).round() as i64
            })
            .collect();

        let mut counts: BTreeMap<i64, usize> = BTreeMap::new();
        for offset in &frame_offsets {
            *counts.entry(*offset).or_default() += 1;
        }
        // Most frequent; ties go to the offset closest to zero
        let dominant_offset = counts
            .into_iter()
            .max_by_key(|(offset, count)| (*count, std::cmp::Reverse(offset.unsigned_abs())))
            .map(|(offset, _)| offset);

        StreamOffset {
            stream_id: series.stream_id.clone(),
            frame_offsets,
            dominant_offset,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PERIOD: i64 = 33_333_333;

    fn camera(id: &str, start: i64, count: usize) -> TimeSeries {
        TimeSeries::periodic(id, start, PERIOD, count)
    }

    #[test]
    fn test_identical_streams_are_in_sync() {
        let (a, b, c) = (camera("a", 0, 300), camera("b", 0, 300), camera("c", 0, 300));
        let report = GroupSyncChecker::default()
            .check(&[&a, &b, &c], 1.0, 30.0)
            .unwrap();

        assert_eq!(report.num_desynced_frames, 0);
        assert_eq!(report.pairs.len(), 3);
        assert_eq!(report.average_difference_ns, Some(0.0));
        assert_eq!(report.percent_desynced_frames, Some(0.0));
        assert!(report.offsets.iter().all(|o| o.dominant_offset == Some(0)));
        assert_eq!(report.reference_stream, "a");
    }

    #[test]
    fn test_out_of_tolerance_index() {
        let a = camera("a", 0, 10);
        let mut samples = a.samples().to_vec();
        samples[4] += 200_000;
        let b = TimeSeries::new("b", samples);
        let c = camera("c", 0, 10);

        let report = GroupSyncChecker::default()
            .check_named("rig", &[&a, &b, &c], 150_000.0, 30.0)
            .unwrap();
        assert_eq!(report.name, "rig");
        assert_eq!(report.desynced_indices, vec![4]);
        assert_eq!(report.desynced_timestamps, vec![4 * PERIOD]);
        assert_eq!(report.max_difference_ns, Some(200_000));
        // a-b and b-c each see one 200 us difference over 10 samples
        assert_eq!(report.average_difference_ns, Some((20_000.0 + 0.0 + 20_000.0) / 3.0));
    }

    #[test]
    fn test_short_stream_trailing_indices_desynced() {
        let a = camera("a", 0, 8);
        let b = camera("b", 0, 10);
        let c = camera("c", 0, 6);

        let report = GroupSyncChecker::new(10)
            .check(&[&a, &b, &c], 0.0, 30.0)
            .unwrap();
        assert_eq!(report.reference_stream, "b");
        assert_eq!(report.reference_length, 10);
        assert_eq!(report.desynced_indices, vec![6, 7, 8, 9]);
        assert_eq!(report.percent_desynced_frames, Some(40.0));
        assert_eq!(
            report.bucket_table.map(|t| t.to_ascii()),
            Some("......xxxx".to_string())
        );
        let compared: Vec<usize> = report.pairs.iter().map(|p| p.compared).collect();
        assert_eq!(compared, vec![8, 6, 6]);
    }

    #[test]
    fn test_constant_frame_offset() {
        let a = camera("a", 0, 100);
        let b = camera("b", 2 * PERIOD + 1_000, 100);
        let report = GroupSyncChecker::default()
            .check(&[&a, &b], 150_000.0, 30.0)
            .unwrap();

        assert_eq!(report.num_desynced_frames, 100);
        assert_eq!(report.offsets[0].dominant_offset, Some(0));
        assert_eq!(report.offsets[1].dominant_offset, Some(2));
        assert!(report.offsets[1].frame_offsets.iter().all(|o| *o == 2));
    }

    #[test]
    fn test_preconditions() {
        let a = camera("a", 0, 10);
        assert!(matches!(
            GroupSyncChecker::default().check(&[&a], 0.0, 30.0),
            Err(AnalysisError::InsufficientStreams { required: 2, actual: 1 })
        ));
        assert!(matches!(
            GroupSyncChecker::default().check(&[&a, &a], -5.0, 30.0),
            Err(AnalysisError::Precondition { .. })
        ));
        assert!(matches!(
            GroupSyncChecker::default().check(&[&a, &a], 0.0, 0.0),
            Err(AnalysisError::Precondition { .. })
        ));
    }

    #[test]
    fn test_all_empty_members() {
        let a = TimeSeries::new("a", vec![]);
        let b = TimeSeries::new("b", vec![]);
        let report = GroupSyncChecker::default().check(&[&a, &b], 0.0, 30.0).unwrap();
        assert_eq!(report.num_desynced_frames, 0);
        assert_eq!(report.percent_desynced_frames, None);
        assert_eq!(report.average_difference_ns, None);
        assert!(report.bucket_table.is_none());
    }
}
