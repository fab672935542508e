//! Interval statistics with guarded division.
//!
//! Nothing here relies on NaN propagation: an empty input yields `None`.

use contracts::{JitterStats, NANOS_PER_MILLI, NANOS_PER_SECOND};
use observability::RunningStats;

/// Arithmetic mean, `None` for an empty slice.
pub fn mean<T: Copy + Into<f64>>(values: &[T]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let sum: f64 = values.iter().map(|v| (*v).into()).sum();
    Some(sum / values.len() as f64)
}

/// Mean of unsigned nanosecond differences.
pub fn mean_ns(values: &[u64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let sum: f64 = values.iter().map(|v| *v as f64).sum();
    Some(sum / values.len() as f64)
}

/// Median, averaging the two middle values for even lengths.
pub fn median(values: &[i64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_unstable();
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] as f64 + sorted[mid] as f64) / 2.0)
    } else {
        Some(sorted[mid] as f64)
    }
}

/// Median of floating-point values, `None` for an empty slice.
pub fn median_f64(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_unstable_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// `part / whole * 100`, `None` when `whole` is zero.
pub fn percent(part: u64, whole: u64) -> Option<f64> {
    (whole > 0).then(|| part as f64 / whole as f64 * 100.0)
}

/// Frequency of an interval, `None` unless the interval is positive.
pub fn frequency_hz(interval_ns: f64) -> Option<f64> {
    (interval_ns > 0.0).then(|| NANOS_PER_SECOND / interval_ns)
}

/// Statistics of `intervals` (ns) against `nominal_period_ns`.
pub fn jitter_stats(intervals: &[i64], nominal_period_ns: f64) -> Option<JitterStats> {
    if intervals.is_empty() {
        return None;
    }

    let mut interval_stats = RunningStats::default();
    let mut error_stats = RunningStats::default();
    let mut errors = Vec::with_capacity(intervals.len());
    for dt in intervals {
        let dt = *dt as f64;
        let error = (dt - nominal_period_ns).abs();
        interval_stats.push(dt);
        error_stats.push(error);
        errors.push(error);
    }

    let mean_interval = interval_stats.mean();
    let median_interval = median(intervals)?;
    let median_error = median_f64(&errors)?;

    Some(JitterStats {
        sample_count: intervals.len(),
        mean_interval_ms: mean_interval / NANOS_PER_MILLI,
        mean_frequency_hz: frequency_hz(mean_interval),
        median_frequency_hz: frequency_hz(median_interval),
        mean_abs_error_ms: error_stats.mean() / NANOS_PER_MILLI,
        median_abs_error_ms: median_error / NANOS_PER_MILLI,
        max_abs_error_ms: error_stats.max() / NANOS_PER_MILLI,
        std_ms: (interval_stats.count() >= 2).then(|| interval_stats.std_dev() / NANOS_PER_MILLI),
    })
}
