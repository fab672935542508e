//! TimeSeries - the unit every analyzer consumes.

use serde::{Deserialize, Serialize};

use crate::StreamId;

/// Capture (acquisition) time in nanoseconds.
pub type CaptureTime = i64;

/// Nanoseconds per second.
pub const NANOS_PER_SECOND: f64 = 1e9;

/// Nanoseconds per millisecond.
pub const NANOS_PER_MILLI: f64 = 1e6;

/// Ordered capture timestamps of one stream.
///
/// Samples are kept in recording order. Non-decreasing order is expected but not
/// enforced: backward and duplicate timestamps are findings, not construction errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSeries {
    pub stream_id: StreamId,
    samples: Vec<CaptureTime>,
}

impl TimeSeries {
    pub fn new(stream_id: impl Into<StreamId>, samples: Vec<CaptureTime>) -> Self {
        Self {
            stream_id: stream_id.into(),
            samples,
        }
    }

    /// Perfectly periodic series, handy for fixtures and synthetic checks.
    pub fn periodic(
        stream_id: impl Into<StreamId>,
        start: CaptureTime,
        period_ns: i64,
        count: usize,
    ) -> Self {
        let samples = (0..count as i64).map(|i| start + i * period_ns).collect();
        Self::new(stream_id, samples)
    }

    #[inline]
    pub fn samples(&self) -> &[CaptureTime] {
        &self.samples
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Earliest and latest capture time, if any.
    pub fn time_range(&self) -> Option<(CaptureTime, CaptureTime)> {
        let min = self.samples.iter().min()?;
        let max = self.samples.iter().max()?;
        Some((*min, *max))
    }
}
