//! Stream categories and their nominal frequency profiles.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{AnalysisError, NANOS_PER_SECOND};

/// Startup/shutdown margin excluded from large-drop detection (10 s).
pub const DEFAULT_STARTUP_MARGIN_NS: i64 = 10_000_000_000;

/// Explicit stream category, resolved once when streams are classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamCategory {
    Camera,
    StereoImu,
    ChassisImu,
    ChassisOdometry,
    BatteryState,
    Other,
}

impl StreamCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Camera => "camera",
            Self::StereoImu => "stereo_imu",
            Self::ChassisImu => "chassis_imu",
            Self::ChassisOdometry => "chassis_odometry",
            Self::BatteryState => "battery_state",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for StreamCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Expected sampling behaviour of a stream category.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrequencyProfile {
    /// Nominal sampling frequency (Hz), must be > 0
    pub nominal_frequency_hz: f64,

    /// Allowed deviation from the nominal period, as a fraction of it
    pub tolerance_fraction: f64,

    /// Consecutive drops tolerated before a gap is a large drop (-1 = unlimited)
    #[serde(default = "default_max_consecutive_drops")]
    pub max_consecutive_drops: i32,

    /// Warm-up samples ignored at the head of the stream
    #[serde(default)]
    pub skip_leading_samples: usize,

    /// Margin at both ends of the stream excluded from large-drop detection
    #[serde(default = "default_startup_margin_ns")]
    pub startup_margin_ns: i64,
}

fn default_max_consecutive_drops() -> i32 {
    -1
}

fn default_startup_margin_ns() -> i64 {
    DEFAULT_STARTUP_MARGIN_NS
}

impl Default for FrequencyProfile {
    /// Profile used for categories without a configured one: 30 Hz, 50 % tolerance.
    fn default() -> Self {
        Self::new(30.0, 0.5)
    }
}

impl FrequencyProfile {
    pub fn new(nominal_frequency_hz: f64, tolerance_fraction: f64) -> Self {
        Self {
            nominal_frequency_hz,
            tolerance_fraction,
            max_consecutive_drops: default_max_consecutive_drops(),
            skip_leading_samples: 0,
            startup_margin_ns: DEFAULT_STARTUP_MARGIN_NS,
        }
    }

    pub fn with_max_consecutive_drops(mut self, max: i32) -> Self {
        self.max_consecutive_drops = max;
        self
    }

    pub fn with_skip_leading_samples(mut self, count: usize) -> Self {
        self.skip_leading_samples = count;
        self
    }

    /// Nominal period in nanoseconds.
    #[inline]
    pub fn nominal_period_ns(&self) -> f64 {
        NANOS_PER_SECOND / self.nominal_frequency_hz
    }

    /// Allowed deviation from the nominal period in nanoseconds.
    #[inline]
    pub fn threshold_ns(&self) -> f64 {
        self.tolerance_fraction * self.nominal_period_ns()
    }

    /// Consecutive drop limit, `None` when unlimited.
    pub fn consecutive_drop_limit(&self) -> Option<u32> {
        u32::try_from(self.max_consecutive_drops).ok()
    }

    /// Reject profiles that indicate misuse rather than a data condition.
    pub fn validate(&self) -> Result<(), AnalysisError> {
        if !(self.nominal_frequency_hz.is_finite() && self.nominal_frequency_hz > 0.0) {
            return Err(AnalysisError::precondition(format!(
                "nominal_frequency_hz must be > 0, got {}",
                self.nominal_frequency_hz
            )));
        }
        if !(self.tolerance_fraction.is_finite() && self.tolerance_fraction >= 0.0) {
            return Err(AnalysisError::precondition(format!(
                "tolerance_fraction must be >= 0, got {}",
                self.tolerance_fraction
            )));
        }
        if self.max_consecutive_drops < -1 {
            return Err(AnalysisError::precondition(format!(
                "max_consecutive_drops must be >= -1, got {}",
                self.max_consecutive_drops
            )));
        }
        if self.startup_margin_ns < 0 {
            return Err(AnalysisError::precondition(format!(
                "startup_margin_ns must be >= 0, got {}",
                self.startup_margin_ns
            )));
        }
        Ok(())
    }
}

/// Where the profile applied to a stream came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileSource {
    /// Configured for the stream's category
    Configured,
    /// Category had no profile; the documented default was used
    Default,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_profile() {
        let profile = FrequencyProfile::default();
        assert_eq!(profile.nominal_frequency_hz, 30.0);
        assert_eq!(profile.tolerance_fraction, 0.5);
        assert_eq!(profile.consecutive_drop_limit(), None);
        assert!((profile.nominal_period_ns() - 33_333_333.333).abs() < 1.0);
    }

    #[test]
    fn test_validate_rejects_misuse() {
        assert!(FrequencyProfile::new(0.0, 0.1).validate().is_err());
        assert!(FrequencyProfile::new(-5.0, 0.1).validate().is_err());
        assert!(FrequencyProfile::new(f64::NAN, 0.1).validate().is_err());
        assert!(FrequencyProfile::new(30.0, -0.1).validate().is_err());
        assert!(FrequencyProfile::new(30.0, 0.1)
            .with_max_consecutive_drops(-2)
            .validate()
            .is_err());
        assert!(FrequencyProfile::new(30.0, 0.0)
            .with_max_consecutive_drops(2)
            .validate()
            .is_ok());
    }

    #[test]
    fn test_profile_serde_defaults() {
        let profile: FrequencyProfile =
            serde_json::from_str(r#"{"nominal_frequency_hz": 100.0, "tolerance_fraction": 0.02}"#)
                .unwrap();
        assert_eq!(profile.max_consecutive_drops, -1);
        assert_eq!(profile.skip_leading_samples, 0);
        assert_eq!(profile.startup_margin_ns, DEFAULT_STARTUP_MARGIN_NS);
    }

    #[test]
    fn test_category_names() {
        assert_eq!(StreamCategory::StereoImu.to_string(), "stereo_imu");
        let parsed: StreamCategory = serde_json::from_str("\"chassis_odometry\"").unwrap();
        assert_eq!(parsed, StreamCategory::ChassisOdometry);
    }
}
