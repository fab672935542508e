//! ValidationConfig - Config Loader output
//!
//! Describes how streams are classified, which profile each category uses,
//! and which sync checks run over which categories.

use serde::{Deserialize, Serialize};

use crate::{FrequencyProfile, ProfileSource, StreamCategory, DEFAULT_BUCKET_COUNT};

/// Configuration version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Complete analysis configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationConfig {
    #[serde(default)]
    pub version: ConfigVersion,

    /// Buckets per bucket table
    #[serde(default = "default_bucket_count")]
    pub bucket_count: usize,

    /// Profile for categories without a configured one
    #[serde(default)]
    pub default_profile: FrequencyProfile,

    /// Category whose drop reports feed the drop and bucket scores
    #[serde(default = "default_score_category")]
    pub score_category: StreamCategory,

    /// Per-category profiles
    #[serde(default)]
    pub profiles: Vec<CategoryProfile>,

    /// Classification rules, first match wins
    #[serde(default)]
    pub streams: Vec<StreamRule>,

    /// Left/right pair sync (disabled when absent)
    #[serde(default)]
    pub pair_sync: Option<PairSyncConfig>,

    /// Group sync (disabled when absent)
    #[serde(default)]
    pub group_sync: Option<GroupSyncConfig>,
}

fn default_bucket_count() -> usize {
    DEFAULT_BUCKET_COUNT
}

fn default_score_category() -> StreamCategory {
    StreamCategory::Camera
}

/// Profile bound to a category.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CategoryProfile {
    pub category: StreamCategory,
    #[serde(flatten)]
    pub profile: FrequencyProfile,
}

/// Stream classification rule.
///
/// A stream matches when its id equals one of `names` or contains one of
/// `contains`, and contains none of `exclude`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamRule {
    pub category: StreamCategory,
    #[serde(default)]
    pub names: Vec<String>,
    #[serde(default)]
    pub contains: Vec<String>,
    #[serde(default)]
    pub exclude: Vec<String>,
}

impl StreamRule {
    pub fn matches(&self, stream_id: &str) -> bool {
        let included = self.names.iter().any(|n| n == stream_id)
            || self.contains.iter().any(|c| stream_id.contains(c.as_str()));
        included && !self.exclude.iter().any(|e| stream_id.contains(e.as_str()))
    }
}

/// Left/right pairing of streams for nearest-neighbour sync.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairSyncConfig {
    #[serde(default = "default_score_category")]
    pub category: StreamCategory,
    /// Path segment naming the left stream
    #[serde(default = "default_left_token")]
    pub left: String,
    /// Path segment naming the right stream
    #[serde(default = "default_right_token")]
    pub right: String,
    /// Allowed |t_left - t_right| in nanoseconds
    #[serde(default)]
    pub tolerance_ns: f64,
}

fn default_left_token() -> String {
    "left".to_string()
}

fn default_right_token() -> String {
    "right".to_string()
}

/// Index-aligned sync across every stream of a category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupSyncConfig {
    #[serde(default = "default_group_name")]
    pub name: String,
    #[serde(default = "default_score_category")]
    pub category: StreamCategory,
    pub tolerance_ns: f64,
    pub nominal_frequency_hz: f64,
}

fn default_group_name() -> String {
    "inter_camera_sync".to_string()
}

impl Default for ValidationConfig {
    /// Reference deployment: stereo camera rigs on a wheeled base.
    fn default() -> Self {
        let rule = |category, names: &[&str], contains: &[&str]| StreamRule {
            category,
            names: names.iter().map(|s| s.to_string()).collect(),
            contains: contains.iter().map(|s| s.to_string()).collect(),
            exclude: Vec::new(),
        };

        Self {
            version: ConfigVersion::V1,
            bucket_count: DEFAULT_BUCKET_COUNT,
            default_profile: FrequencyProfile::default(),
            score_category: StreamCategory::Camera,
            profiles: vec![
                CategoryProfile {
                    category: StreamCategory::Camera,
                    profile: FrequencyProfile::new(30.0, 0.01).with_max_consecutive_drops(2),
                },
                CategoryProfile {
                    category: StreamCategory::StereoImu,
                    profile: FrequencyProfile::new(100.0, 0.02).with_skip_leading_samples(32),
                },
                CategoryProfile {
                    category: StreamCategory::ChassisImu,
                    profile: FrequencyProfile::new(40.0, 0.5),
                },
                CategoryProfile {
                    category: StreamCategory::ChassisOdometry,
                    profile: FrequencyProfile::new(40.0, 0.5),
                },
                CategoryProfile {
                    category: StreamCategory::BatteryState,
                    profile: FrequencyProfile::new(100.0, 0.5),
                },
            ],
            streams: vec![
                rule(StreamCategory::StereoImu, &[], &["stereo_imu"]),
                rule(StreamCategory::Camera, &[], &["camera", "owl", "hawk"]),
                rule(StreamCategory::ChassisImu, &["/imu", "/chassis/imu"], &[]),
                rule(StreamCategory::ChassisOdometry, &["/odom", "/chassis/odom"], &[]),
                rule(
                    StreamCategory::BatteryState,
                    &["/battery_state", "/chassis/battery_state"],
                    &[],
                ),
            ],
            pair_sync: Some(PairSyncConfig {
                category: StreamCategory::Camera,
                left: default_left_token(),
                right: default_right_token(),
                tolerance_ns: 0.0,
            }),
            group_sync: Some(GroupSyncConfig {
                name: default_group_name(),
                category: StreamCategory::Camera,
                tolerance_ns: 150_000.0,
                nominal_frequency_hz: 30.0,
            }),
        }
    }
}

impl ValidationConfig {
    /// Category of a stream, `None` when no rule matches.
    pub fn classify(&self, stream_id: &str) -> Option<StreamCategory> {
        self.streams
            .iter()
            .find(|rule| rule.matches(stream_id))
            .map(|rule| rule.category)
    }

    /// Profile of a category, falling back to `default_profile`.
    pub fn profile_for(&self, category: StreamCategory) -> (FrequencyProfile, ProfileSource) {
        self.profiles
            .iter()
            .find(|p| p.category == category)
            .map(|p| (p.profile, ProfileSource::Configured))
            .unwrap_or((self.default_profile, ProfileSource::Default))
    }
}
