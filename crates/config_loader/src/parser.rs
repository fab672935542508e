//! 配置解析模块
//!
//! 支持 TOML (主要) 和 JSON (可选) 格式。

use std::path::Path;

use contracts::{AnalysisError, ValidationConfig};

/// 配置文件格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// TOML 格式 (推荐)
    Toml,
    /// JSON 格式
    Json,
}

impl ConfigFormat {
    /// 从文件扩展名推断格式 (大小写不敏感)
    pub fn from_extension(ext: &str) -> Option<Self> {
        if ext.eq_ignore_ascii_case("toml") {
            Some(Self::Toml)
        } else if ext.eq_ignore_ascii_case("json") {
            Some(Self::Json)
        } else {
            None
        }
    }

    /// 从路径推断格式
    pub fn from_path(path: &Path) -> Result<Self, AnalysisError> {
        let ext = path.extension().and_then(|e| e.to_str()).ok_or_else(|| {
            AnalysisError::config_parse(format!(
                "{}: cannot determine config format without an extension",
                path.display()
            ))
        })?;
        Self::from_extension(ext).ok_or_else(|| {
            AnalysisError::config_parse(format!("unsupported config format: .{ext}"))
        })
    }

    fn name(self) -> &'static str {
        match self {
            Self::Toml => "TOML",
            Self::Json => "JSON",
        }
    }
}

fn parse_error<E>(format: ConfigFormat) -> impl FnOnce(E) -> AnalysisError
where
    E: std::error::Error + Send + Sync + 'static,
{
    move |e| AnalysisError::ConfigParse {
        message: format!("{} parse error: {e}", format.name()),
        source: Some(Box::new(e)),
    }
}

/// 根据格式解析配置 (不做语义校验)
pub fn parse(content: &str, format: ConfigFormat) -> Result<ValidationConfig, AnalysisError> {
    match format {
        ConfigFormat::Toml => toml::from_str(content).map_err(parse_error(format)),
        ConfigFormat::Json => serde_json::from_str(content).map_err(parse_error(format)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::StreamCategory;

    #[test]
    fn test_parse_toml_minimal() {
        let content = r#"
bucket_count = 32

[[profiles]]
category = "camera"
nominal_frequency_hz = 15.0
tolerance_fraction = 0.05
max_consecutive_drops = 3

[[streams]]
category = "camera"
contains = ["cam"]
"#;
        let result = parse(content, ConfigFormat::Toml);
        assert!(result.is_ok(), "Failed: {:?}", result.err());
        let config = result.unwrap();
        assert_eq!(config.bucket_count, 32);
        assert_eq!(config.profiles.len(), 1);
        assert_eq!(config.profiles[0].profile.max_consecutive_drops, 3);
        assert_eq!(config.profiles[0].profile.skip_leading_samples, 0);
        assert_eq!(config.classify("/cam0/image"), Some(StreamCategory::Camera));
        assert!(config.pair_sync.is_none());
        assert!(config.group_sync.is_none());
    }

    #[test]
    fn test_parse_json_minimal() {
        let content = r#"{
            "profiles": [
                { "category": "stereo_imu", "nominal_frequency_hz": 200.0, "tolerance_fraction": 0.02,
                  "skip_leading_samples": 10 }
            ],
            "streams": [{ "category": "stereo_imu", "names": ["/imu0"] }],
            "group_sync": { "category": "stereo_imu", "tolerance_ns": 1000.0, "nominal_frequency_hz": 200.0 }
        }"#;
        let result = parse(content, ConfigFormat::Json);
        assert!(result.is_ok(), "Failed: {:?}", result.err());
        let config = result.unwrap();
        assert_eq!(config.bucket_count, 64);
        let group = config.group_sync.unwrap();
        assert_eq!(group.name, "inter_camera_sync");
        assert_eq!(group.category, StreamCategory::StereoImu);
    }

    #[test]
    fn test_parse_toml_syntax_error() {
        let content = "invalid toml [[[";
        let result = parse(content, ConfigFormat::Toml);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, AnalysisError::ConfigParse { .. }));
    }

    #[test]
    fn test_parse_unknown_category() {
        let content = r#"
[[streams]]
category = "lidar"
contains = ["velodyne"]
"#;
        let err = parse(content, ConfigFormat::Toml).unwrap_err();
        assert!(err.to_string().contains("TOML parse error"));
    }

    #[test]
    fn test_format_from_extension() {
        for (ext, expected) in [
            ("toml", Some(ConfigFormat::Toml)),
            ("TOML", Some(ConfigFormat::Toml)),
            ("Json", Some(ConfigFormat::Json)),
            ("yaml", None),
        ] {
            assert_eq!(ConfigFormat::from_extension(ext), expected, "{ext}");
        }
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(
            ConfigFormat::from_path(Path::new("qc/stream-qc.json")).unwrap(),
            ConfigFormat::Json
        );
        assert!(ConfigFormat::from_path(Path::new("stream-qc")).is_err());
        assert!(ConfigFormat::from_path(Path::new("stream-qc.yaml")).is_err());
    }
}
