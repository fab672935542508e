//! 配置校验模块
//!
//! 校验规则：
//! - bucket_count > 0
//! - 每个 FrequencyProfile 合法 (frequency > 0, tolerance >= 0, ...)
//! - profile 类别唯一
//! - 每条分类规则至少有一个匹配条件
//! - pair_sync 左右标记非空且不同，tolerance 有限且 >= 0
//! - group_sync 名称非空，tolerance 有限且 >= 0，frequency > 0

use std::collections::HashSet;

use contracts::{AnalysisError, FrequencyProfile, ValidationConfig};

/// 校验 ValidationConfig 配置
///
/// 返回第一个遇到的错误，或 Ok(())。
pub fn validate(config: &ValidationConfig) -> Result<(), AnalysisError> {
    validate_bucket_count(config)?;
    validate_profiles(config)?;
    validate_stream_rules(config)?;
    validate_pair_sync(config)?;
    validate_group_sync(config)?;
    Ok(())
}

fn validate_bucket_count(config: &ValidationConfig) -> Result<(), AnalysisError> {
    if config.bucket_count == 0 {
        return Err(AnalysisError::config_validation(
            "bucket_count",
            "bucket_count must be > 0",
        ));
    }
    Ok(())
}

/// 校验 profile 合法性与类别唯一性
fn validate_profiles(config: &ValidationConfig) -> Result<(), AnalysisError> {
    check_profile("default_profile", &config.default_profile)?;

    let mut seen = HashSet::new();
    for (idx, entry) in config.profiles.iter().enumerate() {
        check_profile(&format!("profiles[{idx}]"), &entry.profile)?;
        if !seen.insert(entry.category) {
            return Err(AnalysisError::config_validation(
                format!("profiles[category={}]", entry.category),
                "duplicate profile category",
            ));
        }
    }
    Ok(())
}

fn check_profile(field: &str, profile: &FrequencyProfile) -> Result<(), AnalysisError> {
    profile.validate().map_err(|e| match e {
        AnalysisError::Precondition { message } => {
            AnalysisError::config_validation(field, message)
        }
        other => other,
    })
}

/// 校验分类规则
fn validate_stream_rules(config: &ValidationConfig) -> Result<(), AnalysisError> {
    for (idx, rule) in config.streams.iter().enumerate() {
        if rule.names.is_empty() && rule.contains.is_empty() {
            return Err(AnalysisError::config_validation(
                format!("streams[{idx}]"),
                "rule needs at least one of `names` or `contains`",
            ));
        }
        if rule.contains.iter().any(String::is_empty) {
            return Err(AnalysisError::config_validation(
                format!("streams[{idx}].contains"),
                "empty pattern matches every stream",
            ));
        }
    }
    Ok(())
}

fn check_tolerance(field: &str, tolerance_ns: f64) -> Result<(), AnalysisError> {
    if !(tolerance_ns.is_finite() && tolerance_ns >= 0.0) {
        return Err(AnalysisError::config_validation(
            field,
            format!("tolerance_ns must be finite and >= 0, got {tolerance_ns}"),
        ));
    }
    Ok(())
}

/// 校验双流同步配置
fn validate_pair_sync(config: &ValidationConfig) -> Result<(), AnalysisError> {
    let Some(pair) = &config.pair_sync else {
        return Ok(());
    };

    if pair.left.is_empty() || pair.right.is_empty() {
        return Err(AnalysisError::config_validation(
            "pair_sync.left / pair_sync.right",
            "side tokens cannot be empty",
        ));
    }
    if pair.left == pair.right {
        return Err(AnalysisError::config_validation(
            "pair_sync.left / pair_sync.right",
            format!("side tokens must differ, both are '{}'", pair.left),
        ));
    }
    if pair.left.contains('/') || pair.right.contains('/') {
        return Err(AnalysisError::config_validation(
            "pair_sync.left / pair_sync.right",
            "side tokens are single path segments",
        ));
    }
    check_tolerance("pair_sync.tolerance_ns", pair.tolerance_ns)
}

/// 校验多流同步配置
fn validate_group_sync(config: &ValidationConfig) -> Result<(), AnalysisError> {
    let Some(group) = &config.group_sync else {
        return Ok(());
    };

    if group.name.is_empty() {
        return Err(AnalysisError::config_validation(
            "group_sync.name",
            "group name cannot be empty",
        ));
    }
    check_tolerance("group_sync.tolerance_ns", group.tolerance_ns)?;
    if !(group.nominal_frequency_hz.is_finite() && group.nominal_frequency_hz > 0.0) {
        return Err(AnalysisError::config_validation(
            "group_sync.nominal_frequency_hz",
            format!(
                "nominal_frequency_hz must be > 0, got {}",
                group.nominal_frequency_hz
            ),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{CategoryProfile, StreamCategory, StreamRule};

    #[test]
    fn test_valid_config() {
        assert!(validate(&ValidationConfig::default()).is_ok());
    }

    #[test]
    fn test_zero_bucket_count() {
        let config = ValidationConfig {
            bucket_count: 0,
            ..Default::default()
        };
        let err = validate(&config).unwrap_err().to_string();
        assert!(err.contains("bucket_count"), "got: {err}");
    }

    #[test]
    fn test_invalid_profile_frequency() {
        let mut config = ValidationConfig::default();
        config.profiles[1].profile.nominal_frequency_hz = -5.0;
        let err = validate(&config).unwrap_err();
        assert!(matches!(err, AnalysisError::ConfigValidation { .. }));
        let err = err.to_string();
        assert!(err.contains("profiles[1]"), "got: {err}");
        assert!(err.contains("must be > 0"), "got: {err}");
    }

    #[test]
    fn test_invalid_drop_limit() {
        let mut config = ValidationConfig::default();
        config.default_profile.max_consecutive_drops = -3;
        let err = validate(&config).unwrap_err().to_string();
        assert!(err.contains("default_profile"), "got: {err}");
    }

    #[test]
    fn test_duplicate_profile_category() {
        let mut config = ValidationConfig::default();
        config.profiles.push(CategoryProfile {
            category: StreamCategory::Camera,
            profile: FrequencyProfile::new(15.0, 0.1),
        });
        let err = validate(&config).unwrap_err().to_string();
        assert!(err.contains("duplicate profile category"), "got: {err}");
    }

    #[test]
    fn test_rule_without_matcher() {
        let mut config = ValidationConfig::default();
        config.streams.push(StreamRule {
            category: StreamCategory::Other,
            names: vec![],
            contains: vec![],
            exclude: vec!["x".into()],
        });
        let err = validate(&config).unwrap_err().to_string();
        assert!(err.contains("at least one"), "got: {err}");
    }

    #[test]
    fn test_pair_tokens() {
        let mut config = ValidationConfig::default();
        if let Some(pair) = config.pair_sync.as_mut() {
            pair.right = "left".into();
        }
        let err = validate(&config).unwrap_err().to_string();
        assert!(err.contains("must differ"), "got: {err}");
    }

    #[test]
    fn test_negative_tolerance() {
        let mut config = ValidationConfig::default();
        if let Some(group) = config.group_sync.as_mut() {
            group.tolerance_ns = -1.0;
        }
        let err = validate(&config).unwrap_err().to_string();
        assert!(err.contains("group_sync.tolerance_ns"), "got: {err}");

        let mut config = ValidationConfig::default();
        if let Some(pair) = config.pair_sync.as_mut() {
            pair.tolerance_ns = f64::NAN;
        }
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_group_frequency() {
        let mut config = ValidationConfig::default();
        if let Some(group) = config.group_sync.as_mut() {
            group.nominal_frequency_hz = 0.0;
        }
        let err = validate(&config).unwrap_err().to_string();
        assert!(err.contains("nominal_frequency_hz"), "got: {err}");
    }
}
