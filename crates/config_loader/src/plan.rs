//! 分析计划构建
//!
//! 将 ValidationConfig 与录制中的 stream id 结合，生成 AnalysisPlan：
//! - 按规则分类 (首个匹配规则生效)
//! - 左右目配对 (`<base>/<left>/<kind>` 与 `<base>/<right>/<kind>`)
//! - 组同步成员 (同类别全部流，按录制顺序)

use std::collections::BTreeMap;

use contracts::{
    AnalysisPlan, DropCheck, GroupCheck, PairCheck, PairSyncConfig, ProfileSource, StreamId,
    ValidationConfig,
};
use tracing::{debug, warn};

/// Build the analysis plan for a recording holding `stream_ids`.
pub fn build_plan(config: &ValidationConfig, stream_ids: &[StreamId]) -> AnalysisPlan {
    let mut plan = AnalysisPlan {
        bucket_count: config.bucket_count,
        score_category: config.score_category,
        ..Default::default()
    };

    for stream_id in stream_ids {
        let Some(category) = config.classify(stream_id) else {
            debug!(stream_id = %stream_id, "no classification rule matches, skipped");
            plan.unclassified.push(stream_id.clone());
            continue;
        };

        let (profile, profile_source) = config.profile_for(category);
        if profile_source == ProfileSource::Default {
            warn!(
                stream_id = %stream_id,
                category = %category,
                "no profile for category, using default profile"
            );
        }
        plan.drop_checks.push(DropCheck {
            stream_id: stream_id.clone(),
            category,
            profile,
            profile_source,
        });
    }

    if let Some(pair) = &config.pair_sync {
        plan_pairs(pair, &mut plan);
    }

    if let Some(group) = &config.group_sync {
        let members: Vec<StreamId> = plan
            .drop_checks
            .iter()
            .filter(|c| c.category == group.category)
            .map(|c| c.stream_id.clone())
            .collect();

        if members.len() >= 2 {
            plan.group_check = Some(GroupCheck {
                name: group.name.clone(),
                members,
                tolerance_ns: group.tolerance_ns,
                nominal_frequency_hz: group.nominal_frequency_hz,
            });
        } else {
            plan.skipped_checks.push((
                group.name.clone(),
                format!(
                    "{} '{}' streams, at least 2 required",
                    members.len(),
                    group.category
                ),
            ));
        }
    }

    debug!(
        drop_checks = plan.drop_checks.len(),
        pair_checks = plan.pair_checks.len(),
        group_check = plan.group_check.is_some(),
        unclassified = plan.unclassified.len(),
        "analysis plan built"
    );

    plan
}

/// Split `<base>/<side>/<kind>` into its three parts.
fn split_side(stream_id: &str) -> Option<(&str, &str, &str)> {
    let mut parts = stream_id.rsplitn(3, '/');
    let kind = parts.next()?;
    let side = parts.next()?;
    let base = parts.next()?;
    Some((base, side, kind))
}

#[derive(Default)]
struct Sides {
    left: Option<StreamId>,
    right: Option<StreamId>,
}

fn plan_pairs(pair: &PairSyncConfig, plan: &mut AnalysisPlan) {
    let mut sides: BTreeMap<(String, String), Sides> = BTreeMap::new();

    for check in plan.drop_checks.iter().filter(|c| c.category == pair.category) {
        let Some((base, side, kind)) = split_side(&check.stream_id) else {
            continue;
        };
        let entry = sides.entry((base.to_string(), kind.to_string())).or_default();
        if side == pair.left {
            entry.left.get_or_insert_with(|| check.stream_id.clone());
        } else if side == pair.right {
            entry.right.get_or_insert_with(|| check.stream_id.clone());
        }
    }

    for ((base, kind), found) in sides {
        let name = format!("{base}/{kind}/sync");
        match (found.left, found.right) {
            (Some(left), Some(right)) => plan.pair_checks.push(PairCheck {
                name,
                left,
                right,
                tolerance_ns: pair.tolerance_ns,
            }),
            (Some(only), None) | (None, Some(only)) => plan
                .skipped_checks
                .push((name, format!("no counterpart for '{only}'"))),
            (None, None) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::StreamCategory;

    fn ids(names: &[&str]) -> Vec<StreamId> {
        names.iter().map(|n| StreamId::from(*n)).collect()
    }

    #[test]
    fn test_classification_and_profiles() {
        let config = ValidationConfig::default();
        let plan = build_plan(
            &config,
            &ids(&["/front_stereo_camera/left/image_raw", "/front_stereo_imu/imu", "/tf"]),
        );

        assert_eq!(plan.drop_checks.len(), 2);
        assert_eq!(plan.unclassified, ids(&["/tf"]));
        assert_eq!(plan.category_of("/front_stereo_imu/imu"), Some(StreamCategory::StereoImu));
        let imu = &plan.drop_checks[1];
        assert_eq!(imu.profile.skip_leading_samples, 32);
        assert_eq!(imu.profile_source, ProfileSource::Configured);
    }

    #[test]
    fn test_stereo_pairing() {
        let config = ValidationConfig::default();
        let plan = build_plan(
            &config,
            &ids(&[
                "/front_stereo_camera/left/image_compressed",
                "/front_stereo_camera/right/image_compressed",
                "/front_stereo_camera/left/camera_info",
                "/front_stereo_camera/right/camera_info",
                "/back_stereo_camera/left/image_compressed",
            ]),
        );

        let names: Vec<&str> = plan.pair_checks.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "/front_stereo_camera/camera_info/sync",
                "/front_stereo_camera/image_compressed/sync",
            ]
        );
        assert_eq!(plan.pair_checks[1].left, "/front_stereo_camera/left/image_compressed");
        assert_eq!(plan.pair_checks[1].right, "/front_stereo_camera/right/image_compressed");
        assert_eq!(plan.skipped_checks.len(), 1);
        assert_eq!(plan.skipped_checks[0].0, "/back_stereo_camera/image_compressed/sync");
    }

    #[test]
    fn test_group_membership() {
        let config = ValidationConfig::default();
        let streams = ids(&["/hawk_0/image", "/imu", "/hawk_1/image", "/owl/image"]);
        let plan = build_plan(&config, &streams);

        let group = plan.group_check.expect("group check planned");
        assert_eq!(group.members, ids(&["/hawk_0/image", "/hawk_1/image", "/owl/image"]));
        assert_eq!(group.tolerance_ns, 150_000.0);

        let plan = build_plan(&config, &ids(&["/hawk_0/image", "/imu"]));
        assert!(plan.group_check.is_none());
        assert_eq!(plan.skipped_checks[0].0, "inter_camera_sync");
    }

    #[test]
    fn test_default_profile_fallback() {
        let mut config = ValidationConfig::default();
        config.profiles.retain(|p| p.category != StreamCategory::BatteryState);
        let plan = build_plan(&config, &ids(&["/battery_state"]));

        assert_eq!(plan.drop_checks[0].profile_source, ProfileSource::Default);
        assert_eq!(plan.drop_checks[0].profile, config.default_profile);
    }

    #[test]
    fn test_split_side() {
        assert_eq!(split_side("/a/b/left/img"), Some(("/a/b", "left", "img")));
        assert_eq!(split_side("left/img"), None);
    }
}
