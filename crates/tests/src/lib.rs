//! # Integration Tests
//!
//! 集成测试与端到端测试。
//!
//! 负责：
//! - 合约快照测试
//! - 端到端测试：JSONL 录制 -> 分析计划 -> 会话报告 -> 评分
//! - 并发分析与顺序分析结果一致性

#[cfg(test)]
mod contract_tests {
    use contracts::SessionScores;

    #[test]
    fn test_contracts_compile() {
        let _ = contracts::ConfigVersion::V1;
    }

    #[test]
    fn test_scores_serialize_with_null_for_not_applicable() {
        let scores = SessionScores {
            drop_score: Some(100.0),
            ..Default::default()
        };
        let json = serde_json::to_value(scores).unwrap();
        assert_eq!(json["drop_score"], 100.0);
        assert!(json["inter_sync_score"].is_null());
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::io::Write;
    use std::path::Path;
    use std::sync::Arc;

    use config_loader::{build_plan, ConfigFormat, ConfigLoader};
    use contracts::{
        DropReport, FindingKind, Recording, RecordingReader, SessionReport, TimeSeries,
        ValidationConfig,
    };
    use integrity_engine::{PairSyncChecker, SessionAnalyzer};
    use observability::SessionMetricsAggregator;
    use recording::JsonlRecordingReader;

    const PERIOD_NS: i64 = 33_333_333;
    const LEFT: &str = "/front_stereo_camera/left/image_compressed";
    const RIGHT: &str = "/front_stereo_camera/right/image_compressed";

    const CONFIG: &str = r#"
bucket_count = 64
score_category = "camera"

[[profiles]]
category = "camera"
nominal_frequency_hz = 30.0
tolerance_fraction = 0.01
max_consecutive_drops = 2

[[streams]]
category = "camera"
contains = ["camera"]

[pair_sync]
category = "camera"
tolerance_ns = 100000.0

[group_sync]
category = "camera"
tolerance_ns = 150000.0
nominal_frequency_hz = 30.0
"#;

    /// Stereo pair at 30 Hz; left misses frame 150, right lags by 50 us.
    fn write_stereo_recording(path: &Path) {
        let mut file = std::fs::File::create(path).unwrap();
        for i in 0..300i64 {
            if i != 150 {
                writeln!(file, r#"{{"stream":"{LEFT}","acqtime_ns":{}}}"#, i * PERIOD_NS).unwrap();
            }
            writeln!(
                file,
                r#"{{"stream":"{RIGHT}","acqtime_ns":{}}}"#,
                i * PERIOD_NS + 50_000
            )
            .unwrap();
        }
        writeln!(file, r#"{{"stream":"{RIGHT}","acqtime_ns":"late"}}"#).unwrap();
        writeln!(file, "not json").unwrap();
    }

    fn drop_report<'a>(report: &'a SessionReport, stream_id: &str) -> Option<&'a DropReport> {
        report
            .drop_reports
            .iter()
            .map(|entry| &entry.report)
            .find(|r| r.stream_id == stream_id)
    }

    fn analyze(recording: &Recording, config: &ValidationConfig, title: &str) -> SessionReport {
        let plan = build_plan(config, &recording.stream_ids());
        SessionAnalyzer::new(plan).analyze(recording, title)
    }

    /// Two 30 Hz camera streams with `drops` frames missing from the first one
    fn synthetic_recording(name: &str, drops: &[i64]) -> Recording {
        let left: Vec<i64> = (0..200)
            .filter(|i| !drops.contains(i))
            .map(|i| i * PERIOD_NS)
            .collect();
        let right: Vec<i64> = (0..200).map(|i| i * PERIOD_NS).collect();
        Recording::from_streams(
            name,
            vec![TimeSeries::new(LEFT, left), TimeSeries::new(RIGHT, right)],
        )
    }

    /// End-to-end: JSONL file -> plan -> session report -> scores
    #[test]
    fn test_e2e_stereo_recording() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.jsonl");
        write_stereo_recording(&path);

        let config = ConfigLoader::load_from_str(CONFIG, ConfigFormat::Toml).unwrap();
        let recording = JsonlRecordingReader.read(&path).unwrap();
        assert_eq!(recording.unattributed_errors, 1);

        let report = analyze(&recording, &config, "session");

        let left = drop_report(&report, LEFT).unwrap();
        assert_eq!(left.total_samples, 299);
        assert_eq!(left.num_frames_dropped, 1);
        assert_eq!(left.removed_indices, vec![150]);
        assert!(left.large_drops.is_empty());
        assert_eq!(drop_report(&report, RIGHT).unwrap().num_frames_dropped, 0);

        let pair = &report.pair_reports[0];
        assert_eq!(pair.num_desynced_frames, 0);
        assert_eq!(pair.average_difference_ns, Some(50_000.0));

        // Left is one frame short after the drop: every later index is off by a period
        let group = report.group_report.as_ref().unwrap();
        assert_eq!(group.reference_stream, RIGHT);
        assert_eq!(group.num_desynced_frames, 150);
        assert_eq!(group.desynced_indices.first(), Some(&150));

        let expected_drop = 100.0 * (1.0 - 1.0 / 600.0);
        assert!((report.scores.drop_score.unwrap() - expected_drop).abs() < 1e-9);
        assert!((report.scores.bucket_score.unwrap() - 100.0 * (1.0 - 1.0 / 64.0)).abs() < 1e-9);
        assert_eq!(report.scores.intra_sync_score, Some(100.0));
        assert_eq!(report.scores.inter_sync_score, Some(50.0));

        assert_eq!(report.failed_streams, vec![contracts::StreamId::from(RIGHT)]);
        assert!(report.findings_of(FindingKind::DeserializationFailure).count() >= 1);
    }

    /// Left/right streams offset by 50 us, well inside a 100 us tolerance
    #[test]
    fn test_e2e_pair_within_tolerance() {
        let left = TimeSeries::new("left", vec![0, 1_000_000, 2_000_000]);
        let right = TimeSeries::new("right", vec![50_000, 1_050_000, 2_050_000]);

        let report = PairSyncChecker::default()
            .check(&left, &right, 100_000.0)
            .unwrap();
        assert_eq!(report.num_desynced_frames, 0);
        assert_eq!(report.average_difference_ns, Some(50_000.0));
    }

    #[test]
    fn test_e2e_default_config_without_camera_streams() {
        let recording = Recording::from_streams(
            "chassis",
            vec![TimeSeries::periodic("/chassis/odom", 0, 25_000_000, 400)],
        );
        let report = analyze(&recording, &ValidationConfig::default(), "chassis");

        assert!(report.has_data());
        assert_eq!(report.scores.drop_score, None);
        assert_eq!(report.scores.intra_sync_score, None);
        assert_eq!(drop_report(&report, "/chassis/odom").unwrap().num_frames_dropped, 0);
    }

    #[test]
    fn test_session_metrics_aggregation() {
        let config = ConfigLoader::load_from_str(CONFIG, ConfigFormat::Toml).unwrap();
        let mut aggregator = SessionMetricsAggregator::new();
        for (name, drops) in [("a", vec![]), ("b", vec![10, 11]), ("c", vec![100])] {
            let report = analyze(&synthetic_recording(name, &drops), &config, name);
            aggregator.update(&report);
        }

        let summary = aggregator.summary();
        assert_eq!(summary.total_sessions, 3);
        assert_eq!(summary.total_dropped, 3);
    }

    /// Analyses on the blocking pool match sequential analysis
    #[tokio::test]
    async fn test_parallel_analysis_matches_sequential() {
        let config = Arc::new(ConfigLoader::load_from_str(CONFIG, ConfigFormat::Toml).unwrap());
        let recordings: Vec<Arc<Recording>> = (0..8)
            .map(|i| Arc::new(synthetic_recording(&format!("run_{i}"), &[i * 20 + 5])))
            .collect();

        let sequential: Vec<SessionReport> = recordings
            .iter()
            .map(|r| analyze(r, &config, &r.source))
            .collect();

        let handles: Vec<_> = recordings
            .iter()
            .map(|r| {
                let recording = Arc::clone(r);
                let config = Arc::clone(&config);
                tokio::task::spawn_blocking(move || {
                    analyze(&recording, &config, &recording.source)
                })
            })
            .collect();

        let mut parallel = Vec::with_capacity(handles.len());
        for handle in handles {
            parallel.push(handle.await.unwrap());
        }

        assert_eq!(parallel, sequential);
    }
}
