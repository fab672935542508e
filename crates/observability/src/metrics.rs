//! 分析指标收集模块
//!
//! 基于分析报告记录 Prometheus 指标，并在内存中聚合多会话统计。

use std::collections::BTreeMap;

use contracts::{DropReport, GroupSyncReport, PairSyncReport, SessionReport, SessionScores};
use metrics::{counter, gauge, histogram};

/// 从 DropReport 记录指标
///
/// 每个流分析完成后调用一次。
pub fn record_drop_report(report: &DropReport) {
    let stream_id = report.stream_id.to_string();

    counter!("stream_qc_streams_analyzed_total").increment(1);
    counter!("stream_qc_samples_analyzed_total").increment(report.total_samples as u64);

    // 丢帧计数
    counter!("stream_qc_frames_dropped_total", "stream_id" => stream_id.clone())
        .increment(report.num_frames_dropped);
    if let Some(percent) = report.percent_frames_dropped {
        gauge!("stream_qc_frames_dropped_percent", "stream_id" => stream_id.clone()).set(percent);
    }

    // 时间戳顺序异常
    if report.num_backward() > 0 {
        counter!("stream_qc_backward_timestamps_total", "stream_id" => stream_id.clone())
            .increment(report.num_backward() as u64);
    }
    if report.num_duplicates() > 0 {
        counter!("stream_qc_duplicate_timestamps_total", "stream_id" => stream_id.clone())
            .increment(report.num_duplicates() as u64);
    }
    if !report.large_drops.is_empty() {
        counter!("stream_qc_large_drops_total", "stream_id" => stream_id.clone())
            .increment(report.large_drops.len() as u64);
    }

    // 频率与抖动
    if let Some(frequency) = report.mean_frequency_hz() {
        gauge!("stream_qc_mean_frequency_hz", "stream_id" => stream_id.clone()).set(frequency);
    }
    if let Some(jitter) = &report.jitter_filtered {
        histogram!("stream_qc_interval_error_ms", "stream_id" => stream_id)
            .record(jitter.mean_abs_error_ms);
    }
}

/// 记录双流同步结果
pub fn record_pair_sync(report: &PairSyncReport) {
    let check = report.name.clone();

    gauge!("stream_qc_desynced_frames", "check" => check.clone())
        .set(report.num_desynced_frames as f64);
    if let Some(percent) = report.percent_desynced_frames {
        gauge!("stream_qc_desynced_percent", "check" => check.clone()).set(percent);
    }
    if let Some(average) = report.average_difference_ns {
        histogram!("stream_qc_sync_difference_ns", "check" => check).record(average);
    }
}

/// 记录多流同步结果
pub fn record_group_sync(report: &GroupSyncReport) {
    let check = report.name.clone();

    gauge!("stream_qc_desynced_frames", "check" => check.clone())
        .set(report.num_desynced_frames as f64);
    if let Some(percent) = report.percent_desynced_frames {
        gauge!("stream_qc_desynced_percent", "check" => check.clone()).set(percent);
    }
    if let Some(average) = report.average_difference_ns {
        histogram!("stream_qc_sync_difference_ns", "check" => check.clone()).record(average);
    }

    // 非零主偏移：恒定错位
    for offset in &report.offsets {
        if let Some(dominant) = offset.dominant_offset {
            gauge!(
                "stream_qc_frame_offset",
                "check" => check.clone(),
                "stream_id" => offset.stream_id.to_string()
            )
            .set(dominant as f64);
        }
    }
}

/// 记录会话评分 (N/A 的评分不记录)
pub fn record_session_scores(scores: &SessionScores) {
    counter!("stream_qc_sessions_total").increment(1);

    let named = [
        ("drop", scores.drop_score),
        ("bucket", scores.bucket_score),
        ("intra_sync", scores.intra_sync_score),
        ("inter_sync", scores.inter_sync_score),
    ];
    for (name, score) in named {
        if let Some(score) = score {
            gauge!("stream_qc_score", "score" => name).set(score);
            histogram!("stream_qc_score_hist", "score" => name).record(score);
        }
    }
}

/// 记录录制文件读取
pub fn record_recording_loaded(format: &str, streams: usize, failed_streams: usize) {
    counter!("stream_qc_recordings_loaded_total", "format" => format.to_string()).increment(1);
    histogram!("stream_qc_recording_streams").record(streams as f64);
    if failed_streams > 0 {
        counter!("stream_qc_failed_streams_total", "format" => format.to_string())
            .increment(failed_streams as u64);
    }
}

/// 会话指标聚合器
///
/// 在内存中聚合多个会话报告，便于批量分析后输出摘要。
#[derive(Debug, Clone, Default)]
pub struct SessionMetricsAggregator {
    /// 会话总数
    pub total_sessions: u64,

    /// 无数据会话数
    pub sessions_without_data: u64,

    /// 分析帧总数
    pub total_captured: u64,

    /// 丢帧总数
    pub total_dropped: u64,

    /// 含 finding 的会话数
    pub sessions_with_findings: u64,

    /// 各评分统计
    pub drop_score_stats: RunningStats,
    pub bucket_score_stats: RunningStats,
    pub intra_sync_stats: RunningStats,
    pub inter_sync_stats: RunningStats,

    /// 各流失败次数
    pub failed_stream_counts: BTreeMap<String, u64>,
}

impl SessionMetricsAggregator {
    /// 创建新的聚合器
    pub fn new() -> Self {
        Self::default()
    }

    /// 更新聚合统计
    pub fn update(&mut self, report: &SessionReport) {
        self.total_sessions += 1;
        if !report.has_data() {
            self.sessions_without_data += 1;
        }
        if !report.findings.is_empty() {
            self.sessions_with_findings += 1;
        }

        for entry in &report.drop_reports {
            self.total_captured += entry.report.total_samples as u64;
            self.total_dropped += entry.report.num_frames_dropped;
        }

        let scores = &report.scores;
        let targets = [
            (scores.drop_score, &mut self.drop_score_stats),
            (scores.bucket_score, &mut self.bucket_score_stats),
            (scores.intra_sync_score, &mut self.intra_sync_stats),
            (scores.inter_sync_score, &mut self.inter_sync_stats),
        ];
        for (score, stats) in targets {
            if let Some(score) = score {
                stats.push(score);
            }
        }

        for stream_id in &report.failed_streams {
            *self
                .failed_stream_counts
                .entry(stream_id.to_string())
                .or_insert(0) += 1;
        }
    }

    /// 生成摘要报告
    pub fn summary(&self) -> MetricsSummary {
        let frames = self.total_captured + self.total_dropped;
        MetricsSummary {
            total_sessions: self.total_sessions,
            sessions_without_data: self.sessions_without_data,
            sessions_with_findings: self.sessions_with_findings,
            total_captured: self.total_captured,
            total_dropped: self.total_dropped,
            drop_rate: if frames > 0 {
                self.total_dropped as f64 / frames as f64 * 100.0
            } else {
                0.0
            },
            drop_score: StatsSummary::from(&self.drop_score_stats),
            bucket_score: StatsSummary::from(&self.bucket_score_stats),
            intra_sync_score: StatsSummary::from(&self.intra_sync_stats),
            inter_sync_score: StatsSummary::from(&self.inter_sync_stats),
            failed_stream_counts: self.failed_stream_counts.clone(),
        }
    }

    /// 重置统计
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// 指标摘要
#[derive(Debug, Clone, Default)]
pub struct MetricsSummary {
    pub total_sessions: u64,
    pub sessions_without_data: u64,
    pub sessions_with_findings: u64,
    pub total_captured: u64,
    pub total_dropped: u64,
    pub drop_rate: f64,
    pub drop_score: StatsSummary,
    pub bucket_score: StatsSummary,
    pub intra_sync_score: StatsSummary,
    pub inter_sync_score: StatsSummary,
    pub failed_stream_counts: BTreeMap<String, u64>,
}

impl std::fmt::Display for MetricsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Session Metrics Summary ===")?;
        writeln!(
            f,
            "Sessions: {} ({} without data, {} with warnings)",
            self.total_sessions, self.sessions_without_data, self.sessions_with_findings
        )?;
        writeln!(f, "Captured frames: {}", self.total_captured)?;
        writeln!(
            f,
            "Dropped frames: {} ({:.2}%)",
            self.total_dropped, self.drop_rate
        )?;
        writeln!(f, "Drop score: {}", self.drop_score)?;
        writeln!(f, "Bucket score: {}", self.bucket_score)?;
        writeln!(f, "Intra sync score: {}", self.intra_sync_score)?;
        writeln!(f, "Inter sync score: {}", self.inter_sync_score)?;

        if !self.failed_stream_counts.is_empty() {
            writeln!(f, "Failed stream counts:")?;
            for (stream, count) in &self.failed_stream_counts {
                writeln!(f, "  {}: {}", stream, count)?;
            }
        }

        Ok(())
    }
}

/// 统计摘要
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.1}, max={:.1}, mean={:.1}, std={:.1} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// 在线统计计算器 (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    /// 添加新值
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            let delta2 = value - self.mean;
            self.m2 += delta * delta2;
        }
    }

    /// 样本数量
    pub fn count(&self) -> u64 {
        self.count
    }

    /// 均值
    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// 样本方差 (n - 1)
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    /// 标准差
    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    /// 最小值
    pub fn min(&self) -> f64 {
        self.min
    }

    /// 最大值
    pub fn max(&self) -> f64 {
        self.max
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{SessionScores, StreamId};

    fn session(scores: SessionScores, failed: Vec<StreamId>) -> SessionReport {
        SessionReport {
            title: "run".to_string(),
            score_category: contracts::StreamCategory::Camera,
            drop_reports: Vec::new(),
            pair_reports: Vec::new(),
            group_report: None,
            scores,
            merged_drop_table: None,
            merged_sync_table: None,
            findings: Vec::new(),
            stream_counts: BTreeMap::new(),
            failed_streams: failed,
        }
    }

    #[test]
    fn test_running_stats() {
        let mut stats = RunningStats::default();
        for value in [1.0, 2.0, 3.0, 4.0, 5.0] {
            stats.push(value);
        }

        assert_eq!(stats.count(), 5);
        assert!((stats.mean() - 3.0).abs() < 1e-10);
        assert!((stats.min() - 1.0).abs() < 1e-10);
        assert!((stats.max() - 5.0).abs() < 1e-10);
        assert!((stats.variance() - 2.5).abs() < 1e-10);
    }

    #[test]
    fn test_aggregator_skips_missing_scores() {
        let mut aggregator = SessionMetricsAggregator::new();

        aggregator.update(&session(
            SessionScores {
                drop_score: Some(99.0),
                inter_sync_score: Some(90.0),
                ..Default::default()
            },
            vec![StreamId::from("/imu")],
        ));
        aggregator.update(&session(
            SessionScores {
                drop_score: Some(97.0),
                ..Default::default()
            },
            vec![StreamId::from("/imu")],
        ));

        let summary = aggregator.summary();
        assert_eq!(summary.total_sessions, 2);
        assert_eq!(summary.drop_score.count, 2);
        assert!((summary.drop_score.mean - 98.0).abs() < 1e-10);
        assert_eq!(summary.inter_sync_score.count, 1);
        assert_eq!(summary.bucket_score.count, 0);
        assert_eq!(summary.failed_stream_counts.get("/imu"), Some(&2));

        aggregator.reset();
        assert_eq!(aggregator.total_sessions, 0);
    }

    #[test]
    fn test_summary_display() {
        let summary = MetricsSummary {
            total_sessions: 4,
            total_captured: 95,
            total_dropped: 5,
            drop_rate: 5.0,
            drop_score: StatsSummary {
                count: 4,
                min: 90.0,
                max: 99.0,
                mean: 95.0,
                std_dev: 3.0,
            },
            ..Default::default()
        };

        let output = format!("{}", summary);
        assert!(output.contains("Sessions: 4"));
        assert!(output.contains("5.00%"));
        assert!(output.contains("Bucket score: N/A"));
    }
}
