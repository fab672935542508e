//! # Observability
//!
//! 可观测性模块：Tracing + Prometheus 指标。
//!
//! ## 功能
//!
//! - Tracing 初始化 (JSON/Pretty/Compact 格式，输出到 stderr)
//! - Prometheus 指标记录，以文本格式导出 (无 HTTP 监听)
//! - 分析报告指标收集与多会话统计
//!
//! ## 使用示例
//!
//! ```ignore
//! use observability::{init_with_config, ObservabilityConfig};
//!
//! let handle = init_with_config(ObservabilityConfig {
//!     metrics_text: true,
//!     ..Default::default()
//! })?;
//!
//! // ... run analysis, record_* functions are called by the engine ...
//!
//! if let Some(handle) = handle {
//!     std::fs::write("metrics.prom", handle.render())?;
//! }
//! ```

pub mod metrics;

use anyhow::{Context, Result};
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

// Re-exports
pub use crate::metrics::{
    record_drop_report, record_group_sync, record_pair_sync, record_recording_loaded,
    record_session_scores, MetricsSummary, RunningStats, SessionMetricsAggregator, StatsSummary,
};
pub use metrics_exporter_prometheus::PrometheusHandle;

/// 可观测性配置
#[derive(Debug, Clone)]
pub struct ObservabilityConfig {
    /// 日志格式
    pub log_format: LogFormat,
    /// 安装 Prometheus 文本导出器
    pub metrics_text: bool,
    /// 默认日志级别 (RUST_LOG 优先)
    pub default_log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_format: LogFormat::Pretty,
            metrics_text: false,
            default_log_level: "info".to_string(),
        }
    }
}

/// 日志格式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// JSON 结构化日志
    Json,
    /// 人类可读格式
    #[default]
    Pretty,
    /// 紧凑单行格式
    Compact,
}

/// 使用自定义配置初始化
///
/// Logs go to stderr so that reports on stdout stay machine-readable.
/// Returns the metrics handle when `metrics_text` is set.
pub fn init_with_config(config: ObservabilityConfig) -> Result<Option<PrometheusHandle>> {
    // 1. Initialize Tracing
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.default_log_level));

    let fmt_layer = match config.log_format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_thread_ids(true)
            .with_thread_names(true)
            .with_file(true)
            .with_line_number(true)
            .boxed(),
        LogFormat::Pretty => fmt::layer().pretty().with_writer(std::io::stderr).boxed(),
        LogFormat::Compact => fmt::layer().compact().with_writer(std::io::stderr).boxed(),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()
        .context("Failed to initialize tracing subscriber")?;

    // 2. Initialize Prometheus recorder (if enabled)
    let handle = if config.metrics_text {
        Some(install_text_recorder()?)
    } else {
        None
    };

    tracing::debug!(
        log_format = ?config.log_format,
        metrics_text = config.metrics_text,
        "Observability initialized"
    );

    Ok(handle)
}

/// 仅安装 Prometheus 指标记录器（不初始化 Tracing）
///
/// 指标保存在进程内，通过 `PrometheusHandle::render` 导出为文本格式。
pub fn install_text_recorder() -> Result<PrometheusHandle> {
    PrometheusBuilder::new()
        .install_recorder()
        .context("Failed to install Prometheus recorder")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ObservabilityConfig::default();
        assert!(!config.metrics_text);
        assert_eq!(config.log_format, LogFormat::Pretty);
        assert_eq!(config.default_log_level, "info");
    }
}
