//! Human-readable and JSON rendering of session reports.

use std::fmt::Write;

use contracts::{
    DropReport, GroupSyncReport, JitterStats, PairSyncReport, ScoreDisplay, SessionReport,
    StreamId,
};
use serde::Serialize;

use crate::cli::DetailLevel;

/// Width of the row label column in bucket tables
const LABEL_WIDTH: usize = 42;

/// Path segments kept in table row labels
const LABEL_DEPTH: usize = 2;

/// JSON envelope with generation time
#[derive(Serialize)]
struct JsonReport<'a> {
    generated_at: String,
    #[serde(flatten)]
    report: &'a SessionReport,
}

/// Render the report as pretty JSON
pub fn render_json(report: &SessionReport) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&JsonReport {
        generated_at: chrono::Local::now().to_rfc3339(),
        report,
    })
}

/// Render the report as text
pub fn render_text(report: &SessionReport, detail: DetailLevel) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail
    let _ = write_report(&mut out, report, detail);
    out
}

fn write_report(out: &mut String, report: &SessionReport, detail: DetailLevel) -> std::fmt::Result {
    let line_length = LABEL_WIDTH + 3 + report_width(report);
    let padding = line_length.saturating_sub(report.title.len() + 2) / 2;
    writeln!(out, "{0} {1} {0}", "=".repeat(padding), report.title)?;

    if !report.has_data() {
        writeln!(out, "No data found")?;
    } else {
        write!(out, "{}", report.scores)?;
        writeln!(out)?;
        write_tables(out, report)?;
    }

    write_findings(out, report)?;
    write_streams(out, report)?;

    if detail >= DetailLevel::Full && report.has_data() {
        write_details(out, report, detail == DetailLevel::Dump)?;
    }

    Ok(())
}

fn report_width(report: &SessionReport) -> usize {
    report
        .drop_reports
        .iter()
        .filter_map(|r| r.report.bucket_table.as_ref())
        .map(|t| t.width())
        .max()
        .unwrap_or(contracts::DEFAULT_BUCKET_COUNT)
}

fn label(stream_id: &StreamId) -> String {
    stream_id.short_name(LABEL_DEPTH)
}

fn table_row(out: &mut String, name: &str, table: Option<&contracts::BucketTable>) -> std::fmt::Result {
    match table {
        Some(table) => writeln!(out, "{name:<LABEL_WIDTH$} [{table}]"),
        None => writeln!(out, "{name:<LABEL_WIDTH$} [n/a]"),
    }
}

fn write_tables(out: &mut String, report: &SessionReport) -> std::fmt::Result {
    match &report.merged_drop_table {
        Some(merged) => {
            table_row(out, "Camera Drop Table", Some(&merged.table))?;
            for entry in report.scored_drop_reports() {
                table_row(out, &label(&entry.report.stream_id), entry.report.bucket_table.as_ref())?;
            }
        }
        None => writeln!(out, "No Camera Drop Table Found")?,
    }
    writeln!(out)?;

    match &report.merged_sync_table {
        Some(merged) => {
            table_row(out, "Intra Camera Sync Table", Some(&merged.table))?;
            for pair in &report.pair_reports {
                table_row(out, &pair.name, pair.bucket_table.as_ref())?;
            }
        }
        None => writeln!(out, "No Camera Sync Table Found")?,
    }
    writeln!(out)?;

    if let Some(group) = &report.group_report {
        table_row(out, "Inter Camera Sync Table", group.bucket_table.as_ref())?;
        writeln!(out)?;
    }

    Ok(())
}

fn write_findings(out: &mut String, report: &SessionReport) -> std::fmt::Result {
    if report.findings.is_empty() {
        return Ok(());
    }
    for finding in &report.findings {
        writeln!(out, "Warning: {}: {}", finding.subject, finding.message)?;
    }
    writeln!(out)
}

fn write_streams(out: &mut String, report: &SessionReport) -> std::fmt::Result {
    writeln!(out, "Streams:")?;
    for (stream_id, count) in &report.stream_counts {
        let failed = if report.failed_streams.contains(stream_id) {
            " (failed)"
        } else {
            ""
        };
        writeln!(out, "    {stream_id} | frames_captured: {count}{failed}")?;
    }
    writeln!(out)
}

fn write_details(out: &mut String, report: &SessionReport, dump: bool) -> std::fmt::Result {
    for entry in &report.drop_reports {
        write_drop_details(out, &entry.report, dump)?;
    }
    for pair in &report.pair_reports {
        write_pair_details(out, pair, dump)?;
    }
    if let Some(group) = &report.group_report {
        write_group_details(out, group, dump)?;
    }
    Ok(())
}

fn opt(value: Option<f64>, precision: usize) -> String {
    value.map_or_else(|| "N/A".to_string(), |v| format!("{v:.precision$}"))
}

fn write_drop_details(out: &mut String, report: &DropReport, dump: bool) -> std::fmt::Result {
    let jitter_all = report.jitter_all.as_ref();
    let jitter_filtered = report.jitter_filtered.as_ref();
    let mean_error = |j: Option<&JitterStats>| opt(j.map(|j| j.mean_abs_error_ms), 3);
    let median_error = |j: Option<&JitterStats>| opt(j.map(|j| j.median_abs_error_ms), 3);

    writeln!(out, "{}:", report.stream_id)?;
    writeln!(out, "    - Percent Dropped: {}%", opt(report.percent_frames_dropped, 2))?;
    writeln!(out, "    - Number Dropped: {}", report.num_frames_dropped)?;
    writeln!(out, "    - Mean Frequency: {} Hz", opt(report.mean_frequency_hz(), 2))?;
    writeln!(
        out,
        "    - Median Frequency: {} Hz",
        opt(jitter_all.and_then(|j| j.median_frequency_hz), 2)
    )?;
    writeln!(out, "    - Frames Captured: {}", report.total_samples)?;
    if report.skipped_leading_samples > 0 {
        writeln!(out, "    - Warm-up Samples Skipped: {}", report.skipped_leading_samples)?;
    }
    writeln!(out, "    - Total Jitter: {} ms", mean_error(jitter_all))?;
    writeln!(out, "    - Jitter Excluding Drops: {} ms", mean_error(jitter_filtered))?;
    writeln!(out, "    - Median Jitter: {} ms", median_error(jitter_all))?;
    writeln!(
        out,
        "    - Median Jitter Excluding Drops: {} ms",
        median_error(jitter_filtered)
    )?;
    writeln!(out, "    - Largest Frame Gap: {} ms", opt(report.largest_gap_ms, 3))?;
    if let Some(table) = &report.bucket_table {
        writeln!(out, "    - Drop Table: [{table}]")?;
    }
    if dump {
        writeln!(out, "    - Indices Dropped: {:?}", report.removed_indices)?;
        writeln!(out, "    - Timestamps Dropped: {:?}", report.removed_timestamps)?;
        writeln!(out, "    - Backward Indices: {:?}", report.backward_indices)?;
        writeln!(out, "    - Duplicate Indices: {:?}", report.duplicate_indices)?;
    }
    writeln!(out)
}

fn write_pair_details(out: &mut String, report: &PairSyncReport, dump: bool) -> std::fmt::Result {
    writeln!(out, "{}:", report.name)?;
    writeln!(out, "    - Num Desyncs: {}", report.num_desynced_frames)?;
    writeln!(out, "    - Percent Desynced: {}%", opt(report.percent_desynced_frames, 2))?;
    writeln!(out, "    - Mean Difference: {} ns", opt(report.average_difference_ns, 1))?;
    writeln!(
        out,
        "    - Max Difference: {} ns",
        report
            .max_difference_ns
            .map_or_else(|| "N/A".to_string(), |v| v.to_string())
    )?;
    if dump {
        writeln!(out, "    - Desynced Indices: {:?}", report.desynced_indices)?;
        writeln!(out, "    - Desynced Timestamps: {:?}", report.desynced_timestamps)?;
    }
    writeln!(out)
}

fn write_group_details(out: &mut String, report: &GroupSyncReport, dump: bool) -> std::fmt::Result {
    writeln!(out, "{}:", report.name)?;
    writeln!(out, "    - Reference: {} ({} frames)", report.reference_stream, report.reference_length)?;
    writeln!(out, "    - Num Desyncs: {}", report.num_desynced_frames)?;
    writeln!(out, "    - Percent Desynced: {}%", opt(report.percent_desynced_frames, 2))?;
    writeln!(out, "    - Mean Difference: {} ns", opt(report.average_difference_ns, 1))?;
    for offset in &report.offsets {
        let dominant = offset
            .dominant_offset
            .map_or_else(|| "N/A".to_string(), |o| o.to_string());
        writeln!(out, "    - Frame Offset {}: {dominant}", offset.stream_id)?;
    }
    if dump {
        writeln!(out, "    - Desynced Indices: {:?}", report.desynced_indices)?;
    }
    writeln!(out)
}

/// One-line summary used when listing many sessions
pub fn score_line(report: &SessionReport) -> String {
    let scores = report.scores;
    format!(
        "drop={} bucket={} intra={} inter={}",
        ScoreDisplay(scores.drop_score),
        ScoreDisplay(scores.bucket_score),
        ScoreDisplay(scores.intra_sync_score),
        ScoreDisplay(scores.inter_sync_score)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{
        BucketTable, Finding, FindingKind, FrequencyProfile, MergedBuckets, ProfileSource,
        SessionScores, StreamCategory, StreamDropReport,
    };
    use std::collections::BTreeMap;

    fn drop_report(stream: &str, table: &str) -> DropReport {
        DropReport {
            stream_id: stream.into(),
            profile: FrequencyProfile::new(30.0, 0.1),
            total_samples: 300,
            skipped_leading_samples: 0,
            num_frames_dropped: 2,
            percent_frames_dropped: Some(0.66),
            removed_indices: vec![10, 200],
            removed_timestamps: vec![333_333_330, 6_666_666_600],
            percent_indices_removed: Some(0.67),
            backward_indices: Vec::new(),
            duplicate_indices: Vec::new(),
            large_drops: Vec::new(),
            largest_gap_ms: Some(66.667),
            largest_gap_interior_ms: None,
            jitter_all: None,
            jitter_filtered: None,
            bucket_table: BucketTable::try_from(table.to_string()).ok(),
        }
    }

    fn report(drop_reports: Vec<StreamDropReport>) -> SessionReport {
        let merged_drop_table = drop_reports.first().and_then(|r| {
            r.report.bucket_table.clone().map(|table| MergedBuckets {
                fail_count: table.bad_count(),
                table,
            })
        });
        SessionReport {
            title: "run_01".to_string(),
            score_category: StreamCategory::Camera,
            drop_reports,
            pair_reports: Vec::new(),
            group_report: None,
            scores: SessionScores {
                drop_score: Some(99.3),
                bucket_score: Some(75.0),
                ..Default::default()
            },
            merged_drop_table,
            merged_sync_table: None,
            findings: vec![Finding::new(
                FindingKind::DuplicateTimestamps,
                "/front/left/image",
                "3 duplicate timestamps",
            )],
            stream_counts: BTreeMap::from([("/front/left/image".into(), 300)]),
            failed_streams: Vec::new(),
        }
    }

    fn camera(report: DropReport) -> StreamDropReport {
        StreamDropReport {
            category: StreamCategory::Camera,
            profile_source: ProfileSource::Configured,
            report,
        }
    }

    #[test]
    fn test_render_compact() {
        let session = report(vec![camera(drop_report("/front/left/image", ".x..x..."))]);
        let text = render_text(&session, DetailLevel::Compact);

        assert!(text.lines().next().unwrap().contains(" run_01 "));
        assert!(text.contains("Camera Drop Q Score: 99.3"));
        assert!(text.contains("Intra Camera Sync Q Score: N/A"));
        assert!(text.contains(&format!("{:<42} [.x..x...]", "Camera Drop Table")));
        assert!(text.contains(&format!("{:<42} [.x..x...]", "/front/left")));
        assert!(text.contains("No Camera Sync Table Found"));
        assert!(text.contains("Warning: /front/left/image: 3 duplicate timestamps"));
        assert!(text.contains("/front/left/image | frames_captured: 300"));
        assert!(!text.contains("Percent Dropped"));
    }

    #[test]
    fn test_render_details() {
        let session = report(vec![camera(drop_report("/front/left/image", "........"))]);

        let full = render_text(&session, DetailLevel::Full);
        assert!(full.contains("Percent Dropped: 0.66%"));
        assert!(full.contains("Number Dropped: 2"));
        assert!(full.contains("Total Jitter: N/A ms"));
        assert!(full.contains("Median Jitter: N/A ms"));

        let mut jittered = drop_report("/front/left/image", "........");
        jittered.jitter_all = Some(JitterStats {
            sample_count: 299,
            mean_interval_ms: 33.444,
            mean_frequency_hz: Some(29.9),
            median_frequency_hz: Some(30.0),
            mean_abs_error_ms: 0.111,
            median_abs_error_ms: 0.0004,
            max_abs_error_ms: 33.333,
            std_ms: Some(1.9),
        });
        let text = render_text(&report(vec![camera(jittered)]), DetailLevel::Full);
        assert!(text.contains("Total Jitter: 0.111 ms"));
        assert!(text.contains("Median Jitter: 0.000 ms"));
        assert!(text.contains("Median Jitter Excluding Drops: N/A ms"));
        assert!(!full.contains("Indices Dropped"));

        let dump = render_text(&session, DetailLevel::Dump);
        assert!(dump.contains("Indices Dropped: [10, 200]"));
    }

    #[test]
    fn test_render_without_data() {
        let mut session = report(Vec::new());
        session.scores = SessionScores::default();
        let text = render_text(&session, DetailLevel::Full);

        assert!(text.contains("No data found"));
        assert!(!text.contains("Q Score"));
        assert!(text.contains("Streams:"));
    }

    #[test]
    fn test_render_json() {
        let session = report(vec![camera(drop_report("/front/left/image", "..x."))]);
        let json = render_json(&session).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert!(value["generated_at"].is_string());
        assert_eq!(value["title"], "run_01");
        assert_eq!(value["drop_reports"][0]["report"]["bucket_table"], "..x.");
    }

    #[test]
    fn test_score_line() {
        let session = report(Vec::new());
        assert_eq!(score_line(&session), "drop=99.3 bucket=75.0 intra=N/A inter=N/A");
    }
}
