//! Runs an [`AnalysisPlan`] over a [`Recording`] and assembles the session report.

use std::collections::BTreeMap;

use contracts::{
    AnalysisPlan, DropCheck, Finding, FindingKind, GroupCheck, PairCheck, ProfileSource,
    Recording, SessionReport, StreamDropReport, StreamId, TimeSeries,
};
use metrics::counter;
use tracing::{info, instrument, warn};

use crate::score::{merge_drop_tables, merge_sync_tables, ScoreAggregator};
use crate::{DropAnalyzer, GroupSyncChecker, PairSyncChecker};

/// Session-level driver.
///
/// Every check is independent: a failing or skipped check becomes a finding and the
/// rest of the session is still analyzed.
#[derive(Debug, Clone)]
pub struct SessionAnalyzer {
    plan: AnalysisPlan,
    drop_analyzer: DropAnalyzer,
    pair_checker: PairSyncChecker,
    group_checker: GroupSyncChecker,
}

impl SessionAnalyzer {
    pub fn new(plan: AnalysisPlan) -> Self {
        Self {
            drop_analyzer: DropAnalyzer::new(plan.bucket_count),
            pair_checker: PairSyncChecker::new(plan.bucket_count),
            group_checker: GroupSyncChecker::new(plan.bucket_count),
            plan,
        }
    }

    pub fn plan(&self) -> &AnalysisPlan {
        &self.plan
    }

    #[instrument(name = "session_analyze", skip_all, fields(source = %recording.source))]
    pub fn analyze(&self, recording: &Recording, title: impl Into<String>) -> SessionReport {
        let mut findings = Vec::new();
        let failed_streams = Self::failure_findings(recording, &mut findings);

        for (check, reason) in &self.plan.skipped_checks {
            findings.push(Finding::new(FindingKind::CheckSkipped, check, reason));
        }

        let drop_reports: Vec<StreamDropReport> = self
            .plan
            .drop_checks
            .iter()
            .filter_map(|check| self.run_drop_check(recording, check, &mut findings))
            .collect();

        let pair_reports: Vec<_> = self
            .plan
            .pair_checks
            .iter()
            .filter_map(|check| self.run_pair_check(recording, check, &mut findings))
            .collect();

        let group_report = self
            .plan
            .group_check
            .as_ref()
            .and_then(|check| self.run_group_check(recording, check, &mut findings));

        let scored: Vec<_> = drop_reports
            .iter()
            .filter(|entry| entry.category == self.plan.score_category)
            .map(|entry| &entry.report)
            .collect();
        let scores = ScoreAggregator::aggregate(
            scored.iter().copied(),
            pair_reports.iter(),
            group_report.as_ref(),
        );

        let stream_counts: BTreeMap<StreamId, usize> = recording
            .stream_ids()
            .into_iter()
            .map(|id| {
                let count = recording.stream(&id).map_or(0, TimeSeries::len);
                (id, count)
            })
            .collect();

        let report = SessionReport {
            title: title.into(),
            score_category: self.plan.score_category,
            merged_drop_table: merge_drop_tables(scored.iter().copied()),
            merged_sync_table: merge_sync_tables(pair_reports.iter()),
            drop_reports,
            pair_reports,
            group_report,
            scores,
            findings,
            stream_counts,
            failed_streams,
        };

        if report.has_data() {
            observability::record_session_scores(&report.scores);
        } else {
            counter!("stream_qc_sessions_without_data_total").increment(1);
        }

        info!(
            streams = report.stream_counts.len(),
            drop_checks = report.drop_reports.len(),
            pair_checks = report.pair_reports.len(),
            group_check = report.group_report.is_some(),
            findings = report.findings.len(),
            "session analyzed"
        );

        report
    }

    /// Findings for reader failures; returns the streams with undeserializable content.
    fn failure_findings(recording: &Recording, findings: &mut Vec<Finding>) -> Vec<StreamId> {
        let mut failed_streams = Vec::new();

        for entry in &recording.failures {
            let failure = &entry.failure;
            if failure.is_failed() {
                let detail = failure.first_error.as_deref().unwrap_or("unknown error");
                warn!(stream_id = %entry.stream_id, failed = failure.failed_samples, "stream failed to deserialize");
                findings.push(Finding::new(
                    FindingKind::DeserializationFailure,
                    entry.stream_id.to_string(),
                    format!("{} samples failed to deserialize: {detail}", failure.failed_samples),
                ));
                failed_streams.push(entry.stream_id.clone());
            }
            if failure.missing_acqtime > 0 {
                findings.push(Finding::new(
                    FindingKind::DeserializationFailure,
                    entry.stream_id.to_string(),
                    format!("{} samples without capture time", failure.missing_acqtime),
                ));
            }
        }

        if recording.unattributed_errors > 0 {
            findings.push(Finding::new(
                FindingKind::DeserializationFailure,
                recording.source.as_str(),
                format!(
                    "{} records could not be attributed to a stream",
                    recording.unattributed_errors
                ),
            ));
        }

        failed_streams
    }

    /// Stream with at least one sample, or an absence finding.
    fn present<'r>(
        recording: &'r Recording,
        stream_id: &StreamId,
        check: &str,
        findings: &mut Vec<Finding>,
    ) -> Option<&'r TimeSeries> {
        match recording.stream(stream_id) {
            Some(series) if !series.is_empty() => Some(series),
            _ => {
                warn!(stream_id = %stream_id, check, "stream absent, not analyzed");
                findings.push(Finding::new(
                    FindingKind::StreamAbsent,
                    stream_id.to_string(),
                    format!("no samples, {check} not analyzed"),
                ));
                None
            }
        }
    }

    fn run_drop_check(
        &self,
        recording: &Recording,
        check: &DropCheck,
        findings: &mut Vec<Finding>,
    ) -> Option<StreamDropReport> {
        let series = Self::present(recording, &check.stream_id, "drop check", findings)?;

        if check.profile_source == ProfileSource::Default {
            findings.push(Finding::new(
                FindingKind::DefaultProfile,
                check.stream_id.to_string(),
                format!(
                    "no profile for category '{}', using default {} Hz / {}",
                    check.category,
                    check.profile.nominal_frequency_hz,
                    check.profile.tolerance_fraction
                ),
            ));
        }

        let report = match self.drop_analyzer.analyze(series, &check.profile) {
            Ok(report) => report,
            Err(e) => {
                warn!(stream_id = %check.stream_id, error = %e, "drop check failed");
                findings.push(Finding::new(
                    FindingKind::CheckFailed,
                    check.stream_id.to_string(),
                    e.to_string(),
                ));
                return None;
            }
        };

        let subject = check.stream_id.to_string();
        if report.num_duplicates() > 0 {
            findings.push(Finding::new(
                FindingKind::DuplicateTimestamps,
                &subject,
                format!("{} duplicate timestamps", report.num_duplicates()),
            ));
        }
        if report.num_backward() > 0 {
            findings.push(Finding::new(
                FindingKind::BackwardTimestamps,
                &subject,
                format!("{} timestamps going backward", report.num_backward()),
            ));
        }
        if let Some(largest) = report.largest_gap_interior_ms {
            findings.push(Finding::new(
                FindingKind::LargeDrops,
                &subject,
                format!(
                    "{} gaps above {} consecutive drops, largest {largest:.1} ms",
                    report.large_drops.len(),
                    report.profile.max_consecutive_drops
                ),
            ));
        }

        observability::record_drop_report(&report);

        Some(StreamDropReport {
            category: check.category,
            profile_source: check.profile_source,
            report,
        })
    }

    fn run_pair_check(
        &self,
        recording: &Recording,
        check: &PairCheck,
        findings: &mut Vec<Finding>,
    ) -> Option<contracts::PairSyncReport> {
        let left = Self::present(recording, &check.left, &check.name, findings);
        let right = Self::present(recording, &check.right, &check.name, findings);
        let (left, right) = (left?, right?);

        match self
            .pair_checker
            .check_named(check.name.clone(), left, right, check.tolerance_ns)
        {
            Ok(report) => {
                observability::record_pair_sync(&report);
                Some(report)
            }
            Err(e) => {
                warn!(check = %check.name, error = %e, "pair sync check failed");
                findings.push(Finding::new(FindingKind::CheckFailed, &check.name, e.to_string()));
                None
            }
        }
    }

    fn run_group_check(
        &self,
        recording: &Recording,
        check: &GroupCheck,
        findings: &mut Vec<Finding>,
    ) -> Option<contracts::GroupSyncReport> {
        let members: Vec<&TimeSeries> = check
            .members
            .iter()
            .filter_map(|id| Self::present(recording, id, &check.name, findings))
            .collect();

        if members.len() < 2 {
            findings.push(Finding::new(
                FindingKind::CheckSkipped,
                &check.name,
                format!("{} of {} members have samples", members.len(), check.members.len()),
            ));
            return None;
        }

        match self.group_checker.check_named(
            check.name.clone(),
            &members,
            check.tolerance_ns,
            check.nominal_frequency_hz,
        ) {
            Ok(report) => {
                observability::record_group_sync(&report);
                Some(report)
            }
            Err(e) => {
                warn!(check = %check.name, error = %e, "group sync check failed");
                findings.push(Finding::new(FindingKind::CheckFailed, &check.name, e.to_string()));
                None
            }
        }
    }
}
