//! Session quality scores.
//!
//! Each score is computed on its own: a missing input yields `None` for that score
//! only, never an error for the whole set.

use contracts::{
    AnalysisError, BucketTable, DropReport, GroupSyncReport, MergedBuckets, PairSyncReport,
    SessionScores,
};
use tracing::warn;

use crate::bucket;

/// Folds drop and sync reports into [`SessionScores`].
pub struct ScoreAggregator;

impl ScoreAggregator {
    pub fn aggregate<'a, D, P>(
        drop_reports: D,
        pair_reports: P,
        group_report: Option<&GroupSyncReport>,
    ) -> SessionScores
    where
        D: IntoIterator<Item = &'a DropReport>,
        P: IntoIterator<Item = &'a PairSyncReport>,
    {
        let drop_reports: Vec<&DropReport> = drop_reports.into_iter().collect();
        let pair_reports: Vec<&PairSyncReport> = pair_reports.into_iter().collect();

        SessionScores {
            drop_score: Self::drop_score(&drop_reports),
            bucket_score: merge_drop_tables(drop_reports.iter().copied())
                .as_ref()
                .and_then(bucket_score),
            intra_sync_score: merge_sync_tables(pair_reports.iter().copied())
                .as_ref()
                .and_then(bucket_score),
            inter_sync_score: group_report
                .and_then(|g| g.percent_desynced_frames)
                .map(|percent| 100.0 - percent),
        }
    }

    /// `100 * (1 - dropped / (dropped + captured))` over every report.
    fn drop_score(reports: &[&DropReport]) -> Option<f64> {
        let dropped: u64 = reports.iter().map(|r| r.num_frames_dropped).sum();
        let captured: u64 = reports.iter().map(|r| r.total_samples as u64).sum();
        let total = dropped + captured;
        (total > 0).then(|| 100.0 * (1.0 - dropped as f64 / total as f64))
    }
}

fn bucket_score(merged: &MergedBuckets) -> Option<f64> {
    let width = merged.table.width();
    (width > 0).then(|| 100.0 * (1.0 - merged.fail_count as f64 / width as f64))
}

/// OR-merge of the drop tables present in `reports`; `None` when there is none.
pub fn merge_drop_tables<'a, I>(reports: I) -> Option<MergedBuckets>
where
    I: IntoIterator<Item = &'a DropReport>,
{
    merge_present(reports.into_iter().filter_map(|r| r.bucket_table.as_ref()))
}

/// OR-merge of the pair-sync tables present in `reports`; `None` when there is none.
pub fn merge_sync_tables<'a, I>(reports: I) -> Option<MergedBuckets>
where
    I: IntoIterator<Item = &'a PairSyncReport>,
{
    merge_present(reports.into_iter().filter_map(|r| r.bucket_table.as_ref()))
}

fn merge_present<'a>(tables: impl Iterator<Item = &'a BucketTable>) -> Option<MergedBuckets> {
    match bucket::merge(tables) {
        Ok(merged) => Some(merged),
        Err(AnalysisError::EmptyRange { .. }) => None,
        Err(e) => {
            warn!(error = %e, "bucket tables not mergeable");
            None
        }
    }
}
