//! # Integrity Engine
//!
//! Temporal-integrity analysis of recorded timestamp streams.
//!
//! 负责：
//! - Drop detection against a nominal sampling frequency
//! - Nearest-neighbour pair sync (stereo left/right)
//! - Index-aligned group sync (co-triggered camera rigs)
//! - Bucket tables and session quality scores
//!
//! Every analyzer is a pure function over immutable inputs; per-stream runs are
//! independent of each other and of their order.
//!
//! ## 使用示例
//!
//! ```
//! use contracts::{FrequencyProfile, TimeSeries};
//! use integrity_engine::DropAnalyzer;
//!
//! let series = TimeSeries::periodic("/cam", 0, 33_333_333, 300);
//! let report = DropAnalyzer::default()
//!     .analyze(&series, &FrequencyProfile::new(30.0, 0.01))
//!     .unwrap();
//! assert_eq!(report.num_frames_dropped, 0);
//! ```

pub mod bucket;
mod drop;
mod group_sync;
mod pair_sync;
mod score;
mod session;
pub mod stats;

pub use drop::DropAnalyzer;
pub use group_sync::GroupSyncChecker;
pub use pair_sync::PairSyncChecker;
pub use score::{merge_drop_tables, merge_sync_tables, ScoreAggregator};
pub use session::SessionAnalyzer;

// Re-export contracts types
pub use contracts::{
    AnalysisError, AnalysisPlan, BucketTable, DropReport, FrequencyProfile, GroupSyncReport,
    MergedBuckets, PairSyncReport, Recording, SessionReport, SessionScores, TimeSeries,
};
