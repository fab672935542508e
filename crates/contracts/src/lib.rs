//! # Contracts
//!
//! Frozen data contracts shared by every crate of the stream quality checker.
//! Business crates depend on this crate only; reverse dependencies are prohibited.
//!
//! ## Time Model
//! - Capture (acquisition) time is a signed 64-bit nanosecond timestamp
//! - A sample is identified solely by its index inside its stream
//! - Reports express durations in milliseconds unless a field name says `_ns`

mod config;
mod error;
mod plan;
mod profile;
mod recording;
mod report;
mod series;
mod session;
mod stream_id;

pub use config::*;
pub use error::*;
pub use plan::*;
pub use profile::*;
pub use recording::*;
pub use report::*;
pub use series::*;
pub use session::*;
pub use stream_id::StreamId;
