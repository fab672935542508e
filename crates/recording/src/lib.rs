//! # Recording
//!
//! 录制文件读取：将 JSONL 时间戳录制转换为 `Recording`。
//!
//! 负责：
//! - 逐行解析 `{"stream", "acqtime_ns", "log_time_ns"}` 记录
//! - 按流统计反序列化失败，失败的流不会被静默丢弃
//! - 发现目录下的全部录制
//!
//! ## 使用示例
//!
//! ```no_run
//! use contracts::RecordingReader;
//! use recording::JsonlRecordingReader;
//! use std::path::Path;
//!
//! let recording = JsonlRecordingReader.read(Path::new("run_01/samples.jsonl")).unwrap();
//! for series in &recording.streams {
//!     println!("{}: {} samples", series.stream_id, series.len());
//! }
//! ```

mod jsonl;

pub use jsonl::{discover_recordings, JsonlRecordingReader, SampleRecord, SAMPLES_FILE};
