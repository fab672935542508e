//! StreamId - topic identifier shared by every report
//!
//! Backed by `Arc<str>`; reports clone the id of the series they describe.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

/// Stream identifier, usually a slash separated topic path such as
/// `/front_stereo_camera/left/image_compressed`.
///
/// Ordering follows the string, so maps keyed by id list topics sorted.
///
/// # Examples
/// ```
/// use contracts::StreamId;
///
/// let id: StreamId = "/front/left/image".into();
/// assert_eq!(id.segments().collect::<Vec<_>>(), ["front", "left", "image"]);
/// assert_eq!(id.short_name(2), "/front/left");
/// ```
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StreamId(Arc<str>);

impl StreamId {
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Non-empty path segments of the id.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/').filter(|s| !s.is_empty())
    }

    /// The id truncated to its first `depth` path segments, keeping a leading slash.
    pub fn short_name(&self, depth: usize) -> String {
        let prefix = if self.0.starts_with('/') { "/" } else { "" };
        let head: Vec<&str> = self.segments().take(depth).collect();
        format!("{prefix}{}", head.join("/"))
    }
}

impl Deref for StreamId {
    type Target = str;

    #[inline]
    fn deref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for StreamId {
    fn from(s: &str) -> Self {
        Self(Arc::from(s))
    }
}

impl From<String> for StreamId {
    fn from(s: String) -> Self {
        Self(Arc::from(s))
    }
}

/// Lookups by topic name: `series.stream_id == "/imu"`.
impl PartialEq<&str> for StreamId {
    fn eq(&self, other: &&str) -> bool {
        &*self.0 == *other
    }
}

impl fmt::Display for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

impl Serialize for StreamId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for StreamId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Self::from)
    }
}
