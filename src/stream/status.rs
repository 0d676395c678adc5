//! Per-channel status record

use std::collections::BTreeMap;

use serde::Serialize;

/// Open sessions and subscriber count of one channel
///
/// Serializes flat: `{"<session id>": "video/H264", ..., "subscriberCount": 1}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StreamStatus {
    #[serde(flatten)]
    pub sessions: BTreeMap<String, String>,
    #[serde(rename = "subscriberCount")]
    pub subscriber_count: usize,
}
