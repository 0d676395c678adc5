//! Publishable frame types
//!
//! A handler turns one received unit into at most one [`Frame`]: a small
//! metadata record, published as structured text, followed by the binary
//! payload.

use bytes::Bytes;
use serde::Serialize;

/// Kind flag carried in metadata
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FrameKind {
    /// Self-contained IDR unit, prefixed with its parameter sets
    Keyframe,
}

/// Metadata record describing a published frame
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FrameMetadata {
    /// Media kind ("video", "audio")
    pub media: String,
    /// Codec identifier ("avc1.64001f", "opus", ...)
    pub codec: String,
    /// RTP clock rate (passthrough handler only)
    #[serde(rename = "clockRate", skip_serializing_if = "Option::is_none")]
    pub clock_rate: Option<u32>,
    /// Channel count (passthrough handler only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channels: Option<u32>,
    /// Presentation time in microseconds
    pub timestamp: u64,
    /// Keyframe flag
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<FrameKind>,
}

impl FrameMetadata {
    /// Metadata for a video unit
    pub fn video(media: impl Into<String>, codec: impl Into<String>, timestamp: u64) -> Self {
        Self {
            media: media.into(),
            codec: codec.into(),
            clock_rate: None,
            channels: None,
            timestamp,
            kind: None,
        }
    }

    /// Mark as keyframe
    pub fn keyframe(mut self) -> Self {
        self.kind = Some(FrameKind::Keyframe);
        self
    }

    /// Whether the keyframe flag is set
    pub fn is_keyframe(&self) -> bool {
        self.kind == Some(FrameKind::Keyframe)
    }

    /// Serialize to the JSON text sent on the wire
    pub fn to_json(&self) -> String {
        // A struct of strings and integers cannot fail to serialize
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// A frame ready to be published
///
/// Cheap to clone: `Bytes` is reference counted.
#[derive(Debug, Clone)]
pub struct Frame {
    pub metadata: FrameMetadata,
    pub data: Bytes,
}

impl Frame {
    /// Create a new frame
    pub fn new(metadata: FrameMetadata, data: Bytes) -> Self {
        Self { metadata, data }
    }
}
