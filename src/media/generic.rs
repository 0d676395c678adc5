//! Passthrough handler
//!
//! Used for codecs whose units are directly decodable by the client (JPEG,
//! AAC, MP3, Opus, G.711). Every unit is published as-is.

use bytes::Bytes;

use super::frame::{Frame, FrameMetadata};
use super::params::{PresentationTime, SessionParams};

/// Handler publishing every received unit unchanged
#[derive(Debug, Clone)]
pub struct GenericHandler {
    params: SessionParams,
}

impl GenericHandler {
    /// Create a new passthrough handler
    pub fn new(params: SessionParams) -> Self {
        Self { params }
    }

    /// Session parameters
    pub fn params(&self) -> &SessionParams {
        &self.params
    }

    /// Wrap the unit with clock rate and channel count metadata
    pub fn on_data(&mut self, payload: Bytes, pts: PresentationTime) -> Option<Frame> {
        let metadata = FrameMetadata {
            media: self.params.media.clone(),
            codec: self.params.codec.clone(),
            clock_rate: Some(self.params.clock_rate),
            channels: Some(self.params.channels),
            timestamp: pts.as_micros(),
            kind: None,
        };
        Some(Frame::new(metadata, payload))
    }

    /// Nothing to configure out of band
    pub fn on_config(&mut self, _sdp: &str) -> bool {
        true
    }
}
