//! Codec handler dispatch
//!
//! The handler variant is chosen once, when a session opens, from the
//! media/codec table in [`crate::registry::codec`].

use bytes::Bytes;

use super::frame::Frame;
use super::generic::GenericHandler;
use super::h264::H264Handler;
use super::h265::H265Handler;
use super::params::{PresentationTime, SessionParams};

/// Which handler implementation a session uses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerKind {
    /// Passthrough
    Generic,
    /// H.264 with SPS/PPS reinsertion
    H264,
    /// H.265 with VPS/SPS/PPS reinsertion
    H265,
}

/// Converts received units into publishable frames
#[derive(Debug, Clone)]
pub enum CodecHandler {
    Generic(GenericHandler),
    H264(H264Handler),
    H265(H265Handler),
}

impl CodecHandler {
    /// Create a new handler of the given kind
    pub fn new(kind: HandlerKind, params: SessionParams) -> Self {
        match kind {
            HandlerKind::Generic => CodecHandler::Generic(GenericHandler::new(params)),
            HandlerKind::H264 => CodecHandler::H264(H264Handler::new(params)),
            HandlerKind::H265 => CodecHandler::H265(H265Handler::new(params)),
        }
    }

    /// Which implementation this handler uses
    pub fn kind(&self) -> HandlerKind {
        match self {
            CodecHandler::Generic(_) => HandlerKind::Generic,
            CodecHandler::H264(_) => HandlerKind::H264,
            CodecHandler::H265(_) => HandlerKind::H265,
        }
    }

    /// Session parameters the handler was created with
    pub fn params(&self) -> &SessionParams {
        match self {
            CodecHandler::Generic(h) => h.params(),
            CodecHandler::H264(h) => h.params(),
            CodecHandler::H265(h) => h.params(),
        }
    }

    /// Convert one unit; `None` means nothing to publish
    pub fn on_data(&mut self, payload: Bytes, pts: PresentationTime) -> Option<Frame> {
        match self {
            CodecHandler::Generic(h) => h.on_data(payload, pts),
            CodecHandler::H264(h) => h.on_data(payload, pts),
            CodecHandler::H265(h) => h.on_data(payload, pts),
        }
    }

    /// Apply out-of-band configuration from the session description
    pub fn on_config(&mut self, sdp: &str) -> bool {
        match self {
            CodecHandler::Generic(h) => h.on_config(sdp),
            CodecHandler::H264(h) => h.on_config(sdp),
            CodecHandler::H265(h) => h.on_config(sdp),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch_by_kind() {
        let params = SessionParams::new("video", "H264", 90_000, 0);
        let mut handler = CodecHandler::new(HandlerKind::H264, params);
        assert_eq!(handler.kind(), HandlerKind::H264);
        assert_eq!(handler.params().codec, "H264");

        let sps = Bytes::from_static(&[0x00, 0x00, 0x00, 0x01, 0x67, 0x42, 0xC0, 0x1E]);
        assert!(handler.on_data(sps, PresentationTime::ZERO).is_none());
    }

    #[test]
    fn test_generic_passthrough() {
        let params = SessionParams::new("audio", "ulaw", 8_000, 1);
        let mut handler = CodecHandler::new(HandlerKind::Generic, params);
        assert!(handler.on_config(""));
        let frame = handler
            .on_data(Bytes::from_static(&[0x7F; 160]), PresentationTime::ZERO)
            .unwrap();
        assert_eq!(frame.data.len(), 160);
        assert_eq!(frame.metadata.codec, "ulaw");
    }
}
