//! Media framing
//!
//! This module provides:
//! - Session parameters and presentation time
//! - Session description helpers (fmtp attributes, base64 parameter sets)
//! - Codec handlers turning received units into publishable frames:
//!   passthrough, H.264 and H.265 with parameter-set caching

pub mod frame;
pub mod generic;
pub mod h264;
pub mod h265;
pub mod handler;
pub mod params;
pub mod sdp;

pub use frame::{Frame, FrameKind, FrameMetadata};
pub use generic::GenericHandler;
pub use h264::H264Handler;
pub use h265::H265Handler;
pub use handler::{CodecHandler, HandlerKind};
pub use params::{PresentationTime, SessionParams};
