//! RTSP to push-channel gateway
//!
//! Each configured channel owns a [`StreamController`]. The controller starts
//! its upstream RTSP session when the first subscriber arrives and stops it
//! when the last one leaves. Media sessions announced by the source are
//! handled by a codec-specific [`CodecHandler`]; every frame is published as a
//! JSON metadata message followed by the binary payload.
//!
//! ```text
//!   SourceSession ──► SessionRegistry ──► CodecHandler ──► Transport
//!        ▲                                                   │
//!        └──── start/stop ◄── StreamController ◄── hooks ────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use rtsp2ws::{ChannelHub, Gateway, GatewayConfig, SourceConnector};
//!
//! fn run<C: SourceConnector>(connector: C) -> rtsp2ws::Result<()> {
//!     let config = GatewayConfig::from_file("rtsp2ws.json")?;
//!     let hub = Arc::new(ChannelHub::new());
//!     let gateway = Gateway::new(&config, &connector, hub.clone())?;
//!     println!("{}", gateway.query(rtsp2ws::Query::Streams));
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod gateway;
pub mod media;
pub mod registry;
pub mod source;
pub mod stream;
pub mod transport;

pub use error::{Error, Result};
pub use gateway::{Gateway, GatewayConfig, Query};
pub use media::{CodecHandler, Frame, FrameMetadata, HandlerKind, PresentationTime, SessionParams};
pub use registry::SessionRegistry;
pub use source::{SourceConnector, SourceEvent, SourceOptions, SourceSession};
pub use stream::{StreamController, StreamStatus};
pub use transport::{ChannelHub, ChannelMessage, Transport};
