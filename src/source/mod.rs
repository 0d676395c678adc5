//! Source-protocol boundary
//!
//! The RTSP client itself lives outside this crate. A controller drives one
//! [`SourceSession`] on its own worker thread:
//!
//! ```text
//!   worker loop (current-thread runtime)
//!   ┌──────────────────────────────────────────────┐
//!   │ commands.recv() ──► start(0) / stop()         │
//!   │ session.next_event() ──► SessionRegistry      │
//!   │        Error / timeouts ──► start(delay)      │
//!   └──────────────────────────────────────────────┘
//! ```
//!
//! All calls into the session happen on that worker, so implementations need
//! no internal locking.

use std::time::Duration;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

use crate::error::Result;
use crate::media::PresentationTime;

/// How RTP is carried between the source and the gateway
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RtpTransport {
    /// Interleaved on the RTSP TCP connection
    #[default]
    Tcp,
    /// UDP unicast
    Udp,
    /// UDP multicast
    Multicast,
    /// Tunnelled over HTTP
    Http,
}

/// Options handed to the connector for every stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceOptions {
    /// Protocol timeout (connect and data)
    pub timeout: Duration,
    /// RTP transport mode
    pub rtp_transport: RtpTransport,
    /// Client verbosity, 0 = quiet
    pub verbose: u8,
}

impl Default for SourceOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            rtp_transport: RtpTransport::Tcp,
            verbose: 0,
        }
    }
}

/// A media session announced by the source
#[derive(Debug)]
pub struct NewSession {
    /// Opaque session identifier, unique while open
    pub id: String,
    /// Media kind ("video", "audio")
    pub media: String,
    /// Encoding name from the rtpmap ("H264", "OPUS", ...)
    pub codec: String,
    /// Session description for this media
    pub sdp: String,
    /// RTP clock rate
    pub clock_rate: u32,
    /// Channel count
    pub channels: u32,
    /// Acceptance answer; dropping it counts as a rejection
    pub reply: oneshot::Sender<bool>,
}

/// Event produced by a running source session
#[derive(Debug)]
pub enum SourceEvent {
    /// A media session was negotiated
    NewSession(NewSession),
    /// One elementary-stream unit
    Data {
        id: String,
        payload: Bytes,
        presentation_time: PresentationTime,
    },
    /// A media session ended
    CloseSession { id: String },
    /// Connection failed or was lost
    Error { message: String },
    /// Connecting took longer than the configured timeout
    ConnectionTimeout,
    /// Connected but no data within the configured timeout
    DataTimeout,
}

/// One upstream session, owned by a stream controller
pub trait SourceSession: Send + 'static {
    /// Connect after `delay` (zero = now)
    ///
    /// Calling it while a session is active or pending replaces that session,
    /// so repeated restarts never overlap.
    fn start(&mut self, delay: Duration);

    /// Tear the session down; no events are produced until the next `start`
    fn stop(&mut self);

    /// Wait for the next event
    ///
    /// Must be cancel safe: the worker polls it alongside its command queue.
    /// Pending while the session is stopped.
    async fn next_event(&mut self) -> SourceEvent;
}

/// Creates sessions for source URLs
pub trait SourceConnector: Send + Sync + 'static {
    type Session: SourceSession;

    /// Create a session for `url`, not yet started
    fn connect(&self, url: &str, options: &SourceOptions) -> Result<Self::Session>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let options = SourceOptions::default();
        assert_eq!(options.timeout, Duration::from_secs(10));
        assert_eq!(options.rtp_transport, RtpTransport::Tcp);
        assert_eq!(options.verbose, 0);
    }

    #[test]
    fn test_rtp_transport_names() {
        let parsed: RtpTransport = serde_json::from_str("\"multicast\"").unwrap();
        assert_eq!(parsed, RtpTransport::Multicast);
        assert_eq!(serde_json::to_string(&RtpTransport::Http).unwrap(), "\"http\"");
    }
}
