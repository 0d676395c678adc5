//! Push-transport boundary
//!
//! The gateway publishes frames to channels and learns about subscribers
//! through these traits. A WebSocket server would implement [`Transport`];
//! [`ChannelHub`] is the in-process implementation.

pub mod hub;

use std::sync::Arc;

use bytes::Bytes;

use crate::error::Result;
use crate::media::FrameMetadata;

pub use hub::{ChannelHub, HubConfig, Subscription};

/// Message delivered to channel subscribers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelMessage {
    /// Structured metadata, serialized as JSON text
    Text(Arc<str>),
    /// Frame payload
    Binary(Bytes),
}

/// Subscriber lifecycle notifications for one channel
///
/// Called from transport threads, after the connection count was updated.
pub trait SubscriberHooks: Send + Sync {
    fn on_subscriber_connect(&self, path: &str);
    fn on_subscriber_disconnect(&self, path: &str);
}

/// Publish/subscribe transport with per-channel connection accounting
pub trait Transport: Send + Sync + 'static {
    /// Make `path` available to subscribers
    fn register_channel(&self, path: &str, hooks: Arc<dyn SubscriberHooks>) -> Result<()>;

    /// Remove `path`; existing subscribers see the channel close
    fn unregister_channel(&self, path: &str);

    /// Publish a metadata record; must not block
    fn publish_structured(&self, path: &str, metadata: &FrameMetadata);

    /// Publish a binary payload; must not block
    fn publish_binary(&self, path: &str, data: Bytes);

    /// Current subscriber count for `path` (0 if unknown)
    fn connection_count(&self, path: &str) -> usize;
}
