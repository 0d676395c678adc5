//! In-process channel hub
//!
//! Fans published messages out to subscribers with `tokio::sync::broadcast`.
//!
//! ```text
//!                          ChannelHub
//!                     ┌─────────────────────────┐
//!                     │ channels: HashMap<Path, │
//!                     │   ChannelEntry {        │
//!                     │     tx: broadcast::Tx,  │
//!                     │     subscriber_count,   │
//!                     │     hooks,              │
//!                     │   }                     │
//!                     │ >                       │
//!                     └───────────┬─────────────┘
//!                                 │
//!         ┌───────────────────────┼───────────────────────┐
//!         ▼                       ▼                       ▼
//!   [StreamController]      [Subscription]          [Subscription]
//!   publish_binary()        recv()                  recv()
//! ```
//!
//! `bytes::Bytes` is reference counted, so every subscriber shares the same
//! payload allocation. A subscriber that falls more than `broadcast_capacity`
//! messages behind skips the missed messages.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

use bytes::Bytes;
use parking_lot::RwLock;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};

use super::{ChannelMessage, SubscriberHooks, Transport};
use crate::error::{Error, Result};
use crate::media::FrameMetadata;

/// Hub configuration
#[derive(Debug, Clone)]
pub struct HubConfig {
    /// Messages buffered per channel before slow subscribers lag
    pub broadcast_capacity: usize,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            broadcast_capacity: 1024,
        }
    }
}

impl HubConfig {
    /// Set the per-channel buffer size
    pub fn broadcast_capacity(mut self, capacity: usize) -> Self {
        self.broadcast_capacity = capacity.max(1);
        self
    }
}

/// Per-channel state
struct ChannelEntry {
    tx: broadcast::Sender<ChannelMessage>,
    subscriber_count: AtomicUsize,
    hooks: Arc<dyn SubscriberHooks>,
}

/// In-process [`Transport`] implementation
pub struct ChannelHub {
    channels: RwLock<HashMap<String, Arc<ChannelEntry>>>,
    config: HubConfig,
}

impl ChannelHub {
    /// Create a new hub with default configuration
    pub fn new() -> Self {
        Self::with_config(HubConfig::default())
    }

    /// Create a new hub with the given configuration
    pub fn with_config(config: HubConfig) -> Self {
        Self {
            channels: RwLock::new(HashMap::new()),
            config,
        }
    }

    /// Subscribe to a channel
    ///
    /// Counts the subscriber, then fires the channel's connect hook.
    pub fn subscribe(&self, path: &str) -> Result<Subscription> {
        let entry = self
            .channels
            .read()
            .get(path)
            .cloned()
            .ok_or_else(|| Error::ChannelNotFound(path.to_string()))?;

        let rx = entry.tx.subscribe();
        let count = entry.subscriber_count.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::info!(channel = %path, subscribers = count, "Subscriber added");
        entry.hooks.on_subscriber_connect(path);

        Ok(Subscription {
            path: path.to_string(),
            entry: Arc::downgrade(&entry),
            rx,
        })
    }

    /// Registered channel paths
    pub fn channels(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.channels.read().keys().cloned().collect();
        paths.sort();
        paths
    }

    fn send(&self, path: &str, message: ChannelMessage) {
        if let Some(entry) = self.channels.read().get(path) {
            // Err only means nobody is listening
            let _ = entry.tx.send(message);
        }
    }
}

impl Default for ChannelHub {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for ChannelHub {
    fn register_channel(&self, path: &str, hooks: Arc<dyn SubscriberHooks>) -> Result<()> {
        let mut channels = self.channels.write();
        if channels.contains_key(path) {
            return Err(Error::DuplicateChannel(path.to_string()));
        }
        let (tx, _) = broadcast::channel(self.config.broadcast_capacity);
        channels.insert(
            path.to_string(),
            Arc::new(ChannelEntry {
                tx,
                subscriber_count: AtomicUsize::new(0),
                hooks,
            }),
        );
        tracing::info!(channel = %path, "Channel registered");
        Ok(())
    }

    fn unregister_channel(&self, path: &str) {
        if self.channels.write().remove(path).is_some() {
            tracing::info!(channel = %path, "Channel unregistered");
        }
    }

    fn publish_structured(&self, path: &str, metadata: &FrameMetadata) {
        self.send(path, ChannelMessage::Text(metadata.to_json().into()));
    }

    fn publish_binary(&self, path: &str, data: Bytes) {
        self.send(path, ChannelMessage::Binary(data));
    }

    fn connection_count(&self, path: &str) -> usize {
        self.channels
            .read()
            .get(path)
            .map(|entry| entry.subscriber_count.load(Ordering::SeqCst))
            .unwrap_or(0)
    }
}

/// A subscriber's view of one channel
///
/// Dropping it removes the subscriber and fires the disconnect hook.
pub struct Subscription {
    path: String,
    entry: Weak<ChannelEntry>,
    rx: broadcast::Receiver<ChannelMessage>,
}

impl Subscription {
    /// Channel this subscription listens to
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Next message, or `None` once the channel is unregistered
    pub async fn recv(&mut self) -> Option<ChannelMessage> {
        loop {
            match self.rx.recv().await {
                Ok(message) => return Some(message),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(channel = %self.path, skipped, "Subscriber lagging, messages dropped");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Next message if one is already queued
    pub fn try_recv(&mut self) -> Option<ChannelMessage> {
        loop {
            match self.rx.try_recv() {
                Ok(message) => return Some(message),
                Err(TryRecvError::Lagged(_)) => continue,
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return None,
            }
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let Some(entry) = self.entry.upgrade() else {
            return;
        };
        let prev = entry.subscriber_count.fetch_sub(1, Ordering::SeqCst);
        tracing::debug!(
            channel = %self.path,
            subscribers = prev.saturating_sub(1),
            "Subscriber removed"
        );
        entry.hooks.on_subscriber_disconnect(&self.path);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicU32;

    use super::*;

    #[derive(Default)]
    struct CountingHooks {
        connects: AtomicU32,
        disconnects: AtomicU32,
    }

    impl SubscriberHooks for CountingHooks {
        fn on_subscriber_connect(&self, _path: &str) {
            self.connects.fetch_add(1, Ordering::SeqCst);
        }

        fn on_subscriber_disconnect(&self, _path: &str) {
            self.disconnects.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_register_duplicate() {
        let hub = ChannelHub::new();
        let hooks = Arc::new(CountingHooks::default());
        hub.register_channel("/cam", hooks.clone()).unwrap();

        let result = hub.register_channel("/cam", hooks);
        assert!(matches!(result, Err(Error::DuplicateChannel(_))));
        assert_eq!(hub.channels(), vec!["/cam".to_string()]);
    }

    #[test]
    fn test_subscribe_unknown_channel() {
        let hub = ChannelHub::new();
        assert!(matches!(hub.subscribe("/nope"), Err(Error::ChannelNotFound(_))));
    }

    #[test]
    fn test_subscriber_accounting_and_hooks() {
        let hub = ChannelHub::new();
        let hooks = Arc::new(CountingHooks::default());
        hub.register_channel("/cam", hooks.clone()).unwrap();

        let first = hub.subscribe("/cam").unwrap();
        let second = hub.subscribe("/cam").unwrap();
        assert_eq!(hub.connection_count("/cam"), 2);
        assert_eq!(hooks.connects.load(Ordering::SeqCst), 2);

        drop(first);
        assert_eq!(hub.connection_count("/cam"), 1);
        drop(second);
        assert_eq!(hub.connection_count("/cam"), 0);
        assert_eq!(hooks.disconnects.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_publish_order() {
        let hub = ChannelHub::new();
        hub.register_channel("/cam", Arc::new(CountingHooks::default()))
            .unwrap();
        let mut sub = hub.subscribe("/cam").unwrap();

        let meta = FrameMetadata::video("video", "avc1.64001f", 7);
        hub.publish_structured("/cam", &meta);
        hub.publish_binary("/cam", Bytes::from_static(&[1, 2, 3]));

        match sub.recv().await.unwrap() {
            ChannelMessage::Text(text) => {
                let json: serde_json::Value = serde_json::from_str(&text).unwrap();
                assert_eq!(json["timestamp"], 7);
            }
            other => panic!("Expected text, got {:?}", other),
        }
        assert_eq!(
            sub.recv().await.unwrap(),
            ChannelMessage::Binary(Bytes::from_static(&[1, 2, 3]))
        );
    }

    #[tokio::test]
    async fn test_unregister_closes_subscribers() {
        let hub = ChannelHub::new();
        let hooks = Arc::new(CountingHooks::default());
        hub.register_channel("/cam", hooks.clone()).unwrap();
        let mut sub = hub.subscribe("/cam").unwrap();

        hub.unregister_channel("/cam");
        assert!(sub.recv().await.is_none());
        assert_eq!(hub.connection_count("/cam"), 0);

        // Channel is gone: dropping must not fire the hook
        drop(sub);
        assert_eq!(hooks.disconnects.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_recv_waits_for_publish() {
        let hub = ChannelHub::new();
        hub.register_channel("/cam", Arc::new(CountingHooks::default()))
            .unwrap();
        let mut sub = hub.subscribe("/cam").unwrap();

        let mut recv = tokio_test::task::spawn(sub.recv());
        tokio_test::assert_pending!(recv.poll());

        hub.publish_binary("/cam", Bytes::from_static(&[9]));
        assert!(recv.is_woken());
        tokio_test::assert_ready_eq!(
            recv.poll(),
            Some(ChannelMessage::Binary(Bytes::from_static(&[9])))
        );
    }

    #[test]
    fn test_lagging_subscriber_skips() {
        let hub = ChannelHub::with_config(HubConfig::default().broadcast_capacity(2));
        hub.register_channel("/cam", Arc::new(CountingHooks::default()))
            .unwrap();
        let mut sub = hub.subscribe("/cam").unwrap();

        for i in 0..5u8 {
            hub.publish_binary("/cam", Bytes::copy_from_slice(&[i]));
        }
        assert_eq!(sub.try_recv(), Some(ChannelMessage::Binary(Bytes::from_static(&[3]))));
        assert_eq!(sub.try_recv(), Some(ChannelMessage::Binary(Bytes::from_static(&[4]))));
        assert_eq!(sub.try_recv(), None);
    }

    #[test]
    fn test_publish_without_subscribers() {
        let hub = ChannelHub::new();
        hub.register_channel("/cam", Arc::new(CountingHooks::default()))
            .unwrap();
        hub.publish_binary("/cam", Bytes::from_static(&[0]));
        hub.publish_binary("/unknown", Bytes::from_static(&[0]));
    }
}
