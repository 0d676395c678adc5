//! Session registry implementation
//!
//! Owns one codec handler per open source session and publishes the frames
//! they produce on the registry's channel. Lives on its controller's worker
//! thread; only the label snapshot is shared with other threads.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use parking_lot::Mutex;

use super::codec;
use super::restart::{Fault, RestartPolicy};
use crate::media::{CodecHandler, Frame, PresentationTime, SessionParams};
use crate::source::{NewSession, SourceEvent};
use crate::transport::Transport;

/// Shared `session id -> "media/codec"` snapshot
///
/// Written by the registry on open/close, read by status queries.
#[derive(Debug, Clone, Default)]
pub struct SessionLabels(Arc<Mutex<BTreeMap<String, String>>>);

impl SessionLabels {
    /// Copy of the current labels
    pub fn snapshot(&self) -> BTreeMap<String, String> {
        self.0.lock().clone()
    }

    /// Number of open sessions
    pub fn len(&self) -> usize {
        self.0.lock().len()
    }

    /// Whether no session is open
    pub fn is_empty(&self) -> bool {
        self.0.lock().is_empty()
    }

    fn insert(&self, id: &str, label: String) {
        self.0.lock().insert(id.to_string(), label);
    }

    fn remove(&self, id: &str) {
        self.0.lock().remove(id);
    }

    fn clear(&self) {
        self.0.lock().clear();
    }
}

/// Routes source events for one channel
pub struct SessionRegistry {
    path: String,
    transport: Arc<dyn Transport>,
    handlers: HashMap<String, CodecHandler>,
    labels: SessionLabels,
    restart: RestartPolicy,
}

impl SessionRegistry {
    /// Create a registry publishing on `path`
    pub fn new(path: impl Into<String>, transport: Arc<dyn Transport>) -> Self {
        Self {
            path: path.into(),
            transport,
            handlers: HashMap::new(),
            labels: SessionLabels::default(),
            restart: RestartPolicy::default(),
        }
    }

    /// Override the restart policy
    pub fn with_restart_policy(mut self, restart: RestartPolicy) -> Self {
        self.restart = restart;
        self
    }

    /// Channel path frames are published on
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Handle to the label snapshot, for readers on other threads
    pub fn labels(&self) -> SessionLabels {
        self.labels.clone()
    }

    /// Number of open sessions
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Whether no session is open
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Open sessions as `id -> "media/codec"`
    pub fn sessions(&self) -> BTreeMap<String, String> {
        self.handlers
            .iter()
            .map(|(id, handler)| (id.clone(), handler.params().label()))
            .collect()
    }

    /// Open a session
    ///
    /// Unsupported media/codec pairs are rejected without touching the map.
    pub fn on_new_session(
        &mut self,
        id: &str,
        media: &str,
        codec: &str,
        sdp: &str,
        clock_rate: u32,
        channels: u32,
    ) -> bool {
        let Some(entry) = codec::lookup(media, codec) else {
            tracing::warn!(
                channel = %self.path,
                session_id = %id,
                media,
                codec,
                "Unsupported session rejected"
            );
            return false;
        };

        let params = SessionParams::new(media, entry.label, clock_rate, channels);
        let mut handler = CodecHandler::new(entry.handler, params);
        let accepted = handler.on_config(sdp);
        let label = handler.params().label();

        if self.handlers.insert(id.to_string(), handler).is_some() {
            tracing::warn!(channel = %self.path, session_id = %id, "Session id reused, handler replaced");
        }
        self.labels.insert(id, label.clone());

        tracing::info!(
            channel = %self.path,
            session_id = %id,
            session = %label,
            clock_rate,
            channels,
            accepted,
            "Session opened"
        );
        accepted
    }

    /// Feed one unit to its session's handler and publish the result
    ///
    /// Returns false for unknown session ids.
    pub fn on_data(&mut self, id: &str, payload: Bytes, pts: PresentationTime) -> bool {
        let Some(handler) = self.handlers.get_mut(id) else {
            tracing::debug!(channel = %self.path, session_id = %id, "Data for unknown session");
            return false;
        };
        if let Some(frame) = handler.on_data(payload, pts) {
            self.publish(frame);
        }
        true
    }

    /// Close a session, releasing its handler
    pub fn on_close_session(&mut self, id: &str) {
        if self.handlers.remove(id).is_some() {
            self.labels.remove(id);
            tracing::info!(channel = %self.path, session_id = %id, "Session closed");
        }
    }

    /// Drop every open session, e.g. after the upstream was stopped
    pub fn close_all(&mut self) {
        if !self.handlers.is_empty() {
            tracing::debug!(channel = %self.path, sessions = self.handlers.len(), "Closing all sessions");
        }
        self.handlers.clear();
        self.labels.clear();
    }

    /// Delay before restarting the upstream after `fault`
    pub fn on_fault(&self, fault: &Fault) -> Duration {
        let delay = self.restart.delay_for(fault);
        tracing::warn!(
            channel = %self.path,
            fault = ?fault,
            delay_secs = delay.as_secs(),
            "Upstream fault, restarting"
        );
        delay
    }

    /// Dispatch one source event
    ///
    /// Returns the restart delay when the event is an upstream fault.
    pub fn handle_event(&mut self, event: SourceEvent) -> Option<Duration> {
        match event {
            SourceEvent::NewSession(NewSession {
                id,
                media,
                codec,
                sdp,
                clock_rate,
                channels,
                reply,
            }) => {
                let accepted =
                    self.on_new_session(&id, &media, &codec, &sdp, clock_rate, channels);
                // Source may have given up on the session already
                let _ = reply.send(accepted);
                None
            }
            SourceEvent::Data {
                id,
                payload,
                presentation_time,
            } => {
                self.on_data(&id, payload, presentation_time);
                None
            }
            SourceEvent::CloseSession { id } => {
                self.on_close_session(&id);
                None
            }
            SourceEvent::Error { message } => Some(self.on_fault(&Fault::Error(message))),
            SourceEvent::ConnectionTimeout => Some(self.on_fault(&Fault::ConnectionTimeout)),
            SourceEvent::DataTimeout => Some(self.on_fault(&Fault::DataTimeout)),
        }
    }

    fn publish(&self, frame: Frame) {
        if frame.data.is_empty() {
            return;
        }
        tracing::trace!(
            channel = %self.path,
            codec = %frame.metadata.codec,
            timestamp = frame.metadata.timestamp,
            keyframe = frame.metadata.is_keyframe(),
            len = frame.data.len(),
            "Publishing frame"
        );
        self.transport.publish_structured(&self.path, &frame.metadata);
        self.transport.publish_binary(&self.path, frame.data);
    }
}
