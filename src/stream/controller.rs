//! Stream controller
//!
//! Binds one channel to one source URL. The upstream session runs on a
//! dedicated worker thread and is started only while the channel has
//! subscribers.
//!
//! Subscriber hooks fire on transport threads. They never touch the session:
//! they enqueue a command and the worker re-reads the connection count, so
//! racing connects and disconnects collapse into one start or one stop.

use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use tokio::sync::mpsc;

use super::status::StreamStatus;
use crate::error::Result;
use crate::registry::{SessionLabels, SessionRegistry};
use crate::source::SourceSession;
use crate::transport::{SubscriberHooks, Transport};

/// Commands drained by the worker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    /// Connection count may have changed
    SubscribersChanged,
    /// Stop the upstream and exit
    Shutdown,
}

/// Hooks registered with the transport for this channel
struct ControllerHooks {
    commands: mpsc::UnboundedSender<Command>,
}

impl SubscriberHooks for ControllerHooks {
    fn on_subscriber_connect(&self, _path: &str) {
        // Closed queue means the controller is shutting down
        let _ = self.commands.send(Command::SubscribersChanged);
    }

    fn on_subscriber_disconnect(&self, _path: &str) {
        let _ = self.commands.send(Command::SubscribersChanged);
    }
}

/// Owns one upstream session and the worker driving it
pub struct StreamController {
    path: String,
    url: String,
    transport: Arc<dyn Transport>,
    labels: SessionLabels,
    commands: mpsc::UnboundedSender<Command>,
    worker: Option<JoinHandle<()>>,
}

impl StreamController {
    /// Register the channel and start the worker
    ///
    /// The upstream session is not started until the first subscriber
    /// connects.
    pub fn new<S: SourceSession>(
        path: impl Into<String>,
        url: impl Into<String>,
        session: S,
        transport: Arc<dyn Transport>,
    ) -> Result<Self> {
        Self::with_registry(path, url, session, transport, |registry| registry)
    }

    /// Like [`StreamController::new`], with a hook to customize the registry
    pub fn with_registry<S, F>(
        path: impl Into<String>,
        url: impl Into<String>,
        session: S,
        transport: Arc<dyn Transport>,
        configure: F,
    ) -> Result<Self>
    where
        S: SourceSession,
        F: FnOnce(SessionRegistry) -> SessionRegistry,
    {
        let path = path.into();
        let url = url.into();
        let (commands, command_rx) = mpsc::unbounded_channel();

        let registry = configure(SessionRegistry::new(path.clone(), Arc::clone(&transport)));
        let labels = registry.labels();

        let hooks = Arc::new(ControllerHooks {
            commands: commands.clone(),
        });
        transport.register_channel(&path, hooks)?;

        let worker = Worker {
            path: path.clone(),
            session,
            registry,
            transport: Arc::clone(&transport),
            commands: command_rx,
            running: false,
        };
        let worker = match spawn_worker(&path, worker) {
            Ok(handle) => handle,
            Err(e) => {
                transport.unregister_channel(&path);
                return Err(e);
            }
        };

        tracing::info!(channel = %path, url = %url, "Stream controller started");

        Ok(Self {
            path,
            url,
            transport,
            labels,
            commands,
            worker: Some(worker),
        })
    }

    /// Channel path
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Source URL
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Open sessions and current subscriber count
    pub fn status(&self) -> StreamStatus {
        StreamStatus {
            sessions: self.labels.snapshot(),
            subscriber_count: self.transport.connection_count(&self.path),
        }
    }

    /// Stop the upstream, stop and join the worker, then unregister the channel
    ///
    /// Runs once; also called on drop.
    pub fn shutdown(&mut self) {
        let Some(worker) = self.worker.take() else {
            return;
        };
        let _ = self.commands.send(Command::Shutdown);
        if worker.join().is_err() {
            tracing::error!(channel = %self.path, "Stream worker panicked");
        }
        self.transport.unregister_channel(&self.path);
        tracing::info!(channel = %self.path, "Stream controller stopped");
    }
}

impl Drop for StreamController {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn spawn_worker<S: SourceSession>(path: &str, worker: Worker<S>) -> Result<JoinHandle<()>> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let handle = std::thread::Builder::new()
        .name(path.to_string())
        .spawn(move || runtime.block_on(worker.run()))?;
    Ok(handle)
}

/// State owned by the worker thread
struct Worker<S> {
    path: String,
    session: S,
    registry: SessionRegistry,
    transport: Arc<dyn Transport>,
    commands: mpsc::UnboundedReceiver<Command>,
    /// Whether the upstream is wanted (started and not stopped)
    running: bool,
}

impl<S: SourceSession> Worker<S> {
    async fn run(mut self) {
        loop {
            tokio::select! {
                biased;
                command = self.commands.recv() => match command {
                    Some(Command::SubscribersChanged) => self.reconcile(),
                    Some(Command::Shutdown) | None => break,
                },
                event = self.session.next_event(), if self.running => {
                    if let Some(delay) = self.registry.handle_event(event) {
                        self.restart(delay);
                    }
                }
            }
        }
        self.stop_upstream();
        tracing::debug!(channel = %self.path, "Stream worker exiting");
    }

    /// Start or stop the upstream to match the subscriber count
    fn reconcile(&mut self) {
        let subscribers = self.transport.connection_count(&self.path);
        if subscribers > 0 && !self.running {
            tracing::info!(channel = %self.path, subscribers, "First subscriber, starting upstream");
            self.session.start(Duration::ZERO);
            self.running = true;
        } else if subscribers == 0 && self.running {
            tracing::info!(channel = %self.path, "No subscribers left");
            self.stop_upstream();
        }
    }

    /// Replace the faulted upstream; its sessions are gone with it
    fn restart(&mut self, delay: Duration) {
        if self.running {
            self.registry.close_all();
            self.session.start(delay);
        }
    }

    fn stop_upstream(&mut self) {
        if !self.running {
            return;
        }
        self.session.stop();
        self.running = false;
        self.registry.close_all();
        tracing::info!(channel = %self.path, "Upstream stopped");
    }
}
