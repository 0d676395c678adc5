//! Gateway
//!
//! Builds one [`StreamController`] per configured channel and answers the
//! introspection queries. Request routing itself belongs to the transport:
//! it maps an incoming path to [`Gateway::route`].

pub mod config;

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::{json, Value};

use crate::error::Result;
use crate::source::SourceConnector;
use crate::stream::{StreamController, StreamStatus};
use crate::transport::Transport;

pub use config::{GatewayConfig, StreamSource};

/// Gateway version string
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Introspection queries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Query {
    /// Version string
    Version,
    /// Status of every channel
    Streams,
    /// Names of the exposed queries
    Help,
}

impl Query {
    /// Every query, in the order help lists them
    pub const ALL: [Query; 3] = [Query::Help, Query::Streams, Query::Version];

    /// Path a transport exposes the query under
    pub fn path(&self) -> &'static str {
        match self {
            Query::Version => "/api/version",
            Query::Streams => "/api/streams",
            Query::Help => "/api/help",
        }
    }

    /// Query exposed under `path`
    pub fn from_path(path: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|q| q.path() == path)
    }
}

/// Named collection of stream controllers
pub struct Gateway {
    streams: BTreeMap<String, StreamController>,
}

impl Gateway {
    /// Create a controller for every configured channel
    ///
    /// Fails if the configuration is invalid, a source URL is refused, or the
    /// transport cannot register a channel. Controllers created before the
    /// failure are shut down.
    pub fn new<C: SourceConnector>(
        config: &GatewayConfig,
        connector: &C,
        transport: Arc<dyn Transport>,
    ) -> Result<Self> {
        let options = config.source_options();
        let mut streams = BTreeMap::new();

        for (path, url) in config.streams()? {
            let session = connector.connect(&url, &options)?;
            let controller = StreamController::new(path.clone(), url, session, Arc::clone(&transport))?;
            streams.insert(path, controller);
        }

        tracing::info!(
            streams = streams.len(),
            rtp_transport = ?options.rtp_transport,
            "Gateway started"
        );
        Ok(Self { streams })
    }

    /// Crate version
    pub fn version(&self) -> &'static str {
        VERSION
    }

    /// Status of every channel
    pub fn streams(&self) -> BTreeMap<String, StreamStatus> {
        self.streams
            .iter()
            .map(|(path, controller)| (path.clone(), controller.status()))
            .collect()
    }

    /// Exposed query names
    pub fn help(&self) -> Vec<&'static str> {
        Query::ALL.iter().map(Query::path).collect()
    }

    /// Controller serving `path`
    pub fn controller(&self, path: &str) -> Option<&StreamController> {
        self.streams.get(path)
    }

    /// Channel paths served by this gateway
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.streams.keys().map(String::as_str)
    }

    /// Answer a query as JSON
    pub fn query(&self, query: Query) -> Value {
        match query {
            Query::Version => json!(self.version()),
            Query::Streams => json!(self.streams()),
            Query::Help => json!(self.help()),
        }
    }

    /// Answer the query registered under `path`, if any
    pub fn route(&self, path: &str) -> Option<Value> {
        Query::from_path(path).map(|query| self.query(query))
    }

    /// Shut every controller down
    pub fn shutdown(&mut self) {
        for controller in self.streams.values_mut() {
            controller.shutdown();
        }
    }
}
