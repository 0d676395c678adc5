//! Gateway configuration
//!
//! Loaded from JSON:
//!
//! ```json
//! {
//!   "urls": { "cam1": { "video": "rtsp://192.168.1.10/stream1" } },
//!   "rtpTransport": "tcp",
//!   "verbose": 1
//! }
//! ```

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::source::{RtpTransport, SourceOptions};

/// Source of one channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamSource {
    /// Source URL (the key is historical: audio sessions come from it too)
    pub video: String,
}

/// Gateway configuration options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayConfig {
    /// Channel name to source
    #[serde(default)]
    pub urls: BTreeMap<String, StreamSource>,

    /// RTP transport requested from every source
    #[serde(default)]
    pub rtp_transport: RtpTransport,

    /// Verbosity: 0 = warn, 1 = info, 2 = debug, 3+ = trace
    #[serde(default)]
    pub verbose: u8,

    /// Source protocol timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    10
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            urls: BTreeMap::new(),
            rtp_transport: RtpTransport::default(),
            verbose: 0,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl GatewayConfig {
    /// Parse a JSON configuration
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Read and parse a JSON configuration file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Add a channel
    pub fn stream(mut self, name: impl Into<String>, url: impl Into<String>) -> Self {
        self.urls
            .insert(name.into(), StreamSource { video: url.into() });
        self
    }

    /// Set the RTP transport
    pub fn rtp_transport(mut self, transport: RtpTransport) -> Self {
        self.rtp_transport = transport;
        self
    }

    /// Set verbosity
    pub fn verbose(mut self, verbose: u8) -> Self {
        self.verbose = verbose;
        self
    }

    /// Set the source protocol timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout_secs = timeout.as_secs();
        self
    }

    /// Channel paths and their source URLs, validated
    pub fn streams(&self) -> Result<Vec<(String, String)>> {
        self.urls
            .iter()
            .map(|(name, source)| {
                let name = name.trim();
                if name.is_empty() || name == "/" {
                    return Err(Error::Config("empty channel name".into()));
                }
                if source.video.trim().is_empty() {
                    return Err(Error::Config(format!("channel {} has no source url", name)));
                }
                Ok((channel_path(name), source.video.trim().to_string()))
            })
            .collect()
    }

    /// Options handed to the source connector
    pub fn source_options(&self) -> SourceOptions {
        SourceOptions {
            timeout: Duration::from_secs(self.timeout_secs),
            rtp_transport: self.rtp_transport,
            verbose: self.verbose,
        }
    }

    /// `EnvFilter` directive matching the verbosity
    pub fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}

/// `cam1` -> `/cam1`; names already starting with `/` are kept
pub fn channel_path(name: &str) -> String {
    if name.starts_with('/') {
        name.to_string()
    } else {
        format!("/{}", name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = GatewayConfig::default();
        assert!(config.urls.is_empty());
        assert_eq!(config.rtp_transport, RtpTransport::Tcp);
        assert_eq!(config.verbose, 0);
        assert_eq!(config.timeout_secs, 10);
        assert_eq!(config.log_filter(), "warn");
    }

    #[test]
    fn test_from_json() {
        let config = GatewayConfig::from_json(
            r#"{
                "urls": {
                    "cam1": { "video": "rtsp://10.0.0.1/live" },
                    "/lobby": { "video": "rtsp://10.0.0.2/live" }
                },
                "rtpTransport": "udp",
                "verbose": 2
            }"#,
        )
        .unwrap();

        assert_eq!(config.rtp_transport, RtpTransport::Udp);
        assert_eq!(config.log_filter(), "debug");
        assert_eq!(config.timeout_secs, 10);
        assert_eq!(
            config.streams().unwrap(),
            vec![
                ("/lobby".to_string(), "rtsp://10.0.0.2/live".to_string()),
                ("/cam1".to_string(), "rtsp://10.0.0.1/live".to_string()),
            ]
        );
    }

    #[test]
    fn test_from_json_minimal() {
        let config = GatewayConfig::from_json("{}").unwrap();
        assert_eq!(config, GatewayConfig::default());
    }

    #[test]
    fn test_from_json_invalid() {
        assert!(matches!(
            GatewayConfig::from_json(r#"{"urls": 3}"#),
            Err(Error::Json(_))
        ));
        assert!(GatewayConfig::from_json(r#"{"rtpTransport": "sctp"}"#).is_err());
    }

    #[test]
    fn test_from_missing_file() {
        let result = GatewayConfig::from_file("/nonexistent/rtsp2ws.json");
        assert!(matches!(result, Err(Error::Io(_))));
    }

    #[test]
    fn test_builder_chaining() {
        let config = GatewayConfig::default()
            .stream("cam", "rtsp://camera/stream")
            .rtp_transport(RtpTransport::Multicast)
            .verbose(1)
            .timeout(Duration::from_secs(5));

        let options = config.source_options();
        assert_eq!(options.rtp_transport, RtpTransport::Multicast);
        assert_eq!(options.timeout, Duration::from_secs(5));
        assert_eq!(options.verbose, 1);
        assert_eq!(config.log_filter(), "info");
        assert_eq!(
            config.streams().unwrap(),
            vec![("/cam".to_string(), "rtsp://camera/stream".to_string())]
        );
    }

    #[test]
    fn test_validation() {
        let config = GatewayConfig::default().stream("cam", "  ");
        assert!(matches!(config.streams(), Err(Error::Config(_))));

        let config = GatewayConfig::default().stream("", "rtsp://camera");
        assert!(matches!(config.streams(), Err(Error::Config(_))));
    }

    #[test]
    fn test_log_filter_levels() {
        let filters: Vec<_> = (0..=4)
            .map(|v| GatewayConfig::default().verbose(v).log_filter())
            .collect();
        assert_eq!(filters, vec!["warn", "info", "debug", "trace", "trace"]);
    }

    #[test]
    fn test_channel_path() {
        assert_eq!(channel_path("cam"), "/cam");
        assert_eq!(channel_path("/cam"), "/cam");
    }
}
