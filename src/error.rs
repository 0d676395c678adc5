//! Error types
//!
//! Only construction-time problems surface as errors. Per-unit media problems
//! (short payloads, bad parameter sets, unsupported codecs) are logged and
//! dropped by the handlers instead.

/// Crate result alias
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for gateway operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The transport refused to register a channel
    #[error("failed to register channel {path}: {reason}")]
    ChannelRegistration { path: String, reason: String },

    /// A channel with this path is already registered
    #[error("channel already registered: {0}")]
    DuplicateChannel(String),

    /// No channel registered under this path
    #[error("channel not found: {0}")]
    ChannelNotFound(String),

    /// Invalid configuration value
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Configuration could not be parsed
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O failure (config file, worker thread, runtime)
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = Error::ChannelRegistration {
            path: "/cam".into(),
            reason: "closed".into(),
        };
        assert_eq!(err.to_string(), "failed to register channel /cam: closed");
        assert_eq!(
            Error::DuplicateChannel("/cam".into()).to_string(),
            "channel already registered: /cam"
        );
    }

    #[test]
    fn test_from_io() {
        let err: Error = std::io::Error::new(std::io::ErrorKind::Other, "boom").into();
        assert!(matches!(err, Error::Io(_)));
    }
}
