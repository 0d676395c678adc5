//! Upstream restart policy

use std::time::Duration;

/// Upstream fault reported by the source
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fault {
    /// Connection failed or dropped
    Error(String),
    /// Connecting timed out
    ConnectionTimeout,
    /// Connected but no data is flowing
    DataTimeout,
}

/// Maps a fault to the delay before the next start
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RestartPolicy {
    /// Back-off after a connection error
    pub error_delay: Duration,
}

impl Default for RestartPolicy {
    fn default() -> Self {
        Self {
            error_delay: Duration::from_secs(10),
        }
    }
}

impl RestartPolicy {
    /// Delay before restarting after `fault`
    pub fn delay_for(&self, fault: &Fault) -> Duration {
        match fault {
            Fault::Error(_) => self.error_delay,
            Fault::ConnectionTimeout | Fault::DataTimeout => Duration::ZERO,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_backs_off() {
        let policy = RestartPolicy::default();
        assert_eq!(
            policy.delay_for(&Fault::Error("refused".into())),
            Duration::from_secs(10)
        );
    }

    #[test]
    fn test_timeouts_restart_immediately() {
        let policy = RestartPolicy::default();
        assert_eq!(policy.delay_for(&Fault::ConnectionTimeout), Duration::ZERO);
        assert_eq!(policy.delay_for(&Fault::DataTimeout), Duration::ZERO);
    }
}
