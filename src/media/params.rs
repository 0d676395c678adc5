//! Negotiated session parameters and presentation time

use std::time::Duration;

/// Immutable description of one negotiated media session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionParams {
    /// Media kind ("video", "audio")
    pub media: String,
    /// Codec label reported for the session
    pub codec: String,
    /// RTP clock rate in Hz
    pub clock_rate: u32,
    /// Audio channel count (0 for video)
    pub channels: u32,
}

impl SessionParams {
    /// Create session parameters
    pub fn new(
        media: impl Into<String>,
        codec: impl Into<String>,
        clock_rate: u32,
        channels: u32,
    ) -> Self {
        Self {
            media: media.into(),
            codec: codec.into(),
            clock_rate,
            channels,
        }
    }

    /// Label used in status reports ("video/H264")
    pub fn label(&self) -> String {
        format!("{}/{}", self.media, self.codec)
    }
}

/// Presentation time of a received unit, as delivered by the source
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PresentationTime {
    /// Whole seconds
    pub seconds: u64,
    /// Microseconds within the second
    pub microseconds: u32,
}

impl PresentationTime {
    /// Zero time, used when priming parameter sets from the session description
    pub const ZERO: Self = Self {
        seconds: 0,
        microseconds: 0,
    };

    /// Create a presentation time
    pub fn new(seconds: u64, microseconds: u32) -> Self {
        Self {
            seconds,
            microseconds,
        }
    }

    /// Timestamp in microseconds
    pub fn as_micros(&self) -> u64 {
        self.seconds
            .saturating_mul(1_000_000)
            .saturating_add(self.microseconds as u64)
    }
}

impl From<Duration> for PresentationTime {
    fn from(d: Duration) -> Self {
        Self::new(d.as_secs(), d.subsec_micros())
    }
}
