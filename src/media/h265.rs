//! H.265/HEVC framing
//!
//! Same Annex-B layout as H.264 but with a two byte NAL header:
//!
//! ```text
//! forbidden_zero_bit (1) | nal_unit_type (6) | nuh_layer_id (6) | nuh_temporal_id_plus1 (3)
//! ```
//!
//! VPS, SPS and PPS are cached; IDR units are published with all three in
//! front of them.

use bytes::{BufMut, Bytes, BytesMut};

use super::frame::{Frame, FrameMetadata};
use super::params::{PresentationTime, SessionParams};
use super::sdp::{decode_parameter_set, extract_attribute};

/// Offset of the first NAL header byte, after the start code
const NAL_HEADER_OFFSET: usize = 4;

/// Codec string reported for every HEVC frame; profile is not parsed
pub const HEVC_CODEC: &str = "hev1.1.6.L93.B0";

/// NAL unit types the handler acts on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NaluType {
    /// Trailing picture, non-reference
    Slice = 1,
    /// IDR with leading pictures
    IdrWRadl = 19,
    /// IDR without leading pictures
    IdrNLp = 20,
    /// Video parameter set
    Vps = 32,
    /// Sequence parameter set
    Sps = 33,
    /// Picture parameter set
    Pps = 34,
}

impl NaluType {
    /// Decode from the first NAL header byte
    pub fn from_header(b: u8) -> Option<Self> {
        match (b & 0x7E) >> 1 {
            1 => Some(NaluType::Slice),
            19 => Some(NaluType::IdrWRadl),
            20 => Some(NaluType::IdrNLp),
            32 => Some(NaluType::Vps),
            33 => Some(NaluType::Sps),
            34 => Some(NaluType::Pps),
            _ => None,
        }
    }

    /// Read the type of an Annex-B unit
    pub fn of_unit(unit: &[u8]) -> Option<Self> {
        unit.get(NAL_HEADER_OFFSET).copied().and_then(Self::from_header)
    }

    /// IDR variants
    pub fn is_keyframe(&self) -> bool {
        matches!(self, NaluType::IdrWRadl | NaluType::IdrNLp)
    }

    /// VPS, SPS or PPS
    pub fn is_parameter_set(&self) -> bool {
        matches!(self, NaluType::Vps | NaluType::Sps | NaluType::Pps)
    }
}

/// H.265 handler with VPS/SPS/PPS cache
#[derive(Debug, Clone)]
pub struct H265Handler {
    params: SessionParams,
    vps: Bytes,
    sps: Bytes,
    pps: Bytes,
}

impl H265Handler {
    /// Create a new handler with empty parameter-set caches
    pub fn new(params: SessionParams) -> Self {
        Self {
            params,
            vps: Bytes::new(),
            sps: Bytes::new(),
            pps: Bytes::new(),
        }
    }

    /// Session parameters
    pub fn params(&self) -> &SessionParams {
        &self.params
    }

    /// Cached VPS unit, start code included
    pub fn vps(&self) -> &Bytes {
        &self.vps
    }

    /// Cached SPS unit, start code included
    pub fn sps(&self) -> &Bytes {
        &self.sps
    }

    /// Cached PPS unit, start code included
    pub fn pps(&self) -> &Bytes {
        &self.pps
    }

    /// Convert one unit
    ///
    /// Parameter sets are cached, IDR units get the cached sets prepended,
    /// slices pass through. Anything else produces no frame.
    pub fn on_data(&mut self, payload: Bytes, pts: PresentationTime) -> Option<Frame> {
        if payload.len() <= NAL_HEADER_OFFSET {
            tracing::debug!(len = payload.len(), "H.265 unit too short, dropped");
            return None;
        }
        let nalu = NaluType::of_unit(&payload)?;

        let data = match nalu {
            NaluType::Vps => {
                tracing::debug!(len = payload.len(), "H.265 VPS cached");
                self.vps = payload;
                return None;
            }
            NaluType::Sps => {
                tracing::debug!(len = payload.len(), "H.265 SPS cached");
                self.sps = payload;
                return None;
            }
            NaluType::Pps => {
                tracing::debug!(len = payload.len(), "H.265 PPS cached");
                self.pps = payload;
                return None;
            }
            NaluType::IdrWRadl | NaluType::IdrNLp => {
                let mut buf = BytesMut::with_capacity(
                    self.vps.len() + self.sps.len() + self.pps.len() + payload.len(),
                );
                buf.put_slice(&self.vps);
                buf.put_slice(&self.sps);
                buf.put_slice(&self.pps);
                buf.put_slice(&payload);
                buf.freeze()
            }
            NaluType::Slice => payload,
        };

        let mut metadata =
            FrameMetadata::video(self.params.media.clone(), HEVC_CODEC, pts.as_micros());
        if nalu.is_keyframe() {
            metadata = metadata.keyframe();
        }
        Some(Frame::new(metadata, data))
    }

    /// Prime the caches from `sprop-vps`, `sprop-sps` and `sprop-pps`
    ///
    /// Each attribute is optional on its own.
    pub fn on_config(&mut self, sdp: &str) -> bool {
        for name in ["sprop-vps", "sprop-sps", "sprop-pps"] {
            let Some(value) = extract_attribute(sdp, name).filter(|v| !v.is_empty()) else {
                continue;
            };
            match decode_parameter_set(value) {
                Some(unit) => {
                    let _ = self.on_data(unit, PresentationTime::ZERO);
                }
                None => tracing::debug!(attribute = name, "Undecodable H.265 parameter set skipped"),
            }
        }
        true
    }
}
