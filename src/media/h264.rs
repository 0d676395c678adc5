//! H.264/AVC framing
//!
//! Units arrive in Annex-B form, one NAL unit per call:
//!
//! ```text
//! +-------------+------------+---------------
//! | 00 00 00 01 | NAL header | payload ...
//! |  (4 bytes)  | (1 byte)   |
//! +-------------+------------+---------------
//! NAL header: forbidden_zero_bit (1) | nal_ref_idc (2) | nal_unit_type (5)
//! ```
//!
//! SPS and PPS units are cached and never published. An IDR unit is
//! published with the cached SPS and PPS in front of it, so a client can
//! start decoding from any keyframe.

use bytes::{BufMut, Bytes, BytesMut};

use super::frame::{Frame, FrameMetadata};
use super::params::{PresentationTime, SessionParams};
use super::sdp::{decode_parameter_set, extract_attribute};

/// Offset of the NAL header, after the start code
const NAL_HEADER_OFFSET: usize = 4;

/// Profile, constraint flags and level follow the SPS NAL header
const SPS_PROFILE_RANGE: std::ops::Range<usize> = 5..8;

/// NAL unit types the handler acts on
///
/// Everything else (SEI, AUD, data partitions, filler) is dropped, so it has
/// no variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NaluType {
    /// Non-IDR slice
    Slice = 1,
    /// IDR slice (keyframe)
    Idr = 5,
    /// Sequence parameter set
    Sps = 7,
    /// Picture parameter set
    Pps = 8,
}

impl NaluType {
    /// Decode `nal_unit_type` from a NAL header byte
    pub fn from_header(b: u8) -> Option<Self> {
        match b & 0x1F {
            1 => Some(NaluType::Slice),
            5 => Some(NaluType::Idr),
            7 => Some(NaluType::Sps),
            8 => Some(NaluType::Pps),
            _ => None,
        }
    }

    /// Read the type of an Annex-B unit
    ///
    /// Returns `None` for units too short to carry a NAL header and for
    /// types the handler ignores.
    pub fn of_unit(unit: &[u8]) -> Option<Self> {
        unit.get(NAL_HEADER_OFFSET).copied().and_then(Self::from_header)
    }

    /// IDR slice
    pub fn is_keyframe(&self) -> bool {
        matches!(self, NaluType::Idr)
    }

    /// SPS or PPS
    pub fn is_parameter_set(&self) -> bool {
        matches!(self, NaluType::Sps | NaluType::Pps)
    }
}

/// H.264 handler with SPS/PPS cache
#[derive(Debug, Clone)]
pub struct H264Handler {
    params: SessionParams,
    sps: Bytes,
    pps: Bytes,
}

impl H264Handler {
    /// Create a new handler with empty parameter-set caches
    pub fn new(params: SessionParams) -> Self {
        Self {
            params,
            sps: Bytes::new(),
            pps: Bytes::new(),
        }
    }

    /// Session parameters
    pub fn params(&self) -> &SessionParams {
        &self.params
    }

    /// Cached SPS unit, start code included
    pub fn sps(&self) -> &Bytes {
        &self.sps
    }

    /// Cached PPS unit, start code included
    pub fn pps(&self) -> &Bytes {
        &self.pps
    }

    /// Codec string in RFC 6381 form: `avc1.PPCCLL`
    ///
    /// Built from whatever profile bytes the cached SPS holds.
    pub fn codec_string(&self) -> String {
        let end = SPS_PROFILE_RANGE.end.min(self.sps.len());
        let start = SPS_PROFILE_RANGE.start.min(end);
        let mut codec = String::from("avc1.");
        for b in &self.sps[start..end] {
            codec.push_str(&format!("{:02x}", b));
        }
        codec
    }

    /// Convert one unit
    ///
    /// SPS and PPS are cached, IDR units get both prepended, slices pass
    /// through. Anything else produces no frame.
    pub fn on_data(&mut self, payload: Bytes, pts: PresentationTime) -> Option<Frame> {
        let Some(nalu) = NaluType::of_unit(&payload) else {
            match payload.get(NAL_HEADER_OFFSET) {
                Some(header) => tracing::trace!(nal_type = header & 0x1F, "H.264 unit ignored"),
                None => tracing::debug!(len = payload.len(), "H.264 unit too short, dropped"),
            }
            return None;
        };

        let data = match nalu {
            NaluType::Sps => {
                tracing::debug!(len = payload.len(), "H.264 SPS cached");
                self.sps = payload;
                return None;
            }
            NaluType::Pps => {
                tracing::debug!(len = payload.len(), "H.264 PPS cached");
                self.pps = payload;
                return None;
            }
            NaluType::Idr => {
                let mut buf =
                    BytesMut::with_capacity(self.sps.len() + self.pps.len() + payload.len());
                buf.put_slice(&self.sps);
                buf.put_slice(&self.pps);
                buf.put_slice(&payload);
                buf.freeze()
            }
            NaluType::Slice => payload,
        };

        let mut metadata =
            FrameMetadata::video(self.params.media.clone(), self.codec_string(), pts.as_micros());
        if nalu.is_keyframe() {
            metadata = metadata.keyframe();
        }
        Some(Frame::new(metadata, data))
    }

    /// Prime the caches from `sprop-parameter-sets=<sps>,<pps>`
    ///
    /// A missing or undecodable attribute leaves the caches untouched.
    pub fn on_config(&mut self, sdp: &str) -> bool {
        let Some(value) = extract_attribute(sdp, "sprop-parameter-sets") else {
            return true;
        };
        let (sps, pps) = match value.split_once(',') {
            Some((sps, pps)) => (sps, Some(pps)),
            None => (value, None),
        };
        for prop in std::iter::once(sps).chain(pps) {
            match decode_parameter_set(prop) {
                Some(unit) => {
                    // Parameter sets never produce a frame
                    let _ = self.on_data(unit, PresentationTime::ZERO);
                }
                None => tracing::debug!(value = prop, "Undecodable H.264 parameter set skipped"),
            }
        }
        true
    }
}
