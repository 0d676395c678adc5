//! Session description helpers
//!
//! Codec configuration arrives as `fmtp` attributes in the session
//! description, e.g.
//!
//! ```text
//! a=fmtp:96 packetization-mode=1;profile-level-id=64001F;sprop-parameter-sets=Z2QAH6zZQFA=,aOvjyw==
//! ```
//!
//! Parameter sets are base64 encoded without a start code. Handlers re-add
//! the Annex-B marker so primed units look exactly like units received in
//! band.

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use base64::Engine as _;
use bytes::{BufMut, Bytes, BytesMut};

/// Annex-B start code prepended to every elementary-stream unit
pub const ANNEX_B_START_CODE: [u8; 4] = [0x00, 0x00, 0x00, 0x01];

/// Encoders differ on whether they pad sprop values
const SPROP_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Find `name=` in the description and return its value
///
/// The value ends at the first space, `;`, CR or LF.
pub fn extract_attribute<'a>(sdp: &'a str, name: &str) -> Option<&'a str> {
    let pattern = format!("{}=", name);
    let start = sdp.find(&pattern)? + pattern.len();
    let rest = &sdp[start..];
    let end = rest
        .find(|c: char| matches!(c, ' ' | ';' | '\r' | '\n'))
        .unwrap_or(rest.len());
    Some(&rest[..end])
}

/// Decode a base64 parameter set and prefix it with the start code
///
/// Returns `None` when the value is not valid base64.
pub fn decode_parameter_set(value: &str) -> Option<Bytes> {
    let decoded = SPROP_BASE64.decode(value.trim()).ok()?;
    let mut unit = BytesMut::with_capacity(ANNEX_B_START_CODE.len() + decoded.len());
    unit.put_slice(&ANNEX_B_START_CODE);
    unit.put_slice(&decoded);
    Some(unit.freeze())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_attribute_stops_at_separator() {
        let sdp = "a=fmtp:96 packetization-mode=1;sprop-parameter-sets=Z2QAH6zZQFA=,aOvjyw==;profile-level-id=64001F\r\n";
        assert_eq!(
            extract_attribute(sdp, "sprop-parameter-sets"),
            Some("Z2QAH6zZQFA=,aOvjyw==")
        );
        assert_eq!(extract_attribute(sdp, "packetization-mode"), Some("1"));
    }

    #[test]
    fn test_extract_attribute_end_of_text() {
        assert_eq!(extract_attribute("sprop-vps=QAEMAf8=", "sprop-vps"), Some("QAEMAf8="));
        assert_eq!(extract_attribute("a=rtpmap:96 H264/90000", "sprop-vps"), None);
    }

    #[test]
    fn test_extract_attribute_line_break() {
        let sdp = "a=fmtp:96 sprop-sps=QgEBAWA=\r\na=control:trackID=1";
        assert_eq!(extract_attribute(sdp, "sprop-sps"), Some("QgEBAWA="));
    }

    #[test]
    fn test_decode_parameter_set() {
        let unit = decode_parameter_set("aOvjyw==").unwrap();
        assert_eq!(&unit[..], &[0x00, 0x00, 0x00, 0x01, 0x68, 0xEB, 0xE3, 0xCB]);
    }

    #[test]
    fn test_decode_parameter_set_unpadded() {
        let unit = decode_parameter_set("aOvjyw").unwrap();
        assert_eq!(&unit[4..], &[0x68, 0xEB, 0xE3, 0xCB]);
    }

    #[test]
    fn test_decode_parameter_set_invalid() {
        assert!(decode_parameter_set("not base64!").is_none());
    }
}
