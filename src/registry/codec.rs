//! Supported media/codec combinations

use crate::media::HandlerKind;

/// Handler and display label for a supported combination
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodecEntry {
    pub handler: HandlerKind,
    /// Codec label stored in the session parameters
    pub label: &'static str,
}

const fn entry(handler: HandlerKind, label: &'static str) -> CodecEntry {
    CodecEntry { handler, label }
}

/// (media, encoding name, entry)
///
/// H.264/H.265 frames compute their codec string per frame; the label here is
/// only used for status reports.
const CODECS: &[(&str, &str, CodecEntry)] = &[
    ("video", "H264", entry(HandlerKind::H264, "H264")),
    ("video", "H265", entry(HandlerKind::H265, "H265")),
    ("video", "JPEG", entry(HandlerKind::Generic, "jpeg")),
    ("audio", "MPEG4-GENERIC", entry(HandlerKind::Generic, "mp4a.40.2")),
    ("audio", "MPA", entry(HandlerKind::Generic, "mp3")),
    ("audio", "OPUS", entry(HandlerKind::Generic, "opus")),
    ("audio", "PCMU", entry(HandlerKind::Generic, "ulaw")),
];

/// Look up a combination announced by the source
///
/// Media names match exactly; encoding names are case-insensitive as in
/// `a=rtpmap`.
pub fn lookup(media: &str, codec: &str) -> Option<CodecEntry> {
    CODECS
        .iter()
        .find(|(m, c, _)| *m == media && c.eq_ignore_ascii_case(codec))
        .map(|(_, _, entry)| *entry)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_video_codecs() {
        assert_eq!(lookup("video", "H264").unwrap().handler, HandlerKind::H264);
        assert_eq!(lookup("video", "H265").unwrap().handler, HandlerKind::H265);
        let jpeg = lookup("video", "JPEG").unwrap();
        assert_eq!(jpeg.handler, HandlerKind::Generic);
        assert_eq!(jpeg.label, "jpeg");
    }

    #[test]
    fn test_audio_labels() {
        let labels = [
            ("MPEG4-GENERIC", "mp4a.40.2"),
            ("MPA", "mp3"),
            ("OPUS", "opus"),
            ("PCMU", "ulaw"),
        ];
        for (codec, label) in labels {
            let entry = lookup("audio", codec).unwrap();
            assert_eq!(entry.handler, HandlerKind::Generic);
            assert_eq!(entry.label, label);
        }
    }

    #[test]
    fn test_encoding_name_case() {
        assert!(lookup("audio", "opus").is_some());
        assert!(lookup("video", "h264").is_some());
        assert!(lookup("Video", "H264").is_none());
    }

    #[test]
    fn test_unsupported() {
        assert!(lookup("video", "VP8").is_none());
        assert!(lookup("audio", "L16").is_none());
        assert!(lookup("audio", "H264").is_none());
        assert!(lookup("application", "ONVIF").is_none());
    }
}
