use std::ops::Range;
use std::time::Duration;

use base64::{engine::general_purpose::STANDARD, Engine};
use bytes::{BufMut, BytesMut};
use serlink_message::{Message, MessageConfig};

use crate::error::Result;

/// Default start sentinel (`#`).
pub const START_SENTINEL: u8 = b'#';

/// Default stop sentinel (`;`).
pub const STOP_SENTINEL: u8 = b';';

/// Smallest legal distance from start sentinel to stop sentinel.
pub const MIN_FRAME_SPAN: usize = 11;

/// Default limit on buffered line data, in bytes.
pub const DEFAULT_BUFFER_MAX_SIZE: usize = 256;

/// Line terminator written around frames and ack bursts.
pub const LINE_TERMINATOR: &[u8] = b"\r\n";

/// Configuration for the frame layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameConfig {
    /// Message-level settings used when decoding.
    pub message: MessageConfig,
    /// Byte opening a frame. Default: `#`.
    pub start_sentinel: u8,
    /// Byte closing a frame. Default: `;`.
    pub stop_sentinel: u8,
    /// Longest line pair considered when looking for a frame. Default: 256.
    pub buffer_max_size: usize,
    /// Read timeout for links that support one.
    pub read_timeout: Option<Duration>,
    /// Write timeout for links that support one.
    pub write_timeout: Option<Duration>,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            message: MessageConfig::default(),
            start_sentinel: START_SENTINEL,
            stop_sentinel: STOP_SENTINEL,
            buffer_max_size: DEFAULT_BUFFER_MAX_SIZE,
            read_timeout: None,
            write_timeout: None,
        }
    }
}

/// Sentinel positions of a frame inside a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameBounds {
    /// Index of the start sentinel.
    pub start: usize,
    /// Index of the stop sentinel.
    pub stop: usize,
}

impl FrameBounds {
    /// Range of the Base64 text between the sentinels.
    pub fn text(&self) -> Range<usize> {
        self.start + 1..self.stop
    }
}

/// Encode raw message bytes as a frame.
///
/// ```text
/// '#' base64(version type status number total dataSize data.. csH csL) ';'
/// ```
pub fn encode_frame(raw: &[u8], dst: &mut BytesMut, config: &FrameConfig) {
    let text = STANDARD.encode(raw);
    dst.reserve(text.len() + 2);
    dst.put_u8(config.start_sentinel);
    dst.put_slice(text.as_bytes());
    dst.put_u8(config.stop_sentinel);
}

/// Find the first complete frame in `buf`.
///
/// The stop sentinel is searched for at least [`MIN_FRAME_SPAN`] bytes past
/// the start sentinel. A later start sentinel before the stop moves the frame
/// start forward, discarding the earlier fragment.
pub fn scan_frame(buf: &[u8], config: &FrameConfig) -> Option<FrameBounds> {
    let mut from = 0;
    loop {
        let start = from + position(&buf[from..], config.start_sentinel)?;
        let search_from = start + MIN_FRAME_SPAN;
        let stop = search_from + position(buf.get(search_from..)?, config.stop_sentinel)?;

        let later = buf[start + 1..stop]
            .iter()
            .rposition(|&b| b == config.start_sentinel)
            .map(|offset| start + 1 + offset);
        match later {
            None => return Some(FrameBounds { start, stop }),
            Some(later) if stop - later >= MIN_FRAME_SPAN => {
                return Some(FrameBounds { start: later, stop })
            }
            Some(later) => from = later,
        }
    }
}

/// Decode the Base64 text of a frame into a verified message.
///
/// Bytes outside the Base64 alphabet (line terminators, noise) are dropped
/// first.
pub fn decode_frame(text: &[u8], config: &FrameConfig) -> Result<Message> {
    let filtered: Vec<u8> = text
        .iter()
        .copied()
        .filter(|&b| is_base64_byte(b))
        .collect();
    let raw = STANDARD.decode(&filtered)?;
    Ok(Message::parse(&raw, &config.message)?)
}

/// True for bytes of the standard Base64 alphabet, padding included.
pub fn is_base64_byte(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || matches!(byte, b'+' | b'/' | b'=')
}

fn position(haystack: &[u8], needle: u8) -> Option<usize> {
    haystack.iter().position(|&b| b == needle)
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use serlink_message::{AuthError, MessageError};

    use super::*;
    use crate::error::FrameError;

    const ECHO_FRAME: &[u8] = b"#AgCFAQEBKjnS;";

    fn echo_raw() -> Vec<u8> {
        let mut msg = Message::new();
        msg.append(42u8).unwrap();
        msg.build(5, true, 1, 1).unwrap().to_vec()
    }

    #[test]
    fn echo_message_encodes_to_known_frame() {
        let mut buf = BytesMut::new();
        encode_frame(&echo_raw(), &mut buf, &FrameConfig::default());
        assert_eq!(buf.as_ref(), ECHO_FRAME);
    }

    #[test]
    fn echo_frame_roundtrip() {
        let cfg = FrameConfig::default();
        let bounds = scan_frame(ECHO_FRAME, &cfg).unwrap();
        assert_eq!(bounds, FrameBounds { start: 0, stop: 13 });

        let msg = decode_frame(&ECHO_FRAME[bounds.text()], &cfg).unwrap();
        assert_eq!(msg.task_value(), 5);
        assert!(msg.succeeded());
        assert_eq!(msg.read_u8(0).unwrap(), 42);
        assert!(Message::verify(&msg.to_bytes(), 0));
    }

    #[test]
    fn flipped_checksum_bit_is_rejected() {
        let mut raw = echo_raw();
        raw[8] ^= 0x10;
        let mut buf = BytesMut::new();
        let cfg = FrameConfig::default();
        encode_frame(&raw, &mut buf, &cfg);

        let bounds = scan_frame(&buf, &cfg).unwrap();
        let err = decode_frame(&buf[bounds.text()], &cfg).unwrap_err();
        assert!(err.is_authentication());
        assert!(matches!(
            err,
            FrameError::Message(MessageError::Authentication(
                AuthError::ChecksumMismatch { .. }
            ))
        ));
    }

    #[test]
    fn scan_skips_leading_noise() {
        let cfg = FrameConfig::default();
        let mut buf = b"\r\nnoise ".to_vec();
        buf.extend_from_slice(ECHO_FRAME);
        let bounds = scan_frame(&buf, &cfg).unwrap();
        assert_eq!(&buf[bounds.start..=bounds.stop], ECHO_FRAME);
    }

    #[test]
    fn scan_requires_minimum_span() {
        let cfg = FrameConfig::default();
        assert_eq!(scan_frame(b"#short;", &cfg), None);
        assert_eq!(scan_frame(b"#AgCFAQEBKjnS", &cfg), None);
        assert_eq!(scan_frame(b"AgCFAQEBKjnS;", &cfg), None);
        assert_eq!(scan_frame(b"", &cfg), None);
        // Stop exactly eleven bytes out is accepted.
        assert_eq!(
            scan_frame(b"#0123456789;", &cfg),
            Some(FrameBounds { start: 0, stop: 11 })
        );
    }

    #[test]
    fn scan_resyncs_on_later_start() {
        let cfg = FrameConfig::default();
        let mut buf = b"#Ag".to_vec();
        buf.extend_from_slice(ECHO_FRAME);
        let bounds = scan_frame(&buf, &cfg).unwrap();
        assert_eq!(bounds.start, 3);
        assert_eq!(&buf[bounds.text()], b"AgCFAQEBKjnS");
    }

    #[test]
    fn scan_resyncs_past_too_short_fragment() {
        let cfg = FrameConfig::default();
        // The second '#' is too close to the first ';'.
        let mut buf = b"#0123456789#ab;".to_vec();
        buf.extend_from_slice(ECHO_FRAME);
        let bounds = scan_frame(&buf, &cfg).unwrap();
        assert_eq!(&buf[bounds.text()], b"AgCFAQEBKjnS");
    }

    #[test]
    fn decode_drops_line_breaks_inside_frame() {
        let cfg = FrameConfig::default();
        let msg = decode_frame(b"AgCFAQ\r\nEBKjnS", &cfg).unwrap();
        assert_eq!(msg.read_u8(0).unwrap(), 42);
    }

    #[test]
    fn invalid_base64_is_rejected() {
        let cfg = FrameConfig::default();
        let err = decode_frame(b"AgCFAQEBKjn", &cfg).unwrap_err();
        assert!(matches!(err, FrameError::InvalidBase64(_)));
        assert!(err.is_authentication());
    }

    #[test]
    fn custom_sentinels() {
        let cfg = FrameConfig {
            start_sentinel: b'<',
            stop_sentinel: b'>',
            ..FrameConfig::default()
        };
        let mut buf = BytesMut::new();
        encode_frame(&echo_raw(), &mut buf, &cfg);
        assert_eq!(buf.as_ref(), b"<AgCFAQEBKjnS>");
        assert!(scan_frame(&buf, &cfg).is_some());
    }

    proptest! {
        #[test]
        fn scan_ignores_trailing_garbage(
            data in proptest::collection::vec(any::<u8>(), 1..60),
            garbage in proptest::collection::vec(any::<u8>(), 0..64),
        ) {
            let cfg = FrameConfig::default();
            let mut msg = Message::new();
            msg.append(data).unwrap();
            let raw = msg.build(1, true, 1, 1).unwrap();

            let mut buf = BytesMut::new();
            encode_frame(&raw, &mut buf, &cfg);
            let clean = scan_frame(&buf, &cfg);
            prop_assert!(clean.is_some());

            buf.extend_from_slice(&garbage);
            prop_assert_eq!(scan_frame(&buf, &cfg), clean);
        }
    }
}
