//! Ack and nack bursts.
//!
//! A burst is one character repeated `ack_burst_len` times on its own line.
//! Recognition is a majority vote: `ack_threshold` matching characters
//! anywhere in the line are enough, so a few corrupted bytes are tolerated.

use crate::config::ExchangeConfig;

/// What a reply line says about the last frame sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckVerdict {
    Ack,
    Nack,
    /// Neither character reached the threshold.
    Unrecognized,
}

/// Build the burst for an ack (`true`) or nack (`false`).
pub fn burst(ack: bool, config: &ExchangeConfig) -> Vec<u8> {
    let ch = if ack { config.ack_char } else { config.nack_char };
    vec![ch; config.ack_burst_len]
}

/// Classify a reply line. Ack wins if both characters reach the threshold.
pub fn classify(line: &[u8], config: &ExchangeConfig) -> AckVerdict {
    let count = |ch: u8| line.iter().filter(|&&b| b == ch).count();
    if count(config.ack_char) >= config.ack_threshold {
        AckVerdict::Ack
    } else if count(config.nack_char) >= config.ack_threshold {
        AckVerdict::Nack
    } else {
        AckVerdict::Unrecognized
    }
}

/// True for lines holding only whitespace.
pub(crate) fn is_blank(line: &[u8]) -> bool {
    line.iter().all(u8::is_ascii_whitespace)
}
