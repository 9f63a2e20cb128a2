use std::time::Duration;

use serlink_frame::FrameConfig;

use crate::error::{PeerError, Result};

/// Default pause between sending a frame and reading the reply.
pub const DEFAULT_QUIET_INTERVAL: Duration = Duration::from_millis(50);

/// Default caller-level attempt cap.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Default number of characters in an ack or nack burst.
pub const DEFAULT_ACK_BURST_LEN: usize = 10;

/// Default number of matching characters that make a burst count.
pub const DEFAULT_ACK_THRESHOLD: usize = 6;

/// Ack burst character (`@`).
pub const ACK_CHAR: u8 = b'@';

/// Nack burst character (`!`).
pub const NACK_CHAR: u8 = b'!';

/// Configuration for the send/acknowledge exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExchangeConfig {
    /// Frame and message settings.
    pub frame: FrameConfig,
    /// Blocking pause after a send, and one third of the pause between
    /// listen attempts. Default: 50 ms.
    pub quiet_interval: Duration,
    /// Attempts made by [`Peer::send_with_retry`](crate::Peer::send_with_retry).
    /// Default: 5.
    pub max_attempts: u32,
    /// Characters written per burst. Default: 10.
    pub ack_burst_len: usize,
    /// Matching characters needed to recognise a burst. Default: 6.
    pub ack_threshold: usize,
    pub ack_char: u8,
    pub nack_char: u8,
}

impl ExchangeConfig {
    pub fn validate(&self) -> Result<()> {
        self.frame.message.validate()?;
        if self.ack_threshold == 0 || self.ack_threshold > self.ack_burst_len {
            return Err(PeerError::InvalidConfig(format!(
                "ack threshold {} must be between 1 and the burst length {}",
                self.ack_threshold, self.ack_burst_len
            )));
        }
        if self.ack_char == self.nack_char {
            return Err(PeerError::InvalidConfig(
                "ack and nack characters must differ".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            frame: FrameConfig::default(),
            quiet_interval: DEFAULT_QUIET_INTERVAL,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            ack_burst_len: DEFAULT_ACK_BURST_LEN,
            ack_threshold: DEFAULT_ACK_THRESHOLD,
            ack_char: ACK_CHAR,
            nack_char: NACK_CHAR,
        }
    }
}
