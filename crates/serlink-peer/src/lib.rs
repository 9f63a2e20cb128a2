//! Send/acknowledge exchange over a half-duplex link.
//!
//! A sender writes one frame, pauses for the quiet interval and reads one
//! reply line; a burst of ack characters means the peer accepted the message.
//! A receiver reads up to two lines, decodes the frame in them and answers
//! with an ack or nack burst. Retrying is the caller's policy;
//! [`Peer::send_with_retry`] applies the configured cap.

pub mod ack;
pub mod config;
pub mod connector;
pub mod error;
#[cfg(unix)]
pub mod listener;
pub mod peer;
pub mod state;

pub use ack::{burst, classify, AckVerdict};
pub use config::{
    ExchangeConfig, ACK_CHAR, DEFAULT_ACK_BURST_LEN, DEFAULT_ACK_THRESHOLD, DEFAULT_MAX_ATTEMPTS,
    DEFAULT_QUIET_INTERVAL, NACK_CHAR,
};
pub use connector::{connect, connect_with_config, from_link, open, open_with_config};
pub use error::{PeerError, Result};
#[cfg(unix)]
pub use listener::PeerListener;
pub use peer::Peer;
pub use state::{ReceiveOutcome, ReceiveState, SendOutcome, SendReport, SendState};
