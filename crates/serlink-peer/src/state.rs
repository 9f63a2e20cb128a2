use std::fmt;

use serde::Serialize;
use serlink_frame::FrameError;

/// Send-side protocol state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SendState {
    #[default]
    Idle,
    Sending,
    AwaitingAck,
    Acked,
    NackedOrTimeout,
}

/// Receive-side protocol state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReceiveState {
    #[default]
    Idle,
    Listening,
    FrameFound,
    Accepted,
    Rejected,
}

impl fmt::Display for SendState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SendState::Idle => "idle",
            SendState::Sending => "sending",
            SendState::AwaitingAck => "awaiting_ack",
            SendState::Acked => "acked",
            SendState::NackedOrTimeout => "nacked_or_timeout",
        };
        f.write_str(name)
    }
}

impl fmt::Display for ReceiveState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ReceiveState::Idle => "idle",
            ReceiveState::Listening => "listening",
            ReceiveState::FrameFound => "frame_found",
            ReceiveState::Accepted => "accepted",
            ReceiveState::Rejected => "rejected",
        };
        f.write_str(name)
    }
}

/// Result of one send and acknowledge cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SendOutcome {
    Acked,
    /// A nack burst, an unrecognised reply, or no reply at all.
    NackedOrTimeout,
}

impl SendOutcome {
    pub fn is_acked(self) -> bool {
        self == SendOutcome::Acked
    }
}

/// Result of [`Peer::send_with_retry`](crate::Peer::send_with_retry).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SendReport {
    pub outcome: SendOutcome,
    /// Cycles used, including the last one.
    pub attempts: u32,
}

/// Result of one receive pass.
#[derive(Debug)]
pub enum ReceiveOutcome {
    /// No complete frame in the lines read.
    NoFrame,
    /// A frame decoded and verified. `succeeded` is the sender's flag, which
    /// also chose the ack or nack reply.
    Accepted { succeeded: bool },
    /// A frame was found but failed decoding, version or checksum checks.
    /// No reply was sent.
    Rejected(FrameError),
}

impl ReceiveOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, ReceiveOutcome::Accepted { .. })
    }
}
