/// Errors that can occur in peer operations.
///
/// Nacks, timeouts and rejected frames are outcomes, not errors; see
/// [`SendOutcome`](crate::SendOutcome) and
/// [`ReceiveOutcome`](crate::ReceiveOutcome).
#[derive(Debug, thiserror::Error)]
pub enum PeerError {
    /// Transport-level error.
    #[error("transport error: {0}")]
    Transport(#[from] serlink_transport::TransportError),

    /// Frame-level error.
    #[error("frame error: {0}")]
    Frame(#[from] serlink_frame::FrameError),

    /// Outbound message could not be built.
    #[error("message error: {0}")]
    Message(#[from] serlink_message::MessageError),

    /// Peer disconnected.
    #[error("peer disconnected: {0}")]
    Disconnected(String),

    /// Exchange settings that cannot work together.
    #[error("invalid exchange config: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, PeerError>;
