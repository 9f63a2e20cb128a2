use serlink_message::MessageError;

/// Errors that can occur while encoding, decoding or moving frames.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// Frame text is not valid Base64.
    #[error("invalid base64 in frame: {0}")]
    InvalidBase64(#[from] base64::DecodeError),

    /// The decoded bytes failed message parsing.
    #[error(transparent)]
    Message(#[from] MessageError),

    /// An encoded frame would not fit the line buffer.
    #[error("frame too large ({size} bytes, max {max})")]
    FrameTooLarge { size: usize, max: usize },

    /// An I/O error occurred while reading or writing frames.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The stream reached end of file.
    #[error("connection closed")]
    ConnectionClosed,
}

impl FrameError {
    /// True when an inbound frame failed decoding, version or checksum checks.
    pub fn is_authentication(&self) -> bool {
        match self {
            FrameError::InvalidBase64(_) => true,
            FrameError::Message(err) => err.is_authentication(),
            _ => false,
        }
    }

    /// True when the frame itself was bad rather than the stream.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            FrameError::InvalidBase64(_) | FrameError::Message(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, FrameError>;
