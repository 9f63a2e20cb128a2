/// Reasons an inbound message fails authentication.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// The sender speaks a different protocol version.
    #[error("version mismatch (expected {expected}, found {found})")]
    VersionMismatch { expected: u8, found: u8 },

    /// The transmitted checksum does not match the recomputed one.
    #[error("checksum mismatch (transmitted 0x{transmitted:04X}, computed 0x{computed:04X})")]
    ChecksumMismatch { transmitted: u16, computed: u16 },

    /// Fewer bytes than the header's dataSize requires.
    #[error("message truncated ({len} bytes, need {needed})")]
    Truncated { len: usize, needed: usize },
}

/// Errors raised by the message model and field codec.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MessageError {
    /// An append or build would exceed the configured maximum size.
    #[error("message too large ({size} bytes, max {max})")]
    Oversize { size: usize, max: usize },

    /// Version or checksum check failed on parse.
    #[error("authentication failed: {0}")]
    Authentication(#[from] AuthError),

    /// Field index past the last field.
    #[error("field {index} not present ({count} fields)")]
    FieldNotFound { index: usize, count: usize },

    /// Field bytes cannot be read as the requested type.
    #[error("field {index} is {width} bytes wide, cannot read as {requested}")]
    FieldWidth {
        index: usize,
        width: usize,
        requested: &'static str,
    },

    /// Field bytes are not valid UTF-8.
    #[error("field {index} is not valid UTF-8")]
    InvalidUtf8 { index: usize },

    /// Zero-length values cannot be told apart from a missing field.
    #[error("empty values cannot be appended")]
    EmptyValue,

    /// Integer outside every supported field width.
    #[error("integer {0} does not fit a 32-bit field")]
    IntegerOutOfRange(i64),

    /// Float that is not finite or truncates outside the 32-bit range.
    #[error("float {0} cannot be encoded as a truncated 32-bit field")]
    FloatOutOfRange(f64),

    /// Configuration the codec cannot honour.
    #[error("invalid message config: {0}")]
    InvalidConfig(String),
}

impl MessageError {
    /// True for version and checksum failures.
    pub fn is_authentication(&self) -> bool {
        matches!(self, MessageError::Authentication(_))
    }
}

pub type Result<T> = std::result::Result<T, MessageError>;
