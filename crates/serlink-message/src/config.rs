use crate::error::{MessageError, Result};

/// Protocol version written by default and required on parse.
pub const DEFAULT_VERSION: u8 = 2;

/// Default largest legal message (`8 + dataSize`) in bytes.
pub const DEFAULT_MAX_SIZE: usize = 186;

/// Byte separating fields inside a payload (`|`).
pub const FIELD_DELIMITER: u8 = b'|';

/// Byte marking the next payload byte as literal data (ESC).
pub const FIELD_ESCAPE: u8 = 0x1B;

/// version, type, status, number, total, dataSize.
pub const HEADER_SIZE: usize = 6;

/// checksumHigh, checksumLow.
pub const TRAILER_SIZE: usize = 2;

/// Header plus trailer.
pub const OVERHEAD: usize = HEADER_SIZE + TRAILER_SIZE;

/// Message-level configuration, fixed at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageConfig {
    /// Local protocol version. Default: 2.
    pub version: u8,
    /// Largest legal `8 + dataSize`. Default: 186.
    pub max_size: usize,
    /// Field delimiter byte. Default: `|`.
    pub delimiter: u8,
    /// Escape byte used when a field byte collides with the delimiter.
    pub escape: u8,
}

impl MessageConfig {
    /// Largest payload this configuration accepts.
    ///
    /// `dataSize` travels in a single byte, so the result never exceeds 255.
    pub fn payload_capacity(&self) -> usize {
        self.max_size
            .saturating_sub(OVERHEAD)
            .min(usize::from(u8::MAX))
    }

    /// Reject configurations the codec cannot honour.
    pub fn validate(&self) -> Result<()> {
        if self.max_size < OVERHEAD {
            return Err(MessageError::InvalidConfig(format!(
                "max_size {} is smaller than the {OVERHEAD}-byte header and trailer",
                self.max_size
            )));
        }
        if self.delimiter == self.escape {
            return Err(MessageError::InvalidConfig(format!(
                "delimiter and escape must differ (both 0x{:02X})",
                self.delimiter
            )));
        }
        Ok(())
    }
}

impl Default for MessageConfig {
    fn default() -> Self {
        Self {
            version: DEFAULT_VERSION,
            max_size: DEFAULT_MAX_SIZE,
            delimiter: FIELD_DELIMITER,
            escape: FIELD_ESCAPE,
        }
    }
}
