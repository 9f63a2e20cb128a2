//! Message model and field codec for serlink.
//!
//! A message is a fixed 6-byte header, a payload of delimiter-separated
//! fields and a 2-byte CRC16 trailer:
//!
//! ```text
//! ┌─────────┬──────┬────────┬────────┬───────┬──────────┬──────────┬──────┬──────┐
//! │ version │ type │ status │ number │ total │ dataSize │ data     │ csH  │ csL  │
//! │ 1B      │ 1B   │ 1B     │ 1B     │ 1B    │ 1B       │ dataSize │ 1B   │ 1B   │
//! └─────────┴──────┴────────┴────────┴───────┴──────────┴──────────┴──────┴──────┘
//! ```
//!
//! The checksum covers header and payload. Nothing in this crate knows about
//! Base64 or sentinels; framing lives one layer up.

pub mod checksum;
pub mod config;
pub mod cursor;
pub mod error;
pub mod field;
pub mod message;
pub mod payload;
pub mod status;

pub use config::{
    MessageConfig, DEFAULT_MAX_SIZE, DEFAULT_VERSION, FIELD_DELIMITER, FIELD_ESCAPE, HEADER_SIZE,
    OVERHEAD, TRAILER_SIZE,
};
pub use cursor::FieldCursor;
pub use error::{AuthError, MessageError, Result};
pub use field::Field;
pub use message::Message;
pub use payload::Payload;
pub use status::CommandStatus;
