//! Base64 framing over line-oriented byte streams.
//!
//! A frame carries one raw message as `'#' + base64(bytes) + ';'`, written
//! between line terminators so a line reader on the other end can pick it
//! up. Reading tolerates a frame split across two lines and noise around it.

pub mod codec;
pub mod error;
pub mod reader;
pub mod writer;

pub use codec::{
    decode_frame, encode_frame, is_base64_byte, scan_frame, FrameBounds, FrameConfig,
    DEFAULT_BUFFER_MAX_SIZE, LINE_TERMINATOR, MIN_FRAME_SPAN, START_SENTINEL, STOP_SENTINEL,
};
pub use error::{FrameError, Result};
pub use reader::FrameReader;
pub use writer::FrameWriter;
