//! Duplex byte-stream links for serlink.
//!
//! The protocol layers above only need something that reads and writes
//! bytes. This crate supplies the concrete links:
//! - Unix domain sockets, for local peers and tests
//! - device nodes (serial ports, ptys) that are already configured
//!
//! Everything else builds on the [`LinkStream`] type provided here.

pub mod device;
pub mod error;
pub mod stream;

#[cfg(unix)]
pub mod uds;

pub use device::open_device;
pub use error::{Result, TransportError};
pub use stream::LinkStream;

#[cfg(unix)]
pub use uds::UnixLinkListener;
