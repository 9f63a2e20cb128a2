//! Checksummed, acknowledged message exchange over serial-style links.
//!
//! serlink packs small typed messages, guards them with a CRC16, ships them
//! as Base64 frames between sentinels and confirms delivery with ack/nack
//! bursts.
//!
//! # Crate Structure
//!
//! - [`transport`]: Duplex links (Unix sockets, device nodes)
//! - [`message`]: Message model, field codec and checksums
//! - [`frame`]: Base64 framing over line-oriented streams
//! - [`peer`]: Send/acknowledge exchange (behind `peer` feature)

/// Re-export transport types.
pub mod transport {
    pub use serlink_transport::*;
}

/// Re-export message types.
pub mod message {
    pub use serlink_message::*;
}

/// Re-export frame types.
pub mod frame {
    pub use serlink_frame::*;
}

/// Re-export peer types (requires `peer` feature).
#[cfg(feature = "peer")]
pub mod peer {
    pub use serlink_peer::*;
}
