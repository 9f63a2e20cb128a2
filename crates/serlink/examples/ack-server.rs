//! Minimal receiver: accepts one peer and acknowledges its messages.
//!
//! Run with:
//!   cargo run --example ack-server --features peer
//!
//! In another terminal:
//!   cargo run --features cli -- send /tmp/serlink-ack-<pid>/link.sock \
//!     --task 5 --field u8:42 --field str:hello

use std::fs;

use serlink::peer::{PeerError, PeerListener, ReceiveOutcome};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let sock_dir = std::env::temp_dir().join(format!("serlink-ack-{}", std::process::id()));
    fs::create_dir_all(&sock_dir)?;
    let sock_path = sock_dir.join("link.sock");

    let listener = PeerListener::bind(&sock_path)?;
    eprintln!("Listening on {}", sock_path.display());

    let mut peer = listener.accept()?;
    eprintln!("Peer connected");

    loop {
        match peer.receive() {
            Ok(ReceiveOutcome::Accepted { succeeded }) => {
                let message = peer.inbound();
                eprintln!(
                    "Task {} ({}), {} fields, checksum {:04X}",
                    message.task_value(),
                    if succeeded { "acked" } else { "nacked" },
                    message.field_count(),
                    message.checksum()
                );
                for index in 0..message.field_count() {
                    eprintln!("  [{index}] {:02x?}", message.read_bytes(index)?);
                }
            }
            Ok(ReceiveOutcome::Rejected(err)) => eprintln!("Rejected frame: {err}"),
            Ok(ReceiveOutcome::NoFrame) => {}
            Err(PeerError::Disconnected(reason)) => {
                eprintln!("Peer disconnected: {reason}");
                break;
            }
            Err(err) => return Err(err.into()),
        }
    }

    let _ = fs::remove_dir_all(&sock_dir);
    Ok(())
}
