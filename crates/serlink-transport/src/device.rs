use std::fs::OpenOptions;
use std::path::Path;

use tracing::info;

use crate::error::{Result, TransportError};
use crate::stream::LinkStream;

/// Open a device node (serial port, pty) for reading and writing.
///
/// Baud rate, parity and raw mode are expected to be configured already,
/// e.g. with `stty`. On Unix the node is opened without becoming the
/// controlling terminal.
pub fn open_device(path: impl AsRef<Path>) -> Result<LinkStream> {
    let path = path.as_ref();
    let mut options = OpenOptions::new();
    options.read(true).write(true);

    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.custom_flags(libc::O_NOCTTY);
    }

    let file = options.open(path).map_err(|e| TransportError::Open {
        path: path.to_path_buf(),
        source: e,
    })?;
    info!(?path, "opened device link");
    Ok(LinkStream::from_device(file))
}
