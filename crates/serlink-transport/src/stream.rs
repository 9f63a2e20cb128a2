use std::fs::File;
use std::io::{Read, Write};
use std::time::Duration;

use tracing::debug;

use crate::error::Result;

/// A connected duplex link: implements `Read + Write`.
///
/// The protocol never opens, configures or closes the link itself; callers
/// hand over one of these already open.
pub struct LinkStream {
    inner: LinkInner,
}

enum LinkInner {
    #[cfg(unix)]
    Unix(std::os::unix::net::UnixStream),
    Device(File),
}

impl Read for LinkStream {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match &mut self.inner {
            #[cfg(unix)]
            LinkInner::Unix(stream) => stream.read(buf),
            LinkInner::Device(file) => file.read(buf),
        }
    }
}

impl Write for LinkStream {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match &mut self.inner {
            #[cfg(unix)]
            LinkInner::Unix(stream) => stream.write(buf),
            LinkInner::Device(file) => file.write(buf),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match &mut self.inner {
            #[cfg(unix)]
            LinkInner::Unix(stream) => stream.flush(),
            LinkInner::Device(file) => file.flush(),
        }
    }
}

impl LinkStream {
    #[cfg(unix)]
    pub(crate) fn from_unix(stream: std::os::unix::net::UnixStream) -> Self {
        Self {
            inner: LinkInner::Unix(stream),
        }
    }

    pub(crate) fn from_device(file: File) -> Self {
        Self {
            inner: LinkInner::Device(file),
        }
    }

    /// Both ends of a connected socket pair, for in-process peers.
    #[cfg(unix)]
    pub fn pair() -> Result<(Self, Self)> {
        let (left, right) = std::os::unix::net::UnixStream::pair()?;
        Ok((Self::from_unix(left), Self::from_unix(right)))
    }

    /// Set the read timeout.
    ///
    /// Device nodes carry their timing in terminal settings, so the call is a
    /// no-op for them.
    pub fn set_read_timeout(&self, timeout: Option<Duration>) -> Result<()> {
        match &self.inner {
            #[cfg(unix)]
            LinkInner::Unix(stream) => stream.set_read_timeout(timeout).map_err(Into::into),
            LinkInner::Device(_) => {
                debug!(?timeout, "read timeout ignored for device link");
                Ok(())
            }
        }
    }

    /// Set the write timeout. No-op for device nodes.
    pub fn set_write_timeout(&self, timeout: Option<Duration>) -> Result<()> {
        match &self.inner {
            #[cfg(unix)]
            LinkInner::Unix(stream) => stream.set_write_timeout(timeout).map_err(Into::into),
            LinkInner::Device(_) => {
                debug!(?timeout, "write timeout ignored for device link");
                Ok(())
            }
        }
    }

    /// Duplicate the handle so reading and writing can use separate owners.
    pub fn try_clone(&self) -> Result<Self> {
        match &self.inner {
            #[cfg(unix)]
            LinkInner::Unix(stream) => Ok(Self::from_unix(stream.try_clone()?)),
            LinkInner::Device(file) => Ok(Self::from_device(file.try_clone()?)),
        }
    }

    /// Transport name for diagnostics.
    pub fn transport_name(&self) -> &'static str {
        match &self.inner {
            #[cfg(unix)]
            LinkInner::Unix(_) => "unix-domain-socket",
            LinkInner::Device(_) => "device",
        }
    }
}

impl std::fmt::Debug for LinkStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinkStream")
            .field("type", &self.transport_name())
            .finish()
    }
}
