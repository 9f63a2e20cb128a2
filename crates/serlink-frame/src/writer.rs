use std::io::{ErrorKind, Write};

use bytes::{BufMut, BytesMut};
use serlink_transport::LinkStream;
use tracing::trace;

use crate::codec::{encode_frame, FrameConfig, LINE_TERMINATOR};
use crate::error::{FrameError, Result};

/// Writes frames and raw lines to any `Write` stream.
///
/// Every frame goes out as `"\r\n" + frame + "\r\n"` in a single write.
pub struct FrameWriter<T> {
    inner: T,
    buf: BytesMut,
    config: FrameConfig,
}

impl<T: Write> FrameWriter<T> {
    /// Create a new frame writer with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new frame writer with explicit configuration.
    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(config.buffer_max_size),
            config,
        }
    }

    /// Frame raw message bytes and send them (blocking).
    ///
    /// Fails with [`FrameError::FrameTooLarge`] before writing anything if the
    /// encoded frame exceeds `buffer_max_size`.
    pub fn write_frame(&mut self, raw: &[u8]) -> Result<()> {
        self.buf.clear();
        self.buf.put_slice(LINE_TERMINATOR);
        encode_frame(raw, &mut self.buf, &self.config);
        let frame_len = self.buf.len() - LINE_TERMINATOR.len();
        if frame_len > self.config.buffer_max_size {
            return Err(FrameError::FrameTooLarge {
                size: frame_len,
                max: self.config.buffer_max_size,
            });
        }
        self.buf.put_slice(LINE_TERMINATOR);
        trace!(frame_len, "writing frame");
        self.send_buffered()
    }

    /// Send bytes as one line, bracketed by line terminators.
    pub fn write_line(&mut self, line: &[u8]) -> Result<()> {
        self.buf.clear();
        self.buf.put_slice(LINE_TERMINATOR);
        self.buf.put_slice(line);
        self.buf.put_slice(LINE_TERMINATOR);
        trace!(len = line.len(), "writing line");
        self.send_buffered()
    }

    /// Write the staged buffer in full, then flush.
    fn send_buffered(&mut self) -> Result<()> {
        let mut offset = 0usize;
        while offset < self.buf.len() {
            match self.inner.write(&self.buf[offset..]) {
                Ok(0) => return Err(FrameError::ConnectionClosed),
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if self.retry_would_block(&err) => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }

        self.flush()
    }

    /// Flush the underlying stream.
    pub fn flush(&mut self) -> Result<()> {
        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if self.retry_would_block(&err) => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }
    }

    /// `WouldBlock` is retried only when no write timeout is set; with one
    /// set it means the timeout elapsed.
    fn retry_would_block(&self, err: &std::io::Error) -> bool {
        err.kind() == ErrorKind::WouldBlock && self.config.write_timeout.is_none()
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the writer and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Current frame writer configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}

impl FrameWriter<LinkStream> {
    /// Create a frame writer for a link and apply the write timeout from config.
    pub fn with_config_link(inner: LinkStream, config: FrameConfig) -> Result<Self> {
        inner
            .set_write_timeout(config.write_timeout)
            .map_err(|err| FrameError::Io(err.into_io()))?;
        Ok(Self::with_config(inner, config))
    }
}
