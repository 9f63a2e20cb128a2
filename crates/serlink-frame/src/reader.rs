use std::io::{ErrorKind, Read};

use bytes::{Bytes, BytesMut};
use serlink_message::Message;
use serlink_transport::LinkStream;
use tracing::{trace, warn};

use crate::codec::{decode_frame, scan_frame, FrameConfig, MIN_FRAME_SPAN};
use crate::error::{FrameError, Result};

const READ_CHUNK_SIZE: usize = 256;

/// Reads lines and frames from any `Read` stream.
///
/// Bytes read past the end of a line stay buffered for the next call.
pub struct FrameReader<T> {
    inner: T,
    buf: BytesMut,
    config: FrameConfig,
}

impl<T: Read> FrameReader<T> {
    /// Create a new frame reader with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new frame reader with explicit configuration.
    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(config.buffer_max_size),
            config,
        }
    }

    /// Read one line, terminator included (blocking).
    ///
    /// A read timeout yields whatever partial line is buffered, or `None` if
    /// nothing is. Input without a newline is cut off once it passes
    /// `buffer_max_size` and returned as an unterminated line. Returns
    /// `Err(FrameError::ConnectionClosed)` at EOF with an empty buffer.
    pub fn read_line(&mut self) -> Result<Option<Bytes>> {
        loop {
            if let Some(pos) = self.buf.iter().position(|&b| b == b'\n') {
                let line = self.buf.split_to(pos + 1).freeze();
                trace!(len = line.len(), "read line");
                return Ok(Some(line));
            }

            let mut chunk = [0u8; READ_CHUNK_SIZE];
            let read = match self.inner.read(&mut chunk) {
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err)
                    if matches!(err.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) =>
                {
                    return Ok(self.take_partial());
                }
                Err(err) => return Err(FrameError::Io(err)),
            };

            if read == 0 {
                return self.take_partial().map(Some).ok_or(FrameError::ConnectionClosed);
            }

            self.buf.extend_from_slice(&chunk[..read]);

            if self.buf.len() > self.config.buffer_max_size
                && !self.buf.contains(&b'\n')
            {
                warn!(
                    len = self.buf.len(),
                    max = self.config.buffer_max_size,
                    "line exceeds buffer, returning it unterminated"
                );
                return Ok(self.take_partial());
            }
        }
    }

    /// Read up to two lines and return the Base64 text of a frame in them.
    ///
    /// The second line is only read when the first holds no complete frame.
    /// `None` means no frame was found; the lines are discarded.
    pub fn read_frame_text(&mut self) -> Result<Option<Bytes>> {
        let Some(first) = self.read_line()? else {
            return Ok(None);
        };

        let mut combined = BytesMut::from(first.as_ref());
        if scan_frame(&combined, &self.config).is_none() {
            if let Some(second) = self.read_line()? {
                combined.extend_from_slice(&second);
            }
        }

        if combined.len() < MIN_FRAME_SPAN {
            trace!(len = combined.len(), "line pair too short for a frame");
            return Ok(None);
        }
        if combined.len() > self.config.buffer_max_size {
            warn!(
                len = combined.len(),
                max = self.config.buffer_max_size,
                "discarding oversized input"
            );
            return Ok(None);
        }

        match scan_frame(&combined, &self.config) {
            Some(bounds) => Ok(Some(combined.freeze().slice(bounds.text()))),
            None => {
                trace!(len = combined.len(), "no frame in line pair");
                Ok(None)
            }
        }
    }

    /// Read and decode the next frame.
    ///
    /// `Ok(None)` means no frame was found. Decode failures are returned as
    /// errors; see [`FrameError::is_rejection`].
    pub fn poll_frame(&mut self) -> Result<Option<Message>> {
        match self.read_frame_text()? {
            Some(text) => decode_frame(&text, &self.config).map(Some),
            None => Ok(None),
        }
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Current frame reader configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }

    fn take_partial(&mut self) -> Option<Bytes> {
        if self.buf.is_empty() {
            None
        } else {
            Some(self.buf.split().freeze())
        }
    }
}

impl FrameReader<LinkStream> {
    /// Create a frame reader for a link and apply the read timeout from config.
    pub fn with_config_link(inner: LinkStream, config: FrameConfig) -> Result<Self> {
        inner
            .set_read_timeout(config.read_timeout)
            .map_err(|err| FrameError::Io(err.into_io()))?;
        Ok(Self::with_config(inner, config))
    }
}
