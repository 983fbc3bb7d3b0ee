use std::io::{ErrorKind, Write};

use bytes::BytesMut;
use tracing::trace;

use crate::codec::{encode_message, DEFAULT_DELIMITER};
use crate::error::{FrameError, Result};

const INITIAL_BUFFER_CAPACITY: usize = 1024;

/// Writes delimiter-terminated messages to any `Write` stream.
///
/// Each message goes out in a single `write` call. A short write is not
/// retried; the byte count is returned so the caller can check it.
#[derive(Debug)]
pub struct MessageWriter {
    buf: BytesMut,
    delimiter: u8,
}

impl MessageWriter {
    /// Create a writer using [`DEFAULT_DELIMITER`].
    pub fn new() -> Self {
        Self::with_delimiter(DEFAULT_DELIMITER)
    }

    pub fn with_delimiter(delimiter: u8) -> Self {
        Self {
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            delimiter,
        }
    }

    /// Append the delimiter to `payload` and write it (blocking).
    ///
    /// Returns the number of bytes the stream accepted, delimiter included.
    pub fn write_message<W: Write + ?Sized>(&mut self, dst: &mut W, payload: &[u8]) -> Result<usize> {
        self.buf.clear();
        encode_message(payload, self.delimiter, &mut self.buf);

        let written = loop {
            match dst.write(&self.buf) {
                Ok(n) => break n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Write(err)),
            }
        };
        trace!(bytes = written, expected = self.buf.len(), "wrote message");

        loop {
            match dst.flush() {
                Ok(()) => return Ok(written),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Write(err)),
            }
        }
    }

    pub fn delimiter(&self) -> u8 {
        self.delimiter
    }

    /// Change the delimiter for subsequent writes.
    pub fn set_delimiter(&mut self, delimiter: u8) {
        self.delimiter = delimiter;
    }
}

impl Default for MessageWriter {
    fn default() -> Self {
        Self::new()
    }
}
