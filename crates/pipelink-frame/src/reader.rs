use std::io::{ErrorKind, Read};

use bytes::BytesMut;
use tracing::trace;

use crate::codec::{decode_message_from, Message, DEFAULT_DELIMITER, READ_CHUNK_SIZE};
use crate::error::{FrameError, Result};

/// Reads delimiter-terminated messages from any `Read` stream.
///
/// The reader does not own the stream, so it can sit beside a handle that
/// is opened and closed independently. Bytes read past a delimiter are kept
/// and served by the next [`read_message`](Self::read_message).
#[derive(Debug)]
pub struct MessageReader {
    buf: BytesMut,
    delimiter: u8,
    /// Prefix of `buf` already known to hold no delimiter.
    scanned: usize,
}

impl MessageReader {
    /// Create a reader using [`DEFAULT_DELIMITER`].
    pub fn new() -> Self {
        Self::with_delimiter(DEFAULT_DELIMITER)
    }

    pub fn with_delimiter(delimiter: u8) -> Self {
        Self {
            buf: BytesMut::with_capacity(READ_CHUNK_SIZE),
            delimiter,
            scanned: 0,
        }
    }

    /// Read the next message (blocking).
    ///
    /// Reads `READ_CHUNK_SIZE` bytes at a time until a delimiter shows up.
    /// If the stream ends first, returns what was accumulated as an
    /// unterminated message (possibly empty) rather than an error.
    pub fn read_message<R: Read + ?Sized>(&mut self, src: &mut R) -> Result<Message> {
        loop {
            if let Some(payload) = decode_message_from(&mut self.buf, self.delimiter, self.scanned)
            {
                self.scanned = 0;
                return Ok(Message::terminated(payload));
            }
            self.scanned = self.buf.len();

            let mut chunk = [0u8; READ_CHUNK_SIZE];
            let read = match src.read(&mut chunk) {
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Read(err)),
            };

            if read == 0 {
                trace!(buffered = self.buf.len(), "stream ended before delimiter");
                self.scanned = 0;
                return Ok(Message::unterminated(self.buf.split().freeze()));
            }

            trace!(bytes = read, "read chunk");
            self.buf.extend_from_slice(&chunk[..read]);
        }
    }

    /// Bytes held over from earlier reads.
    pub fn buffered(&self) -> &[u8] {
        &self.buf
    }

    /// Drop any held-over bytes.
    pub fn clear(&mut self) {
        self.buf.clear();
        self.scanned = 0;
    }

    pub fn delimiter(&self) -> u8 {
        self.delimiter
    }

    /// Change the delimiter for subsequent reads. Buffered bytes are rescanned.
    pub fn set_delimiter(&mut self, delimiter: u8) {
        if delimiter != self.delimiter {
            self.delimiter = delimiter;
            self.scanned = 0;
        }
    }
}

impl Default for MessageReader {
    fn default() -> Self {
        Self::new()
    }
}
