use std::fmt;

use bytes::Bytes;
use pipelink_frame::{Message, MessageReader, MessageWriter};
#[cfg(any(unix, windows))]
use pipelink_transport::DefaultConnector;
use pipelink_transport::{PipeConnector, PipeStream};
use tracing::debug;

use crate::config::ConnectionConfig;
use crate::connection::ConnectionManager;
use crate::error::{PipeError, Result};
use crate::status::PipeStatusResponse;

/// Outcome of a successful send.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SendReport {
    /// Bytes accepted by the pipe, delimiter included. May be short of the
    /// payload length; the write is not retried.
    pub bytes_written: usize,
}

impl fmt::Display for SendReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Success, bytes written: {}", self.bytes_written)
    }
}

/// Sends and receives delimiter-terminated messages over one pipe.
///
/// The connection is opened lazily: any send or receive on a closed
/// client runs the open sequence first. A connection that drops mid-use is
/// not reopened; the failure is returned and the handle stays until
/// [`close`](Self::close).
///
/// Not internally synchronized. Wrap in a mutex to share across threads.
#[derive(Debug)]
pub struct PipeClient<C: PipeConnector> {
    connection: ConnectionManager<C>,
    reader: MessageReader,
    writer: MessageWriter,
}

#[cfg(any(unix, windows))]
impl PipeClient<DefaultConnector> {
    /// Create an unconnected client on the platform backend.
    pub fn new() -> Self {
        Self::with_connector(DefaultConnector::default())
    }
}

#[cfg(any(unix, windows))]
impl Default for PipeClient<DefaultConnector> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: PipeConnector> PipeClient<C> {
    /// Create an unconnected client on a specific backend.
    pub fn with_connector(connector: C) -> Self {
        let delimiter = ConnectionConfig::default().delimiter;
        Self {
            connection: ConnectionManager::with_connector(connector),
            reader: MessageReader::with_delimiter(delimiter),
            writer: MessageWriter::with_delimiter(delimiter),
        }
    }

    /// Store name and configuration and open the pipe now.
    ///
    /// An already open pipe is kept. If the delimiter changes, any input
    /// still buffered from earlier reads is discarded.
    pub fn connect(&mut self, name: impl Into<String>, config: ConnectionConfig) -> Result<()> {
        self.apply_delimiter(config.delimiter);
        self.connection.connect(name, config)
    }

    /// [`connect`](Self::connect) with [`ConnectionConfig::default`].
    pub fn connect_default(&mut self, name: impl Into<String>) -> Result<()> {
        self.connect(name, ConnectionConfig::default())
    }

    /// Store name and configuration; the pipe opens on first send/receive.
    pub fn configure(&mut self, name: impl Into<String>, config: ConnectionConfig) {
        self.apply_delimiter(config.delimiter);
        self.connection.configure(name, config);
    }

    /// Input buffered under a different delimiter is dropped.
    fn apply_delimiter(&mut self, delimiter: u8) {
        if self.reader.delimiter() != delimiter {
            self.reader.clear();
        }
        self.reader.set_delimiter(delimiter);
        self.writer.set_delimiter(delimiter);
    }

    /// Release the pipe and drop any buffered partial input.
    pub fn close(&mut self) {
        self.connection.close();
        self.reader.clear();
    }

    pub fn is_open(&self) -> bool {
        self.connection.is_open()
    }

    pub fn connection(&self) -> &ConnectionManager<C> {
        &self.connection
    }

    pub fn name(&self) -> &str {
        self.connection.name()
    }

    pub fn prefix(&self) -> &str {
        self.connection.prefix()
    }

    pub fn set_prefix(&mut self, prefix: impl Into<String>) {
        self.connection.set_prefix(prefix);
    }

    pub fn address(&self) -> String {
        self.connection.address()
    }

    /// Send `text` followed by the delimiter.
    pub fn send(&mut self, text: &str) -> Result<SendReport> {
        self.send_bytes(text.as_bytes())
    }

    /// Send raw bytes followed by the delimiter.
    pub fn send_bytes(&mut self, payload: &[u8]) -> Result<SendReport> {
        let stream = prepare(&mut self.connection)?;
        let bytes_written = self.writer.write_message(stream, payload)?;
        debug!(bytes_written, payload_len = payload.len(), "sent message");
        Ok(SendReport { bytes_written })
    }

    /// Receive the next message as text (invalid UTF-8 is replaced).
    pub fn receive(&mut self) -> Result<String> {
        Ok(self.receive_message()?.to_text())
    }

    /// Receive the next message as raw bytes.
    pub fn receive_bytes(&mut self) -> Result<Bytes> {
        Ok(self.receive_message()?.payload)
    }

    /// Receive the next message, noting whether it ended with a delimiter.
    ///
    /// If the stream ends first, whatever arrived is returned as an
    /// unterminated message.
    pub fn receive_message(&mut self) -> Result<Message> {
        let stream = prepare(&mut self.connection)?;
        let message = self.reader.read_message(stream)?;
        if message.terminated {
            debug!(bytes = message.payload.len(), "received message");
        } else {
            debug!(
                bytes = message.payload.len(),
                "stream ended before delimiter; returning partial message"
            );
        }
        Ok(message)
    }

    /// [`send`](Self::send) flattened into a [`PipeStatusResponse`].
    pub fn send_status(&mut self, text: &str) -> PipeStatusResponse {
        self.send(text).into()
    }

    /// [`receive`](Self::receive) flattened into a [`PipeStatusResponse`].
    pub fn receive_status(&mut self) -> PipeStatusResponse {
        self.receive().into()
    }
}

/// Open lazily, then re-assert the configured read mode.
fn prepare<C: PipeConnector>(connection: &mut ConnectionManager<C>) -> Result<&mut C::Stream> {
    let mode = connection.config().mode;
    let stream = connection
        .ensure_open()
        .map_err(|err| PipeError::OpenFailed(Box::new(err)))?;
    stream
        .set_read_mode(mode)
        .map_err(|source| PipeError::SetMode { mode, source })?;
    Ok(stream)
}
