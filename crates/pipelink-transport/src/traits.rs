use std::fmt;
use std::io::{Read, Write};
use std::time::Duration;

use crate::error::Result;

/// Read/write semantics requested from the underlying primitive.
///
/// This is independent of the delimiter framing layered on top: `Byte`
/// presents a flat stream, `Message` asks the primitive to preserve write
/// boundaries on the read side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PipeMode {
    #[default]
    Byte,
    Message,
}

impl fmt::Display for PipeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipeMode::Byte => f.write_str("byte"),
            PipeMode::Message => f.write_str("message"),
        }
    }
}

/// A connected pipe handle.
///
/// Dropping the value releases the OS resource. A read returning `Ok(0)`
/// means the stream has ended. When the primitive reports that more data
/// is pending for the current message, implementations return the bytes
/// they did read as a successful (short) read.
pub trait PipeStream: Read + Write + Send {
    /// Switch the handle's read mode. Called before every framed operation.
    fn set_read_mode(&mut self, mode: PipeMode) -> std::io::Result<()>;
}

/// Opens pipe endpoints by address.
pub trait PipeConnector {
    type Stream: PipeStream;

    /// Issue a single non-blocking open (read+write, exclusive, existing
    /// endpoints only).
    ///
    /// Returns [`TransportError::Busy`](crate::TransportError::Busy) when the
    /// endpoint exists but has no free slot, so the caller can wait on it.
    fn try_connect(&self, address: &str) -> Result<Self::Stream>;

    /// Block until the endpoint at `address` can accept a connection.
    ///
    /// Returns `Ok(false)` if `timeout` elapsed first.
    fn wait_available(&self, address: &str, timeout: Duration) -> std::io::Result<bool>;

    /// Transport name for diagnostics.
    fn transport_name(&self) -> &'static str;
}
