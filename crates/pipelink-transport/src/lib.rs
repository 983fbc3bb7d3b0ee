//! Named-pipe primitive contract and platform backends.
//!
//! This is the lowest layer of pipelink. The connection manager only ever
//! talks to a [`PipeConnector`] and the [`PipeStream`] it hands back:
//! - Unix domain sockets (Linux/macOS) via [`UnixSocketConnector`]
//! - Named pipes (Windows) via [`NamedPipeConnector`]
//!
//! [`DefaultConnector`] names the backend for the current platform.

pub mod error;
pub mod traits;

#[cfg(unix)]
pub mod uds;

#[cfg(windows)]
pub mod windows;

pub use error::{Result, TransportError};
pub use traits::{PipeConnector, PipeMode, PipeStream};

#[cfg(unix)]
pub use uds::{UnixPipeStream, UnixSocketConnector};

#[cfg(windows)]
pub use windows::{NamedPipeConnector, NamedPipeStream};

/// Platform connector used when the caller does not supply one.
#[cfg(unix)]
pub type DefaultConnector = UnixSocketConnector;

/// Platform connector used when the caller does not supply one.
#[cfg(windows)]
pub type DefaultConnector = NamedPipeConnector;

/// Namespace root prepended to endpoint names by default.
#[cfg(windows)]
pub const DEFAULT_ADDRESS_PREFIX: &str = r"\\.\pipe\";

/// Namespace root prepended to endpoint names by default.
#[cfg(not(windows))]
pub const DEFAULT_ADDRESS_PREFIX: &str = "/tmp/";
