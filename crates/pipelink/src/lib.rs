//! Named-pipe client with connection retry and delimiter-framed messages.
//!
//! pipelink connects to an existing pipe endpoint by name, retries while
//! the endpoint is missing or busy, and exchanges text messages terminated
//! by a single delimiter byte.
//!
//! # Crate Structure
//!
//! - [`transport`] - OS primitive contract and platform backends
//! - [`frame`] - Delimiter framing codec, message reader and writer
//! - [`client`] - Connection manager and framed [`PipeClient`]

/// Re-export transport types.
pub mod transport {
    pub use pipelink_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use pipelink_frame::*;
}

/// Re-export client types.
pub mod client {
    pub use pipelink_client::*;
}

pub use pipelink_client::{
    ConnectionConfig, ConnectionManager, PipeClient, PipeError, PipeMode, PipeStatusResponse,
    SendReport,
};
