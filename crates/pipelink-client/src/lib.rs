//! Named-pipe client: connection retry plus framed send/receive.
//!
//! [`ConnectionManager`] resolves an endpoint address, opens it with a
//! bounded number of attempts, and owns the resulting handle.
//! [`PipeClient`] sits on top and exchanges delimiter-terminated text
//! messages, opening the connection lazily on first use.
//!
//! ```no_run
//! use pipelink_client::{ConnectionConfig, PipeClient};
//!
//! let mut client = PipeClient::new();
//! client.connect("tmp-app.world", ConnectionConfig::default())?;
//! client.send(r#"{ "type": "message", "data": "hi" }"#)?;
//! let reply = client.receive()?;
//! println!("read message: {reply}");
//! # Ok::<(), pipelink_client::PipeError>(())
//! ```

pub mod client;
pub mod config;
pub mod connection;
pub mod error;
pub mod status;

#[cfg(test)]
mod testing;

pub use client::{PipeClient, SendReport};
pub use config::{
    ConnectionConfig, DEFAULT_CONNECT_TIMEOUT, DEFAULT_MAX_ATTEMPTS, DEFAULT_RETRY_INTERVAL,
};
pub use connection::ConnectionManager;
pub use error::{PipeError, Result};
pub use pipelink_frame::DEFAULT_DELIMITER;
pub use pipelink_transport::{PipeConnector, PipeMode, PipeStream, DEFAULT_ADDRESS_PREFIX};
pub use status::PipeStatusResponse;
