use std::fmt;

#[cfg(any(unix, windows))]
use pipelink_transport::DefaultConnector;
use pipelink_transport::{PipeConnector, TransportError, DEFAULT_ADDRESS_PREFIX};
use tracing::{debug, info, warn};

use crate::config::ConnectionConfig;
use crate::error::{PipeError, Result};

/// Owns one pipe handle and the retry policy used to acquire it.
///
/// The handle is an owned value: [`close`](Self::close) drops it, and so
/// does dropping the manager.
pub struct ConnectionManager<C: PipeConnector> {
    connector: C,
    stream: Option<C::Stream>,
    name: String,
    prefix: String,
    config: ConnectionConfig,
    attempts_made: u32,
}

#[cfg(any(unix, windows))]
impl ConnectionManager<DefaultConnector> {
    /// Create an unopened manager on the platform backend.
    pub fn new() -> Self {
        Self::with_connector(DefaultConnector::default())
    }
}

#[cfg(any(unix, windows))]
impl Default for ConnectionManager<DefaultConnector> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: PipeConnector> ConnectionManager<C> {
    /// Create an unopened manager on a specific backend.
    pub fn with_connector(connector: C) -> Self {
        Self {
            connector,
            stream: None,
            name: String::new(),
            prefix: DEFAULT_ADDRESS_PREFIX.to_string(),
            config: ConnectionConfig::default(),
            attempts_made: 0,
        }
    }

    /// Store the endpoint name and configuration without opening.
    ///
    /// Resets the attempt counter. Leaves an open handle untouched.
    pub fn configure(&mut self, name: impl Into<String>, config: ConnectionConfig) {
        self.name = name.into();
        self.config = config;
        self.attempts_made = 0;
    }

    /// Store the endpoint name and configuration, then run the open sequence.
    ///
    /// If a handle is already open, nothing is re-attempted.
    pub fn connect(&mut self, name: impl Into<String>, config: ConnectionConfig) -> Result<()> {
        self.configure(name, config);
        debug!(address = %self.address(), "connecting");
        self.open()
    }

    /// Run the open sequence unless already open.
    pub fn open(&mut self) -> Result<()> {
        self.ensure_open().map(|_| ())
    }

    /// Run the open sequence if needed and return the live handle.
    pub fn ensure_open(&mut self) -> Result<&mut C::Stream> {
        let stream = match self.stream.take() {
            Some(stream) => stream,
            None => self.open_with_retry()?,
        };
        Ok(self.stream.insert(stream))
    }

    fn open_with_retry(&mut self) -> Result<C::Stream> {
        let address = self.address();
        loop {
            std::thread::sleep(self.config.retry_interval);

            match self.try_open(&address) {
                Ok(stream) => {
                    info!(
                        %address,
                        transport = self.connector.transport_name(),
                        failed_attempts = self.attempts_made,
                        "pipe connected"
                    );
                    return Ok(stream);
                }
                Err(err) => {
                    self.attempts_made += 1;
                    if self.attempts_made >= self.config.max_attempts {
                        return Err(PipeError::AttemptsExhausted {
                            address,
                            attempts: self.attempts_made,
                            last: Box::new(err),
                        });
                    }
                    warn!(
                        %address,
                        attempt = self.attempts_made,
                        max_attempts = self.config.max_attempts,
                        error = %err,
                        "error connecting to pipe"
                    );
                }
            }
        }
    }

    /// One open attempt, including the bounded wait on a busy endpoint.
    fn try_open(&self, address: &str) -> Result<C::Stream> {
        match self.connector.try_connect(address) {
            Ok(stream) => Ok(stream),
            Err(TransportError::Busy { .. }) => {
                let timeout = self.config.connect_timeout;
                debug!(address, ?timeout, "pipe busy; waiting");
                let available = self
                    .connector
                    .wait_available(address, timeout)
                    .map_err(|source| PipeError::Wait {
                        address: address.to_string(),
                        source,
                    })?;
                if !available {
                    return Err(PipeError::BusyTimeout {
                        address: address.to_string(),
                        timeout,
                    });
                }
                Ok(self.connector.try_connect(address)?)
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Release the handle if held. Safe to call repeatedly.
    pub fn close(&mut self) {
        if let Some(stream) = self.stream.take() {
            drop(stream);
            debug!(address = %self.address(), "pipe closed");
        }
    }

    pub fn is_open(&self) -> bool {
        self.stream.is_some()
    }

    /// Borrow the live handle, if open.
    pub fn stream_mut(&mut self) -> Option<&mut C::Stream> {
        self.stream.as_mut()
    }

    /// Endpoint name as given to [`connect`](Self::connect).
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Override the namespace root joined onto the endpoint name.
    pub fn set_prefix(&mut self, prefix: impl Into<String>) {
        self.prefix = prefix.into();
    }

    /// Full address: `prefix + name`, or `name` alone when the prefix is disabled.
    pub fn address(&self) -> String {
        if self.config.include_address_prefix {
            format!("{}{}", self.prefix, self.name)
        } else {
            self.name.clone()
        }
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// Failed open attempts since the last `connect`/`configure`.
    pub fn attempts_made(&self) -> u32 {
        self.attempts_made
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }
}

impl<C: PipeConnector> Drop for ConnectionManager<C> {
    fn drop(&mut self) {
        self.close();
    }
}

impl<C: PipeConnector> fmt::Debug for ConnectionManager<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("transport", &self.connector.transport_name())
            .field("address", &self.address())
            .field("open", &self.is_open())
            .field("attempts_made", &self.attempts_made)
            .finish()
    }
}
