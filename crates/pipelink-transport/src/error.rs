/// Errors from a single attempt to open a pipe endpoint.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// A listener exists but has no free connection slot right now.
    #[error("pipe {address} is busy")]
    Busy { address: String },

    /// The primitive returned no usable handle and no error code.
    #[error("pipe handle was invalid when connecting to {address}")]
    InvalidHandle { address: String },

    /// Failed to connect to the specified address.
    #[error("failed to connect to {address}: {source}")]
    Connect {
        address: String,
        source: std::io::Error,
    },

    /// The address is too long for the platform.
    #[error("pipe address too long ({len} bytes, max {max}): {address}")]
    AddressTooLong {
        address: String,
        len: usize,
        max: usize,
    },
}

impl TransportError {
    /// Whether this failure means "try again after waiting".
    pub fn is_busy(&self) -> bool {
        matches!(self, Self::Busy { .. })
    }

    /// The underlying OS error code, when the failure came from the OS.
    pub fn raw_os_error(&self) -> Option<i32> {
        match self {
            Self::Connect { source, .. } => source.raw_os_error(),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, TransportError>;
