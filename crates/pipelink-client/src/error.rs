use std::time::Duration;

use pipelink_transport::PipeMode;

/// Errors that can occur in pipe client operations.
///
/// Display text is meant for operators and carries the OS error code
/// (`os error N`) whenever the failure came from below this crate.
#[derive(Debug, thiserror::Error)]
pub enum PipeError {
    /// A single open attempt failed at the transport.
    #[error(transparent)]
    Transport(#[from] pipelink_transport::TransportError),

    /// The endpoint stayed busy for the whole wait.
    #[error("pipe {address} is still busy after {timeout:?}")]
    BusyTimeout { address: String, timeout: Duration },

    /// Waiting on a busy endpoint failed.
    #[error("failed waiting for pipe {address}: {source}")]
    Wait {
        address: String,
        source: std::io::Error,
    },

    /// Every open attempt failed.
    #[error("gave up connecting to {address} after {attempts} attempts: {last}")]
    AttemptsExhausted {
        address: String,
        attempts: u32,
        last: Box<PipeError>,
    },

    /// The lazy open inside a send or receive failed.
    #[error("failed to open the pipe: {0}")]
    OpenFailed(Box<PipeError>),

    /// Applying the read mode to the handle failed.
    #[error("failed to set pipe handle state to {mode} mode: {source}")]
    SetMode {
        mode: PipeMode,
        source: std::io::Error,
    },

    /// Frame-level I/O failure.
    #[error(transparent)]
    Frame(#[from] pipelink_frame::FrameError),
}

impl PipeError {
    /// The OS error code behind this failure, if any.
    pub fn raw_os_error(&self) -> Option<i32> {
        match self {
            PipeError::Transport(err) => err.raw_os_error(),
            PipeError::Wait { source, .. } | PipeError::SetMode { source, .. } => {
                source.raw_os_error()
            }
            PipeError::AttemptsExhausted { last, .. } => last.raw_os_error(),
            PipeError::OpenFailed(inner) => inner.raw_os_error(),
            PipeError::Frame(err) => err.io().raw_os_error(),
            PipeError::BusyTimeout { .. } => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, PipeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagnostics_carry_os_code() {
        let err = PipeError::Frame(pipelink_frame::FrameError::Write(
            std::io::Error::from_raw_os_error(232),
        ));
        assert_eq!(err.raw_os_error(), Some(232));
        assert!(err.to_string().contains("os error 232"));
    }

    #[test]
    fn exhausted_reports_last_failure() {
        let err = PipeError::AttemptsExhausted {
            address: "/tmp/x".to_string(),
            attempts: 3,
            last: Box::new(PipeError::BusyTimeout {
                address: "/tmp/x".to_string(),
                timeout: Duration::from_millis(5),
            }),
        };
        let text = err.to_string();
        assert!(text.contains("after 3 attempts"));
        assert!(text.contains("still busy"));
        assert_eq!(err.raw_os_error(), None);
    }
}
