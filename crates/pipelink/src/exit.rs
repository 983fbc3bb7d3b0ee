use std::fmt;
use std::io;

use pipelink_client::PipeError;
use pipelink_frame::FrameError;
use pipelink_transport::TransportError;

// Exit codes shared across the pipelink tools.
pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const TRANSPORT_ERROR: i32 = 3;
pub const PERMISSION_DENIED: i32 = 50;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const TIMEOUT: i32 = 124;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    CliError::new(io_code(&err), format!("{context}: {err}"))
}

fn io_code(err: &io::Error) -> i32 {
    match err.kind() {
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => TIMEOUT,
        io::ErrorKind::ConnectionRefused
        | io::ErrorKind::NotFound
        | io::ErrorKind::BrokenPipe
        | io::ErrorKind::ConnectionReset => FAILURE,
        io::ErrorKind::Unsupported | io::ErrorKind::InvalidInput => DATA_INVALID,
        _ => INTERNAL,
    }
}

fn transport_code(err: &TransportError) -> i32 {
    match err {
        TransportError::Connect { source, .. } => io_code(source),
        TransportError::AddressTooLong { .. } => USAGE,
        TransportError::Busy { .. } => TIMEOUT,
        TransportError::InvalidHandle { .. } => TRANSPORT_ERROR,
    }
}

fn frame_code(err: &FrameError) -> i32 {
    io_code(err.io())
}

fn pipe_code(err: &PipeError) -> i32 {
    match err {
        PipeError::OpenFailed(inner) => pipe_code(inner),
        PipeError::AttemptsExhausted { .. } => TRANSPORT_ERROR,
        PipeError::BusyTimeout { .. } => TIMEOUT,
        PipeError::Transport(err) => transport_code(err),
        PipeError::Wait { source, .. } => io_code(source),
        PipeError::SetMode { source, .. } => match source.kind() {
            io::ErrorKind::Unsupported => USAGE,
            _ => TRANSPORT_ERROR,
        },
        PipeError::Frame(err) => frame_code(err),
    }
}

pub fn pipe_error(context: &str, err: PipeError) -> CliError {
    CliError::new(pipe_code(&err), format!("{context}: {err}"))
}
