use std::fmt;

use crate::error::PipeError;

/// Flattened `(success, message)` view of a client call.
///
/// On success `message` is the received payload or the send report; on
/// failure it is the error's diagnostic text. Check `success` before
/// treating `message` as payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipeStatusResponse {
    pub success: bool,
    pub message: String,
}

impl PipeStatusResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }

    pub fn into_tuple(self) -> (bool, String) {
        (self.success, self.message)
    }
}

impl<T: fmt::Display> From<Result<T, PipeError>> for PipeStatusResponse {
    fn from(result: Result<T, PipeError>) -> Self {
        match result {
            Ok(value) => Self::ok(value.to_string()),
            Err(err) => Self::failed(err.to_string()),
        }
    }
}

impl From<PipeStatusResponse> for (bool, String) {
    fn from(status: PipeStatusResponse) -> Self {
        status.into_tuple()
    }
}

impl fmt::Display for PipeStatusResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = if self.success { "ok" } else { "error" };
        write!(f, "{tag}: {}", self.message)
    }
}
