/// Errors that can occur while moving framed messages over a stream.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// Reading from the stream failed.
    #[error("error whilst reading pipe data: {0}")]
    Read(std::io::Error),

    /// Writing to the stream failed.
    #[error("failed to write message: {0}")]
    Write(std::io::Error),
}

impl FrameError {
    /// The underlying I/O error.
    pub fn io(&self) -> &std::io::Error {
        match self {
            FrameError::Read(err) | FrameError::Write(err) => err,
        }
    }
}

pub type Result<T> = std::result::Result<T, FrameError>;
