use thiserror::Error;

/// Transport failure. Only [`TransportError::Timeout`] is retryable.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Receive timed out")]
    Timeout,

    #[error("Server address {0} did not resolve")]
    Resolve(String),

    #[error("Transport I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl TransportError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, TransportError::Timeout)
    }
}

#[derive(Error, Debug)]
pub enum RecorderError {
    #[error("Recorder I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to encode record: {0}")]
    Encode(String),

    #[error("No episode is open")]
    NoEpisode,

    #[error("Invalid dataset file: {0}")]
    InvalidFile(String),
}

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Transport failed: {0}")]
    Transport(#[from] TransportError),
}

pub type SessionResult<T> = Result<T, SessionError>;
