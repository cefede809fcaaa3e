//! Error types for scr-client

use scr_session::{SessionError, TransportError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),
}

impl ClientError {
    /// Process exit status for this failure.
    pub fn exit_code(&self) -> u8 {
        match self {
            ClientError::InvalidConfiguration(_) | ClientError::YamlError(_) => 2,
            ClientError::Transport(_) | ClientError::Session(_) => 3,
            ClientError::IoError(_) => 1,
        }
    }
}
