//! Server error types.

use std::io;
use thiserror::Error;

use crate::extract::ExtractError;
use crate::pipeline::PipelineError;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

/// Errors that stop the server or a command built on it.
#[derive(Debug, Error)]
pub enum ServerError {
    /// IO error (listener, roster file, etc.).
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error(transparent)]
    Extract(#[from] ExtractError),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    /// Configuration error.
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl ServerError {
    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}
