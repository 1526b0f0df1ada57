//! Client error types.

use std::io;

use shiftcal_core::RosterError;
use shiftcal_providers::ProviderError;
use shiftcal_server::{ExtractError, PipelineError, ServerError};
use thiserror::Error;

use crate::secret::SecretError;

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors that can occur in the client.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Secret(#[from] SecretError),

    /// Provider error.
    #[error("provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Authentication required.
    #[error("authentication required: {0}")]
    AuthRequired(String),

    /// Roster file could not be read.
    #[error("could not read roster {path}: {source}")]
    Extract {
        path: String,
        #[source]
        source: ExtractError,
    },

    #[error(transparent)]
    Roster(#[from] RosterError),

    #[error(transparent)]
    Pipeline(PipelineError),

    /// Some planned events were not created.
    #[error("{failed} of {planned} events could not be created")]
    ImportIncomplete { failed: usize, planned: usize },

    #[error(transparent)]
    Server(#[from] ServerError),

    /// Output could not be encoded as JSON.
    #[error("JSON encoding error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl ClientError {
    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}

impl From<PipelineError> for ClientError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::Roster(e) => Self::Roster(e),
            e if e.is_auth() => Self::AuthRequired(format!(
                "{e}; run 'shiftcal auth google' first"
            )),
            e => Self::Pipeline(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn logged_out_pipeline_asks_for_login() {
        let err = ClientError::from(PipelineError::NotAuthenticated {
            provider: "google:default".to_string(),
        });
        assert!(matches!(err, ClientError::AuthRequired(_)));
        assert!(err.to_string().contains("shiftcal auth google"));
    }

    #[test]
    fn json_errors_are_not_config_errors() {
        let source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = ClientError::from(source);
        assert!(matches!(err, ClientError::Json(_)));
        assert!(err.to_string().starts_with("JSON encoding error"));
    }

    #[test]
    fn roster_errors_pass_through() {
        let err = ClientError::from(PipelineError::Roster(RosterError::person_not_found("Carol")));
        assert!(matches!(err, ClientError::Roster(RosterError::PersonNotFound { .. })));
    }
}
