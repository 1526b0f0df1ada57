//! Error types for calendar access.
//!
//! Every failure talking to a calendar backend is a [`ProviderError`]
//! tagged with a [`ProviderErrorCode`]. Authentication codes
//! ([`ProviderError::is_auth`]) mean the user must log in again; everything
//! else is an API failure for the one operation that raised it.

use std::fmt;
use thiserror::Error;

/// The category of a provider error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderErrorCode {
    /// Not logged in, or credentials are invalid/expired.
    AuthenticationFailed,
    /// Logged in, but not allowed to touch this calendar.
    AuthorizationFailed,
    /// Connection failed, timed out, DNS resolution, etc.
    NetworkError,
    /// Too many requests.
    RateLimited,
    /// The server returned a 5xx status.
    ServerError,
    /// The response could not be parsed.
    InvalidResponse,
    /// Calendar or resource not found (404).
    NotFound,
    /// The request was rejected as invalid (400).
    BadRequest,
    /// Missing or invalid configuration.
    ConfigurationError,
    /// Calendar-level problem, e.g. an account without calendars.
    CalendarError,
    /// Unexpected provider state.
    InternalError,
}

impl ProviderErrorCode {
    /// Returns true if the operation may succeed when retried.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::NetworkError | Self::RateLimited | Self::ServerError
        )
    }

    /// Returns true if the user has to (re-)authenticate.
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::AuthenticationFailed)
    }

    /// Returns a stable machine-readable name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AuthenticationFailed => "authentication_failed",
            Self::AuthorizationFailed => "authorization_failed",
            Self::NetworkError => "network_error",
            Self::RateLimited => "rate_limited",
            Self::ServerError => "server_error",
            Self::InvalidResponse => "invalid_response",
            Self::NotFound => "not_found",
            Self::BadRequest => "bad_request",
            Self::ConfigurationError => "configuration_error",
            Self::CalendarError => "calendar_error",
            Self::InternalError => "internal_error",
        }
    }
}

impl fmt::Display for ProviderErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An error raised by a calendar provider.
#[derive(Debug, Error)]
pub struct ProviderError {
    code: ProviderErrorCode,
    message: String,
    /// The provider that raised the error (e.g. `"google:default"`).
    provider: Option<String>,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl ProviderError {
    /// Creates a new provider error with the given code and message.
    pub fn new(code: ProviderErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            provider: None,
            source: None,
        }
    }

    /// Creates an authentication error.
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::AuthenticationFailed, message)
    }

    /// Creates an authorization error.
    pub fn authorization(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::AuthorizationFailed, message)
    }

    /// Creates a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::NetworkError, message)
    }

    /// Creates a rate limit error.
    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::RateLimited, message)
    }

    /// Creates a server error.
    pub fn server(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::ServerError, message)
    }

    /// Creates an invalid response error.
    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::InvalidResponse, message)
    }

    /// Creates a not found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::NotFound, message)
    }

    /// Creates a bad request error.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::BadRequest, message)
    }

    /// Creates a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::ConfigurationError, message)
    }

    /// Creates a calendar-level error.
    pub fn calendar(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::CalendarError, message)
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::InternalError, message)
    }

    /// Sets the provider name.
    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    /// Sets the underlying cause.
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.source = Some(Box::new(source));
        self
    }

    /// Returns the error code.
    pub fn code(&self) -> ProviderErrorCode {
        self.code
    }

    /// Returns the error message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the provider name, if set.
    pub fn provider(&self) -> Option<&str> {
        self.provider.as_deref()
    }

    /// Returns true if the operation may succeed when retried.
    pub fn is_retryable(&self) -> bool {
        self.code.is_retryable()
    }

    /// Returns true if the user has to (re-)authenticate.
    pub fn is_auth(&self) -> bool {
        self.code.is_auth()
    }

    /// Copies code, message and provider; the source is not carried over.
    pub fn duplicate(&self) -> Self {
        Self {
            code: self.code,
            message: self.message.clone(),
            provider: self.provider.clone(),
            source: None,
        }
    }
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ref provider) = self.provider {
            write!(f, "[{}] ", provider)?;
        }
        write!(f, "{}: {}", self.code, self.message)
    }
}

/// Result type for provider operations.
pub type ProviderResult<T> = Result<T, ProviderError>;
