//! Server configuration.

use std::net::SocketAddr;
use std::time::Duration;

use crate::session::SessionStore;

/// HTTP upload server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to listen on.
    pub bind: SocketAddr,

    /// Largest accepted request body; bigger uploads get 413.
    pub max_upload_bytes: usize,

    /// Idle time before a session is dropped.
    pub session_ttl: Duration,
}

impl ServerConfig {
    /// Default upload cap (1 MiB).
    pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 1024 * 1024;

    pub fn new(bind: SocketAddr) -> Self {
        Self {
            bind,
            ..Default::default()
        }
    }

    /// Builder: set the upload size cap.
    pub fn with_max_upload_bytes(mut self, bytes: usize) -> Self {
        self.max_upload_bytes = bytes;
        self
    }

    /// Builder: set the session idle TTL.
    pub fn with_session_ttl(mut self, ttl: Duration) -> Self {
        self.session_ttl = ttl;
        self
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            max_upload_bytes: Self::DEFAULT_MAX_UPLOAD_BYTES,
            session_ttl: SessionStore::DEFAULT_TTL,
        }
    }
}

/// Returns the default listen address, `127.0.0.1:5000`.
pub fn default_bind() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 5000))
}
