//! Google Calendar backend.
//!
//! Users bring their own OAuth client (a `credentials.json` from the Google
//! Cloud Console). Login runs once in the browser via a PKCE loopback flow
//! and the tokens are kept on disk for later runs.
//!
//! ```ignore
//! use shiftcal_providers::google::{GoogleConfig, GoogleProvider, OAuthCredentials};
//!
//! let credentials = OAuthCredentials::from_file("credentials.json")?;
//! let provider = GoogleProvider::new(GoogleConfig::new(credentials))?;
//! if !provider.is_authenticated() {
//!     provider.authenticate().await?;
//! }
//! let calendars = provider.list_writable_calendars().await?;
//! ```

mod client;
mod config;
mod oauth;
mod provider;
mod tokens;

pub use client::{CalendarListEntry, GoogleCalendarClient};
pub use config::{GoogleConfig, OAuthCredentials};
pub use oauth::{OAuthClient, PkceFlow};
pub use provider::GoogleProvider;
pub use tokens::{TokenInfo, TokenStorage};
