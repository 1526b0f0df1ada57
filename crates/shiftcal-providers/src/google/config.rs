//! Google Calendar provider configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

/// OAuth 2.0 client credentials from the Google Cloud Console.
#[derive(Debug, Clone)]
pub struct OAuthCredentials {
    pub client_id: String,
    pub client_secret: String,
}

/// Layout of a Google credentials JSON download.
///
/// Accepts the Cloud Console format (an `installed` or `web` section) and
/// the flat format with `client_id`/`client_secret` at the root.
#[derive(Debug, Deserialize)]
struct CredentialsFile {
    installed: Option<ClientSection>,
    web: Option<ClientSection>,
    client_id: Option<String>,
    client_secret: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ClientSection {
    client_id: String,
    client_secret: String,
}

impl OAuthCredentials {
    /// Creates new OAuth credentials.
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }

    /// Loads credentials from a downloaded `credentials.json`.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, String> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| format!("failed to read credentials file: {}", e))?;
        Self::from_json(&content)
    }

    /// Parses credentials from a Google credentials JSON string.
    pub fn from_json(json: &str) -> Result<Self, String> {
        let file: CredentialsFile = serde_json::from_str(json)
            .map_err(|e| format!("failed to parse credentials JSON: {}", e))?;

        if let Some(section) = file.installed.or(file.web) {
            return Ok(Self::new(section.client_id, section.client_secret));
        }

        match (file.client_id, file.client_secret) {
            (Some(id), Some(secret)) => Ok(Self::new(id, secret)),
            _ => Err(
                "credentials file needs an 'installed'/'web' section or root-level 'client_id'/'client_secret'"
                    .to_string(),
            ),
        }
    }

    /// Checks the credentials look like a Google OAuth client.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.client_id.is_empty() {
            return Err("client_id is required");
        }
        if !self.client_id.ends_with(".apps.googleusercontent.com") {
            return Err("client_id should end with .apps.googleusercontent.com");
        }
        if self.client_secret.is_empty() {
            return Err("client_secret is required");
        }
        Ok(())
    }
}

/// Configuration for the Google Calendar provider.
#[derive(Debug, Clone)]
pub struct GoogleConfig {
    /// Account name, used to keep several logins apart. Defaults to `"default"`.
    pub account_name: String,

    pub credentials: OAuthCredentials,

    /// Where OAuth tokens are persisted.
    ///
    /// Defaults to `~/.local/share/shiftcal/google-tokens-{account}.json`.
    pub token_path: PathBuf,

    /// The single time zone all shift events are created in.
    pub time_zone: String,

    pub timeout: Duration,

    /// Ports tried, in order, for the OAuth loopback redirect.
    pub loopback_port_range: (u16, u16),

    /// OAuth scopes to request.
    pub scopes: Vec<String>,
}

impl GoogleConfig {
    /// Default timeout in seconds.
    pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

    /// Read/write access to calendars and events.
    pub const DEFAULT_SCOPE: &'static str = "https://www.googleapis.com/auth/calendar";

    /// Time zone of the rosters this tool was written for.
    pub const DEFAULT_TIME_ZONE: &'static str = "Europe/Zurich";

    /// Creates a new Google configuration with the given credentials.
    pub fn new(credentials: OAuthCredentials) -> Self {
        Self {
            account_name: "default".to_string(),
            credentials,
            token_path: Self::default_token_path("default"),
            time_zone: Self::DEFAULT_TIME_ZONE.to_string(),
            timeout: Duration::from_secs(Self::DEFAULT_TIMEOUT_SECS),
            loopback_port_range: (8080, 8090),
            scopes: vec![Self::DEFAULT_SCOPE.to_string()],
        }
    }

    /// Returns the default token path for an account.
    pub fn default_token_path(account_name: &str) -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("shiftcal")
            .join(format!("google-tokens-{}.json", account_name))
    }

    /// Sets the account name, moving a default token path along with it.
    pub fn with_account_name(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        if self.token_path == Self::default_token_path(&self.account_name) {
            self.token_path = Self::default_token_path(&name);
        }
        self.account_name = name;
        self
    }

    /// Returns the provider name for this account (e.g. `"google:work"`).
    pub fn provider_name(&self) -> String {
        format!("google:{}", self.account_name)
    }

    /// Sets the token storage path.
    pub fn with_token_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.token_path = path.into();
        self
    }

    /// Sets the event time zone.
    pub fn with_time_zone(mut self, time_zone: impl Into<String>) -> Self {
        self.time_zone = time_zone.into();
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the loopback port range for OAuth.
    pub fn with_loopback_port_range(mut self, start: u16, end: u16) -> Self {
        self.loopback_port_range = (start, end);
        self
    }

    /// Sets the OAuth scopes.
    pub fn with_scopes(mut self, scopes: Vec<String>) -> Self {
        self.scopes = scopes;
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), String> {
        self.credentials
            .validate()
            .map_err(|e| format!("invalid credentials: {}", e))?;

        if self.scopes.is_empty() {
            return Err("at least one OAuth scope is required".to_string());
        }

        if self.time_zone.trim().is_empty() {
            return Err("time_zone must not be empty".to_string());
        }

        if self.loopback_port_range.0 > self.loopback_port_range.1 {
            return Err("invalid loopback port range".to_string());
        }

        Ok(())
    }
}
