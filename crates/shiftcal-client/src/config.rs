//! Client configuration.
//!
//! All settings live in a single `config.toml` file at
//! `~/.config/shiftcal/config.toml` by default.
//!
//! Credential values (`client_id`, `client_secret`) support secret references:
//! - `pass::path/in/store` is resolved via `pass show`
//! - `env::VAR_NAME` is resolved from the environment
//! - plain text is used as-is

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use shiftcal_core::{EventBuilder, MonthResolver};
use shiftcal_server::{ServerConfig, SessionStore};

use crate::error::{ClientError, ClientResult};

/// Configuration for the shiftcal client.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Google Calendar settings.
    #[cfg(feature = "google")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub google: Option<GoogleSettings>,

    /// Roster reading settings.
    pub roster: RosterSettings,

    /// Upload server settings.
    pub server: ServerSettings,
}

/// How roster headers are read.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RosterSettings {
    /// Extra month tokens, e.g. `{ "Sept" = 9 }`, on top of the German names.
    pub month_aliases: BTreeMap<String, u32>,
}

impl RosterSettings {
    /// Builds the month table: German names plus configured aliases.
    pub fn resolver(&self) -> MonthResolver {
        self.month_aliases
            .iter()
            .fold(MonthResolver::german(), |resolver, (token, month)| {
                resolver.with_alias(token, *month)
            })
    }

    /// Returns an event builder using [`Self::resolver`].
    pub fn event_builder(&self) -> EventBuilder {
        EventBuilder::new(self.resolver())
    }

    /// Checks every alias names a real month.
    pub fn validate(&self) -> ClientResult<()> {
        match self
            .month_aliases
            .iter()
            .find(|(_, month)| !(1..=12).contains(*month))
        {
            Some((token, month)) => Err(ClientError::config(format!(
                "month alias '{token}' maps to {month}, expected 1-12"
            ))),
            None => Ok(()),
        }
    }
}

/// Upload server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Address to listen on.
    pub bind: SocketAddr,

    /// Largest accepted upload in bytes.
    pub max_upload_bytes: usize,

    /// Idle seconds before an upload session is dropped.
    pub session_ttl_secs: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: shiftcal_server::default_bind(),
            max_upload_bytes: ServerConfig::DEFAULT_MAX_UPLOAD_BYTES,
            session_ttl_secs: SessionStore::DEFAULT_TTL.as_secs(),
        }
    }
}

impl ServerSettings {
    /// Converts to server configuration, with an optional bind override.
    pub fn to_server_config(&self, bind: Option<SocketAddr>) -> ServerConfig {
        ServerConfig::new(bind.unwrap_or(self.bind))
            .with_max_upload_bytes(self.max_upload_bytes)
            .with_session_ttl(Duration::from_secs(self.session_ttl_secs))
    }

    pub fn validate(&self) -> ClientResult<()> {
        if self.max_upload_bytes == 0 {
            return Err(ClientError::config("server.max_upload_bytes must be positive"));
        }
        if self.session_ttl_secs == 0 {
            return Err(ClientError::config("server.session_ttl_secs must be positive"));
        }
        Ok(())
    }
}

impl ClientConfig {
    /// Loads configuration from the default path, or defaults if it is missing.
    pub fn load() -> ClientResult<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Loads configuration from a specific path.
    pub fn load_from(path: &Path) -> ClientResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ClientError::config(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::parse(&content)
            .map_err(|e| ClientError::config(format!("{}: {}", path.display(), e)))
    }

    /// Parses configuration from TOML text.
    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Checks every section.
    pub fn validate(&self) -> ClientResult<()> {
        self.roster.validate()?;
        self.server.validate()?;
        #[cfg(feature = "google")]
        if let Some(ref google) = self.google {
            google.to_provider_config()?;
        }
        Ok(())
    }

    /// Returns the default configuration file path.
    pub fn default_path() -> PathBuf {
        Self::default_config_dir().join("config.toml")
    }

    /// Returns the default configuration directory.
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("shiftcal")
    }
}

/// Google Calendar provider settings.
///
/// Credentials (`client_id`, `client_secret`) are stored inline and support
/// secret references (`pass::…`, `env::…`).
#[cfg(feature = "google")]
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GoogleSettings {
    /// OAuth client ID (supports `pass::` and `env::` prefixes).
    pub client_id: Option<String>,

    /// OAuth client secret (supports `pass::` and `env::` prefixes).
    pub client_secret: Option<String>,

    /// Path to token storage.
    pub token_path: Option<PathBuf>,

    /// Time zone shift events are created in (default `Europe/Zurich`).
    pub time_zone: Option<String>,
}

#[cfg(feature = "google")]
impl GoogleSettings {
    /// Converts to provider configuration.
    ///
    /// Resolves credentials (expanding `pass::` / `env::` references) and
    /// builds a `GoogleConfig` suitable for the provider.
    pub fn to_provider_config(&self) -> ClientResult<shiftcal_providers::google::GoogleConfig> {
        let credentials = self.resolve_credentials()?;
        self.provider_config(credentials)
    }

    /// Builds provider configuration around already resolved credentials.
    pub fn provider_config(
        &self,
        credentials: shiftcal_providers::google::OAuthCredentials,
    ) -> ClientResult<shiftcal_providers::google::GoogleConfig> {
        use shiftcal_providers::google::GoogleConfig;

        let mut config = GoogleConfig::new(credentials);
        if let Some(ref path) = self.token_path {
            config = config.with_token_path(path);
        }
        if let Some(ref time_zone) = self.time_zone {
            config = config.with_time_zone(time_zone);
        }

        config
            .validate()
            .map_err(|e| ClientError::config(format!("[google] {e}")))?;
        Ok(config)
    }

    /// Resolves Google OAuth credentials from inline fields.
    ///
    /// Both `client_id` and `client_secret` must be set. Each value is passed
    /// through `secret::resolve()` to expand `pass::` and `env::` references.
    pub(crate) fn resolve_credentials(
        &self,
    ) -> ClientResult<shiftcal_providers::google::OAuthCredentials> {
        use shiftcal_providers::google::OAuthCredentials;

        let raw_id = self.client_id.as_deref().ok_or_else(|| {
            ClientError::config(format!(
                "Google credentials not found. Add to {}:\n  \
                 [google]\n  \
                 client_id = \"YOUR_ID.apps.googleusercontent.com\"\n  \
                 client_secret = \"YOUR_SECRET\"\n\n  \
                 Or run: shiftcal auth google --credentials-file <path>",
                ClientConfig::default_path().display()
            ))
        })?;

        let raw_secret = self.client_secret.as_deref().ok_or_else(|| {
            ClientError::config("client_secret is missing from [google] section in config.toml")
        })?;

        let resolved_id = crate::secret::resolve(raw_id)?;
        let resolved_secret = crate::secret::resolve(raw_secret)?;

        Ok(OAuthCredentials::new(resolved_id, resolved_secret))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_without_file_content() {
        let config = ClientConfig::parse("").unwrap();
        assert!(config.roster.month_aliases.is_empty());
        assert_eq!(config.server.bind.to_string(), "127.0.0.1:5000");
        assert_eq!(config.server.max_upload_bytes, 1024 * 1024);
        assert_eq!(config.server.session_ttl_secs, 3600);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn month_aliases_extend_the_german_table() {
        let config = ClientConfig::parse(
            r#"
[roster]
month_aliases = { "Sept" = 9, "März" = 3 }
"#,
        )
        .unwrap();
        let resolver = config.roster.resolver();
        assert_eq!(resolver.resolve("Sept").unwrap(), 9);
        assert_eq!(resolver.resolve("märz").unwrap(), 3);
        assert_eq!(resolver.resolve("Okt").unwrap(), 10);
        assert!(config.validate().is_ok());

        let builder = config.roster.event_builder();
        assert_eq!(builder.month_year("Sept 24").unwrap().month, 9);
    }

    #[test]
    fn month_alias_out_of_range_is_invalid() {
        let config = ClientConfig::parse("[roster]\nmonth_aliases = { Foo = 13 }\n").unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("Foo"));
    }

    #[test]
    fn server_settings_override_and_bind_flag() {
        let config = ClientConfig::parse(
            r#"
[server]
bind = "0.0.0.0:8000"
max_upload_bytes = 2048
session_ttl_secs = 60
"#,
        )
        .unwrap();

        let server = config.server.to_server_config(None);
        assert_eq!(server.bind.port(), 8000);
        assert_eq!(server.max_upload_bytes, 2048);
        assert_eq!(server.session_ttl, Duration::from_secs(60));

        let flag = "127.0.0.1:9000".parse().unwrap();
        assert_eq!(config.server.to_server_config(Some(flag)).bind, flag);
    }

    #[test]
    fn zero_upload_limit_is_invalid() {
        let config = ClientConfig::parse("[server]\nmax_upload_bytes = 0\n").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn load_from_reports_the_path() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(&path, "[server]\nbind = 5\n").unwrap();

        let err = ClientConfig::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("config.toml"));

        let missing = ClientConfig::load_from(&tmp.path().join("nope.toml")).unwrap_err();
        assert!(matches!(missing, ClientError::Config(_)));
    }

    #[cfg(feature = "google")]
    mod google {
        use super::*;

        #[test]
        fn resolve_credentials_plain_text() {
            let settings = GoogleSettings {
                client_id: Some("test-id.apps.googleusercontent.com".to_string()),
                client_secret: Some("test-secret".to_string()),
                ..Default::default()
            };
            let creds = settings.resolve_credentials().unwrap();
            assert_eq!(creds.client_id, "test-id.apps.googleusercontent.com");
            assert_eq!(creds.client_secret, "test-secret");
        }

        #[test]
        fn resolve_credentials_env_prefix() {
            unsafe {
                std::env::set_var(
                    "_SHIFTCAL_TEST_CLIENT_ID",
                    "env-id.apps.googleusercontent.com",
                );
                std::env::set_var("_SHIFTCAL_TEST_CLIENT_SECRET", "env-secret");
            }

            let settings = GoogleSettings {
                client_id: Some("env::_SHIFTCAL_TEST_CLIENT_ID".to_string()),
                client_secret: Some("env::_SHIFTCAL_TEST_CLIENT_SECRET".to_string()),
                ..Default::default()
            };
            let creds = settings.resolve_credentials().unwrap();
            assert_eq!(creds.client_id, "env-id.apps.googleusercontent.com");
            assert_eq!(creds.client_secret, "env-secret");

            unsafe {
                std::env::remove_var("_SHIFTCAL_TEST_CLIENT_ID");
                std::env::remove_var("_SHIFTCAL_TEST_CLIENT_SECRET");
            }
        }

        #[test]
        fn missing_credentials_error() {
            let settings = GoogleSettings {
                client_secret: Some("secret".to_string()),
                ..Default::default()
            };
            let err = settings.resolve_credentials().unwrap_err();
            assert!(err.to_string().contains("credentials not found"));

            let settings = GoogleSettings {
                client_id: Some("id.apps.googleusercontent.com".to_string()),
                ..Default::default()
            };
            let err = settings.resolve_credentials().unwrap_err();
            assert!(err.to_string().contains("client_secret"));
        }

        #[test]
        fn to_provider_config_applies_settings() {
            let settings = GoogleSettings {
                client_id: Some("test.apps.googleusercontent.com".to_string()),
                client_secret: Some("test-secret".to_string()),
                token_path: Some(PathBuf::from("/tmp/shiftcal-tokens.json")),
                time_zone: Some("Europe/Berlin".to_string()),
            };
            let config = settings.to_provider_config().unwrap();
            assert_eq!(config.credentials.client_id, "test.apps.googleusercontent.com");
            assert_eq!(config.token_path, PathBuf::from("/tmp/shiftcal-tokens.json"));
            assert_eq!(config.time_zone, "Europe/Berlin");
        }

        #[test]
        fn default_time_zone_is_zurich() {
            let config = ClientConfig::parse(
                r#"
[google]
client_id = "toml-id.apps.googleusercontent.com"
client_secret = "toml-secret"
"#,
            )
            .unwrap();
            let provider_config = config.google.unwrap().to_provider_config().unwrap();
            assert_eq!(provider_config.time_zone, "Europe/Zurich");
        }

        #[test]
        fn invalid_client_id_fails_validation() {
            let config = ClientConfig::parse(
                "[google]\nclient_id = \"not-google\"\nclient_secret = \"s\"\n",
            )
            .unwrap();
            assert!(config.validate().is_err());
        }
    }
}
