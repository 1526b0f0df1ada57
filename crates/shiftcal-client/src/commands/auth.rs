//! Authentication commands.

use std::path::{Path, PathBuf};

use shiftcal_providers::CalendarAccess;
use shiftcal_providers::google::{GoogleProvider, OAuthCredentials};
use tracing::{info, warn};

use crate::config::{ClientConfig, GoogleSettings};
use crate::error::{ClientError, ClientResult};

/// Options of `shiftcal auth google`.
#[derive(Debug, Default)]
pub struct GoogleAuthArgs {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub credentials_file: Option<PathBuf>,
    pub force: bool,
    pub logout: bool,
}

/// Run the Google authentication flow.
///
/// Resolves credentials from CLI flags, a `--credentials-file`, or
/// `config.toml`, then runs the OAuth 2.0 PKCE flow.
///
/// When credentials are provided via CLI or `--credentials-file`, they are
/// persisted to `config.toml` so later commands and the server find them.
pub async fn google(
    args: GoogleAuthArgs,
    config: &ClientConfig,
    config_path: &Path,
) -> ClientResult<()> {
    let settings = config.google.clone().unwrap_or_default();

    let (credentials, source) = resolve_google_credentials(
        args.client_id,
        args.client_secret,
        args.credentials_file,
        config.google.as_ref(),
    )?;
    credentials
        .validate()
        .map_err(|e| ClientError::config(format!("invalid Google credentials: {}", e)))?;

    let provider = GoogleProvider::new(settings.provider_config(credentials.clone())?)?;

    if args.logout {
        provider.logout().await?;
        println!("Logged out of Google Calendar.");
        return Ok(());
    }

    if provider.is_authenticated() && !provider.needs_reauth() && !args.force {
        persist_if_new(&credentials, source, config_path);
        println!("Already authenticated with Google Calendar.");
        println!("Use --force to re-authenticate.");
        return Ok(());
    }

    println!("Starting Google Calendar authentication...");
    println!();
    println!("A browser window will open for you to authorize access.");
    println!("If the browser doesn't open, check the terminal for a URL to copy.");
    println!();

    provider.authenticate().await?;
    persist_if_new(&credentials, source, config_path);

    info!("Google authentication successful");
    println!();
    println!("Authentication successful!");
    println!("You can now import shifts with 'shiftcal import'.");

    Ok(())
}

/// Where the credentials were resolved from.
#[derive(Debug, Clone, Copy, PartialEq)]
enum CredentialSource {
    /// From CLI flags (--client-id/--client-secret or --credentials-file)
    Cli,
    /// From config.toml (already persisted)
    Config,
}

/// Saves CLI-supplied credentials; failures are reported, not fatal.
fn persist_if_new(credentials: &OAuthCredentials, source: CredentialSource, config_path: &Path) {
    if source == CredentialSource::Config {
        return;
    }
    match save_credentials(config_path, &credentials.client_id, &credentials.client_secret) {
        Ok(()) => {
            info!(path = %config_path.display(), "credentials saved");
            println!("Credentials saved to {}", config_path.display());
        }
        Err(e) => warn!(path = %config_path.display(), error = %e, "could not save credentials"),
    }
}

/// Writes credentials under `[google]`, keeping everything else in the file.
fn save_credentials(config_path: &Path, client_id: &str, client_secret: &str) -> ClientResult<()> {
    let content = if config_path.exists() {
        std::fs::read_to_string(config_path)?
    } else {
        String::new()
    };

    let updated = with_credentials(&content, client_id, client_secret)?;

    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(config_path, updated)?;
    Ok(())
}

/// Returns `content` with `[google] client_id/client_secret` set.
fn with_credentials(content: &str, client_id: &str, client_secret: &str) -> ClientResult<String> {
    let mut doc = content
        .parse::<toml_edit::DocumentMut>()
        .map_err(|e| ClientError::config(format!("could not parse config.toml: {}", e)))?;

    if !doc.contains_key("google") {
        doc["google"] = toml_edit::Item::Table(toml_edit::Table::new());
    }

    let google = doc["google"]
        .as_table_mut()
        .ok_or_else(|| ClientError::config("[google] in config.toml is not a table"))?;
    google["client_id"] = toml_edit::value(client_id);
    google["client_secret"] = toml_edit::value(client_secret);

    Ok(doc.to_string())
}

/// Resolves Google credentials from multiple sources.
///
/// Priority (highest to lowest):
/// 1. CLI `--client-id` + `--client-secret`
/// 2. CLI `--credentials-file` (Google Cloud Console JSON)
/// 3. `config.toml` `[google]` section (client_id + client_secret, with secret resolution)
fn resolve_google_credentials(
    cli_client_id: Option<String>,
    cli_client_secret: Option<String>,
    cli_credentials_file: Option<PathBuf>,
    config_google: Option<&GoogleSettings>,
) -> ClientResult<(OAuthCredentials, CredentialSource)> {
    if let (Some(id), Some(secret)) = (&cli_client_id, &cli_client_secret) {
        return Ok((OAuthCredentials::new(id, secret), CredentialSource::Cli));
    }

    if let Some(ref path) = cli_credentials_file {
        let creds = OAuthCredentials::from_file(path).map_err(|e| {
            ClientError::config(format!(
                "failed to load credentials from {}: {}",
                path.display(),
                e
            ))
        })?;
        return Ok((creds, CredentialSource::Cli));
    }

    if let Some(google) = config_google
        && google.client_id.is_some()
        && google.client_secret.is_some()
    {
        return Ok((google.resolve_credentials()?, CredentialSource::Config));
    }

    if cli_client_id.is_some() || cli_client_secret.is_some() {
        return Err(ClientError::config(
            "both --client-id and --client-secret are required when providing credentials directly",
        ));
    }

    Err(ClientError::config(format!(
        "Google credentials are required. Provide via:\n  \
         - client_id + client_secret in {}\n  \
         - --client-id and --client-secret flags\n  \
         - --credentials-file flag (path to Google Cloud Console JSON)\n  \
         - GOOGLE_CLIENT_ID and GOOGLE_CLIENT_SECRET env vars",
        ClientConfig::default_path().display()
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_credentials_from_cli() {
        let (creds, source) = resolve_google_credentials(
            Some("cli-id.apps.googleusercontent.com".to_string()),
            Some("cli-secret".to_string()),
            None,
            None,
        )
        .unwrap();
        assert_eq!(creds.client_id, "cli-id.apps.googleusercontent.com");
        assert_eq!(creds.client_secret, "cli-secret");
        assert_eq!(source, CredentialSource::Cli);
    }

    #[test]
    fn resolve_credentials_cli_overrides_config() {
        let settings = GoogleSettings {
            client_id: Some("config-id.apps.googleusercontent.com".to_string()),
            client_secret: Some("config-secret".to_string()),
            ..Default::default()
        };

        let (creds, source) =
            resolve_google_credentials(None, None, None, Some(&settings)).unwrap();
        assert_eq!(creds.client_id, "config-id.apps.googleusercontent.com");
        assert_eq!(source, CredentialSource::Config);

        let (creds, source) = resolve_google_credentials(
            Some("cli-id.apps.googleusercontent.com".to_string()),
            Some("cli-secret".to_string()),
            None,
            Some(&settings),
        )
        .unwrap();
        assert_eq!(creds.client_id, "cli-id.apps.googleusercontent.com");
        assert_eq!(source, CredentialSource::Cli);
    }

    #[test]
    fn partial_or_missing_credentials_fail() {
        assert!(
            resolve_google_credentials(
                Some("id.apps.googleusercontent.com".to_string()),
                None,
                None,
                None,
            )
            .is_err()
        );
        assert!(resolve_google_credentials(None, Some("secret".to_string()), None, None).is_err());
        assert!(resolve_google_credentials(None, None, None, None).is_err());
    }

    #[test]
    fn resolve_credentials_from_cli_credentials_file() {
        let tmp = tempfile::tempdir().unwrap();
        let creds_path = tmp.path().join("creds.json");
        std::fs::write(
            &creds_path,
            r#"{
                "installed": {
                    "client_id": "file-id.apps.googleusercontent.com",
                    "client_secret": "file-secret"
                }
            }"#,
        )
        .unwrap();

        let (creds, source) =
            resolve_google_credentials(None, None, Some(creds_path), None).unwrap();
        assert_eq!(creds.client_id, "file-id.apps.googleusercontent.com");
        assert_eq!(creds.client_secret, "file-secret");
        assert_eq!(source, CredentialSource::Cli);
    }

    #[test]
    fn saving_credentials_keeps_other_settings() {
        let tmp = tempfile::tempdir().unwrap();
        let config_path = tmp.path().join("nested").join("config.toml");
        std::fs::create_dir_all(config_path.parent().unwrap()).unwrap();
        std::fs::write(
            &config_path,
            "# my roster tweaks\n[roster]\nmonth_aliases = { Sept = 9 }\n",
        )
        .unwrap();

        save_credentials(&config_path, "test.apps.googleusercontent.com", "test-secret").unwrap();

        let written = std::fs::read_to_string(&config_path).unwrap();
        assert!(written.starts_with("# my roster tweaks"));

        let reloaded = ClientConfig::load_from(&config_path).unwrap();
        let google = reloaded.google.unwrap();
        assert_eq!(
            google.client_id.as_deref(),
            Some("test.apps.googleusercontent.com")
        );
        assert_eq!(google.client_secret.as_deref(), Some("test-secret"));
        assert_eq!(reloaded.roster.month_aliases.get("Sept"), Some(&9));
    }

    #[test]
    fn saving_credentials_creates_the_file() {
        let tmp = tempfile::tempdir().unwrap();
        let config_path = tmp.path().join("shiftcal").join("config.toml");

        save_credentials(&config_path, "new.apps.googleusercontent.com", "s").unwrap();
        let reloaded = ClientConfig::load_from(&config_path).unwrap();
        assert!(reloaded.google.is_some());
    }

    #[test]
    fn non_table_google_key_is_rejected() {
        assert!(with_credentials("google = 5\n", "id", "secret").is_err());
    }

    #[test]
    fn config_sourced_credentials_are_not_rewritten() {
        let tmp = tempfile::tempdir().unwrap();
        let config_path = tmp.path().join("config.toml");
        let creds = OAuthCredentials::new("id.apps.googleusercontent.com", "secret");

        persist_if_new(&creds, CredentialSource::Config, &config_path);
        assert!(!config_path.exists());

        persist_if_new(&creds, CredentialSource::Cli, &config_path);
        assert!(config_path.exists());
    }
}
