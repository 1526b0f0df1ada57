//! OAuth token persistence.
//!
//! Tokens live in a JSON file readable only by the user. The storage keeps
//! an in-memory copy so the provider can check expiry without touching disk.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{ProviderError, ProviderResult};

/// Seconds shaved off the reported lifetime so tokens refresh early.
const EXPIRY_MARGIN_SECS: i64 = 60;

/// A set of OAuth tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenInfo {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    /// Scopes granted with this token.
    pub scopes: Vec<String>,
    pub last_refresh: DateTime<Utc>,
}

fn expiry(expires_in_secs: Option<i64>) -> Option<DateTime<Utc>> {
    expires_in_secs
        .map(|secs| Utc::now() + Duration::seconds(secs) - Duration::seconds(EXPIRY_MARGIN_SECS))
}

impl TokenInfo {
    /// Creates token info from a token endpoint response.
    pub fn new(
        access_token: impl Into<String>,
        refresh_token: Option<String>,
        expires_in_secs: Option<i64>,
        scopes: Vec<String>,
    ) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token,
            expires_at: expiry(expires_in_secs),
            scopes,
            last_refresh: Utc::now(),
        }
    }

    /// Returns true if the access token is expired or about to expire.
    ///
    /// Tokens without an expiry never expire.
    pub fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| Utc::now() >= at)
    }

    /// Returns true if every required scope was granted.
    pub fn has_scopes(&self, required: &[String]) -> bool {
        required.iter().all(|scope| self.scopes.contains(scope))
    }

    /// Replaces the access token after a refresh.
    pub fn update_access_token(
        &mut self,
        access_token: impl Into<String>,
        expires_in_secs: Option<i64>,
    ) {
        self.access_token = access_token.into();
        self.expires_at = expiry(expires_in_secs);
        self.last_refresh = Utc::now();
    }
}

/// File-backed token storage.
#[derive(Debug)]
pub struct TokenStorage {
    path: PathBuf,
    tokens: RwLock<Option<TokenInfo>>,
}

impl TokenStorage {
    /// Creates storage at the given path; nothing is read yet.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            tokens: RwLock::new(None),
        }
    }

    /// Loads tokens from disk.
    ///
    /// Returns `Ok(false)` when there is no token file.
    pub fn load(&self) -> ProviderResult<bool> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "no token file");
            return Ok(false);
        }

        let content = fs::read_to_string(&self.path).map_err(|e| {
            ProviderError::configuration(format!("failed to read token file: {}", e))
        })?;
        let tokens: TokenInfo = serde_json::from_str(&content).map_err(|e| {
            ProviderError::configuration(format!("failed to parse token file: {}", e))
        })?;

        info!(path = %self.path.display(), "loaded tokens");
        *self.tokens.write().unwrap_or_else(PoisonError::into_inner) = Some(tokens);
        Ok(true)
    }

    /// Writes the current tokens to disk via a temp file and rename.
    pub fn save(&self) -> ProviderResult<()> {
        let content = {
            let tokens = self.tokens.read().unwrap_or_else(PoisonError::into_inner);
            let tokens = tokens
                .as_ref()
                .ok_or_else(|| ProviderError::internal("no tokens to save"))?;
            serde_json::to_string_pretty(tokens).map_err(|e| {
                ProviderError::internal(format!("failed to serialize tokens: {}", e))
            })?
        };

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                ProviderError::configuration(format!("failed to create token directory: {}", e))
            })?;
        }

        let temp_path = self.path.with_extension("json.tmp");
        fs::write(&temp_path, &content).map_err(|e| {
            ProviderError::configuration(format!("failed to write token file: {}", e))
        })?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let _ = fs::set_permissions(&temp_path, fs::Permissions::from_mode(0o600));
        }

        fs::rename(&temp_path, &self.path).map_err(|e| {
            ProviderError::configuration(format!("failed to rename token file: {}", e))
        })?;

        debug!(path = %self.path.display(), "saved tokens");
        Ok(())
    }

    /// Returns a copy of the current tokens.
    pub fn get(&self) -> Option<TokenInfo> {
        self.tokens
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replaces the tokens and saves them.
    pub fn set(&self, tokens: TokenInfo) -> ProviderResult<()> {
        *self.tokens.write().unwrap_or_else(PoisonError::into_inner) = Some(tokens);
        self.save()
    }

    /// Updates the access token after a refresh and saves.
    pub fn update_access_token(
        &self,
        access_token: impl Into<String>,
        expires_in_secs: Option<i64>,
    ) -> ProviderResult<()> {
        {
            let mut tokens = self.tokens.write().unwrap_or_else(PoisonError::into_inner);
            let tokens = tokens
                .as_mut()
                .ok_or_else(|| ProviderError::internal("no tokens to update"))?;
            tokens.update_access_token(access_token, expires_in_secs);
        }
        self.save()
    }

    /// Forgets the tokens in memory and deletes the file.
    pub fn clear(&self) -> ProviderResult<()> {
        *self.tokens.write().unwrap_or_else(PoisonError::into_inner) = None;
        if self.path.exists() {
            fs::remove_file(&self.path).map_err(|e| {
                ProviderError::configuration(format!("failed to remove token file: {}", e))
            })?;
            info!(path = %self.path.display(), "cleared tokens");
        }
        Ok(())
    }

    /// Returns the token file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns true if re-authentication is needed for these scopes.
    pub fn needs_reauth(&self, required_scopes: &[String]) -> bool {
        match self
            .tokens
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
        {
            None => true,
            Some(tokens) => !tokens.has_scopes(required_scopes),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scope() -> Vec<String> {
        vec!["https://www.googleapis.com/auth/calendar".to_string()]
    }

    #[test]
    fn fresh_token_is_not_expired() {
        let token = TokenInfo::new("access", Some("refresh".to_string()), Some(3600), scope());
        assert!(!token.is_expired());
        assert!(token.expires_at.is_some());
    }

    #[test]
    fn short_lived_token_counts_as_expired() {
        // Shorter than the refresh margin.
        let token = TokenInfo::new("access", None, Some(30), scope());
        assert!(token.is_expired());
    }

    #[test]
    fn token_without_expiry_never_expires() {
        let token = TokenInfo::new("access", None, None, scope());
        assert!(!token.is_expired());
    }

    #[test]
    fn save_load_and_clear() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("tokens.json");

        let storage = TokenStorage::new(&path);
        storage
            .set(TokenInfo::new("access", Some("refresh".to_string()), Some(3600), scope()))
            .unwrap();
        assert!(path.exists());

        let reloaded = TokenStorage::new(&path);
        assert!(reloaded.load().unwrap());
        assert_eq!(reloaded.get().unwrap().access_token, "access");

        reloaded.update_access_token("access-2", Some(3600)).unwrap();
        let again = TokenStorage::new(&path);
        again.load().unwrap();
        assert_eq!(again.get().unwrap().access_token, "access-2");
        assert_eq!(again.get().unwrap().refresh_token.as_deref(), Some("refresh"));

        again.clear().unwrap();
        assert!(!path.exists());
        assert!(again.get().is_none());
    }

    #[cfg(unix)]
    #[test]
    fn token_file_is_private() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tokens.json");
        TokenStorage::new(&path)
            .set(TokenInfo::new("access", None, None, scope()))
            .unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn missing_file_loads_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let storage = TokenStorage::new(dir.path().join("absent.json"));
        assert!(!storage.load().unwrap());
        assert!(storage.needs_reauth(&scope()));
    }

    #[test]
    fn read_only_scope_needs_reauth() {
        let dir = tempfile::tempdir().unwrap();
        let storage = TokenStorage::new(dir.path().join("tokens.json"));
        storage
            .set(TokenInfo::new(
                "access",
                None,
                None,
                vec!["https://www.googleapis.com/auth/calendar.readonly".to_string()],
            ))
            .unwrap();
        assert!(storage.needs_reauth(&scope()));
    }
}
