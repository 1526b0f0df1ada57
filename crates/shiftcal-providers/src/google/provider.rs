//! [`CalendarAccess`] backed by Google Calendar.

use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use shiftcal_core::EventDescriptor;

use crate::error::{ProviderError, ProviderResult};
use crate::provider::{AccessRole, BoxFuture, CalendarAccess, CalendarInfo, CreatedEvent};

use super::client::{CalendarListEntry, GoogleCalendarClient};
use super::config::GoogleConfig;
use super::oauth::OAuthClient;
use super::tokens::TokenStorage;

const LOGIN_HINT: &str = "run 'shiftcal auth google'";

/// Google Calendar access for one account.
///
/// Tokens are loaded from disk on creation. Expired access tokens are
/// refreshed on demand; a refresh token Google rejects is deleted so the
/// next login starts clean.
pub struct GoogleProvider {
    config: GoogleConfig,
    display_name: String,
    token_storage: TokenStorage,
    oauth_client: OAuthClient,
    api_client: RwLock<Option<GoogleCalendarClient>>,
}

impl GoogleProvider {
    /// Creates the provider and loads stored tokens, without logging in.
    pub fn new(config: GoogleConfig) -> ProviderResult<Self> {
        config.validate().map_err(ProviderError::configuration)?;

        let display_name = config.provider_name();
        let token_storage = TokenStorage::new(&config.token_path);
        if let Err(e) = token_storage.load() {
            warn!(provider = %display_name, error = %e, "ignoring unreadable token file");
        }

        let oauth_client = OAuthClient::new(config.credentials.clone(), config.timeout)?;

        let api_client = match token_storage.get() {
            Some(tokens) if !tokens.is_expired() => Some(GoogleCalendarClient::new(
                &tokens.access_token,
                config.timeout,
            )?),
            _ => None,
        };

        Ok(Self {
            config,
            display_name,
            token_storage,
            oauth_client,
            api_client: RwLock::new(api_client),
        })
    }

    /// Returns the provider configuration.
    pub fn config(&self) -> &GoogleConfig {
        &self.config
    }

    /// Runs the browser login and stores the resulting tokens.
    pub async fn authenticate(&self) -> ProviderResult<()> {
        info!(provider = %self.display_name, "starting Google login");

        let tokens = self
            .oauth_client
            .authorize(&self.config.scopes, self.config.loopback_port_range)
            .await?;
        self.token_storage.set(tokens.clone())?;

        let client = GoogleCalendarClient::new(&tokens.access_token, self.config.timeout)?;
        *self.api_client.write().await = Some(client);

        info!(
            provider = %self.display_name,
            path = %self.token_storage.path().display(),
            "Google login stored"
        );
        Ok(())
    }

    /// Returns true if there are no tokens or they lack a required scope.
    pub fn needs_reauth(&self) -> bool {
        self.token_storage.needs_reauth(&self.config.scopes)
    }

    /// Deletes the stored tokens.
    pub async fn logout(&self) -> ProviderResult<()> {
        *self.api_client.write().await = None;
        self.token_storage.clear()
    }

    /// Makes sure an API client with a live access token exists.
    async fn ensure_client(&self) -> ProviderResult<()> {
        let tokens = self.token_storage.get().ok_or_else(|| {
            ProviderError::authentication(format!("not logged in, {}", LOGIN_HINT))
        })?;

        if !tokens.is_expired() {
            let mut client = self.api_client.write().await;
            if client.is_none() {
                *client = Some(GoogleCalendarClient::new(
                    &tokens.access_token,
                    self.config.timeout,
                )?);
            }
            return Ok(());
        }

        let refresh_token = tokens.refresh_token.as_deref().ok_or_else(|| {
            ProviderError::authentication(format!("login expired, {}", LOGIN_HINT))
        })?;

        debug!(provider = %self.display_name, "refreshing expired access token");
        let (access_token, expires_in) = match self.oauth_client.refresh(refresh_token).await {
            Ok(refreshed) => refreshed,
            Err(e) if e.is_auth() => {
                warn!(provider = %self.display_name, error = %e, "refresh rejected, dropping stored login");
                self.logout().await?;
                return Err(ProviderError::authentication(format!(
                    "stored login was rejected, {}",
                    LOGIN_HINT
                ))
                .with_source(e));
            }
            Err(e) => return Err(e),
        };

        self.token_storage
            .update_access_token(&access_token, expires_in)?;

        let mut client = self.api_client.write().await;
        match client.as_mut() {
            Some(c) => c.set_access_token(&access_token),
            None => {
                *client = Some(GoogleCalendarClient::new(
                    &access_token,
                    self.config.timeout,
                )?)
            }
        }
        Ok(())
    }

    async fn list_writable(&self) -> ProviderResult<Vec<CalendarInfo>> {
        self.ensure_client().await?;

        let entries = {
            let client = self.api_client.read().await;
            let client = client
                .as_ref()
                .ok_or_else(|| ProviderError::internal("API client not available"))?;
            client.list_calendars().await
        }
        .map_err(|e| e.with_provider(&self.display_name))?;

        if entries.is_empty() {
            return Err(ProviderError::calendar("the account has no calendars")
                .with_provider(&self.display_name));
        }

        let owned: Vec<CalendarInfo> = entries
            .into_iter()
            .filter_map(CalendarListEntry::into_info)
            .filter(|c| c.access_role == AccessRole::Owner)
            .collect();
        debug!(provider = %self.display_name, count = owned.len(), "owned calendars");
        Ok(owned)
    }

    async fn insert(
        &self,
        calendar_id: &str,
        event: &EventDescriptor,
    ) -> ProviderResult<CreatedEvent> {
        self.ensure_client().await?;

        let client = self.api_client.read().await;
        let client = client
            .as_ref()
            .ok_or_else(|| ProviderError::internal("API client not available"))?;
        client
            .insert_event(calendar_id, event, &self.config.time_zone)
            .await
            .map_err(|e| e.with_provider(&self.display_name))
    }
}

impl CalendarAccess for GoogleProvider {
    fn name(&self) -> &str {
        &self.display_name
    }

    fn is_authenticated(&self) -> bool {
        self.token_storage
            .get()
            .is_some_and(|tokens| !tokens.is_expired() || tokens.refresh_token.is_some())
    }

    fn list_writable_calendars(&self) -> BoxFuture<'_, ProviderResult<Vec<CalendarInfo>>> {
        Box::pin(self.list_writable())
    }

    fn create_event<'a>(
        &'a self,
        calendar_id: &'a str,
        event: &'a EventDescriptor,
    ) -> BoxFuture<'a, ProviderResult<CreatedEvent>> {
        Box::pin(self.insert(calendar_id, event))
    }
}
