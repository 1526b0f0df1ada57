//! The calendar access abstraction.
//!
//! Shift import needs three things from a calendar backend: whether the
//! user is logged in, which calendars they may write to, and a way to
//! create one event. [`CalendarAccess`] captures exactly that.

use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};
use shiftcal_core::EventDescriptor;

use crate::error::{ProviderError, ProviderResult};

/// The user's role on a calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AccessRole {
    Owner,
    Writer,
    Reader,
    FreeBusyReader,
}

impl AccessRole {
    /// Parses a Google `accessRole` value.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "owner" => Some(Self::Owner),
            "writer" => Some(Self::Writer),
            "reader" => Some(Self::Reader),
            "freeBusyReader" => Some(Self::FreeBusyReader),
            _ => None,
        }
    }
}

/// A calendar shifts can be written to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarInfo {
    pub id: String,
    pub name: String,
    pub access_role: AccessRole,
    pub is_primary: bool,
    /// IANA time zone of the calendar.
    pub timezone: Option<String>,
    pub description: Option<String>,
}

impl CalendarInfo {
    /// Creates an owned calendar with the given ID and name.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            access_role: AccessRole::Owner,
            is_primary: false,
            timezone: None,
            description: None,
        }
    }

    /// Builder method to mark as primary.
    pub fn with_primary(mut self, is_primary: bool) -> Self {
        self.is_primary = is_primary;
        self
    }

    /// Builder method to set the access role.
    pub fn with_access_role(mut self, role: AccessRole) -> Self {
        self.access_role = role;
        self
    }

    /// Builder method to set timezone.
    pub fn with_timezone(mut self, timezone: impl Into<String>) -> Self {
        self.timezone = Some(timezone.into());
        self
    }
}

/// A calendar event created from an [`EventDescriptor`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedEvent {
    /// Provider-assigned event ID.
    pub id: String,
    /// Link to the event in the calendar UI, when the provider returns one.
    pub html_link: Option<String>,
    pub descriptor: EventDescriptor,
}

/// A boxed future for object-safe async trait methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Access to a user's calendars.
///
/// Implementations own their credentials; callers only see whether the
/// user is authenticated. Every method reports failures as
/// [`ProviderError`]s and never retries on its own.
pub trait CalendarAccess: Send + Sync {
    /// Returns the name of this provider (e.g. `"google:default"`).
    fn name(&self) -> &str;

    /// Returns true if the provider holds usable credentials.
    fn is_authenticated(&self) -> bool;

    /// Lists the calendars the user owns.
    fn list_writable_calendars(&self) -> BoxFuture<'_, ProviderResult<Vec<CalendarInfo>>>;

    /// Creates one event in the given calendar.
    fn create_event<'a>(
        &'a self,
        calendar_id: &'a str,
        event: &'a EventDescriptor,
    ) -> BoxFuture<'a, ProviderResult<CreatedEvent>>;
}

/// A provider that fails every call.
///
/// Stands in for a backend whose configuration could not be built, so
/// callers can still report the reason through the normal error path.
#[derive(Debug)]
pub struct ErrorProvider {
    name: String,
    error: ProviderError,
}

impl ErrorProvider {
    /// Creates a new error provider.
    pub fn new(name: impl Into<String>, error: ProviderError) -> Self {
        Self {
            name: name.into(),
            error,
        }
    }

    fn error(&self) -> ProviderError {
        self.error.duplicate().with_provider(&self.name)
    }
}

impl CalendarAccess for ErrorProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_authenticated(&self) -> bool {
        false
    }

    fn list_writable_calendars(&self) -> BoxFuture<'_, ProviderResult<Vec<CalendarInfo>>> {
        let error = self.error();
        Box::pin(async move { Err(error) })
    }

    fn create_event<'a>(
        &'a self,
        _calendar_id: &'a str,
        _event: &'a EventDescriptor,
    ) -> BoxFuture<'a, ProviderResult<CreatedEvent>> {
        let error = self.error();
        Box::pin(async move { Err(error) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderErrorCode;
    use chrono::NaiveDate;
    use shiftcal_core::{ColumnIndex, ShiftCode};

    #[test]
    fn calendar_info_builder() {
        let info = CalendarInfo::new("cal-123", "Shifts")
            .with_primary(true)
            .with_access_role(AccessRole::Writer)
            .with_timezone("Europe/Zurich");

        assert_eq!(info.id, "cal-123");
        assert_eq!(info.name, "Shifts");
        assert!(info.is_primary);
        assert_eq!(info.access_role, AccessRole::Writer);
        assert_eq!(info.timezone.as_deref(), Some("Europe/Zurich"));
    }

    #[test]
    fn access_role_parsing() {
        assert_eq!(AccessRole::parse("owner"), Some(AccessRole::Owner));
        assert_eq!(
            AccessRole::parse("freeBusyReader"),
            Some(AccessRole::FreeBusyReader)
        );
        assert_eq!(AccessRole::parse("admin"), None);
    }

    #[tokio::test]
    async fn error_provider_fails_everything() {
        let provider = ErrorProvider::new("google", ProviderError::configuration("no credentials"));
        assert_eq!(provider.name(), "google");
        assert!(!provider.is_authenticated());

        let err = provider.list_writable_calendars().await.unwrap_err();
        assert_eq!(err.code(), ProviderErrorCode::ConfigurationError);
        assert_eq!(err.provider(), Some("google"));

        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let event = EventDescriptor {
            label: ShiftCode::K00,
            column: ColumnIndex(2),
            start: date.and_hms_opt(3, 15, 0).unwrap(),
            end: date.and_hms_opt(11, 0, 0).unwrap(),
        };
        assert!(provider.create_event("primary", &event).await.is_err());
    }
}
