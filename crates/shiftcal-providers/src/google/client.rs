//! Google Calendar API v3 client.
//!
//! Only the two calls shift import needs: listing the user's calendars and
//! inserting a timed event.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use shiftcal_core::EventDescriptor;
use tracing::debug;

use crate::error::{ProviderError, ProviderResult};
use crate::provider::{AccessRole, CalendarInfo, CreatedEvent};

const CALENDAR_API_BASE: &str = "https://www.googleapis.com/calendar/v3";

/// Local date-time format Google accepts together with an explicit `timeZone`.
const DATE_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Google Calendar API client bound to one access token.
#[derive(Debug)]
pub struct GoogleCalendarClient {
    http: reqwest::Client,
    base_url: String,
    access_token: String,
}

impl GoogleCalendarClient {
    /// Creates a client with the given access token.
    pub fn new(access_token: impl Into<String>, timeout: Duration) -> ProviderResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                ProviderError::internal(format!("failed to build HTTP client: {}", e))
                    .with_source(e)
            })?;

        Ok(Self {
            http,
            base_url: CALENDAR_API_BASE.to_string(),
            access_token: access_token.into(),
        })
    }

    /// Points the client at another API root.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Replaces the access token after a refresh.
    pub fn set_access_token(&mut self, token: impl Into<String>) {
        self.access_token = token.into();
    }

    /// Lists every calendar on the user's calendar list, following pages.
    pub async fn list_calendars(&self) -> ProviderResult<Vec<CalendarListEntry>> {
        let url = format!("{}/users/me/calendarList", self.base_url);
        let mut entries = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut request = self.http.get(&url).bearer_auth(&self.access_token);
            if let Some(token) = page_token.as_deref() {
                request = request.query(&[("pageToken", token)]);
            }

            let body = send(request).await?;
            let page: CalendarListResponse = serde_json::from_str(&body).map_err(|e| {
                ProviderError::invalid_response(format!("failed to parse calendar list: {}", e))
            })?;
            entries.extend(page.items);

            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        debug!(count = entries.len(), "fetched calendar list");
        Ok(entries)
    }

    /// Inserts one shift as a timed event in `time_zone`.
    pub async fn insert_event(
        &self,
        calendar_id: &str,
        event: &EventDescriptor,
        time_zone: &str,
    ) -> ProviderResult<CreatedEvent> {
        let url = format!(
            "{}/calendars/{}/events",
            self.base_url,
            urlencoding::encode(calendar_id)
        );
        let request = self
            .http
            .post(&url)
            .bearer_auth(&self.access_token)
            .json(&EventInsert::new(event, time_zone));

        let body = send(request).await?;
        let inserted: InsertedEvent = serde_json::from_str(&body).map_err(|e| {
            ProviderError::invalid_response(format!("failed to parse inserted event: {}", e))
        })?;

        debug!(
            calendar_id,
            id = %inserted.id,
            link = inserted.html_link.as_deref().unwrap_or(""),
            "event created"
        );
        Ok(CreatedEvent {
            id: inserted.id,
            html_link: inserted.html_link,
            descriptor: event.clone(),
        })
    }
}

/// Sends a request and returns the body of a successful response.
async fn send(request: reqwest::RequestBuilder) -> ProviderResult<String> {
    let response = request.send().await.map_err(|e| {
        if e.is_timeout() {
            ProviderError::network("request timeout")
        } else if e.is_connect() {
            ProviderError::network(format!("connection failed: {}", e))
        } else {
            ProviderError::network(format!("request failed: {}", e))
        }
    })?;

    let status = response.status();
    if status.is_success() {
        return response
            .text()
            .await
            .map_err(|e| ProviderError::network(format!("failed to read response: {}", e)));
    }

    let retry_after = response
        .headers()
        .get("Retry-After")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse::<u64>().ok());
    let body = response.text().await.unwrap_or_default();
    Err(status_error(status, &body, retry_after))
}

/// Maps a failed API status to a provider error.
fn status_error(status: reqwest::StatusCode, body: &str, retry_after: Option<u64>) -> ProviderError {
    use reqwest::StatusCode;

    match status {
        StatusCode::UNAUTHORIZED => {
            ProviderError::authentication("access token expired or invalid")
        }
        StatusCode::FORBIDDEN => {
            ProviderError::authorization(format!("access denied: {}", body))
        }
        StatusCode::NOT_FOUND => ProviderError::not_found("calendar not found"),
        StatusCode::BAD_REQUEST => ProviderError::bad_request(format!("rejected: {}", body)),
        StatusCode::TOO_MANY_REQUESTS => ProviderError::rate_limited(format!(
            "rate limit exceeded{}",
            retry_after
                .map(|s| format!(", retry after {} seconds", s))
                .unwrap_or_default()
        )),
        _ => ProviderError::server(format!("API error ({}): {}", status, body)),
    }
}

/// Request body for `events.insert`.
#[derive(Debug, Serialize)]
struct EventInsert {
    summary: String,
    start: EventTime,
    end: EventTime,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EventTime {
    date_time: String,
    time_zone: String,
}

impl EventInsert {
    fn new(event: &EventDescriptor, time_zone: &str) -> Self {
        let time = |at: chrono::NaiveDateTime| EventTime {
            date_time: at.format(DATE_TIME_FORMAT).to_string(),
            time_zone: time_zone.to_string(),
        };
        Self {
            summary: event.summary().to_string(),
            start: time(event.start),
            end: time(event.end),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InsertedEvent {
    id: String,
    html_link: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CalendarListResponse {
    #[serde(default)]
    items: Vec<CalendarListEntry>,
    next_page_token: Option<String>,
}

/// A calendar from the user's calendar list.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarListEntry {
    pub id: String,
    /// Calendar name.
    #[serde(default)]
    pub summary: String,
    pub description: Option<String>,
    #[serde(default)]
    pub primary: bool,
    pub time_zone: Option<String>,
    /// `owner`, `writer`, `reader` or `freeBusyReader`.
    pub access_role: String,
}

impl CalendarListEntry {
    /// Converts to a [`CalendarInfo`], dropping entries with unknown roles.
    pub fn into_info(self) -> Option<CalendarInfo> {
        let role = AccessRole::parse(&self.access_role)?;
        let mut info = CalendarInfo::new(self.id, self.summary)
            .with_access_role(role)
            .with_primary(self.primary);
        info.timezone = self.time_zone;
        info.description = self.description;
        Some(info)
    }
}
