//! In-process calendar that records created events.
//!
//! Used for dry runs and tests. Failures can be injected per roster column
//! to exercise the per-event error path.

use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};

use shiftcal_core::{ColumnIndex, EventDescriptor};
use tracing::debug;

use crate::error::{ProviderError, ProviderResult};
use crate::provider::{AccessRole, BoxFuture, CalendarAccess, CalendarInfo, CreatedEvent};

/// A calendar backend living entirely in memory.
#[derive(Debug)]
pub struct MemoryCalendar {
    name: String,
    authenticated: bool,
    calendars: Vec<CalendarInfo>,
    failing_columns: HashSet<ColumnIndex>,
    created: Mutex<Vec<CreatedEvent>>,
}

impl MemoryCalendar {
    /// Creates an authenticated backend with one owned `primary` calendar.
    pub fn new() -> Self {
        Self {
            name: "memory".to_string(),
            authenticated: true,
            calendars: vec![CalendarInfo::new("primary", "Primary").with_primary(true)],
            failing_columns: HashSet::new(),
            created: Mutex::new(Vec::new()),
        }
    }

    /// Replaces the calendar list.
    pub fn with_calendars(mut self, calendars: Vec<CalendarInfo>) -> Self {
        self.calendars = calendars;
        self
    }

    /// Sets whether the backend reports itself as logged in.
    pub fn with_authenticated(mut self, authenticated: bool) -> Self {
        self.authenticated = authenticated;
        self
    }

    /// Makes event creation fail for events from this roster column.
    pub fn failing_on(mut self, column: ColumnIndex) -> Self {
        self.failing_columns.insert(column);
        self
    }

    /// Returns the events created so far, in creation order.
    pub fn created(&self) -> Vec<CreatedEvent> {
        self.created
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn insert(&self, calendar_id: &str, event: &EventDescriptor) -> ProviderResult<CreatedEvent> {
        if !self.authenticated {
            return Err(ProviderError::authentication("not logged in").with_provider(&self.name));
        }

        let calendar = self
            .calendars
            .iter()
            .find(|c| c.id == calendar_id)
            .ok_or_else(|| {
                ProviderError::not_found(format!("calendar '{}' not found", calendar_id))
                    .with_provider(&self.name)
            })?;

        if !matches!(calendar.access_role, AccessRole::Owner | AccessRole::Writer) {
            return Err(ProviderError::authorization(format!(
                "calendar '{}' is read-only",
                calendar_id
            ))
            .with_provider(&self.name));
        }

        if self.failing_columns.contains(&event.column) {
            return Err(ProviderError::server(format!(
                "injected failure for column {}",
                event.column
            ))
            .with_provider(&self.name));
        }

        let mut created = self.created.lock().unwrap_or_else(PoisonError::into_inner);
        let id = format!("memory-{}", created.len() + 1);
        debug!(calendar_id, id = %id, event = %event, "recorded event");
        let record = CreatedEvent {
            id,
            html_link: None,
            descriptor: event.clone(),
        };
        created.push(record.clone());
        Ok(record)
    }
}

impl Default for MemoryCalendar {
    fn default() -> Self {
        Self::new()
    }
}

impl CalendarAccess for MemoryCalendar {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    fn list_writable_calendars(&self) -> BoxFuture<'_, ProviderResult<Vec<CalendarInfo>>> {
        Box::pin(async move {
            if !self.authenticated {
                return Err(ProviderError::authentication("not logged in").with_provider(&self.name));
            }
            Ok(self
                .calendars
                .iter()
                .filter(|c| c.access_role == AccessRole::Owner)
                .cloned()
                .collect())
        })
    }

    fn create_event<'a>(
        &'a self,
        calendar_id: &'a str,
        event: &'a EventDescriptor,
    ) -> BoxFuture<'a, ProviderResult<CreatedEvent>> {
        Box::pin(async move { self.insert(calendar_id, event) })
    }
}
