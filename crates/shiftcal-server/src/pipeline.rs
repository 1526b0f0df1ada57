//! Roster → events → calendar.
//!
//! [`Pipeline::plan`] is pure: it parses the roster for one person and
//! builds the event plan. [`Pipeline::run`] then creates every planned
//! event, one provider call at a time in column order. A failed event is
//! recorded and the batch goes on; only roster errors and a logged-out
//! provider stop a run before anything is created.

use std::sync::Arc;

use serde::Serialize;
use shiftcal_core::{
    EventBuilder, EventDescriptor, EventPlan, RosterError, RosterTable, SkippedColumn,
    parse_roster,
};
use shiftcal_providers::{CalendarAccess, CalendarInfo, CreatedEvent, ProviderError};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Result type for pipeline runs.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Errors that stop a pipeline run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Roster(#[from] RosterError),

    #[error("calendar provider '{provider}' is not logged in")]
    NotAuthenticated { provider: String },

    /// Listing calendars failed.
    #[error(transparent)]
    Provider(#[from] ProviderError),
}

impl PipelineError {
    /// Returns true if the user has to log in (again).
    pub fn is_auth(&self) -> bool {
        match self {
            Self::NotAuthenticated { .. } => true,
            Self::Provider(e) => e.is_auth(),
            Self::Roster(_) => false,
        }
    }
}

/// An event the provider refused.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedEvent {
    pub event: EventDescriptor,
    /// Provider error code, e.g. `"rate_limited"`.
    pub code: String,
    pub message: String,
}

/// Outcome of one import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub calendar_id: String,
    pub created: Vec<CreatedEvent>,
    pub failed: Vec<FailedEvent>,
    pub skipped: Vec<SkippedColumn>,
}

impl ImportSummary {
    pub fn created_count(&self) -> usize {
        self.created.len()
    }

    pub fn failed_count(&self) -> usize {
        self.failed.len()
    }

    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }

    /// Returns true if every planned event was created.
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Runs roster imports against one calendar provider.
#[derive(Clone)]
pub struct Pipeline {
    provider: Arc<dyn CalendarAccess>,
    builder: EventBuilder,
}

impl Pipeline {
    pub fn new(provider: Arc<dyn CalendarAccess>, builder: EventBuilder) -> Self {
        Self { provider, builder }
    }

    pub fn provider(&self) -> &Arc<dyn CalendarAccess> {
        &self.provider
    }

    pub fn builder(&self) -> &EventBuilder {
        &self.builder
    }

    /// Parses the roster for `person` and builds the event plan.
    pub fn plan(&self, table: &RosterTable, person: &str) -> PipelineResult<EventPlan> {
        let roster = parse_roster(table, person)?;
        let plan = self.builder.build(&roster)?;
        debug!(
            person,
            events = plan.events.len(),
            skipped = plan.skipped.len(),
            "planned events"
        );
        Ok(plan)
    }

    /// Lists the calendars events may be created in.
    pub async fn calendars(&self) -> PipelineResult<Vec<CalendarInfo>> {
        self.require_login()?;
        Ok(self.provider.list_writable_calendars().await?)
    }

    /// Plans and creates `person`'s events in `calendar_id`.
    pub async fn run(
        &self,
        table: &RosterTable,
        person: &str,
        calendar_id: &str,
    ) -> PipelineResult<ImportSummary> {
        let plan = self.plan(table, person)?;
        self.require_login()?;
        Ok(self.create_all(plan, calendar_id).await)
    }

    /// Creates every event of an existing plan.
    pub async fn create_all(&self, plan: EventPlan, calendar_id: &str) -> ImportSummary {
        let mut created = Vec::with_capacity(plan.events.len());
        let mut failed = Vec::new();

        for event in &plan.events {
            match self.provider.create_event(calendar_id, event).await {
                Ok(record) => {
                    info!(
                        calendar_id,
                        event = %event,
                        link = record.html_link.as_deref().unwrap_or(""),
                        "created event"
                    );
                    created.push(record);
                }
                Err(e) => {
                    warn!(calendar_id, event = %event, error = %e, "failed to create event");
                    failed.push(FailedEvent {
                        event: event.clone(),
                        code: e.code().as_str().to_string(),
                        message: e.message().to_string(),
                    });
                }
            }
        }

        info!(
            calendar_id,
            created = created.len(),
            failed = failed.len(),
            skipped = plan.skipped.len(),
            "import finished"
        );
        ImportSummary {
            calendar_id: calendar_id.to_string(),
            created,
            failed,
            skipped: plan.skipped,
        }
    }

    fn require_login(&self) -> PipelineResult<()> {
        if self.provider.is_authenticated() {
            Ok(())
        } else {
            Err(PipelineError::NotAuthenticated {
                provider: self.provider.name().to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shiftcal_core::{ColumnIndex, ShiftCode};
    use shiftcal_providers::{AccessRole, MemoryCalendar};

    fn table() -> RosterTable {
        RosterTable::from_rows(vec![
            vec!["Jan 24"],
            vec!["", "", "1", "2", "3", "4"],
            vec!["Alice", "", "K00", "X", "DK1", "ZZ9"],
            vec!["Bob", "RS", "K04", "K04", "", "SK2"],
        ])
    }

    fn pipeline(provider: MemoryCalendar) -> (Arc<MemoryCalendar>, Pipeline) {
        let provider = Arc::new(provider);
        let pipeline = Pipeline::new(provider.clone(), EventBuilder::default());
        (provider, pipeline)
    }

    #[test]
    fn plan_has_no_side_effects() {
        let (provider, pipeline) = pipeline(MemoryCalendar::new());
        let plan = pipeline.plan(&table(), "Alice").unwrap();

        assert_eq!(plan.events.len(), 2);
        assert_eq!(plan.skipped.len(), 2);
        assert!(provider.created().is_empty());
    }

    #[tokio::test]
    async fn run_creates_events_in_column_order() {
        let (provider, pipeline) = pipeline(MemoryCalendar::new());
        let summary = pipeline.run(&table(), "Alice", "primary").await.unwrap();

        assert_eq!(summary.created_count(), 2);
        assert_eq!(summary.failed_count(), 0);
        assert_eq!(summary.skipped_count(), 2);
        assert!(summary.is_complete());

        let labels: Vec<ShiftCode> = provider
            .created()
            .iter()
            .map(|e| e.descriptor.label)
            .collect();
        assert_eq!(labels, vec![ShiftCode::K00, ShiftCode::DK1]);
    }

    #[tokio::test]
    async fn failed_event_does_not_stop_the_batch() {
        let (provider, pipeline) = pipeline(MemoryCalendar::new().failing_on(ColumnIndex(2)));
        let summary = pipeline.run(&table(), "Bob", "primary").await.unwrap();

        assert_eq!(summary.failed_count(), 1);
        assert_eq!(summary.failed[0].event.column, ColumnIndex(2));
        assert_eq!(summary.failed[0].code, "server_error");
        assert_eq!(summary.created_count(), 2);
        assert_eq!(provider.created().len(), 2);
        assert!(!summary.is_complete());
    }

    #[tokio::test]
    async fn unknown_person_fails_before_any_call() {
        let (provider, pipeline) = pipeline(MemoryCalendar::new());
        let err = pipeline.run(&table(), "Carol", "primary").await.unwrap_err();

        assert!(matches!(
            err,
            PipelineError::Roster(RosterError::PersonNotFound { .. })
        ));
        assert!(provider.created().is_empty());
    }

    #[tokio::test]
    async fn bad_header_fails_the_run() {
        let table = RosterTable::from_rows(vec![
            vec!["Xyz 24"],
            vec!["", "", "1"],
            vec!["Alice", "", "K00"],
        ]);

        let (_, pipeline) = pipeline(MemoryCalendar::new());
        let err = pipeline.run(&table, "Alice", "primary").await.unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Roster(RosterError::UnknownMonth { .. })
        ));
    }

    #[tokio::test]
    async fn logged_out_provider_is_rejected() {
        let (provider, pipeline) = pipeline(MemoryCalendar::new().with_authenticated(false));

        let err = pipeline.run(&table(), "Alice", "primary").await.unwrap_err();
        assert!(err.is_auth());
        assert!(provider.created().is_empty());

        assert!(pipeline.calendars().await.unwrap_err().is_auth());
    }

    #[tokio::test]
    async fn calendars_come_from_the_provider() {
        let (_, pipeline) = pipeline(MemoryCalendar::new().with_calendars(vec![
            CalendarInfo::new("shifts", "Shifts"),
            CalendarInfo::new("team", "Team").with_access_role(AccessRole::Reader),
        ]));
        let calendars = pipeline.calendars().await.unwrap();
        assert_eq!(calendars.len(), 1);
        assert_eq!(calendars[0].id, "shifts");
    }
}
