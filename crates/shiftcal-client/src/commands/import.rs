//! Calendar listing and import commands.

use std::fmt::Write as _;
use std::path::Path;
use std::sync::Arc;

use shiftcal_core::EventBuilder;
use shiftcal_providers::{CalendarInfo, MemoryCalendar};
use shiftcal_server::{ImportSummary, Pipeline};
use tracing::info;

use crate::error::{ClientError, ClientResult};

/// Print the calendars the user can import into.
pub async fn calendars(pipeline: &Pipeline) -> ClientResult<()> {
    let calendars = pipeline.calendars().await?;
    print!("{}", render_calendars(&calendars));
    Ok(())
}

/// Create one person's shifts in a calendar.
///
/// With `dry_run` the events go to an in-memory calendar and nothing
/// leaves the machine.
pub async fn import(
    pipeline: &Pipeline,
    roster: &Path,
    person: &str,
    calendar_id: &str,
    dry_run: bool,
) -> ClientResult<()> {
    let table = super::read_roster(roster)?;

    let summary = if dry_run {
        info!(person, calendar_id, "dry run, using an in-memory calendar");
        dry_run_pipeline(pipeline.builder().clone(), calendar_id)
            .run(&table, person, calendar_id)
            .await?
    } else {
        pipeline.run(&table, person, calendar_id).await?
    };

    print!("{}", render_summary(&summary, dry_run));
    if summary.is_complete() {
        Ok(())
    } else {
        Err(ClientError::ImportIncomplete {
            failed: summary.failed_count(),
            planned: summary.created_count() + summary.failed_count(),
        })
    }
}

fn dry_run_pipeline(builder: EventBuilder, calendar_id: &str) -> Pipeline {
    let calendar = MemoryCalendar::new()
        .with_calendars(vec![CalendarInfo::new(calendar_id, calendar_id)]);
    Pipeline::new(Arc::new(calendar), builder)
}

pub(crate) fn render_calendars(calendars: &[CalendarInfo]) -> String {
    let mut out = String::new();
    for calendar in calendars {
        let _ = write!(out, "{}\t{}", calendar.id, calendar.name);
        if calendar.is_primary {
            let _ = write!(out, " (primary)");
        }
        let _ = writeln!(out);
    }
    out
}

pub(crate) fn render_summary(summary: &ImportSummary, dry_run: bool) -> String {
    let mut out = String::new();
    let verb = if dry_run { "would create" } else { "created" };
    let _ = writeln!(
        out,
        "{}: {} {} events, {} failed, {} skipped",
        summary.calendar_id,
        verb,
        summary.created_count(),
        summary.failed_count(),
        summary.skipped_count()
    );
    for event in &summary.created {
        let _ = write!(out, "  + {}", event.descriptor);
        if let Some(ref link) = event.html_link {
            let _ = write!(out, "  {link}");
        }
        let _ = writeln!(out);
    }
    for failed in &summary.failed {
        let _ = writeln!(out, "  ! {}  {}: {}", failed.event, failed.code, failed.message);
    }
    out
}
