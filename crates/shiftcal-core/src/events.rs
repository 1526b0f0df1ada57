//! Event building: turning a person's roster row into calendar events.
//!
//! For every shift column the builder joins the shift cell with the day
//! cell of the same [`ColumnIndex`], combines the date with the shift's
//! clock times and emits an [`EventDescriptor`]. Columns that cannot yield
//! an event are never errors; they are recorded as [`SkippedColumn`]s.

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::error::RosterResult;
use crate::month::{MonthResolver, MonthYear};
use crate::roster::{Cell, ColumnIndex, ParsedRoster};
use crate::shift::{ShiftCell, ShiftCode};

/// First column that holds a shift code.
///
/// Column 0 is the person's name and column 1 holds per-person metadata
/// (qualification or team) on the source rosters.
pub const FIRST_SHIFT_COLUMN: ColumnIndex = ColumnIndex(2);

/// Everything needed to create one calendar entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventDescriptor {
    pub label: ShiftCode,
    /// Roster column the event came from.
    pub column: ColumnIndex,
    /// Local start, in the calendar's fixed time zone.
    pub start: NaiveDateTime,
    /// Local end, same day as `start`.
    pub end: NaiveDateTime,
}

impl EventDescriptor {
    /// Returns the event summary shown in the calendar.
    pub fn summary(&self) -> &'static str {
        self.label.as_str()
    }
}

impl fmt::Display for EventDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} -> {}",
            self.label,
            self.start.format("%Y-%m-%d %H:%M"),
            self.end.format("%H:%M")
        )
    }
}

/// Why a shift column produced no event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum SkipReason {
    /// The `X` sentinel or an empty cell.
    Off,
    /// A token outside the shift-code table.
    UnknownCode(String),
    /// No day number in this column.
    MissingDay,
    /// The day cell is not an integer.
    InvalidDay(String),
    /// The day does not exist in the roster's month.
    InvalidDate { day: u32 },
}

impl SkipReason {
    /// Returns true for days off, which are expected rather than noteworthy.
    pub fn is_off(&self) -> bool {
        matches!(self, Self::Off)
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Off => write!(f, "day off"),
            Self::UnknownCode(code) => write!(f, "unknown shift code '{}'", code),
            Self::MissingDay => write!(f, "no day number"),
            Self::InvalidDay(day) => write!(f, "invalid day number '{}'", day),
            Self::InvalidDate { day } => write!(f, "day {} does not exist in this month", day),
        }
    }
}

/// A shift column that produced no event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedColumn {
    pub column: ColumnIndex,
    pub reason: SkipReason,
}

/// The events for one person plus a record of every skipped column.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventPlan {
    /// Events in ascending column order.
    pub events: Vec<EventDescriptor>,
    pub skipped: Vec<SkippedColumn>,
}

impl EventPlan {
    /// Skips other than days off.
    pub fn irregular(&self) -> impl Iterator<Item = &SkippedColumn> {
        self.skipped.iter().filter(|s| !s.reason.is_off())
    }

    /// Number of days off in the row.
    pub fn days_off(&self) -> usize {
        self.skipped.iter().filter(|s| s.reason.is_off()).count()
    }

    /// Renders one line per event.
    pub fn render(&self) -> String {
        self.events
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Builds events from a person's shift cells and the day-number row.
///
/// Cells left of [`FIRST_SHIFT_COLUMN`] are ignored. Every column holding
/// a shift cell or a day number is visited in ascending order and joined
/// by [`ColumnIndex`]; a day with no shift cell counts as a day off. This
/// is a pure function of its inputs.
pub fn build_events(shifts: &[Cell], days: &[Cell], month: &MonthYear) -> EventPlan {
    let days_by_column: HashMap<ColumnIndex, &str> = days
        .iter()
        .filter(|cell| cell.column >= FIRST_SHIFT_COLUMN)
        .filter_map(|cell| Some((cell.column, cell.text()?)))
        .collect();
    let shifts_by_column: HashMap<ColumnIndex, Option<&str>> = shifts
        .iter()
        .filter(|cell| cell.column >= FIRST_SHIFT_COLUMN)
        .map(|cell| (cell.column, cell.text()))
        .collect();

    let columns: BTreeSet<ColumnIndex> = shifts_by_column
        .keys()
        .chain(days_by_column.keys())
        .copied()
        .collect();

    let mut plan = EventPlan::default();
    for column in columns {
        let shift = shifts_by_column.get(&column).copied().flatten();
        let day = days_by_column.get(&column).copied();
        match build_one(column, shift, day, month) {
            Ok(event) => {
                trace!(column = %column, event = %event, "built event");
                plan.events.push(event);
            }
            Err(reason) => {
                if reason.is_off() {
                    trace!(column = %column, "day off");
                } else {
                    warn!(column = %column, reason = %reason, "skipping roster column");
                }
                plan.skipped.push(SkippedColumn { column, reason });
            }
        }
    }

    debug!(
        events = plan.events.len(),
        skipped = plan.skipped.len(),
        "built event plan"
    );
    plan
}

fn build_one(
    column: ColumnIndex,
    shift: Option<&str>,
    day: Option<&str>,
    month: &MonthYear,
) -> Result<EventDescriptor, SkipReason> {
    let code = match ShiftCell::classify(shift) {
        ShiftCell::Code(code) => code,
        ShiftCell::Off => return Err(SkipReason::Off),
        ShiftCell::Unknown(token) => return Err(SkipReason::UnknownCode(token)),
    };

    let day_text = day.ok_or(SkipReason::MissingDay)?;
    let day_number = parse_day(day_text).ok_or_else(|| SkipReason::InvalidDay(day_text.to_string()))?;
    let date = month
        .date(day_number)
        .ok_or(SkipReason::InvalidDate { day: day_number })?;

    let (start, end) = code.times();
    Ok(EventDescriptor {
        label: code,
        column,
        start: date.and_time(start),
        end: date.and_time(end),
    })
}

/// Parses a day-of-month cell; German rosters may print `"1."`.
fn parse_day(text: &str) -> Option<u32> {
    let digits = text.trim().trim_end_matches('.');
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Builds event plans from parsed rosters, resolving the header itself.
#[derive(Debug, Clone, Default)]
pub struct EventBuilder {
    resolver: MonthResolver,
}

impl EventBuilder {
    /// Creates a builder with the given month table.
    pub fn new(resolver: MonthResolver) -> Self {
        Self { resolver }
    }

    /// Returns the month table.
    pub fn resolver(&self) -> &MonthResolver {
        &self.resolver
    }

    /// Parses a month/year header with this builder's month table.
    ///
    /// # Errors
    ///
    /// Fails if the header is malformed or its month is unknown.
    pub fn month_year(&self, header: &str) -> RosterResult<MonthYear> {
        MonthYear::parse(header, &self.resolver)
    }

    /// Builds the event plan for a parsed roster.
    ///
    /// # Errors
    ///
    /// Fails only on header errors; cell problems become skips.
    pub fn build(&self, roster: &ParsedRoster) -> RosterResult<EventPlan> {
        let month = self.month_year(&roster.header)?;
        Ok(build_events(&roster.person.cells, &roster.days, &month))
    }
}
