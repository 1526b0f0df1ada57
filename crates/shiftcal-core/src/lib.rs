//! Core types: shift codes, month names, roster parsing, event building

pub mod error;
pub mod events;
pub mod month;
pub mod roster;
pub mod shift;
pub mod tracing;

pub use error::{RosterError, RosterResult};
pub use events::{
    EventBuilder, EventDescriptor, EventPlan, FIRST_SHIFT_COLUMN, SkipReason, SkippedColumn,
    build_events,
};
pub use month::{MonthResolver, MonthYear};
pub use roster::{
    Cell, ColumnIndex, DAY_ROW, HEADER_ROW, NAME_COLUMN, ParsedRoster,
    PersonRow, RosterTable, parse_roster,
};
pub use shift::{OFF_SENTINEL, ShiftCell, ShiftCode, end_time, start_time};
pub use self::tracing::{TracingConfig, TracingError, TracingOutputFormat, init_tracing};
