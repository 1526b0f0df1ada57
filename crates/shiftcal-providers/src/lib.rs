//! Calendar backends for shift import.
//!
//! - [`CalendarAccess`] - what the import pipeline needs from a calendar
//! - [`google::GoogleProvider`] - Google Calendar over OAuth (feature `google`)
//! - [`MemoryCalendar`] - in-process backend for dry runs and tests
//! - [`ProviderError`] - failures, split into authentication and API errors

pub mod error;
#[cfg(feature = "google")]
pub mod google;
pub mod memory;
pub mod provider;

pub use error::{ProviderError, ProviderErrorCode, ProviderResult};
pub use memory::MemoryCalendar;
pub use provider::{
    AccessRole, BoxFuture, CalendarAccess, CalendarInfo, CreatedEvent, ErrorProvider,
};
