//! Roster extraction, the import pipeline and the HTTP upload surface.
//!
//! - [`extract`] turns uploaded PDF/CSV rosters into tables
//! - [`Pipeline`] parses a table for one person and creates the events
//! - [`SessionStore`] keeps each upload session's roster apart
//! - [`http`] exposes the flow to a browser
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use shiftcal_core::EventBuilder;
//! use shiftcal_providers::MemoryCalendar;
//! use shiftcal_server::{AppState, Pipeline, ServerConfig, SessionStore, serve};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ServerConfig::default();
//!     let pipeline = Pipeline::new(Arc::new(MemoryCalendar::new()), EventBuilder::default());
//!     let state = AppState::new(pipeline, SessionStore::new(config.session_ttl));
//!     serve(&config, state).await?;
//!     Ok(())
//! }
//! ```

mod config;
mod error;
pub mod extract;
pub mod http;
mod pipeline;
mod session;

pub use config::{ServerConfig, default_bind};
pub use error::{ServerError, ServerResult};
pub use extract::{
    CsvTableExtractor, ExtractError, ExtractResult, PdfTableExtractor, TableExtractor,
    extractor_for_path,
};
pub use http::{AppState, router, serve};
pub use pipeline::{FailedEvent, ImportSummary, Pipeline, PipelineError, PipelineResult};
pub use session::{Session, SessionId, SessionStore};
