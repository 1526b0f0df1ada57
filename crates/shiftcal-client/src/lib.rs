//! The `shiftcal` command-line interface.
//!
//! Reads rosters, previews and imports one person's shifts, manages the
//! Google login and runs the HTTP upload server.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod secret;

pub use cli::Cli;
pub use error::{ClientError, ClientResult};
