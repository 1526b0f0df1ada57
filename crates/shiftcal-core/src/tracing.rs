//! Tracing setup shared by the shiftcal binaries.
//!
//! The CLI logs compact lines to stderr; `shiftcal serve` logs JSON so
//! skipped roster columns and failed event creations can be collected.
//!
//! ```ignore
//! use shiftcal_core::tracing::{init_tracing, TracingConfig};
//!
//! init_tracing(TracingConfig::server())?;
//! ```

use thiserror::Error;
use tracing::Level;
use tracing_subscriber::{
    EnvFilter, Layer, Registry,
    fmt::{self, format::FmtSpan},
    prelude::*,
};

/// Errors that can occur during tracing initialization.
#[derive(Debug, Error)]
pub enum TracingError {
    #[error("failed to set global tracing subscriber: {0}")]
    SetGlobalSubscriber(#[from] tracing::subscriber::SetGlobalDefaultError),

    #[error("failed to parse env filter: {0}")]
    EnvFilter(#[from] tracing_subscriber::filter::ParseError),
}

/// Output format for log lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TracingOutputFormat {
    /// Multi-line, human-readable.
    #[default]
    Pretty,
    /// One line per event.
    Compact,
    /// One JSON object per event.
    Json,
}

/// How logging is set up for one process.
#[derive(Debug, Clone)]
pub struct TracingConfig {
    /// Level for the shiftcal crates when `RUST_LOG` is unset.
    pub default_level: Level,
    pub output_format: TracingOutputFormat,
    /// Print source file and line.
    pub include_location: bool,
    /// Print the module path.
    pub include_target: bool,
    pub include_timestamp: bool,
    /// Log span open/close, e.g. around each HTTP request.
    pub include_span_events: bool,
    /// Explicit filter directive; replaces both `RUST_LOG` and `default_level`.
    pub env_filter: Option<String>,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            default_level: Level::INFO,
            output_format: TracingOutputFormat::Pretty,
            include_location: false,
            include_target: true,
            include_timestamp: true,
            include_span_events: false,
            env_filter: None,
        }
    }
}

impl TracingConfig {
    /// Quiet compact output for interactive commands: warnings only.
    #[must_use]
    pub fn cli() -> Self {
        Self {
            default_level: Level::WARN,
            output_format: TracingOutputFormat::Compact,
            include_target: false,
            include_timestamp: false,
            ..Self::default()
        }
    }

    /// Compact output for `-v`: debug records with their source location.
    #[must_use]
    pub fn cli_debug() -> Self {
        Self {
            default_level: Level::DEBUG,
            output_format: TracingOutputFormat::Compact,
            include_location: true,
            include_timestamp: false,
            ..Self::default()
        }
    }

    /// JSON output for the upload server.
    #[must_use]
    pub fn server() -> Self {
        Self {
            output_format: TracingOutputFormat::Json,
            include_location: true,
            include_span_events: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_level(mut self, level: Level) -> Self {
        self.default_level = level;
        self
    }

    #[must_use]
    pub fn with_format(mut self, format: TracingOutputFormat) -> Self {
        self.output_format = format;
        self
    }

    #[must_use]
    pub fn with_env_filter(mut self, filter: impl Into<String>) -> Self {
        self.env_filter = Some(filter.into());
        self
    }

    /// Directive used when neither `env_filter` nor `RUST_LOG` is set.
    ///
    /// Covers every `shiftcal*` target; dependencies stay silent.
    pub fn default_directive(&self) -> String {
        format!("shiftcal={}", self.default_level)
    }

    /// Builds the filter: `env_filter`, else `RUST_LOG`, else the default directive.
    pub fn filter(&self) -> Result<EnvFilter, TracingError> {
        if let Some(ref directive) = self.env_filter {
            return Ok(EnvFilter::try_new(directive)?);
        }
        Ok(EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(self.default_directive())))
    }

    fn span_events(&self) -> FmtSpan {
        if self.include_span_events {
            FmtSpan::NEW | FmtSpan::CLOSE
        } else {
            FmtSpan::NONE
        }
    }
}

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Installs the global subscriber. Call once, first thing in `main`.
///
/// # Errors
///
/// Fails if a subscriber is already installed or the filter directive
/// does not parse.
pub fn init_tracing(config: TracingConfig) -> Result<(), TracingError> {
    let filter = config.filter()?;
    let location = config.include_location;
    let target = config.include_target;
    let spans = config.span_events();

    let layer: BoxedLayer = match config.output_format {
        TracingOutputFormat::Pretty => fmt::layer()
            .pretty()
            .with_file(location)
            .with_line_number(location)
            .with_target(target)
            .with_span_events(spans)
            .with_filter(filter)
            .boxed(),
        TracingOutputFormat::Compact if config.include_timestamp => fmt::layer()
            .compact()
            .with_file(location)
            .with_line_number(location)
            .with_target(target)
            .with_span_events(spans)
            .with_filter(filter)
            .boxed(),
        TracingOutputFormat::Compact => fmt::layer()
            .compact()
            .without_time()
            .with_file(location)
            .with_line_number(location)
            .with_target(target)
            .with_span_events(spans)
            .with_filter(filter)
            .boxed(),
        TracingOutputFormat::Json => fmt::layer()
            .json()
            .with_file(location)
            .with_line_number(location)
            .with_target(target)
            .with_span_events(spans)
            .with_filter(filter)
            .boxed(),
    };

    tracing::subscriber::set_global_default(tracing_subscriber::registry().with(layer))?;
    Ok(())
}
