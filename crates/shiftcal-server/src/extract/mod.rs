//! Turning uploaded documents into roster tables.
//!
//! The import pipeline only sees [`RosterTable`]s. Extractors own the
//! document format: PDF rosters as exported by the planning tool, and
//! header-less CSV for rosters that were already converted.

mod csv;
mod pdf;

use std::path::Path;

use shiftcal_core::RosterTable;
use thiserror::Error;

pub use self::csv::CsvTableExtractor;
pub use self::pdf::{PdfTableExtractor, table_from_text};

/// Result type for table extraction.
pub type ExtractResult<T> = Result<T, ExtractError>;

/// Errors raised while extracting a roster table.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("CSV error: {0}")]
    Csv(#[from] ::csv::Error),

    #[error("failed to read PDF: {message}")]
    Pdf { message: String },

    /// The document parsed but contained no rows.
    #[error("document contains no table rows")]
    Empty,

    #[error("unsupported roster format '{path}' (expected .pdf or .csv)")]
    Unsupported { path: String },
}

impl ExtractError {
    /// Creates a PDF error.
    pub fn pdf(message: impl Into<String>) -> Self {
        Self::Pdf {
            message: message.into(),
        }
    }
}

/// Reads one roster document into a table.
pub trait TableExtractor: Send + Sync {
    /// Short format name, e.g. `"pdf"`.
    fn name(&self) -> &'static str;

    /// Extracts the table from the raw document bytes.
    fn extract(&self, data: &[u8]) -> ExtractResult<RosterTable>;
}

/// Returns true if the file name has the given extension, ignoring case.
pub fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(extension))
}

/// Picks an extractor from the file extension.
pub fn extractor_for_path(path: &Path) -> ExtractResult<Box<dyn TableExtractor>> {
    if has_extension(path, "pdf") {
        Ok(Box::new(PdfTableExtractor::new()))
    } else if has_extension(path, "csv") {
        Ok(Box::new(CsvTableExtractor::new()))
    } else {
        Err(ExtractError::Unsupported {
            path: path.display().to_string(),
        })
    }
}
