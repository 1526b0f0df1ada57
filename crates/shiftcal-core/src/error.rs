//! Error types for roster parsing and event building.

use thiserror::Error;

/// Result type for roster operations.
pub type RosterResult<T> = Result<T, RosterError>;

/// Errors raised while reading a roster table.
///
/// Cells that merely fail to produce an event (unknown shift code, bad day
/// number) are not errors; they are reported as
/// [`SkippedColumn`](crate::events::SkippedColumn)s on the event plan.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RosterError {
    /// The table has no row 0 or cell (0, 0) is empty.
    #[error("roster has no month/year header in the first cell")]
    MissingHeader,

    /// The table has no day-number row.
    #[error("roster has no day-number row")]
    MissingDayRow,

    /// No person row carries the requested name.
    #[error("person '{name}' not found in roster")]
    PersonNotFound { name: String },

    /// The header month token is not in the month table.
    #[error("unknown month abbreviation '{token}'")]
    UnknownMonth { token: String },

    /// The header is not of the form `<month> <year>`.
    #[error("malformed month/year header '{header}'")]
    MalformedHeader { header: String },
}

impl RosterError {
    /// Creates a person-not-found error.
    pub fn person_not_found(name: impl Into<String>) -> Self {
        Self::PersonNotFound { name: name.into() }
    }

    /// Creates an unknown-month error.
    pub fn unknown_month(token: impl Into<String>) -> Self {
        Self::UnknownMonth {
            token: token.into(),
        }
    }

    /// Creates a malformed-header error.
    pub fn malformed_header(header: impl Into<String>) -> Self {
        Self::MalformedHeader {
            header: header.into(),
        }
    }

    /// Returns true if the error comes from the month/year header.
    pub fn is_header_error(&self) -> bool {
        matches!(
            self,
            Self::MissingHeader | Self::UnknownMonth { .. } | Self::MalformedHeader { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages() {
        assert_eq!(
            RosterError::person_not_found("Bob").to_string(),
            "person 'Bob' not found in roster"
        );
        assert_eq!(
            RosterError::unknown_month("Xyz").to_string(),
            "unknown month abbreviation 'Xyz'"
        );
    }

    #[test]
    fn header_error_classification() {
        assert!(RosterError::MissingHeader.is_header_error());
        assert!(RosterError::unknown_month("Xyz").is_header_error());
        assert!(RosterError::malformed_header("Jan").is_header_error());
        assert!(!RosterError::person_not_found("Bob").is_header_error());
        assert!(!RosterError::MissingDayRow.is_header_error());
    }
}
