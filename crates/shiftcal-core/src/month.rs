//! Month-name resolution and the roster's month/year header.
//!
//! Resolution is table driven: [`MonthResolver::german`] carries the tokens
//! seen on German rosters, and further locales or spellings are added with
//! [`MonthResolver::with_alias`] rather than new code.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{RosterError, RosterResult};

/// German three-letter month abbreviations.
const GERMAN_MONTHS: [(&str, u32); 12] = [
    ("Jan", 1),
    ("Feb", 2),
    ("Mär", 3),
    ("Apr", 4),
    ("Mai", 5),
    ("Jun", 6),
    ("Jul", 7),
    ("Aug", 8),
    ("Sep", 9),
    ("Okt", 10),
    ("Nov", 11),
    ("Dez", 12),
];

/// Alternative spellings found on German rosters.
///
/// `MÃ¤r` is `Mär` after a UTF-8/Latin-1 mix-up, which is what PDF table
/// extraction commonly hands back.
const GERMAN_ALIASES: [(&str, u32); 2] = [("Mrz", 3), ("MÃ¤r", 3)];

/// Maps month abbreviations to month numbers (1..=12).
#[derive(Debug, Clone)]
pub struct MonthResolver {
    entries: Vec<(String, u32)>,
}

impl MonthResolver {
    /// Creates a resolver from `(token, month)` pairs.
    ///
    /// Pairs with a month outside 1..=12 are dropped.
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, u32)>,
        S: Into<String>,
    {
        Self {
            entries: entries
                .into_iter()
                .filter(|(_, month)| (1..=12).contains(month))
                .map(|(token, month)| (token.into().to_lowercase(), month))
                .collect(),
        }
    }

    /// Resolver for German roster headers.
    pub fn german() -> Self {
        Self::new(GERMAN_MONTHS.into_iter().chain(GERMAN_ALIASES))
    }

    /// Adds an extra token for a month.
    ///
    /// Months outside 1..=12 are ignored.
    #[must_use]
    pub fn with_alias(mut self, token: impl Into<String>, month: u32) -> Self {
        if (1..=12).contains(&month) {
            self.entries.push((token.into().to_lowercase(), month));
        }
        self
    }

    /// Resolves a month token. Matching ignores case and a trailing `.`.
    ///
    /// # Errors
    ///
    /// Returns [`RosterError::UnknownMonth`] if the token is not in the table.
    pub fn resolve(&self, token: &str) -> RosterResult<u32> {
        let needle = token.trim().trim_end_matches('.').to_lowercase();
        self.entries
            .iter()
            .find(|(entry, _)| *entry == needle)
            .map(|(_, month)| *month)
            .ok_or_else(|| RosterError::unknown_month(token))
    }

    /// Returns the number of known tokens.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the resolver knows no tokens.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for MonthResolver {
    fn default() -> Self {
        Self::german()
    }
}

/// The month and year a roster covers, parsed from its header cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthYear {
    /// Month number, 1..=12.
    pub month: u32,
    /// Full calendar year.
    pub year: i32,
}

impl MonthYear {
    /// Parses a header such as `"Jan 24"` or `"Mär 2025"`.
    ///
    /// Two-digit years are taken as `20yy`.
    ///
    /// # Errors
    ///
    /// Returns [`RosterError::MalformedHeader`] unless the header is exactly
    /// a month token and a year, and [`RosterError::UnknownMonth`] if the
    /// month token does not resolve.
    pub fn parse(header: &str, resolver: &MonthResolver) -> RosterResult<Self> {
        let mut parts = header.split_whitespace();
        let (Some(month_token), Some(year_token), None) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(RosterError::malformed_header(header));
        };

        let month = resolver.resolve(month_token)?;
        let year = parse_year(year_token).ok_or_else(|| RosterError::malformed_header(header))?;

        Ok(Self { month, year })
    }

    /// Returns the date of `day` in this month, if it exists.
    pub fn date(&self, day: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, day)
    }
}

fn parse_year(token: &str) -> Option<i32> {
    if !token.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let value: i32 = token.parse().ok()?;
    match token.len() {
        2 => Some(2000 + value),
        4 => Some(value),
        _ => None,
    }
}
