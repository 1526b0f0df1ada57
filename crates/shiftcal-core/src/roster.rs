//! Roster tables and the roster parser.
//!
//! A roster is a header-less grid:
//!
//! ```text
//!            col 0      col 1   col 2  col 3  ...
//! row 0      "Jan 24"
//! row 1                         "1"    "2"    ...   day of month
//! row 2      "Alice"    ...     "K00"  "X"    ...   shift codes
//! row 3      "Bob"      ...     ""     "DK1"  ...
//! ```
//!
//! Columns are aligned by position only. Every cell carries its
//! [`ColumnIndex`] so later stages join day numbers and shift codes by
//! column rather than by slice position.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{RosterError, RosterResult};

/// Row holding the month/year header in column 0.
pub const HEADER_ROW: usize = 0;
/// Row holding the day-of-month numbers.
pub const DAY_ROW: usize = 1;
/// First row holding a person.
pub const FIRST_PERSON_ROW: usize = 2;
/// Column holding the header and the person names.
pub const NAME_COLUMN: ColumnIndex = ColumnIndex(0);

/// Zero-based column position in a roster table.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ColumnIndex(pub usize);

impl ColumnIndex {
    /// Returns the raw column position.
    pub fn get(self) -> usize {
        self.0
    }
}

impl fmt::Display for ColumnIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One roster cell and its column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    pub column: ColumnIndex,
    /// Trimmed text, `None` when the cell is empty.
    pub value: Option<String>,
}

impl Cell {
    /// Creates a cell, normalizing blank text to `None`.
    pub fn new(column: usize, value: Option<&str>) -> Self {
        let value = value
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string);
        Self {
            column: ColumnIndex(column),
            value,
        }
    }

    /// Returns the cell text, if any.
    pub fn text(&self) -> Option<&str> {
        self.value.as_deref()
    }
}

/// A rectangular-ish grid of roster cells.
///
/// Rows may have different lengths; missing trailing cells read as empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterTable {
    rows: Vec<Vec<Cell>>,
}

impl RosterTable {
    /// Builds a table from raw rows of text.
    pub fn from_rows<R, C, S>(rows: R) -> Self
    where
        R: IntoIterator<Item = C>,
        C: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let rows = rows
            .into_iter()
            .map(|row| {
                row.into_iter()
                    .enumerate()
                    .map(|(column, text)| Cell::new(column, Some(text.as_ref())))
                    .collect()
            })
            .collect();
        Self { rows }
    }

    /// Number of rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Width of the widest row.
    pub fn column_count(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    /// Returns true if the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Returns the cells of a row.
    pub fn row(&self, index: usize) -> Option<&[Cell]> {
        self.rows.get(index).map(Vec::as_slice)
    }

    /// Returns the text of a cell, `None` if it is empty or out of range.
    pub fn cell(&self, row: usize, column: ColumnIndex) -> Option<&str> {
        self.rows
            .get(row)
            .and_then(|cells| cells.get(column.get()))
            .and_then(Cell::text)
    }

    /// Names of all person rows, in row order.
    pub fn people(&self) -> Vec<&str> {
        self.rows
            .iter()
            .skip(FIRST_PERSON_ROW)
            .filter_map(|row| row.get(NAME_COLUMN.get()).and_then(Cell::text))
            .collect()
    }
}

/// A person's row without its name cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonRow {
    pub name: String,
    /// Row index in the table.
    pub row: usize,
    /// Cells from column 1 onward, unmodified.
    pub cells: Vec<Cell>,
}

/// The parts of a roster needed to build one person's events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedRoster {
    /// Raw month/year header text, e.g. `"Jan 24"`.
    pub header: String,
    /// The full day-number row, column 0 included.
    pub days: Vec<Cell>,
    pub person: PersonRow,
    /// Further rows with the same name, ignored in favour of the first.
    pub duplicate_rows: Vec<usize>,
}

/// Locates the header, day row and the named person's row.
///
/// Names are compared exactly (case-sensitive, after trimming the cell).
/// When several rows carry the name, the first one wins.
///
/// # Errors
///
/// - [`RosterError::MissingHeader`] if cell (0, 0) is empty
/// - [`RosterError::MissingDayRow`] if there is no row 1
/// - [`RosterError::PersonNotFound`] if no person row matches
pub fn parse_roster(table: &RosterTable, name: &str) -> RosterResult<ParsedRoster> {
    let header = table
        .cell(HEADER_ROW, NAME_COLUMN)
        .ok_or(RosterError::MissingHeader)?
        .to_string();

    let days = table.row(DAY_ROW).ok_or(RosterError::MissingDayRow)?.to_vec();

    let mut matches = table
        .rows
        .iter()
        .enumerate()
        .skip(FIRST_PERSON_ROW)
        .filter(|(_, row)| row.first().and_then(Cell::text) == Some(name))
        .map(|(index, _)| index);

    let row = matches
        .next()
        .ok_or_else(|| RosterError::person_not_found(name))?;
    let duplicate_rows: Vec<usize> = matches.collect();

    if !duplicate_rows.is_empty() {
        warn!(
            person = name,
            row,
            duplicates = ?duplicate_rows,
            "person appears in several roster rows, using the first"
        );
    }

    let cells = table.rows[row].iter().skip(1).cloned().collect();
    debug!(person = name, row, header = %header, "located roster row");

    Ok(ParsedRoster {
        header,
        days,
        person: PersonRow {
            name: name.to_string(),
            row,
            cells,
        },
        duplicate_rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> RosterTable {
        RosterTable::from_rows(vec![
            vec!["Jan 24"],
            vec!["", "", "1", "2", "3"],
            vec!["Alice", "TL", "K00", "X", ""],
            vec!["Bob", "", "", "DK1"],
            vec!["", "", "K01"],
        ])
    }

    #[test]
    fn table_shape() {
        let table = sample();
        assert_eq!(table.row_count(), 5);
        assert_eq!(table.column_count(), 5);
        assert_eq!(table.cell(0, ColumnIndex(0)), Some("Jan 24"));
        assert_eq!(table.cell(1, ColumnIndex(0)), None);
        assert_eq!(table.cell(3, ColumnIndex(9)), None);
        assert_eq!(table.people(), vec!["Alice", "Bob"]);
    }

    #[test]
    fn parse_returns_remaining_cells_unmodified() {
        let parsed = parse_roster(&sample(), "Alice").unwrap();
        assert_eq!(parsed.header, "Jan 24");
        assert_eq!(parsed.person.row, 2);

        let texts: Vec<Option<&str>> = parsed.person.cells.iter().map(Cell::text).collect();
        assert_eq!(texts, vec![Some("TL"), Some("K00"), Some("X"), None]);

        let columns: Vec<usize> = parsed.person.cells.iter().map(|c| c.column.get()).collect();
        assert_eq!(columns, vec![1, 2, 3, 4]);

        assert_eq!(parsed.days.len(), 5);
        assert_eq!(parsed.days[2].text(), Some("1"));
    }

    #[test]
    fn missing_person() {
        assert_eq!(
            parse_roster(&sample(), "Carol"),
            Err(RosterError::person_not_found("Carol"))
        );
    }

    #[test]
    fn name_match_is_case_sensitive() {
        assert!(parse_roster(&sample(), "alice").is_err());
    }

    #[test]
    fn header_and_day_rows_are_not_people() {
        // "Jan 24" sits in column 0 but is never a person.
        assert!(parse_roster(&sample(), "Jan 24").is_err());
    }

    #[test]
    fn first_match_wins() {
        let table = RosterTable::from_rows(vec![
            vec!["Jan 24"],
            vec!["", "", "1"],
            vec!["Alice", "", "K00"],
            vec!["Alice", "", "K04"],
        ]);
        let parsed = parse_roster(&table, "Alice").unwrap();
        assert_eq!(parsed.person.row, 2);
        assert_eq!(parsed.person.cells[1].text(), Some("K00"));
        assert_eq!(parsed.duplicate_rows, vec![3]);
    }

    #[test]
    fn missing_header_and_day_row() {
        assert_eq!(
            parse_roster(&RosterTable::default(), "Alice"),
            Err(RosterError::MissingHeader)
        );
        let table = RosterTable::from_rows(vec![vec!["Jan 24"]]);
        assert_eq!(
            parse_roster(&table, "Alice"),
            Err(RosterError::MissingDayRow)
        );
    }
}
