use std::sync::LazyLock;

use regex::Regex;
use shiftcal_core::{DAY_ROW, FIRST_SHIFT_COLUMN, HEADER_ROW, NAME_COLUMN, RosterTable};
use tracing::{debug, warn};

use super::{ExtractError, ExtractResult, TableExtractor};

/// Column gap in extracted text: a tab, or two or more spaces.
static COLUMN_GAP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\t+|[ ]{2,}").expect("Invalid column gap regex"));

const PAGE_BREAK: char = '\x0C';

/// Per-person metadata (qualification or team) sits between name and shifts.
const METADATA_COLUMN: usize = 1;

/// Reads the roster table from the first page of a PDF.
///
/// Works on the text layer: each non-blank line is a row and runs of two or
/// more spaces separate tokens. The day-number row fixes the shift columns;
/// person-row tokens are placed under the day whose position they share, so
/// blank cells in the source keep their column.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfTableExtractor;

impl PdfTableExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl TableExtractor for PdfTableExtractor {
    fn name(&self) -> &'static str {
        "pdf"
    }

    fn extract(&self, data: &[u8]) -> ExtractResult<RosterTable> {
        // pdf-extract panics on some malformed files.
        let text = std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem(data))
            .map_err(|_| ExtractError::pdf("document could not be parsed"))?
            .map_err(|e| ExtractError::pdf(e.to_string()))?;

        if text.split(PAGE_BREAK).skip(1).any(|page| !page.trim().is_empty()) {
            warn!("PDF has more than one page, only the first is read");
        }

        let table = table_from_text(&text);
        if table.is_empty() {
            return Err(ExtractError::Empty);
        }
        debug!(
            rows = table.row_count(),
            columns = table.column_count(),
            "read PDF roster"
        );
        Ok(table)
    }
}

/// A piece of text between column gaps and its character offset.
#[derive(Debug, Clone, Copy)]
struct Token<'a> {
    text: &'a str,
    start: usize,
    len: usize,
}

impl Token<'_> {
    /// Twice the center offset, to stay in integers.
    fn center2(&self) -> usize {
        2 * self.start + self.len
    }

    fn is_day(&self) -> bool {
        let digits = self.text.trim_end_matches('.');
        !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
    }
}

fn tokens(line: &str) -> Vec<Token<'_>> {
    let mut out = Vec::new();
    let mut from = 0;
    for gap in COLUMN_GAP.find_iter(line) {
        push_token(&mut out, line, from, gap.start());
        from = gap.end();
    }
    push_token(&mut out, line, from, line.len());
    out
}

fn push_token<'a>(out: &mut Vec<Token<'a>>, line: &'a str, from: usize, to: usize) {
    let raw = &line[from..to];
    let text = raw.trim();
    if text.is_empty() {
        return;
    }
    let lead = raw.len() - raw.trim_start().len();
    out.push(Token {
        text,
        start: line[..from + lead].chars().count(),
        len: text.chars().count(),
    });
}

/// Splits the first page of extracted text into a table.
///
/// Row 0 is taken as split. Day tokens of row 1 start at
/// [`FIRST_SHIFT_COLUMN`]. A person row with one token per day (plus an
/// optional metadata token) is placed in order; a sparser row is placed by
/// nearest day position. Without any day number every row is taken as split.
pub fn table_from_text(text: &str) -> RosterTable {
    let first_page = text.split(PAGE_BREAK).next().unwrap_or_default();
    let lines: Vec<Vec<Token<'_>>> = first_page
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(tokens)
        .collect();

    let Some(anchors) = lines.get(DAY_ROW).map(|row| day_anchors(row)) else {
        return split_rows(&lines);
    };
    if anchors.days.is_empty() {
        return split_rows(&lines);
    }

    let mut rows: Vec<Vec<&str>> = Vec::with_capacity(lines.len());
    for (index, line) in lines.iter().enumerate() {
        let row = match index {
            HEADER_ROW => line.iter().map(|t| t.text).collect(),
            DAY_ROW => anchors.day_row(),
            _ => anchors.place(index, line),
        };
        rows.push(row);
    }
    RosterTable::from_rows(rows)
}

fn split_rows(lines: &[Vec<Token<'_>>]) -> RosterTable {
    RosterTable::from_rows(
        lines
            .iter()
            .map(|line| line.iter().map(|t| t.text).collect::<Vec<_>>()),
    )
}

/// Day-row layout: where each day column sits on the page.
struct DayAnchors<'a> {
    /// Non-day tokens in front of the first day.
    leading: Vec<&'a str>,
    days: Vec<Token<'a>>,
    first_column: usize,
}

fn day_anchors<'a>(row: &[Token<'a>]) -> DayAnchors<'a> {
    let split = row.iter().position(Token::is_day).unwrap_or(row.len());
    let leading: Vec<&str> = row[..split].iter().map(|t| t.text).collect();
    let first_column = FIRST_SHIFT_COLUMN.get().max(leading.len());
    DayAnchors {
        leading,
        days: row[split..].to_vec(),
        first_column,
    }
}

impl<'a> DayAnchors<'a> {
    fn width(&self) -> usize {
        self.first_column + self.days.len()
    }

    fn day_row(&self) -> Vec<&'a str> {
        let mut row = vec![""; self.width()];
        for (column, text) in self.leading.iter().enumerate() {
            row[column] = *text;
        }
        for (offset, day) in self.days.iter().enumerate() {
            row[self.first_column + offset] = day.text;
        }
        row
    }

    fn place(&self, index: usize, line: &[Token<'a>]) -> Vec<&'a str> {
        let Some((name, rest)) = line.split_first() else {
            return Vec::new();
        };
        let mut row = vec![""; self.width()];
        row[NAME_COLUMN.get()] = name.text;

        let count = self.days.len();
        if rest.len() == count || rest.len() == count + 1 {
            let (meta, shifts) = rest.split_at(rest.len() - count);
            if let Some(meta) = meta.first() {
                row[METADATA_COLUMN] = meta.text;
            }
            for (offset, token) in shifts.iter().enumerate() {
                row[self.first_column + offset] = token.text;
            }
            return row;
        }

        let first_day_start2 = self.days.first().map_or(0, |d| 2 * d.start);
        for token in rest {
            let column = if token.center2() < first_day_start2 {
                METADATA_COLUMN
            } else {
                self.first_column + self.nearest_day(token)
            };
            if row[column].is_empty() {
                row[column] = token.text;
            } else {
                warn!(
                    row = index,
                    column,
                    token = token.text,
                    "overlapping roster cells, token dropped"
                );
            }
        }
        row
    }

    fn nearest_day(&self, token: &Token<'_>) -> usize {
        let center = token.center2();
        self.days
            .iter()
            .enumerate()
            .min_by_key(|(_, day)| day.center2().abs_diff(center))
            .map_or(0, |(offset, _)| offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shiftcal_core::{ColumnIndex, EventBuilder, parse_roster};

    #[test]
    fn splits_lines_on_wide_gaps() {
        let text = "Jan 24\n\n        1    2    3\nAlice Muster   RS   K00  X    DK1\n";
        let table = table_from_text(text);

        assert_eq!(table.row_count(), 3);
        assert_eq!(table.cell(0, ColumnIndex(0)), Some("Jan 24"));
        assert_eq!(table.cell(1, ColumnIndex(0)), None);
        assert_eq!(table.cell(1, ColumnIndex(1)), None);
        assert_eq!(table.cell(1, FIRST_SHIFT_COLUMN), Some("1"));
        assert_eq!(table.cell(2, ColumnIndex(0)), Some("Alice Muster"));
        assert_eq!(table.cell(2, ColumnIndex(1)), Some("RS"));
        assert_eq!(table.cell(2, FIRST_SHIFT_COLUMN), Some("K00"));
        assert_eq!(table.cell(2, ColumnIndex(4)), Some("DK1"));
        assert_eq!(table.people(), vec!["Alice Muster"]);

        let roster = parse_roster(&table, "Alice Muster").unwrap();
        let plan = EventBuilder::default().build(&roster).unwrap();
        insta::assert_snapshot!(plan.render(), @r"
        K00 2024-01-01 03:15 -> 11:00
        DK1 2024-01-03 01:30 -> 09:00
        ");
        assert_eq!(plan.days_off(), 1);
    }

    #[test]
    fn tabs_separate_cells() {
        let table = table_from_text("Feb 24\n\t\t1\t2\nBob\tRS\tK01\tK02");
        assert_eq!(table.cell(1, FIRST_SHIFT_COLUMN), Some("1"));
        assert_eq!(table.cell(2, FIRST_SHIFT_COLUMN), Some("K01"));
        assert_eq!(table.cell(2, ColumnIndex(3)), Some("K02"));
    }

    #[test]
    fn sparse_rows_follow_day_positions() {
        let text = [
            "Jan 24".to_string(),
            format!("{}1   2     3", " ".repeat(21)),
            "Alice Muster   RS   K00  X    DK1".to_string(),
            format!("Bob{}RS{}K04", " ".repeat(12), " ".repeat(8)),
            format!("Carol{}DK2", " ".repeat(25)),
        ]
        .join("\n");
        let table = table_from_text(&text);

        assert_eq!(table.cell(3, ColumnIndex(1)), Some("RS"));
        assert_eq!(table.cell(3, FIRST_SHIFT_COLUMN), None);
        assert_eq!(table.cell(3, ColumnIndex(3)), Some("K04"));
        assert_eq!(table.cell(4, ColumnIndex(1)), None);
        assert_eq!(table.cell(4, ColumnIndex(4)), Some("DK2"));

        let roster = parse_roster(&table, "Bob").unwrap();
        let plan = EventBuilder::default().build(&roster).unwrap();
        insta::assert_snapshot!(plan.render(), @"K04 2024-01-02 07:00 -> 16:15");
        assert_eq!(plan.days_off(), 2);
    }

    #[test]
    fn leading_labels_on_the_day_row_are_kept() {
        let table = table_from_text("Mär 24\nName  Team  1.  2.\nAlice  RS  SK1  SK2\n");
        assert_eq!(table.cell(1, ColumnIndex(0)), Some("Name"));
        assert_eq!(table.cell(1, ColumnIndex(1)), Some("Team"));
        assert_eq!(table.cell(1, FIRST_SHIFT_COLUMN), Some("1."));
        assert_eq!(table.cell(2, ColumnIndex(3)), Some("SK2"));
    }

    #[test]
    fn without_day_numbers_rows_are_split_as_is() {
        let table = table_from_text("Jan 24\nfoo  bar\nAlice  K00\n");
        assert_eq!(table.cell(1, ColumnIndex(0)), Some("foo"));
        assert_eq!(table.cell(2, ColumnIndex(1)), Some("K00"));
    }

    #[test]
    fn ignores_pages_after_the_first() {
        let table = table_from_text("Jan 24\n  1\nAlice  K00\n\x0CFeb 24\n  1\nBob  K01\n");
        assert_eq!(table.row_count(), 3);
        assert_eq!(table.people(), vec!["Alice"]);
    }

    #[test]
    fn blank_text_gives_empty_table() {
        assert!(table_from_text(" \n\n").is_empty());
    }

    #[test]
    fn garbage_bytes_are_a_pdf_error() {
        let err = PdfTableExtractor::new().extract(b"not a pdf").unwrap_err();
        assert!(matches!(err, ExtractError::Pdf { .. }));
    }
}
