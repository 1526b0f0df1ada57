use shiftcal_core::RosterTable;
use tracing::debug;

use super::{ExtractError, ExtractResult, TableExtractor};

/// Reads a header-less CSV roster.
///
/// Rows may have different widths. Row 0 is the month header, so the CSV
/// reader must not treat it as column names.
#[derive(Debug, Clone, Copy)]
pub struct CsvTableExtractor {
    delimiter: u8,
}

impl CsvTableExtractor {
    pub fn new() -> Self {
        Self { delimiter: b',' }
    }

    /// Sets the field delimiter (e.g. `b';'` for spreadsheet exports).
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }
}

impl Default for CsvTableExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl TableExtractor for CsvTableExtractor {
    fn name(&self) -> &'static str {
        "csv"
    }

    fn extract(&self, data: &[u8]) -> ExtractResult<RosterTable> {
        let mut reader = ::csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .delimiter(self.delimiter)
            .from_reader(data);

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            rows.push(record.iter().map(str::to_string).collect::<Vec<_>>());
        }

        if rows.is_empty() {
            return Err(ExtractError::Empty);
        }
        debug!(rows = rows.len(), "read CSV roster");
        Ok(RosterTable::from_rows(rows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shiftcal_core::ColumnIndex;

    #[test]
    fn reads_ragged_rows_without_header() {
        let data = "Jan 24\n,,1,2,3\nAlice,,K00,X\nBob,RS,DK1,K02,SK1\n";
        let table = CsvTableExtractor::new().extract(data.as_bytes()).unwrap();

        assert_eq!(table.row_count(), 4);
        assert_eq!(table.column_count(), 5);
        assert_eq!(table.cell(0, ColumnIndex(0)), Some("Jan 24"));
        assert_eq!(table.cell(1, ColumnIndex(0)), None);
        assert_eq!(table.cell(1, ColumnIndex(2)), Some("1"));
        assert_eq!(table.cell(2, ColumnIndex(4)), None);
        assert_eq!(table.people(), vec!["Alice", "Bob"]);
    }

    #[test]
    fn custom_delimiter() {
        let data = "Mär 24\n;;1\nAlice;;K03\n";
        let table = CsvTableExtractor::new()
            .with_delimiter(b';')
            .extract(data.as_bytes())
            .unwrap();
        assert_eq!(table.cell(2, ColumnIndex(2)), Some("K03"));
    }

    #[test]
    fn empty_input_is_an_error() {
        assert!(matches!(
            CsvTableExtractor::new().extract(b""),
            Err(ExtractError::Empty)
        ));
    }
}
