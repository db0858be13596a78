//! Roster reader for spreadsheets and CSV tables.
//!
//! Workbooks (`.xlsx`, `.xlsm`, `.xlsb`, `.xls`, `.ods`) are read from their
//! first sheet with `calamine`; anything else is parsed as CSV. Either way
//! the first row is the header and columns are located by their label, so
//! the table may carry any number of extra columns in any order.

use super::model::RosterRow;
use crate::error::{Error, Result};
use calamine::{Reader, open_workbook_auto};
use std::path::Path;
use thiserror::Error as ThisError;
use tracing::debug;

/// File extensions read as workbooks.
const WORKBOOK_EXTENSIONS: [&str; 5] = ["xlsx", "xlsm", "xlsb", "xls", "ods"];

/// Problems with the roster's structure or encoding.
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
pub enum RosterError {
    /// The file could not be opened.
    #[error("{0}")]
    Io(String),
    /// The table holds no header row.
    #[error("missing header row")]
    MissingHeader,
    /// A required label is absent from the header.
    #[error("column '{0}' not found in header")]
    MissingColumn(String),
    /// The CSV text could not be parsed.
    #[error("invalid CSV: {0}")]
    Csv(String),
    /// The workbook could not be opened or holds no sheet.
    #[error("invalid workbook: {0}")]
    Workbook(String),
}

/// Reads the roster at `path`, choosing the format by file extension.
///
/// # Errors
///
/// Returns [`Error::Load`] if the file cannot be read or parsed, or lacks
/// one of the labelled columns.
pub fn read_roster(path: &Path, name_column: &str, email_column: &str) -> Result<Vec<RosterRow>> {
    let parsed = if is_workbook(path) {
        read_workbook(path, name_column, email_column)
    } else {
        std::fs::File::open(path)
            .map_err(|e| RosterError::Io(e.to_string()))
            .and_then(|file| rows_from_csv(file, name_column, email_column))
    };
    let rows = parsed.map_err(|e| Error::Load {
        what: "roster",
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    debug!(path = %path.display(), rows = rows.len(), "Read roster");
    Ok(rows)
}

/// Parses roster text in CSV form.
///
/// Quoted fields follow RFC 4180 and a UTF-8 byte order mark is ignored.
///
/// # Errors
///
/// Returns a [`RosterError`] when the header or a labelled column is
/// missing.
pub fn parse_csv(
    text: &str,
    name_column: &str,
    email_column: &str,
) -> std::result::Result<Vec<RosterRow>, RosterError> {
    rows_from_csv(text.as_bytes(), name_column, email_column)
}

fn is_workbook(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| WORKBOOK_EXTENSIONS.iter().any(|w| ext.eq_ignore_ascii_case(w)))
}

fn rows_from_csv(
    input: impl std::io::Read,
    name_column: &str,
    email_column: &str,
) -> std::result::Result<Vec<RosterRow>, RosterError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(input);

    let mut records = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let record = record.map_err(|e| RosterError::Csv(e.to_string()))?;
        // Physical line of the record; csv skips empty lines.
        let line = record
            .position()
            .and_then(|p| usize::try_from(p.line()).ok())
            .unwrap_or(i + 1);
        records.push((line, record.iter().map(str::to_string).collect()));
    }
    rows_from_records(records, name_column, email_column)
}

fn read_workbook(
    path: &Path,
    name_column: &str,
    email_column: &str,
) -> std::result::Result<Vec<RosterRow>, RosterError> {
    let mut workbook =
        open_workbook_auto(path).map_err(|e| RosterError::Workbook(e.to_string()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| RosterError::Workbook("no worksheet".into()))?
        .map_err(|e| RosterError::Workbook(e.to_string()))?;

    // The range starts at the first used cell, not necessarily at A1.
    let first_row = range
        .start()
        .and_then(|(row, _)| usize::try_from(row).ok())
        .unwrap_or(0);
    let records = range
        .rows()
        .enumerate()
        .map(|(i, cells)| (first_row + i + 1, cells.iter().map(ToString::to_string).collect()))
        .collect();
    rows_from_records(records, name_column, email_column)
}

/// Turns `(row number, cells)` records into roster rows.
///
/// The first record is the header. Records whose cells are all blank are
/// dropped; short records yield empty strings for the missing cells.
fn rows_from_records(
    records: Vec<(usize, Vec<String>)>,
    name_column: &str,
    email_column: &str,
) -> std::result::Result<Vec<RosterRow>, RosterError> {
    let (header, body) = records.split_first().ok_or(RosterError::MissingHeader)?;
    let position = |label: &str| {
        header
            .1
            .iter()
            .position(|h| h.trim_start_matches('\u{feff}').trim() == label)
            .ok_or_else(|| RosterError::MissingColumn(label.to_string()))
    };
    let name_idx = position(name_column)?;
    let email_idx = position(email_column)?;

    let cell = |cells: &[String], idx: usize| cells.get(idx).cloned().unwrap_or_default();

    Ok(body
        .iter()
        .filter(|(_, cells)| cells.iter().any(|c| !c.trim().is_empty()))
        .map(|(row, cells)| RosterRow::new(*row, cell(cells, name_idx), cell(cells, email_idx)))
        .collect())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use rust_xlsxwriter::Workbook;

    const NAME: &str = "姓名";
    const EMAIL: &str = "電子郵件";

    #[test]
    fn resolves_columns_by_label() {
        let text = "編號,電子郵件,姓名\n1,a@x.com,Alice\n2,b@x.com,Bob\n";
        let rows = parse_csv(text, NAME, EMAIL).unwrap();
        assert_eq!(
            rows,
            vec![
                RosterRow::new(2, "Alice", "a@x.com"),
                RosterRow::new(3, "Bob", "b@x.com"),
            ]
        );
    }

    #[test]
    fn handles_bom_crlf_and_quotes() {
        let text = "\u{feff}姓名,電子郵件,備註\r\n\"Wang, Ming\",m@x.com,\"said \"\"hi\"\"\nthen left\"\r\nLee,l@x.com,\r\n";
        let rows = parse_csv(text, NAME, EMAIL).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], RosterRow::new(2, "Wang, Ming", "m@x.com"));
        assert_eq!(rows[1].name, "Lee");
        assert_eq!(rows[1].email, "l@x.com");
    }

    #[test]
    fn blank_records_are_dropped_but_keep_numbering() {
        let text = "姓名,電子郵件\nAlice,a@x.com\n\n,\nBob,b@x.com";
        let rows = parse_csv(text, NAME, EMAIL).unwrap();
        assert_eq!(
            rows,
            vec![
                RosterRow::new(2, "Alice", "a@x.com"),
                RosterRow::new(5, "Bob", "b@x.com"),
            ]
        );
    }

    #[test]
    fn short_records_yield_empty_cells() {
        let rows = parse_csv("姓名,電子郵件\nAlice\n", NAME, EMAIL).unwrap();
        assert_eq!(rows, vec![RosterRow::new(2, "Alice", "")]);
    }

    #[test]
    fn missing_column_and_header() {
        assert_eq!(
            parse_csv("name,email\n", NAME, EMAIL).unwrap_err(),
            RosterError::MissingColumn(NAME.into())
        );
        assert_eq!(parse_csv("", NAME, EMAIL).unwrap_err(), RosterError::MissingHeader);
    }

    #[test]
    fn csv_file_reports_load_errors() {
        let err = read_roster(Path::new("/nonexistent/roster.csv"), NAME, EMAIL).unwrap_err();
        assert!(err.is_load());

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("roster.csv");
        std::fs::write(&path, b"\xe5\xa7\x93\xe5\x90\x8d,\xff\n").unwrap();
        assert!(read_roster(&path, NAME, EMAIL).unwrap_err().is_load());

        std::fs::write(&path, "姓名,電子郵件\nAlice,a@x.com\n").unwrap();
        assert_eq!(read_roster(&path, NAME, EMAIL).unwrap().len(), 1);
    }

    #[test]
    fn reads_first_sheet_of_a_workbook() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("0419 聯絡資料.xlsx");

        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.write_string(0, 0, "編號").unwrap();
        sheet.write_string(0, 1, EMAIL).unwrap();
        sheet.write_string(0, 2, NAME).unwrap();
        sheet.write_number(1, 0, 1.0).unwrap();
        sheet.write_string(1, 1, "a@x.com").unwrap();
        sheet.write_string(1, 2, "王小明").unwrap();
        // Row 3 is left empty.
        sheet.write_number(3, 0, 3.0).unwrap();
        sheet.write_string(3, 2, "李小華").unwrap();
        workbook.save(&path).unwrap();

        let rows = read_roster(&path, NAME, EMAIL).unwrap();
        assert_eq!(
            rows,
            vec![
                RosterRow::new(2, "王小明", "a@x.com"),
                RosterRow::new(4, "李小華", ""),
            ]
        );
    }

    #[test]
    fn workbook_without_label_is_a_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("roster.xlsx");

        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.write_string(0, 0, "name").unwrap();
        sheet.write_string(0, 1, EMAIL).unwrap();
        workbook.save(&path).unwrap();

        let err = read_roster(&path, NAME, EMAIL).unwrap_err();
        assert!(err.is_load());
        assert!(err.to_string().contains("column '姓名' not found"));
    }

    #[test]
    fn unreadable_workbook_is_a_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("roster.xlsx");
        std::fs::write(&path, "姓名,電子郵件\n").unwrap();
        assert!(read_roster(&path, NAME, EMAIL).unwrap_err().is_load());
    }
}
