use std::fmt;

use serde::Serialize;
use serde_json::{Map, Value};

use super::sheet_service::SheetError;

/// One data row keyed by the sheet's header names.
///
/// Backed by an insertion-ordered map, so records serialize with their columns
/// in sheet order. Every value produced by the reader is a JSON string.
pub type Record = Map<String, Value>;

/// A rectangular region of a single sheet, e.g. `Contacts!A:Z`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetRange {
    sheet: String,
    cells: String,
}

impl SheetRange {
    /// Column-bounded range with an open-ended row span (`<sheet>!<start>:<end>`).
    pub fn columns(sheet: &str, start: &str, end: &str) -> Result<Self, SheetError> {
        if sheet.trim().is_empty() {
            return Err(SheetError::InvalidRange(
                "sheet name must not be empty".to_string(),
            ));
        }

        Ok(Self {
            sheet: sheet.to_string(),
            cells: format!("{}:{}", start, end),
        })
    }

    /// The `A:Z` range every HTTP endpoint works against.
    pub fn whole_sheet(sheet: &str) -> Result<Self, SheetError> {
        Self::columns(sheet, "A", "Z")
    }

    /// Row 1 of the same sheet, where the column headers live.
    pub fn header_row(&self) -> Self {
        Self {
            sheet: self.sheet.clone(),
            cells: "1:1".to_string(),
        }
    }

    pub fn sheet_name(&self) -> &str {
        &self.sheet
    }

    pub fn cells(&self) -> &str {
        &self.cells
    }

    /// A1 notation understood by the Sheets API. Names with anything other than
    /// ASCII alphanumerics or underscores are single-quoted.
    pub fn to_a1(&self) -> String {
        let plain = self
            .sheet
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');

        if plain {
            format!("{}!{}", self.sheet, self.cells)
        } else {
            format!("'{}'!{}", self.sheet.replace('\'', "''"), self.cells)
        }
    }
}

impl fmt::Display for SheetRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_a1())
    }
}

/// Result of an append as reported by the spreadsheet backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppendOutcome {
    pub updated_row_count: u64,
}

/// Text written to a cell for a JSON value.
pub fn cell_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Map raw rows to records using the first row as headers.
///
/// Fewer than two rows (no header, or a header without data) yields nothing.
/// Cells missing from the end of a short row become empty strings; a repeated
/// header keeps its first position and takes the later column's value.
pub fn records_from_rows(rows: &[Vec<String>]) -> Vec<Record> {
    let Some((headers, data_rows)) = rows.split_first() else {
        return Vec::new();
    };
    if data_rows.is_empty() {
        return Vec::new();
    }

    data_rows
        .iter()
        .map(|row| {
            let mut record = Record::new();
            for (i, header) in headers.iter().enumerate() {
                let cell = row.get(i).cloned().unwrap_or_default();
                record.insert(header.clone(), Value::String(cell));
            }
            record
        })
        .collect()
}

/// Lay a record out as one row in header order, blank where a key is absent.
pub fn project_row(record: &Record, headers: &[String]) -> Vec<String> {
    headers
        .iter()
        .map(|header| record.get(header).map(cell_text).unwrap_or_default())
        .collect()
}
