use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use super::sheet_models::{
    cell_text, project_row, records_from_rows, AppendOutcome, Record, SheetRange,
};

/// Errors raised while reading or writing a sheet.
#[derive(Debug, Error)]
pub enum SheetError {
    /// The spreadsheet backend failed (network, auth, quota, malformed range).
    #[error("Spreadsheet backend error: {0}")]
    Upstream(String),
    #[error("Invalid sheet range: {0}")]
    InvalidRange(String),
    /// Record keys with no column of the same name in the header row.
    #[error("No column named {} in the sheet's header row", .0.join(", "))]
    UnknownColumns(Vec<String>),
}

/// The two spreadsheet calls this service depends on.
#[async_trait]
pub trait SpreadsheetBackend: Send + Sync {
    /// Raw rows of the range. Rows may be shorter than the widest row.
    async fn get_values(&self, range: &SheetRange) -> Result<Vec<Vec<String>>, SheetError>;

    /// Append rows after the last row of the range, letting the backend
    /// interpret values as if typed by a user. Returns the updated row count.
    async fn append_values(
        &self,
        range: &SheetRange,
        rows: &[Vec<String>],
    ) -> Result<u64, SheetError>;
}

/// Treats a sheet as a list of records keyed by its header row.
///
/// There is no locking around appends: concurrent writers race at the backend
/// and their relative order is whatever the backend decides.
pub struct SheetService {
    backend: Arc<dyn SpreadsheetBackend>,
}

impl SheetService {
    pub fn new(backend: Arc<dyn SpreadsheetBackend>) -> Self {
        Self { backend }
    }

    pub async fn read_range_as_records(
        &self,
        range: &SheetRange,
    ) -> Result<Vec<Record>, SheetError> {
        let rows = self.backend.get_values(range).await?;
        tracing::debug!("Read {} raw row(s) from {}", rows.len(), range);
        Ok(records_from_rows(&rows))
    }

    pub async fn append_rows(
        &self,
        rows: Vec<Vec<String>>,
        range: &SheetRange,
    ) -> Result<AppendOutcome, SheetError> {
        let updated_row_count = self.backend.append_values(range, &rows).await?;
        tracing::info!(
            range = %range,
            submitted = rows.len(),
            updated = updated_row_count,
            "Appended rows to sheet"
        );
        Ok(AppendOutcome { updated_row_count })
    }

    /// Append one record laid out by `headers`. Keys outside `headers` are
    /// not written.
    pub async fn append_record_by_headers(
        &self,
        record: &Record,
        headers: &[String],
        range: &SheetRange,
    ) -> Result<AppendOutcome, SheetError> {
        let row = project_row(record, headers);
        self.append_rows(vec![row], range).await
    }

    /// Current header row of the range's sheet; empty for a blank sheet.
    pub async fn header_row(&self, range: &SheetRange) -> Result<Vec<String>, SheetError> {
        let rows = self.backend.get_values(&range.header_row()).await?;
        Ok(rows.into_iter().next().unwrap_or_default())
    }

    /// Append a record by column name, reading the sheet's headers first.
    ///
    /// Every key must name a header exactly, otherwise `UnknownColumns` is
    /// returned and no row is appended. A sheet with no header row gets the
    /// record's values in its own key order.
    pub async fn append_object(
        &self,
        record: &Record,
        range: &SheetRange,
    ) -> Result<AppendOutcome, SheetError> {
        let headers = self.header_row(range).await?;

        if headers.is_empty() {
            tracing::debug!(
                "Sheet '{}' has no header row, appending in body order",
                range.sheet_name()
            );
            let row = record.values().map(cell_text).collect();
            return self.append_rows(vec![row], range).await;
        }

        // Header names match exactly; nothing is written when any key misses.
        let unknown: Vec<String> = record
            .keys()
            .filter(|key| !headers.contains(*key))
            .cloned()
            .collect();
        if !unknown.is_empty() {
            tracing::debug!(
                "Rejecting append to '{}', unknown field(s): {}",
                range.sheet_name(),
                unknown.join(", ")
            );
            return Err(SheetError::UnknownColumns(unknown));
        }

        self.append_record_by_headers(record, &headers, range).await
    }
}
