pub mod sheet_models;
pub mod sheet_service;

pub use sheet_models::{AppendOutcome, Record, SheetRange};
pub use sheet_service::{SheetError, SheetService, SpreadsheetBackend};
