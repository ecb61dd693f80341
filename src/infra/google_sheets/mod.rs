// =============================================================================
// GOOGLE SHEETS MODULE
// =============================================================================
//
// Implements the core `SpreadsheetBackend` over the Sheets v4 REST API.
// Lives in the infra layer because it handles external I/O; the core only
// sees rows of strings.

pub mod service_account;
pub mod sheets_client;

pub use service_account::{ServiceAccountAuth, SPREADSHEETS_SCOPE};
pub use sheets_client::GoogleSheetsClient;
