use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::service_account::ServiceAccountAuth;
use crate::core::sheets::sheet_models::cell_text;
use crate::core::sheets::{SheetError, SheetRange, SpreadsheetBackend};

const SHEETS_API_BASE: &str = "https://sheets.googleapis.com/v4/spreadsheets";

/// Google Sheets v4 values API for a single spreadsheet.
pub struct GoogleSheetsClient {
    client: Client,
    auth: ServiceAccountAuth,
    spreadsheet_id: String,
    base_url: String,
}

impl GoogleSheetsClient {
    pub fn new(auth: ServiceAccountAuth, spreadsheet_id: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            auth,
            spreadsheet_id: spreadsheet_id.into(),
            base_url: SHEETS_API_BASE.to_string(),
        }
    }

    /// `<base>/<spreadsheet id>/values/<range><suffix>` with the range
    /// percent-encoded as a single path segment.
    fn values_url(&self, range: &SheetRange, suffix: &str) -> Result<Url, SheetError> {
        let mut url =
            Url::parse(&self.base_url).map_err(|e| SheetError::Upstream(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| SheetError::Upstream(format!("Cannot use {} as a base URL", self.base_url)))?
            .push(&self.spreadsheet_id)
            .push("values")
            .push(&format!("{}{}", range.to_a1(), suffix));
        Ok(url)
    }

    async fn bearer_token(&self) -> Result<String, SheetError> {
        self.auth
            .get_access_token()
            .await
            .map_err(|e| SheetError::Upstream(format!("Google auth failed: {}", e)))
    }

    async fn error_from(response: reqwest::Response) -> SheetError {
        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        SheetError::Upstream(format!(
            "Google Sheets API error ({}): {}. \
             Make sure the spreadsheet is shared with your service account email.",
            status, text
        ))
    }
}

#[async_trait]
impl SpreadsheetBackend for GoogleSheetsClient {
    async fn get_values(&self, range: &SheetRange) -> Result<Vec<Vec<String>>, SheetError> {
        let url = self.values_url(range, "")?;
        let token = self.bearer_token().await?;

        tracing::debug!("Fetching sheet values: {}", range);

        let response = self
            .client
            .get(url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| SheetError::Upstream(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }

        let body: ValueRange = response
            .json()
            .await
            .map_err(|e| SheetError::Upstream(e.to_string()))?;

        Ok(body.into_rows())
    }

    async fn append_values(
        &self,
        range: &SheetRange,
        rows: &[Vec<String>],
    ) -> Result<u64, SheetError> {
        let url = self.values_url(range, ":append")?;
        let token = self.bearer_token().await?;

        tracing::debug!("Appending {} row(s) to {}", rows.len(), range);

        let response = self
            .client
            .post(url)
            .bearer_auth(token)
            .query(&[("valueInputOption", "USER_ENTERED")])
            .json(&AppendRequest { values: rows })
            .send()
            .await
            .map_err(|e| SheetError::Upstream(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }

        let body: AppendResponse = response
            .json()
            .await
            .map_err(|e| SheetError::Upstream(e.to_string()))?;

        Ok(body
            .updates
            .and_then(|u| u.updated_rows)
            .unwrap_or_default())
    }
}

// =============================================================================
// GOOGLE SHEETS API REQUEST / RESPONSE STRUCTURES
// =============================================================================

#[derive(Debug, Deserialize)]
struct ValueRange {
    /// Omitted entirely when the range is empty.
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

impl ValueRange {
    /// Formatted values arrive as strings; anything else is rendered as text.
    fn into_rows(self) -> Vec<Vec<String>> {
        self.values
            .into_iter()
            .map(|row| row.iter().map(cell_text).collect())
            .collect()
    }
}

#[derive(Debug, Serialize)]
struct AppendRequest<'a> {
    values: &'a [Vec<String>],
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AppendResponse {
    updates: Option<UpdateValuesResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateValuesResponse {
    updated_rows: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::google_sheets::service_account::SPREADSHEETS_SCOPE;

    fn client() -> GoogleSheetsClient {
        let auth = ServiceAccountAuth::from_parts("a@b.c", "key", SPREADSHEETS_SCOPE);
        GoogleSheetsClient::new(auth, "sheet-id-123")
    }

    #[test]
    fn values_url_encodes_range_segment() {
        let range = SheetRange::whole_sheet("Sheet1").unwrap();
        let url = client().values_url(&range, "").unwrap();
        assert_eq!(
            url.as_str(),
            "https://sheets.googleapis.com/v4/spreadsheets/sheet-id-123/values/Sheet1!A:Z"
        );
    }

    #[test]
    fn append_url_keeps_quoted_names_in_one_segment() {
        let range = SheetRange::whole_sheet("Q1/Leads list").unwrap();
        let url = client().values_url(&range, ":append").unwrap();
        assert_eq!(
            url.as_str(),
            "https://sheets.googleapis.com/v4/spreadsheets/sheet-id-123/values/'Q1%2FLeads%20list'!A:Z:append"
        );
    }

    #[test]
    fn missing_values_mean_no_rows() {
        let body: ValueRange =
            serde_json::from_str(r#"{"range": "Sheet1!A1:Z1000", "majorDimension": "ROWS"}"#)
                .unwrap();
        assert!(body.into_rows().is_empty());
    }

    #[test]
    fn ragged_rows_survive_parsing() {
        let body: ValueRange = serde_json::from_str(
            r#"{"values": [["name", "email"], ["Ann", "a@x.com"], ["Bo"], [42, true]]}"#,
        )
        .unwrap();

        assert_eq!(
            body.into_rows(),
            vec![
                vec!["name", "email"],
                vec!["Ann", "a@x.com"],
                vec!["Bo"],
                vec!["42", "true"],
            ]
        );
    }

    #[test]
    fn append_response_without_updates_counts_zero() {
        let body: AppendResponse = serde_json::from_str(r#"{"spreadsheetId": "x"}"#).unwrap();
        assert!(body.updates.and_then(|u| u.updated_rows).is_none());

        let body: AppendResponse =
            serde_json::from_str(r#"{"updates": {"updatedRows": 3, "updatedCells": 6}}"#).unwrap();
        assert_eq!(body.updates.and_then(|u| u.updated_rows), Some(3));
    }

    #[test]
    fn append_request_serializes_rows() {
        let rows = vec![vec!["a".to_string(), "1".to_string()]];
        let json = serde_json::to_value(AppendRequest { values: &rows }).unwrap();
        assert_eq!(json, serde_json::json!({"values": [["a", "1"]]}));
    }
}
