// GET/POST /sheet/:sheet_name - a sheet tab as a list of records.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::Value;

use super::{ApiError, AppState};
use crate::core::sheets::{AppendOutcome, Record, SheetRange};

pub fn routes() -> Router<AppState> {
    Router::new().route("/sheet/:sheet_name", get(read_sheet).post(append_to_sheet))
}

async fn read_sheet(
    State(state): State<AppState>,
    Path(sheet_name): Path<String>,
) -> Result<Json<Vec<Record>>, ApiError> {
    let range = SheetRange::whole_sheet(&sheet_name)?;
    let records = state.sheets.read_range_as_records(&range).await?;
    Ok(Json(records))
}

async fn append_to_sheet(
    State(state): State<AppState>,
    Path(sheet_name): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<AppendOutcome>), ApiError> {
    let Json(body) = body?;
    let Value::Object(record) = body else {
        return Err(ApiError::BadRequest(
            "Request body must be a JSON object".to_string(),
        ));
    };

    let range = SheetRange::whole_sheet(&sheet_name)?;
    let outcome = state.sheets.append_object(&record, &range).await?;
    Ok((StatusCode::CREATED, Json(outcome)))
}
