// Upload endpoints. Every route needs a session; the session is checked
// before the body is looked at, so anonymous callers always get 401.

use axum::body::Bytes;
use axum::extract::rejection::{BytesRejection, JsonRejection, QueryRejection};
use axum::extract::{DefaultBodyLimit, Query, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{delete, post};
use axum::{Json, Router};
use serde::Deserialize;

use super::{ApiError, AppState, MaybeSession};
use crate::core::uploads::upload_models::MAX_UPLOAD_SIZE_MB;
use crate::core::uploads::{
    check_upload, PresignedGrant, UploadReceipt, UploadRequest, UploadResult,
};

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Bodies a little over the cap still reach the handler so the caller gets
/// the usual 400 message instead of a bare 413.
const DIRECT_UPLOAD_BODY_LIMIT: usize = (MAX_UPLOAD_SIZE_MB as usize + 1) * 1024 * 1024;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/upload/presigned", post(presigned_upload))
        .route(
            "/upload/direct",
            post(direct_upload).layer(DefaultBodyLimit::max(DIRECT_UPLOAD_BODY_LIMIT)),
        )
        .route("/upload/confirm", post(confirm_upload))
        .route("/upload", delete(revoke_upload))
}

#[derive(Debug, Deserialize)]
struct DirectUploadParams {
    filename: String,
    #[serde(default)]
    folder: Option<String>,
}

#[derive(Debug, Deserialize)]
struct KeyBody {
    key: String,
}

impl KeyBody {
    fn into_key(self) -> Result<String, ApiError> {
        let key = self.key.trim();
        if key.is_empty() {
            return Err(ApiError::BadRequest("key must not be empty".to_string()));
        }
        Ok(key.to_string())
    }
}

async fn presigned_upload(
    State(state): State<AppState>,
    MaybeSession(session): MaybeSession,
    body: Result<Json<UploadRequest>, JsonRejection>,
) -> Result<Json<PresignedGrant>, ApiError> {
    let session = session.ok_or(ApiError::Unauthorized)?;
    let Json(request) = body?;

    let grant = state
        .uploads
        .authorize_upload(Some(&session), &request)
        .await?;
    Ok(Json(grant))
}

async fn direct_upload(
    State(state): State<AppState>,
    MaybeSession(session): MaybeSession,
    params: Result<Query<DirectUploadParams>, QueryRejection>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Result<(StatusCode, Json<UploadResult>), ApiError> {
    let session = session.ok_or(ApiError::Unauthorized)?;
    let Query(params) = params?;
    let body = body?;

    // Parameters such as `; charset=...` are not part of the allow-list.
    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Missing Content-Type header".to_string()))?
        .to_string();

    check_upload(&content_type, Some(body.len() as f64 / BYTES_PER_MB))?;

    tracing::debug!(user_id = %session.user_id, "Direct upload of {}", params.filename);
    let result = state
        .uploads
        .upload_buffer_directly(
            body.to_vec(),
            &params.filename,
            &content_type,
            params.folder.as_deref(),
        )
        .await?;
    Ok((StatusCode::CREATED, Json(result)))
}

async fn confirm_upload(
    State(state): State<AppState>,
    MaybeSession(session): MaybeSession,
    body: Result<Json<KeyBody>, JsonRejection>,
) -> Result<Json<UploadReceipt>, ApiError> {
    let session = session.ok_or(ApiError::Unauthorized)?;
    let Json(body) = body?;
    let key = body.into_key()?;

    let receipt = state.uploads.confirm_upload(Some(&session), &key).await?;
    Ok(Json(receipt))
}

async fn revoke_upload(
    State(state): State<AppState>,
    MaybeSession(session): MaybeSession,
    body: Result<Json<KeyBody>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let session = session.ok_or(ApiError::Unauthorized)?;
    let Json(body) = body?;
    let key = body.into_key()?;

    state.uploads.revoke(Some(&session), &key).await?;
    Ok(StatusCode::NO_CONTENT)
}
