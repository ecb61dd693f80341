use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;

use super::{ApiError, AppState, MaybeSession};
use crate::core::auth::{Session, SignedSession};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/session", get(current_session))
}

/// Missing fields are treated as empty so they fail like a wrong password.
#[derive(Debug, Deserialize)]
struct LoginRequest {
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

async fn login(
    State(state): State<AppState>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<SignedSession>, ApiError> {
    let Json(request) = body?;
    let signed = state
        .auth
        .sign_in_with_credentials(&request.email, &request.password)
        .await?;
    Ok(Json(signed))
}

async fn current_session(MaybeSession(session): MaybeSession) -> Result<Json<Session>, ApiError> {
    session.map(Json).ok_or(ApiError::Unauthorized)
}
