use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Role given to users whose row carries none.
pub const DEFAULT_ROLE: &str = "user";

/// Role allowed to delete stored uploads.
pub const ADMIN_ROLE: &str = "admin";

/// A user row as stored in the user database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: Option<String>,
    pub role: Option<String>,
    /// Argon2 PHC string (`$argon2id$v=19$...`), salt included.
    pub password_hash: Option<String>,
}

/// An authenticated caller, decoded from a session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub user_id: String,
    pub email: Option<String>,
    pub name: Option<String>,
    pub role: String,
    pub expires_at: DateTime<Utc>,
}

/// Claims carried inside a session token.
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct SessionClaims {
    pub sub: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    pub role: String,
    pub iat: i64,
    pub exp: i64,
}

/// A freshly issued token and the session it encodes.
#[derive(Debug, Clone, Serialize)]
pub struct SignedSession {
    pub token: String,
    pub session: Session,
}
