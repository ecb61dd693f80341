// HTTP layer - axum router, extractors and handlers.
//
// Handlers stay thin: pull the session and the request apart, call a core
// service, turn its error into a status code.

#[path = "api_error.rs"]
pub mod api_error;
#[path = "session.rs"]
pub mod session;

#[path = "routes/auth_routes.rs"]
pub mod auth_routes;
#[path = "routes/sheet_routes.rs"]
pub mod sheet_routes;
#[path = "routes/upload_routes.rs"]
pub mod upload_routes;

use std::sync::Arc;

use axum::Router;

use crate::core::auth::AuthService;
use crate::core::sheets::SheetService;
use crate::core::uploads::UploadService;

pub use api_error::ApiError;
pub use session::MaybeSession;

/// Services shared by every handler. Built once in `main`.
#[derive(Clone)]
pub struct AppState {
    pub sheets: Arc<SheetService>,
    pub uploads: Arc<UploadService>,
    pub auth: Arc<AuthService>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(sheet_routes::routes())
        .merge(upload_routes::routes())
        .merge(auth_routes::routes())
        .with_state(state)
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::Value;
    use tower::ServiceExt;

    use crate::core::auth::{SessionSigner, User};
    use crate::core::testing::{InMemorySheet, InMemoryUserStore, RecordingObjectStore};

    pub const SECRET: &[u8] = b"router-test-secret";

    pub struct TestApp {
        pub router: Router,
        pub sheet: Arc<InMemorySheet>,
        pub store: Arc<RecordingObjectStore>,
        pub users: Arc<InMemoryUserStore>,
        /// Bearer token for a valid `user` session.
        pub token: String,
        /// Bearer token for a valid `admin` session.
        pub admin_token: String,
    }

    impl TestApp {
        pub fn new() -> Self {
            Self::with_sheet(InMemorySheet::default())
        }

        pub fn with_sheet(sheet: InMemorySheet) -> Self {
            let sheet = Arc::new(sheet);
            let store = Arc::new(RecordingObjectStore::default());
            let users = Arc::new(InMemoryUserStore::default());

            let state = AppState {
                sheets: Arc::new(SheetService::new(sheet.clone())),
                uploads: Arc::new(UploadService::new(store.clone(), "cdn.example.com")),
                auth: Arc::new(AuthService::new(
                    users.clone(),
                    SessionSigner::new(SECRET, chrono::Duration::days(1)),
                )),
            };

            let signer = SessionSigner::new(SECRET, chrono::Duration::days(1));
            let token = signer.issue(&test_user("user-1", None)).unwrap().token;
            let admin_token = signer
                .issue(&test_user("admin-1", Some("admin")))
                .unwrap()
                .token;

            Self {
                router: router(state),
                sheet,
                store,
                users,
                token,
                admin_token,
            }
        }

        pub fn bearer(&self) -> String {
            format!("Bearer {}", self.token)
        }

        pub fn admin_bearer(&self) -> String {
            format!("Bearer {}", self.admin_token)
        }

        /// Send a request and decode the JSON body (`Null` when empty).
        pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
            let response = self.router.clone().oneshot(request).await.unwrap();
            let status = response.status();
            let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
            let body = if bytes.is_empty() {
                Value::Null
            } else {
                serde_json::from_slice(&bytes).unwrap()
            };
            (status, body)
        }
    }

    fn test_user(id: &str, role: Option<&str>) -> User {
        User {
            id: id.to_string(),
            email: format!("{}@example.com", id),
            name: None,
            role: role.map(str::to_string),
            password_hash: None,
        }
    }

    pub fn json_request(method: &str, uri: &str, auth: Option<&str>, body: &Value) -> Request<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json");
        if let Some(auth) = auth {
            builder = builder.header("authorization", auth);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }
}
