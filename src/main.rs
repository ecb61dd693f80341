// This is the entry point of the sheetdrop server.
//
// **Architecture Overview:**
// - `core/` = Business logic (sheets, uploads, sessions) and the traits it needs
// - `infra/` = Implementations of core traits (Google Sheets, S3, SQLite)
// - `http/` = axum router and handlers
//
// This file's job is to:
// 1. Load configuration
// 2. Build each backing client once and inject it into its service
// 3. Serve HTTP until ctrl-c

// These attrs point each module declaration at a more descriptive root file
// so we don't end up with half a dozen mod.rs files that all look the same.
#[path = "config.rs"]
mod config;
#[path = "core/core_layer.rs"]
mod core;
#[path = "http/http_layer.rs"]
mod http;
#[path = "infra/infra_layer.rs"]
mod infra;

use std::sync::Arc;

use anyhow::Context;

use crate::config::{AppConfig, GoogleCredentials};
use crate::core::auth::{AuthService, SessionSigner};
use crate::core::sheets::SheetService;
use crate::core::uploads::UploadService;
use crate::http::AppState;
use crate::infra::google_sheets::{GoogleSheetsClient, ServiceAccountAuth, SPREADSHEETS_SCOPE};
use crate::infra::storage::S3ObjectStore;
use crate::infra::users::SqliteUserStore;

async fn google_auth(credentials: &GoogleCredentials) -> anyhow::Result<ServiceAccountAuth> {
    let auth = match credentials {
        GoogleCredentials::KeyFile(path) => ServiceAccountAuth::from_file(path, SPREADSHEETS_SCOPE)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to load service account key {}: {}", path, e))?,
        GoogleCredentials::Json(json) => ServiceAccountAuth::from_json(json, SPREADSHEETS_SCOPE)
            .map_err(|e| anyhow::anyhow!("Invalid GOOGLE_SERVICE_ACCOUNT_JSON: {}", e))?,
        GoogleCredentials::Parts {
            client_email,
            private_key,
        } => ServiceAccountAuth::from_parts(client_email, private_key, SPREADSHEETS_SCOPE),
    };
    Ok(auth)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for ctrl-c: {}", e);
        return;
    }
    tracing::info!("Shutting down");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging so we can see what's happening
    tracing_subscriber::fmt::init();

    // Load environment variables from .env file (if it exists)
    dotenv::dotenv().ok();

    let config = AppConfig::from_env().context("Invalid configuration")?;

    // Keep the default SQLite file in a dedicated folder so the repo root stays tidy.
    std::fs::create_dir_all("data").context("Failed to create data directory")?;

    // ========================================================================
    // DEPENDENCY INJECTION
    // ========================================================================
    // Every backing client is created exactly once here and shared by Arc.

    let google = google_auth(&config.google_credentials).await?;
    tracing::info!("Using Google service account {}", google.client_email());
    let sheets_client = GoogleSheetsClient::new(google, config.sheet_id.clone());
    let sheet_service = Arc::new(SheetService::new(Arc::new(sheets_client)));

    let object_store = S3ObjectStore::new(config.s3.clone()).context("Invalid S3 configuration")?;
    tracing::info!("Uploading to S3 bucket {}", object_store.bucket());
    let upload_service = Arc::new(UploadService::new(
        Arc::new(object_store),
        config.cdn_domain.clone(),
    ));

    let user_store = SqliteUserStore::new(&config.database_url)
        .await
        .context("Failed to initialize user database")?;
    let signer = SessionSigner::new(
        config.auth_secret.as_bytes(),
        chrono::Duration::days(config.session_ttl_days),
    );
    let auth_service = Arc::new(AuthService::new(Arc::new(user_store), signer));

    if let Some(seed) = &config.seed_user {
        auth_service
            .ensure_user(&seed.email, None, &seed.password, seed.role.as_deref())
            .await
            .context("Failed to seed user")?;
    }

    let state = AppState {
        sheets: sheet_service,
        uploads: upload_service,
        auth: auth_service,
    };

    // ========================================================================
    // SERVE
    // ========================================================================

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;
    tracing::info!("Listening on {}", config.bind_addr);

    axum::serve(listener, http::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}
