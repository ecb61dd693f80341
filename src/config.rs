// Runtime configuration, read from environment variables (and `.env` via
// dotenv in `main`).

use std::net::SocketAddr;

use thiserror::Error;

use crate::infra::storage::S3Config;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_DATABASE_URL: &str = "sqlite://data/auth.db?mode=rwc";
const DEFAULT_SESSION_TTL_DAYS: i64 = 30;
/// Ten years. Keeps token expiry far below where `chrono::Duration::days` panics.
const MAX_SESSION_TTL_DAYS: i64 = 3650;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing {0} environment variable")]
    Missing(&'static str),
    #[error("Invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
    #[error(
        "No Google service account credentials. Set GOOGLE_SERVICE_ACCOUNT_KEY, \
         GOOGLE_SERVICE_ACCOUNT_JSON, or GOOGLE_SERVICE_ACCOUNT_EMAIL + GOOGLE_PRIVATE_KEY"
    )]
    MissingGoogleCredentials,
}

/// Where the Google service account key comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GoogleCredentials {
    KeyFile(String),
    Json(String),
    Parts { client_email: String, private_key: String },
}

/// A user created at startup when absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedUser {
    pub email: String,
    pub password: String,
    pub role: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub sheet_id: String,
    pub google_credentials: GoogleCredentials,
    pub s3: S3Config,
    pub cdn_domain: String,
    pub auth_secret: String,
    pub database_url: String,
    pub session_ttl_days: i64,
    pub seed_user: Option<SeedUser>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the config from any variable source. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let require = |name: &'static str| get(name).ok_or(ConfigError::Missing(name));

        let bind_addr = get("BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::Invalid {
                name: "BIND_ADDR",
                reason: e.to_string(),
            })?;

        let google_credentials = if let Some(path) = get("GOOGLE_SERVICE_ACCOUNT_KEY") {
            GoogleCredentials::KeyFile(path)
        } else if let Some(json) = get("GOOGLE_SERVICE_ACCOUNT_JSON") {
            GoogleCredentials::Json(json)
        } else {
            match (
                get("GOOGLE_SERVICE_ACCOUNT_EMAIL"),
                get("GOOGLE_PRIVATE_KEY"),
            ) {
                (Some(client_email), Some(private_key)) => GoogleCredentials::Parts {
                    client_email,
                    private_key,
                },
                _ => return Err(ConfigError::MissingGoogleCredentials),
            }
        };

        let s3 = S3Config {
            bucket: require("AWS_S3_BUCKET_NAME")?,
            region: require("AWS_REGION")?,
            access_key_id: require("AWS_ACCESS_KEY_ID")?,
            secret_access_key: require("AWS_SECRET_ACCESS_KEY")?,
            endpoint: get("S3_ENDPOINT"),
        };

        let session_ttl_days = match get("SESSION_TTL_DAYS") {
            None => DEFAULT_SESSION_TTL_DAYS,
            Some(raw) => match raw.trim().parse::<i64>() {
                Ok(days) if (1..=MAX_SESSION_TTL_DAYS).contains(&days) => days,
                _ => {
                    return Err(ConfigError::Invalid {
                        name: "SESSION_TTL_DAYS",
                        reason: format!(
                            "expected between 1 and {} days, got '{}'",
                            MAX_SESSION_TTL_DAYS, raw
                        ),
                    })
                }
            },
        };

        let seed_user = match (get("SEED_USER_EMAIL"), get("SEED_USER_PASSWORD")) {
            (Some(email), Some(password)) => Some(SeedUser {
                email,
                password,
                role: get("SEED_USER_ROLE"),
            }),
            _ => None,
        };

        Ok(Self {
            bind_addr,
            sheet_id: require("GOOGLE_SHEET_ID")?,
            google_credentials,
            s3,
            cdn_domain: require("AWS_CLOUDFRONT_DOMAIN")?,
            auth_secret: require("AUTH_SECRET")?,
            database_url: get("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            session_ttl_days,
            seed_user,
        })
    }
}
