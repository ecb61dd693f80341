use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use super::upload_models::{
    ObjectMetadata, PresignedGrant, StorageKey, UploadReceipt, UploadRequest, UploadResult,
    ALLOWED_CONTENT_TYPES, MAX_UPLOAD_SIZE_MB, PRESIGNED_URL_TTL,
};
use crate::core::auth::{Session, ADMIN_ROLE};

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Unauthorized")]
    Unauthorized,
    #[error("File type '{0}' is not allowed. Allowed types: image/jpeg, image/png, image/webp, image/gif, application/pdf")]
    InvalidContentType(String),
    #[error("File size must be {max} MB or less (got {size} MB)")]
    PayloadTooLarge { size: f64, max: f64 },
    #[error("Only admins can delete uploads")]
    Forbidden,
    #[error("'{0}' is not an upload key")]
    InvalidKey(String),
    #[error("Nothing has been uploaded under '{0}'")]
    NotUploaded(String),
    #[error("Object store error: {0}")]
    Storage(String),
}

/// The object-store operations uploads rely on.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn put_object(
        &self,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<(), UploadError>;

    /// Succeeds when the object is already gone.
    async fn delete_object(&self, key: &str) -> Result<(), UploadError>;

    /// `None` when no object exists under `key`.
    async fn head_object(&self, key: &str) -> Result<Option<ObjectMetadata>, UploadError>;

    /// URL granting a single PUT of `key` with `content_type`, valid for `ttl`.
    async fn presigned_put_url(
        &self,
        key: &str,
        content_type: &str,
        ttl: Duration,
    ) -> Result<String, UploadError>;
}

/// Content-type and size checks shared by every upload path.
///
/// `size_mb == None` skips the size cap entirely.
pub fn check_upload(content_type: &str, size_mb: Option<f64>) -> Result<(), UploadError> {
    if !ALLOWED_CONTENT_TYPES.contains(&content_type) {
        return Err(UploadError::InvalidContentType(content_type.to_string()));
    }

    if let Some(size) = size_mb {
        if size > MAX_UPLOAD_SIZE_MB {
            return Err(UploadError::PayloadTooLarge {
                size,
                max: MAX_UPLOAD_SIZE_MB,
            });
        }
    }

    Ok(())
}

/// Issues upload grants and talks to the object store.
///
/// Stateless: each grant depends only on its request and a fresh random key.
/// Grant issuance alone says nothing about whether the client ever uploads;
/// `confirm_upload` is the only way to observe that.
pub struct UploadService {
    store: Arc<dyn ObjectStore>,
    cdn_domain: String,
}

impl UploadService {
    pub fn new(store: Arc<dyn ObjectStore>, cdn_domain: impl Into<String>) -> Self {
        let cdn_domain = cdn_domain.into();
        Self {
            store,
            cdn_domain: cdn_domain.trim_end_matches('/').to_string(),
        }
    }

    /// Public URL for `key`. No existence check.
    pub fn cdn_url(&self, key: &str) -> String {
        format!("https://{}/{}", self.cdn_domain, key)
    }

    pub async fn authorize_upload(
        &self,
        session: Option<&Session>,
        request: &UploadRequest,
    ) -> Result<PresignedGrant, UploadError> {
        let session = session.ok_or(UploadError::Unauthorized)?;
        check_upload(&request.content_type, request.size_mb)?;

        let key = StorageKey::generate(&request.filename, request.folder.as_deref());
        let presigned_url = self
            .store
            .presigned_put_url(key.as_str(), &request.content_type, PRESIGNED_URL_TTL)
            .await?;
        let cdn_url = self.cdn_url(key.as_str());

        tracing::info!(
            user_id = %session.user_id,
            key = %key,
            content_type = %request.content_type,
            "Issued presigned upload grant"
        );

        Ok(PresignedGrant {
            presigned_url,
            cdn_url,
            key: key.into_string(),
        })
    }

    /// Server-side upload. Callers are trusted here: run the session and
    /// `check_upload` gates before calling this.
    pub async fn upload_buffer_directly(
        &self,
        body: Vec<u8>,
        filename: &str,
        content_type: &str,
        folder: Option<&str>,
    ) -> Result<UploadResult, UploadError> {
        let key = StorageKey::generate(filename, folder);
        let size = body.len();

        self.store
            .put_object(key.as_str(), body, content_type)
            .await?;
        tracing::info!(key = %key, bytes = size, "Uploaded object");

        let cdn_url = self.cdn_url(key.as_str());
        Ok(UploadResult {
            key: key.into_string(),
            cdn_url,
        })
    }

    /// Delete an uploaded object. Admin sessions only, and only for keys this
    /// service could have generated.
    pub async fn revoke(&self, session: Option<&Session>, key: &str) -> Result<(), UploadError> {
        let session = session.ok_or(UploadError::Unauthorized)?;
        if session.role != ADMIN_ROLE {
            return Err(UploadError::Forbidden);
        }
        let key = StorageKey::parse(key).ok_or_else(|| UploadError::InvalidKey(key.to_string()))?;

        self.store.delete_object(key.as_str()).await?;
        tracing::info!(user_id = %session.user_id, key = %key, "Deleted object");
        Ok(())
    }

    /// Check that an authorized upload actually happened.
    pub async fn confirm_upload(
        &self,
        session: Option<&Session>,
        key: &str,
    ) -> Result<UploadReceipt, UploadError> {
        session.ok_or(UploadError::Unauthorized)?;

        let metadata = self
            .store
            .head_object(key)
            .await?
            .ok_or_else(|| UploadError::NotUploaded(key.to_string()))?;

        Ok(UploadReceipt {
            key: key.to_string(),
            cdn_url: self.cdn_url(key),
            content_type: metadata.content_type,
            size_bytes: metadata.size_bytes,
        })
    }
}
