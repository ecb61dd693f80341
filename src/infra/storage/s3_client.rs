use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::Url;
use s3::creds::Credentials;
use s3::error::S3Error;
use s3::region::Region;
use s3::Bucket;

use crate::core::uploads::{ObjectMetadata, ObjectStore, UploadError};

/// Connection settings for one S3 bucket.
#[derive(Debug, Clone)]
pub struct S3Config {
    pub bucket: String,
    pub region: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    /// Custom endpoint (e.g. MinIO). Switches to path-style addressing.
    pub endpoint: Option<String>,
}

/// `ObjectStore` backed by a single S3 (or S3-compatible) bucket.
pub struct S3ObjectStore {
    bucket: Box<Bucket>,
}

impl S3ObjectStore {
    pub fn new(config: S3Config) -> Result<Self, UploadError> {
        let region = match config.endpoint.as_deref() {
            Some(raw) => {
                let url = Url::parse(raw)
                    .map_err(|e| UploadError::Storage(format!("Invalid S3 endpoint {}: {}", raw, e)))?;
                if url.host_str().is_none() {
                    return Err(UploadError::Storage(format!("S3 endpoint {} has no host", raw)));
                }
                Region::Custom {
                    region: config.region.clone(),
                    endpoint: raw.trim_end_matches('/').to_string(),
                }
            }
            None => Region::Custom {
                region: config.region.clone(),
                endpoint: format!("https://s3.{}.amazonaws.com", config.region),
            },
        };

        let credentials = Credentials::new(
            Some(&config.access_key_id),
            Some(&config.secret_access_key),
            None,
            None,
            None,
        )
        .map_err(|e| UploadError::Storage(format!("Invalid S3 credentials: {}", e)))?;

        let mut bucket = Bucket::new(&config.bucket, region, credentials).map_err(storage_error)?;
        if config.endpoint.is_some() {
            bucket = bucket.with_path_style();
        }

        Ok(Self { bucket })
    }

    pub fn bucket(&self) -> &str {
        &self.bucket.name
    }
}

fn storage_error(err: S3Error) -> UploadError {
    UploadError::Storage(err.to_string())
}

/// S3 answers 204 for a missing key on delete; compatible stores say 404.
fn is_not_found(err: &S3Error) -> bool {
    matches!(err, S3Error::HttpFailWithBody(404, _))
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn put_object(
        &self,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<(), UploadError> {
        tracing::debug!("S3 put {}/{}", self.bucket(), key);
        self.bucket
            .put_object_with_content_type(key, &body, content_type)
            .await
            .map_err(|e| UploadError::Storage(format!("S3 put of '{}' failed: {}", key, e)))?;
        Ok(())
    }

    async fn delete_object(&self, key: &str) -> Result<(), UploadError> {
        tracing::debug!("S3 delete {}/{}", self.bucket(), key);
        match self.bucket.delete_object(key).await {
            Ok(_) => Ok(()),
            Err(err) if is_not_found(&err) => Ok(()),
            Err(err) => Err(UploadError::Storage(format!(
                "S3 delete of '{}' failed: {}",
                key, err
            ))),
        }
    }

    async fn head_object(&self, key: &str) -> Result<Option<ObjectMetadata>, UploadError> {
        let head = match self.bucket.head_object(key).await {
            Ok((head, _)) => head,
            Err(err) if is_not_found(&err) => return Ok(None),
            Err(err) => {
                return Err(UploadError::Storage(format!(
                    "S3 head of '{}' failed: {}",
                    key, err
                )))
            }
        };

        Ok(Some(ObjectMetadata {
            content_type: head.content_type,
            size_bytes: head
                .content_length
                .and_then(|len| u64::try_from(len).ok())
                .unwrap_or_default(),
        }))
    }

    async fn presigned_put_url(
        &self,
        key: &str,
        content_type: &str,
        ttl: Duration,
    ) -> Result<String, UploadError> {
        // The content type is signed, so the browser must send the same one.
        let mut headers = HeaderMap::new();
        let value = HeaderValue::from_str(content_type)
            .map_err(|_| UploadError::InvalidContentType(content_type.to_string()))?;
        headers.insert(CONTENT_TYPE, value);

        let expiry_secs = u32::try_from(ttl.as_secs()).unwrap_or(u32::MAX);
        self.bucket
            .presign_put(key, expiry_secs, Some(headers), None)
            .await
            .map_err(storage_error)
    }
}
