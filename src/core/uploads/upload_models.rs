use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Content types a client may upload.
pub const ALLOWED_CONTENT_TYPES: [&str; 5] = [
    "image/jpeg",
    "image/png",
    "image/webp",
    "image/gif",
    "application/pdf",
];

/// Largest declared upload size, in megabytes.
pub const MAX_UPLOAD_SIZE_MB: f64 = 10.0;

/// How long a presigned PUT stays valid.
pub const PRESIGNED_URL_TTL: Duration = Duration::from_secs(300);

pub const DEFAULT_FOLDER: &str = "uploads";

/// Extension used when the original filename has none.
pub const FALLBACK_EXTENSION: &str = "bin";

/// Body of `POST /upload/presigned`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadRequest {
    pub filename: String,
    pub content_type: String,
    #[serde(default)]
    pub folder: Option<String>,
    /// Declared size. When absent, no size cap applies.
    #[serde(default)]
    pub size_mb: Option<f64>,
}

/// A write-only, time-boxed credential for one object plus its public URL.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PresignedGrant {
    pub presigned_url: String,
    pub cdn_url: String,
    pub key: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResult {
    pub key: String,
    pub cdn_url: String,
}

/// Proof that an object actually landed under an authorized key.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadReceipt {
    pub key: String,
    pub cdn_url: String,
    pub content_type: Option<String>,
    pub size_bytes: u64,
}

/// What the object store reports about a stored object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectMetadata {
    pub content_type: Option<String>,
    pub size_bytes: u64,
}

/// `<folder>/<uuid>.<ext>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageKey(String);

impl StorageKey {
    /// New random key for `filename` under `folder` (default `uploads`).
    pub fn generate(filename: &str, folder: Option<&str>) -> Self {
        let folder = folder
            .map(|f| f.trim_matches('/'))
            .filter(|f| !f.is_empty())
            .unwrap_or(DEFAULT_FOLDER);

        Self(format!(
            "{}/{}.{}",
            folder,
            uuid::Uuid::new_v4(),
            extension_of(filename)
        ))
    }

    /// Accept only keys shaped like the ones `generate` produces:
    /// one or more folder segments, then `<uuid>.<ext>`.
    pub fn parse(key: &str) -> Option<Self> {
        let (folder, file) = key.rsplit_once('/')?;
        let folder_ok = folder
            .split('/')
            .all(|segment| !segment.is_empty() && segment != "." && segment != "..");
        let (id, ext) = file.split_once('.')?;

        if !folder_ok || ext.is_empty() || ext.contains('.') {
            return None;
        }
        uuid::Uuid::parse_str(id).ok()?;

        Some(Self(key.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Last dot-separated segment of `filename`, or `bin` if there is none.
pub fn extension_of(filename: &str) -> &str {
    match filename.rsplit_once('.') {
        Some((_, ext)) if !ext.is_empty() => ext,
        _ => FALLBACK_EXTENSION,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_is_last_dot_segment() {
        assert_eq!(extension_of("a.b.png"), "png");
        assert_eq!(extension_of("photo.JPG"), "JPG");
        assert_eq!(extension_of("README"), "bin");
        assert_eq!(extension_of("trailing."), "bin");
    }

    #[test]
    fn key_layout() {
        let key = StorageKey::generate("a.b.png", None);
        let (folder, file) = key.as_str().split_once('/').unwrap();
        let (id, ext) = file.rsplit_once('.').unwrap();

        assert_eq!(folder, "uploads");
        assert_eq!(ext, "png");
        assert!(uuid::Uuid::parse_str(id).is_ok());
    }

    #[test]
    fn key_uses_given_folder() {
        let key = StorageKey::generate("cv.pdf", Some("/resumes/"));
        assert!(key.as_str().starts_with("resumes/"));
        assert!(key.as_str().ends_with(".pdf"));

        let blank = StorageKey::generate("cv.pdf", Some(""));
        assert!(blank.as_str().starts_with("uploads/"));
    }

    #[test]
    fn generated_keys_parse_back() {
        let key = StorageKey::generate("a.b.png", Some("team/avatars"));
        assert_eq!(StorageKey::parse(key.as_str()), Some(key));
    }

    #[test]
    fn foreign_keys_do_not_parse() {
        let id = uuid::Uuid::new_v4();
        for key in [
            "backups/db-dump.sql".to_string(),
            format!("{}.png", id),
            format!("/{}.png", id),
            format!("uploads//{}.png", id),
            format!("../{}.png", id),
            format!("uploads/{}", id),
            format!("uploads/{}.", id),
            format!("uploads/{}.tar.gz", id),
        ] {
            assert_eq!(StorageKey::parse(&key), None, "{}", key);
        }
    }

    #[test]
    fn keys_do_not_repeat() {
        let a = StorageKey::generate("x.png", None);
        let b = StorageKey::generate("x.png", None);
        assert_ne!(a, b);
    }

    #[test]
    fn upload_request_accepts_camel_case() {
        let request: UploadRequest = serde_json::from_str(
            r#"{"filename": "a.png", "contentType": "image/png", "sizeMb": 2.5}"#,
        )
        .unwrap();

        assert_eq!(request.content_type, "image/png");
        assert_eq!(request.size_mb, Some(2.5));
        assert!(request.folder.is_none());
    }
}
