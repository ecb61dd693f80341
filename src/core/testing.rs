// In-memory stand-ins for the core's external collaborators, shared by the
// core and http test modules.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;

use crate::core::auth::{AuthError, Session, User, UserStore};
use crate::core::sheets::{SheetError, SheetRange, SpreadsheetBackend};
use crate::core::uploads::{ObjectMetadata, ObjectStore, UploadError};

pub fn test_session() -> Session {
    Session {
        user_id: "user-1".to_string(),
        email: Some("user@example.com".to_string()),
        name: None,
        role: "user".to_string(),
        expires_at: Utc::now() + chrono::Duration::days(1),
    }
}

pub fn admin_session() -> Session {
    Session {
        user_id: "admin-1".to_string(),
        role: "admin".to_string(),
        ..test_session()
    }
}

/// A single sheet held in memory.
#[derive(Default)]
pub struct InMemorySheet {
    rows: Mutex<Vec<Vec<String>>>,
    appended: Mutex<Vec<Vec<String>>>,
    fail: bool,
}

impl InMemorySheet {
    pub fn with_rows(rows: &[&[&str]]) -> Self {
        let rows = rows
            .iter()
            .map(|r| r.iter().map(|c| c.to_string()).collect())
            .collect();
        Self {
            rows: Mutex::new(rows),
            ..Default::default()
        }
    }

    /// Every call fails as an unreachable backend would.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    /// Rows appended so far, in order.
    pub fn appended(&self) -> Vec<Vec<String>> {
        self.appended.lock().unwrap().clone()
    }
}

#[async_trait]
impl SpreadsheetBackend for InMemorySheet {
    async fn get_values(&self, range: &SheetRange) -> Result<Vec<Vec<String>>, SheetError> {
        if self.fail {
            return Err(SheetError::Upstream("backend unavailable".to_string()));
        }

        let rows = self.rows.lock().unwrap();
        if range.cells() == "1:1" {
            return Ok(rows.first().cloned().into_iter().collect());
        }
        Ok(rows.clone())
    }

    async fn append_values(
        &self,
        _range: &SheetRange,
        rows: &[Vec<String>],
    ) -> Result<u64, SheetError> {
        if self.fail {
            return Err(SheetError::Upstream("backend unavailable".to_string()));
        }

        self.rows.lock().unwrap().extend_from_slice(rows);
        self.appended.lock().unwrap().extend_from_slice(rows);
        Ok(rows.len() as u64)
    }
}

/// Object store that keeps metadata only and logs every call it receives.
#[derive(Default)]
pub struct RecordingObjectStore {
    objects: Mutex<HashMap<String, ObjectMetadata>>,
    calls: Mutex<Vec<String>>,
}

impl RecordingObjectStore {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn object(&self, key: &str) -> Option<ObjectMetadata> {
        self.objects.lock().unwrap().get(key).cloned()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl ObjectStore for RecordingObjectStore {
    async fn put_object(
        &self,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<(), UploadError> {
        self.record(format!("put {}", key));
        self.objects.lock().unwrap().insert(
            key.to_string(),
            ObjectMetadata {
                content_type: Some(content_type.to_string()),
                size_bytes: body.len() as u64,
            },
        );
        Ok(())
    }

    async fn delete_object(&self, key: &str) -> Result<(), UploadError> {
        self.record(format!("delete {}", key));
        self.objects.lock().unwrap().remove(key);
        Ok(())
    }

    async fn head_object(&self, key: &str) -> Result<Option<ObjectMetadata>, UploadError> {
        self.record(format!("head {}", key));
        Ok(self.object(key))
    }

    async fn presigned_put_url(
        &self,
        key: &str,
        content_type: &str,
        ttl: Duration,
    ) -> Result<String, UploadError> {
        self.record(format!("presign {}", key));
        Ok(format!(
            "https://bucket.test/{}?content-type={}&expires={}",
            key,
            content_type,
            ttl.as_secs()
        ))
    }
}

#[derive(Default)]
pub struct InMemoryUserStore {
    users: Mutex<HashMap<String, User>>,
}

impl InMemoryUserStore {
    pub fn insert(&self, user: User) {
        self.users.lock().unwrap().insert(user.email.clone(), user);
    }

    pub fn len(&self) -> usize {
        self.users.lock().unwrap().len()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AuthError> {
        Ok(self.users.lock().unwrap().get(email).cloned())
    }

    async fn insert_user(&self, user: &User) -> Result<(), AuthError> {
        self.insert(user.clone());
        Ok(())
    }
}
