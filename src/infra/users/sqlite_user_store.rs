// SQLite implementation of the UserStore trait

use crate::core::auth::{AuthError, User, UserStore};
use async_trait::async_trait;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use sqlx::Row;

pub struct SqliteUserStore {
    pool: SqlitePool,
}

impl SqliteUserStore {
    /// Open (or create) the user database at `database_url` and run migrations.
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                email TEXT NOT NULL UNIQUE,
                name TEXT,
                role TEXT,
                password_hash TEXT,
                created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl UserStore for SqliteUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AuthError> {
        let row = sqlx::query(
            "SELECT id, email, name, role, password_hash FROM users WHERE email = ?",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AuthError::Store(e.to_string()))?;

        Ok(row.map(|row| User {
            id: row.get("id"),
            email: row.get("email"),
            name: row.get("name"),
            role: row.get("role"),
            password_hash: row.get("password_hash"),
        }))
    }

    async fn insert_user(&self, user: &User) -> Result<(), AuthError> {
        sqlx::query(
            r#"
            INSERT INTO users (id, email, name, role, password_hash)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&user.id)
        .bind(&user.email)
        .bind(&user.name)
        .bind(&user.role)
        .bind(&user.password_hash)
        .execute(&self.pool)
        .await
        .map_err(|e| AuthError::Store(e.to_string()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // A single connection keeps the in-memory database alive for the whole test.
    async fn memory_store() -> SqliteUserStore {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        let store = SqliteUserStore { pool };
        store.migrate().await.unwrap();
        store
    }

    fn user(id: &str, email: &str) -> User {
        User {
            id: id.to_string(),
            email: email.to_string(),
            name: Some("Ann".to_string()),
            role: None,
            password_hash: Some("$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA".to_string()),
        }
    }

    #[tokio::test]
    async fn inserted_user_is_found_by_email() {
        let store = memory_store().await;
        store.insert_user(&user("u1", "ann@example.com")).await.unwrap();

        let found = store.find_by_email("ann@example.com").await.unwrap();
        assert_eq!(found, Some(user("u1", "ann@example.com")));
    }

    #[tokio::test]
    async fn unknown_email_is_none() {
        let store = memory_store().await;
        assert_eq!(store.find_by_email("nobody@example.com").await.unwrap(), None);
    }

    #[tokio::test]
    async fn duplicate_email_is_a_store_error() {
        let store = memory_store().await;
        store.insert_user(&user("u1", "ann@example.com")).await.unwrap();

        let err = store
            .insert_user(&user("u2", "ann@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Store(_)));
    }

    #[tokio::test]
    async fn migrate_is_idempotent() {
        let store = memory_store().await;
        store.migrate().await.unwrap();
    }

    #[tokio::test]
    async fn opens_file_database() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}?mode=rwc", dir.path().join("auth.db").display());

        let store = SqliteUserStore::new(&url).await.unwrap();
        store.insert_user(&user("u1", "ann@example.com")).await.unwrap();
        assert!(store.find_by_email("ann@example.com").await.unwrap().is_some());
    }
}
