//! # Staffdesk Storage - SQLite Backend
//!
//! SQLite implementation of the storage backend. Each client profile gets
//! its own database file, so several operators can keep separate sessions
//! on one machine.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use tracing::{debug, info};

use staffdesk_storage::{StorageBackend, StorageError};

/// SQLite storage backend, one database file per profile.
///
/// The database lives at `{base_path}/{profile}.db`.
#[derive(Clone)]
pub struct SqliteBackend {
    pool: SqlitePool,
    db_path: PathBuf,
}

impl SqliteBackend {
    /// Opens or creates the database of a profile.
    ///
    /// # Arguments
    ///
    /// * `base_path` - Directory where profile databases are stored
    /// * `profile` - Profile name (must match `[a-z0-9_-]+`)
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Profile name is invalid
    /// - Directory cannot be created
    /// - Database connection fails
    pub async fn open(base_path: impl AsRef<Path>, profile: &str) -> Result<Self, StorageError> {
        Self::validate_profile(profile)?;

        let base = base_path.as_ref();
        std::fs::create_dir_all(base).map_err(|e| {
            StorageError::ConnectionFailed(format!("failed to create directory: {e}"))
        })?;

        let db_path = base.join(format!("{profile}.db"));
        let db_url = format!("sqlite:{}?mode=rwc", db_path.display());

        debug!(profile = %profile, path = %db_path.display(), "Opening SQLite database");

        let pool = SqlitePoolOptions::new()
            .max_connections(2)
            .connect(&db_url)
            .await
            .map_err(|e| StorageError::ConnectionFailed(e.to_string()))?;

        let backend = Self { pool, db_path };
        backend.migrate().await?;

        info!(profile = %profile, "SQLite backend ready");

        Ok(backend)
    }

    /// Path of the database file.
    pub fn path(&self) -> &Path {
        &self.db_path
    }

    /// Validates that a profile name is safe to use as a file name.
    ///
    /// Only allows: lowercase letters, digits, underscore, hyphen.
    fn validate_profile(profile: &str) -> Result<(), StorageError> {
        if profile.is_empty() {
            return Err(StorageError::InvalidInput("profile cannot be empty".into()));
        }

        if profile.len() > 64 {
            return Err(StorageError::InvalidInput("profile name too long".into()));
        }

        let valid = profile
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-');

        if !valid {
            return Err(StorageError::InvalidInput(
                "profile must match [a-z0-9_-]+".into(),
            ));
        }

        Ok(())
    }

    async fn migrate(&self) -> Result<(), StorageError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS kv_store (
                key        TEXT PRIMARY KEY,
                value      BLOB NOT NULL,
                updated_at INTEGER NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::ConnectionFailed(format!("migration failed: {e}")))?;

        Ok(())
    }

    /// Current Unix timestamp; a clock before the epoch reads as zero.
    fn now() -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or_default()
    }
}

#[async_trait]
impl StorageBackend for SqliteBackend {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let row: Option<(Vec<u8>,)> = sqlx::query_as("SELECT value FROM kv_store WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StorageError::QueryFailed(e.to_string()))?;

        Ok(row.map(|(v,)| v))
    }

    async fn put(&self, key: &str, value: &[u8]) -> Result<(), StorageError> {
        if key.is_empty() {
            return Err(StorageError::InvalidInput("key cannot be empty".into()));
        }

        sqlx::query(
            r#"
            INSERT INTO kv_store (key, value, updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(Self::now())
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::QueryFailed(e.to_string()))?;

        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM kv_store WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(|e| StorageError::QueryFailed(e.to_string()))?;

        Ok(())
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        let pattern = format!("{prefix}%");

        let rows: Vec<(String,)> = sqlx::query_as("SELECT key FROM kv_store WHERE key LIKE ?")
            .bind(&pattern)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StorageError::QueryFailed(e.to_string()))?;

        Ok(rows.into_iter().map(|(k,)| k).collect())
    }
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn setup() -> (TempDir, SqliteBackend) {
        let tmp = TempDir::new().unwrap();
        let backend = SqliteBackend::open(tmp.path(), "front-desk").await.unwrap();
        (tmp, backend)
    }

    #[tokio::test]
    async fn test_open_creates_db() {
        let tmp = TempDir::new().unwrap();
        let backend = SqliteBackend::open(tmp.path(), "default").await.unwrap();

        let db_path = tmp.path().join("default.db");
        assert!(db_path.exists(), "database file should be created");
        assert_eq!(backend.path(), db_path);
    }

    #[tokio::test]
    async fn test_profile_validation() {
        let tmp = TempDir::new().unwrap();

        for name in ["", "Desk", "my desk", "desk/sub", "../escape", "desk.db"] {
            let result = SqliteBackend::open(tmp.path(), name).await;
            assert!(
                matches!(result, Err(StorageError::InvalidInput(_))),
                "should reject profile name: {name:?}"
            );
        }

        for name in ["default", "front-desk", "engineer_2"] {
            assert!(SqliteBackend::open(tmp.path(), name).await.is_ok());
        }
    }

    #[tokio::test]
    async fn test_crud_roundtrip() {
        let (_tmp, backend) = setup().await;

        assert!(backend.get("session/identity").await.unwrap().is_none());

        backend.put("session/identity", b"{\"id\":1}").await.unwrap();
        assert_eq!(
            backend.get("session/identity").await.unwrap(),
            Some(b"{\"id\":1}".to_vec())
        );

        backend.put("session/identity", b"{\"id\":2}").await.unwrap();
        assert_eq!(
            backend.get("session/identity").await.unwrap(),
            Some(b"{\"id\":2}".to_vec())
        );

        backend.delete("session/identity").await.unwrap();
        assert!(backend.get("session/identity").await.unwrap().is_none());
        assert!(!backend.exists("session/identity").await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_nonexistent_is_ok() {
        let (_tmp, backend) = setup().await;
        backend.delete("nonexistent").await.unwrap();
    }

    #[tokio::test]
    async fn test_list_prefix() {
        let (_tmp, backend) = setup().await;

        backend.put("session/identity", b"1").await.unwrap();
        backend.put("prefs/theme", b"2").await.unwrap();
        backend.put("prefs/locale", b"3").await.unwrap();

        let mut keys = backend.list("prefs/").await.unwrap();
        keys.sort();
        assert_eq!(keys, vec!["prefs/locale", "prefs/theme"]);
        assert!(backend.list("cache/").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_survives_reopen() {
        let tmp = TempDir::new().unwrap();
        {
            let backend = SqliteBackend::open(tmp.path(), "default").await.unwrap();
            backend.put("session/identity", b"persisted").await.unwrap();
        }

        let reopened = SqliteBackend::open(tmp.path(), "default").await.unwrap();
        assert_eq!(
            reopened.get("session/identity").await.unwrap(),
            Some(b"persisted".to_vec())
        );
    }

    #[tokio::test]
    async fn test_profile_isolation() {
        let tmp = TempDir::new().unwrap();

        let desk = SqliteBackend::open(tmp.path(), "desk").await.unwrap();
        let field = SqliteBackend::open(tmp.path(), "field").await.unwrap();

        desk.put("session/identity", b"desk").await.unwrap();
        assert!(field.get("session/identity").await.unwrap().is_none());
    }
}
