// src/storage.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::SqlitePool;
use std::collections::HashMap;
use std::path::Path;
use tracing::info;

/// Storage keys for the saved profile and its derived hashtag.
///
/// Values are plain strings with no schema versioning; a profile is saved
/// wholesale or not at all.
pub mod profile_keys {
    pub const NAME: &str = "name";
    pub const RESUME_URL: &str = "resumeURL";
    pub const SKILLS: &str = "skills";
    pub const DESCRIPTION: &str = "description";
    pub const EXPERIENCE: &str = "experience";
    pub const GENERATED_HASHTAG: &str = "generatedHashtag";

    pub const PROFILE_FIELDS: [&str; 5] = [NAME, RESUME_URL, SKILLS, DESCRIPTION, EXPERIENCE];
}

/// Flat key-value persistence, injected wherever profile data is read or
/// written. Absent keys are simply missing from a `get_many` result.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get_many(&self, keys: &[&str]) -> Result<HashMap<String, String>>;

    async fn set_many(&self, pairs: &[(&str, &str)]) -> Result<()>;

    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut values = self.get_many(&[key]).await?;
        Ok(values.remove(key))
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.set_many(&[(key, value)]).await
    }
}

/// SQLite-backed key-value store.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (creating if needed) the database at `path` and run migrations.
    pub async fn connect(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .context("Failed to create database directory")?;
        }

        let database_url = format!("sqlite:{}?mode=rwc", path.display());
        let pool = SqlitePool::connect(&database_url)
            .await
            .context("Failed to connect to SQLite database")?;

        let store = Self { pool };
        store.migrate().await?;

        info!("Key-value store ready: {}", database_url);
        Ok(store)
    }

    /// In-memory database, useful for hosts that do not persist across runs.
    ///
    /// Capped at one connection: every pooled connection would otherwise get
    /// its own empty `:memory:` database.
    pub async fn connect_in_memory() -> Result<Self> {
        let pool = sqlx::sqlite::SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .context("Failed to open in-memory SQLite database")?;

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    async fn migrate(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS kv_store (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await
        .context("Failed to create kv_store table")?;

        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for SqliteStore {
    async fn get_many(&self, keys: &[&str]) -> Result<HashMap<String, String>> {
        let mut values = HashMap::new();

        for key in keys {
            let value: Option<String> =
                sqlx::query_scalar("SELECT value FROM kv_store WHERE key = ?")
                    .bind(key)
                    .fetch_optional(&self.pool)
                    .await
                    .with_context(|| format!("Failed to read key: {}", key))?;

            if let Some(value) = value {
                values.insert(key.to_string(), value);
            }
        }

        Ok(values)
    }

    async fn set_many(&self, pairs: &[(&str, &str)]) -> Result<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin storage transaction")?;

        for (key, value) in pairs {
            sqlx::query(
                r#"
                INSERT INTO kv_store (key, value) VALUES (?, ?)
                ON CONFLICT(key) DO UPDATE SET value = excluded.value
                "#,
            )
            .bind(key)
            .bind(value)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("Failed to write key: {}", key))?;
        }

        tx.commit()
            .await
            .context("Failed to commit storage transaction")?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_many_overwrites_wholesale() {
        let store = SqliteStore::connect_in_memory().await.unwrap();

        store
            .set_many(&[("skills", "rust"), ("experience", "4")])
            .await
            .unwrap();
        store.set_many(&[("skills", "go")]).await.unwrap();

        let values = store.get_many(&["skills", "experience", "name"]).await.unwrap();
        assert_eq!(values.get("skills").map(String::as_str), Some("go"));
        assert_eq!(values.get("experience").map(String::as_str), Some("4"));
        assert!(!values.contains_key("name"));
    }

    #[tokio::test]
    async fn test_single_key_helpers() {
        let store = SqliteStore::connect_in_memory().await.unwrap();

        assert_eq!(store.get(profile_keys::GENERATED_HASHTAG).await.unwrap(), None);
        store.set(profile_keys::GENERATED_HASHTAG, "#rustlang").await.unwrap();
        assert_eq!(
            store.get(profile_keys::GENERATED_HASHTAG).await.unwrap().as_deref(),
            Some("#rustlang")
        );
    }
}
