//! Key-value settings repository.
//!
//! Currently holds a single key: the global maintenance flag.

use sqlx::{Pool, Sqlite};

use super::RepositoryError;

const MAINTENANCE_KEY: &str = "maintenance";

/// Repository for key-value settings.
pub struct SettingsRepository<'a> {
    pool: &'a Pool<Sqlite>,
}

impl<'a> SettingsRepository<'a> {
    /// Create a new settings repository.
    #[must_use]
    pub const fn new(pool: &'a Pool<Sqlite>) -> Self {
        Self { pool }
    }

    /// Get a setting value.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, key: &str) -> Result<Option<String>, RepositoryError> {
        let value: Option<String> = sqlx::query_scalar("SELECT value FROM settings WHERE key = ?")
            .bind(key)
            .fetch_optional(self.pool)
            .await?;
        Ok(value)
    }

    /// Set a setting value, inserting or overwriting.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the upsert fails.
    pub async fn set(&self, key: &str, value: &str) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO settings (key, value)
            VALUES (?, ?)
            ON CONFLICT (key) DO UPDATE SET value = excluded.value
            ",
        )
        .bind(key)
        .bind(value)
        .execute(self.pool)
        .await?;
        Ok(())
    }

    /// Whether the bot is in maintenance mode.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn maintenance_enabled(&self) -> Result<bool, RepositoryError> {
        Ok(self.get(MAINTENANCE_KEY).await?.as_deref() == Some("1"))
    }

    /// Toggle maintenance mode on or off.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the write fails.
    pub async fn set_maintenance(&self, enabled: bool) -> Result<(), RepositoryError> {
        self.set(MAINTENANCE_KEY, if enabled { "1" } else { "0" })
            .await
    }
}
