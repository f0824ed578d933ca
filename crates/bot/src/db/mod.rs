//! Database access for the bot (SQLite).
//!
//! # Tables
//!
//! - `users` - known users, opt-in/blocked flags, last-seen timestamps
//! - `catalog_items` - purchasable items (read-only to the core)
//! - `orders` - order lifecycle records (append-only history)
//! - `broadcasts` - one audit row per completed broadcast run
//! - `settings` - key-value settings (maintenance flag)
//!
//! Migrations are embedded from `crates/bot/migrations/` and run when the
//! database is opened.

pub mod broadcasts;
pub mod catalog;
pub mod orders;
pub mod settings;
pub mod users;

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use thiserror::Error;
use tracing::info;

pub use broadcasts::BroadcastRepository;
pub use catalog::CatalogRepository;
pub use orders::OrderRepository;
pub use settings::SettingsRepository;
pub use users::UserRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., duplicate order code).
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// Schema migration failed.
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Handle to the bot's SQLite database.
///
/// Cheap to clone; all repositories borrow the underlying pool.
#[derive(Clone)]
pub struct Database {
    pool: Pool<Sqlite>,
}

impl Database {
    /// Open (or create) the database file and run pending migrations.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or a migration fails.
    pub async fn open(path: &Path) -> Result<Self, RepositoryError> {
        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", path.display()))
            .map_err(RepositoryError::Database)?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .foreign_keys(true)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        let db = Self { pool };
        db.run_migrations().await?;
        info!(path = %path.display(), "Database opened");

        Ok(db)
    }

    /// Open a fresh in-memory database with migrations applied.
    ///
    /// Used by tests; each call yields an isolated database.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection or a migration fails.
    pub async fn open_in_memory() -> Result<Self, RepositoryError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(RepositoryError::Database)?
            .foreign_keys(true);

        // A single connection keeps every query on the same in-memory database.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        let db = Self { pool };
        db.run_migrations().await?;

        Ok(db)
    }

    async fn run_migrations(&self) -> Result<(), RepositoryError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    /// Get the underlying connection pool.
    #[must_use]
    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    /// User directory operations.
    #[must_use]
    pub fn users(&self) -> UserRepository<'_> {
        UserRepository::new(&self.pool)
    }

    /// Catalog read operations.
    #[must_use]
    pub fn catalog(&self) -> CatalogRepository<'_> {
        CatalogRepository::new(&self.pool)
    }

    /// Order persistence operations.
    #[must_use]
    pub fn orders(&self) -> OrderRepository<'_> {
        OrderRepository::new(&self.pool)
    }

    /// Broadcast audit operations.
    #[must_use]
    pub fn broadcasts(&self) -> BroadcastRepository<'_> {
        BroadcastRepository::new(&self.pool)
    }

    /// Key-value settings operations.
    #[must_use]
    pub fn settings(&self) -> SettingsRepository<'_> {
        SettingsRepository::new(&self.pool)
    }
}
