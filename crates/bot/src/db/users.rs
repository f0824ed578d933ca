//! User directory repository.
//!
//! The bot records every user it has ever seen and refreshes their profile
//! and last-seen timestamp on each interaction. Users are never deleted;
//! broadcast delivery failures flip the `blocked` flag instead.

use chrono::{DateTime, Duration, Utc};
use sqlx::{Pool, Sqlite};

use dokan_core::{Segment, UserId};

use super::RepositoryError;
use crate::models::user::{User, UserProfile};

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: i64,
    username: Option<String>,
    first_name: Option<String>,
    last_name: Option<String>,
    language_code: Option<String>,
    allow_broadcast: bool,
    blocked: bool,
    created_at: DateTime<Utc>,
    last_seen_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(r: UserRow) -> Self {
        Self {
            id: UserId::new(r.id),
            username: r.username,
            first_name: r.first_name,
            last_name: r.last_name,
            language_code: r.language_code,
            allow_broadcast: r.allow_broadcast,
            blocked: r.blocked,
            created_at: r.created_at,
            last_seen_at: r.last_seen_at,
        }
    }
}

/// Repository for user directory operations.
pub struct UserRepository<'a> {
    pool: &'a Pool<Sqlite>,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a Pool<Sqlite>) -> Self {
        Self { pool }
    }

    /// Insert the user on first contact, or refresh profile fields and the
    /// last-seen timestamp on every later one.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the upsert fails.
    pub async fn upsert_seen(
        &self,
        id: UserId,
        profile: &UserProfile,
        now: DateTime<Utc>,
    ) -> Result<User, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r"
            INSERT INTO users (id, username, first_name, last_name, language_code, created_at, last_seen_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (id) DO UPDATE SET
                username = excluded.username,
                first_name = excluded.first_name,
                last_name = excluded.last_name,
                language_code = excluded.language_code,
                last_seen_at = excluded.last_seen_at
            RETURNING id, username, first_name, last_name, language_code,
                      allow_broadcast, blocked, created_at, last_seen_at
            ",
        )
        .bind(id)
        .bind(profile.username.clone())
        .bind(profile.first_name.clone())
        .bind(profile.last_name.clone())
        .bind(profile.language_code.clone())
        .bind(now)
        .bind(now)
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }

    /// Get a user by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r"
            SELECT id, username, first_name, last_name, language_code,
                   allow_broadcast, blocked, created_at, last_seen_at
            FROM users
            WHERE id = ?
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// Set the broadcast opt-in flag.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn set_opt_in(&self, id: UserId, allow: bool) -> Result<(), RepositoryError> {
        sqlx::query("UPDATE users SET allow_broadcast = ? WHERE id = ?")
            .bind(allow)
            .bind(id)
            .execute(self.pool)
            .await?;
        Ok(())
    }

    /// Set the blocked flag.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn set_blocked(&self, id: UserId, blocked: bool) -> Result<(), RepositoryError> {
        sqlx::query("UPDATE users SET blocked = ? WHERE id = ?")
            .bind(blocked)
            .bind(id)
            .execute(self.pool)
            .await?;
        Ok(())
    }

    /// Resolve a broadcast segment to recipient ids.
    ///
    /// Both segments require broadcast opt-in; [`Segment::Active30`]
    /// additionally requires activity within the last 30 days relative to
    /// `now`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_segment(
        &self,
        segment: Segment,
        now: DateTime<Utc>,
    ) -> Result<Vec<UserId>, RepositoryError> {
        let ids: Vec<i64> = match segment {
            Segment::All => {
                sqlx::query_scalar("SELECT id FROM users WHERE allow_broadcast = 1 ORDER BY id")
                    .fetch_all(self.pool)
                    .await?
            }
            Segment::Active30 => {
                let cutoff = now - Duration::days(Segment::ACTIVE_WINDOW_DAYS);
                sqlx::query_scalar(
                    r"
                    SELECT id FROM users
                    WHERE allow_broadcast = 1 AND last_seen_at >= ?
                    ORDER BY id
                    ",
                )
                .bind(cutoff)
                .fetch_all(self.pool)
                .await?
            }
        };

        Ok(ids.into_iter().map(UserId::new).collect())
    }

    /// Total number of known users.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self) -> Result<i64, RepositoryError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }

    /// Number of users seen within the last 30 days relative to `now`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count_active(&self, now: DateTime<Utc>) -> Result<i64, RepositoryError> {
        let cutoff = now - Duration::days(Segment::ACTIVE_WINDOW_DAYS);
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE last_seen_at >= ?")
            .bind(cutoff)
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }
}
