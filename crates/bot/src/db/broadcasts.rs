//! Broadcast audit repository.
//!
//! One append-only row per completed broadcast run.

use chrono::{DateTime, Utc};
use sqlx::{Pool, Sqlite};

use dokan_core::{Segment, UserId};

use super::RepositoryError;
use crate::models::draft::Draft;

/// An audit row for a completed broadcast run.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BroadcastRecord {
    pub id: i64,
    pub admin_id: i64,
    pub from_chat_id: i64,
    pub message_id: i64,
    pub segment: String,
    pub sent_ok: i64,
    pub sent_fail: i64,
    pub created_at: DateTime<Utc>,
}

/// Repository for broadcast audit rows.
pub struct BroadcastRepository<'a> {
    pool: &'a Pool<Sqlite>,
}

impl<'a> BroadcastRepository<'a> {
    /// Create a new broadcast repository.
    #[must_use]
    pub const fn new(pool: &'a Pool<Sqlite>) -> Self {
        Self { pool }
    }

    /// Append the audit row for a completed run.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn record_run(
        &self,
        admin: UserId,
        draft: &Draft,
        segment: Segment,
        sent_ok: u32,
        sent_fail: u32,
        now: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO broadcasts (admin_id, from_chat_id, message_id, segment,
                                    sent_ok, sent_fail, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ",
        )
        .bind(admin)
        .bind(draft.from_chat)
        .bind(draft.message_id)
        .bind(segment.to_string())
        .bind(i64::from(sent_ok))
        .bind(i64::from(sent_fail))
        .bind(now)
        .execute(self.pool)
        .await?;

        Ok(())
    }

    /// List all audit rows, oldest first. Used by tests and admin tooling.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<BroadcastRecord>, RepositoryError> {
        let rows = sqlx::query_as::<_, BroadcastRecord>(
            r"
            SELECT id, admin_id, from_chat_id, message_id, segment,
                   sent_ok, sent_fail, created_at
            FROM broadcasts
            ORDER BY id
            ",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows)
    }
}
