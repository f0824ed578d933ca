//! Order repository.
//!
//! All state transitions are written as status-guarded `UPDATE` statements;
//! zero rows affected means the order was not in an accepted source state
//! (or does not exist), which the order engine resolves into its own error
//! taxonomy. The repository itself never decides transition legality beyond
//! the guard it is given.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use sqlx::{Pool, Sqlite};

use dokan_core::{Category, ItemId, OrderCode, OrderId, OrderStatus, ProofKind, Toman, UserId};

use super::RepositoryError;
use crate::models::order::{Order, Proof};

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: i64,
    order_code: String,
    user_id: i64,
    category: String,
    item_title: String,
    price_toman: i64,
    catalog_item_id: Option<i64>,
    status: String,
    proof_file_id: Option<String>,
    proof_kind: Option<String>,
    decided_by_admin_id: Option<i64>,
    rejection_reason: Option<String>,
    delivery_note: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = RepositoryError;

    fn try_from(r: OrderRow) -> Result<Self, Self::Error> {
        let status = OrderStatus::from_str(&r.status).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid status in database: {e}"))
        })?;
        let category = Category::from_str(&r.category).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid category in database: {e}"))
        })?;
        let proof = match (r.proof_file_id, r.proof_kind) {
            (Some(file_id), Some(kind)) => Some(Proof {
                file_id,
                kind: ProofKind::from_str(&kind).map_err(|e| {
                    RepositoryError::DataCorruption(format!("invalid proof kind in database: {e}"))
                })?,
            }),
            (None, None) => None,
            _ => {
                return Err(RepositoryError::DataCorruption(
                    "proof file id and kind must be stored together".into(),
                ));
            }
        };

        Ok(Self {
            id: OrderId::new(r.id),
            code: OrderCode::from_stored(r.order_code),
            user_id: UserId::new(r.user_id),
            category,
            item_title: r.item_title,
            price: Toman::new(r.price_toman),
            catalog_item_id: r.catalog_item_id.map(ItemId::new),
            status,
            proof,
            decided_by: r.decided_by_admin_id.map(UserId::new),
            rejection_reason: r.rejection_reason,
            delivery_note: r.delivery_note,
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}

const SELECT_COLUMNS: &str = r"
    SELECT id, order_code, user_id, category, item_title, price_toman,
           catalog_item_id, status, proof_file_id, proof_kind,
           decided_by_admin_id, rejection_reason, delivery_note,
           created_at, updated_at
    FROM orders
";

/// Parameters for inserting a new order.
pub struct NewOrder<'a> {
    pub code: &'a OrderCode,
    pub user_id: UserId,
    pub category: Category,
    pub item_title: &'a str,
    pub price: Toman,
    pub catalog_item_id: Option<ItemId>,
}

/// Repository for order persistence.
pub struct OrderRepository<'a> {
    pool: &'a Pool<Sqlite>,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a Pool<Sqlite>) -> Self {
        Self { pool }
    }

    /// Insert a new order in `awaiting_payment`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the order code collides with an
    /// existing one, or `RepositoryError::Database` for other failures.
    pub async fn insert(
        &self,
        params: NewOrder<'_>,
        now: DateTime<Utc>,
    ) -> Result<Order, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(
            r"
            INSERT INTO orders (order_code, user_id, category, item_title, price_toman,
                                catalog_item_id, status, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, 'awaiting_payment', ?, ?)
            RETURNING id, order_code, user_id, category, item_title, price_toman,
                      catalog_item_id, status, proof_file_id, proof_kind,
                      decided_by_admin_id, rejection_reason, delivery_note,
                      created_at, updated_at
            ",
        )
        .bind(params.code.as_str())
        .bind(params.user_id)
        .bind(params.category.to_string())
        .bind(params.item_title)
        .bind(params.price.amount())
        .bind(params.catalog_item_id)
        .bind(now)
        .bind(now)
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return RepositoryError::Conflict("order code already exists".to_owned());
            }
            RepositoryError::Database(e)
        })?;

        row.try_into()
    }

    /// Get an order by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails, or
    /// `RepositoryError::DataCorruption` for invalid stored enum text.
    pub async fn get(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!("{SELECT_COLUMNS} WHERE id = ?"))
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Find the most recently created `awaiting_payment` order for a user.
    ///
    /// This is the order an incoming payment proof binds to; recency (not
    /// uniqueness) resolves ambiguity when a user has several open orders.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn latest_awaiting_payment(
        &self,
        user_id: UserId,
    ) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            r"
            {SELECT_COLUMNS}
            WHERE user_id = ? AND status = 'awaiting_payment'
            ORDER BY created_at DESC, id DESC
            LIMIT 1
            "
        ))
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Attach a payment proof and move `awaiting_payment -> proof_submitted`.
    ///
    /// Returns `false` when the order was not in `awaiting_payment` (nothing
    /// written).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn attach_proof(
        &self,
        id: OrderId,
        proof: &Proof,
        now: DateTime<Utc>,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE orders
            SET status = 'proof_submitted', proof_file_id = ?, proof_kind = ?, updated_at = ?
            WHERE id = ? AND status = 'awaiting_payment'
            ",
        )
        .bind(&proof.file_id)
        .bind(proof.kind.to_string())
        .bind(now)
        .bind(id)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Record an admin decision, moving the order to `approved` or
    /// `rejected`.
    ///
    /// Accepted source states are `proof_submitted` and `awaiting_payment`
    /// (admins may decide before a proof arrives). Returns `false` when the
    /// order was in any other state.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn record_decision(
        &self,
        id: OrderId,
        admin: UserId,
        status: OrderStatus,
        now: DateTime<Utc>,
    ) -> Result<bool, RepositoryError> {
        debug_assert!(matches!(
            status,
            OrderStatus::Approved | OrderStatus::Rejected
        ));
        let result = sqlx::query(
            r"
            UPDATE orders
            SET status = ?, decided_by_admin_id = ?, updated_at = ?
            WHERE id = ? AND status IN ('proof_submitted', 'awaiting_payment')
            ",
        )
        .bind(status.to_string())
        .bind(admin)
        .bind(now)
        .bind(id)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Store the delivery note and move `approved -> delivered`.
    ///
    /// Returns `false` when the order was not in `approved`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn mark_delivered(
        &self,
        id: OrderId,
        delivery_note: &str,
        now: DateTime<Utc>,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE orders
            SET status = 'delivered', delivery_note = ?, updated_at = ?
            WHERE id = ? AND status = 'approved'
            ",
        )
        .bind(delivery_note)
        .bind(now)
        .bind(id)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Store the rejection reason on a `rejected` order.
    ///
    /// Returns `false` when the order was not in `rejected`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn store_rejection_reason(
        &self,
        id: OrderId,
        reason: &str,
        now: DateTime<Utc>,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE orders
            SET rejection_reason = ?, updated_at = ?
            WHERE id = ? AND status = 'rejected'
            ",
        )
        .bind(reason)
        .bind(now)
        .bind(id)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
