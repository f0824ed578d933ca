//! Order domain types.

use chrono::{DateTime, Utc};

use dokan_core::{Category, ItemId, OrderCode, OrderId, OrderStatus, ProofKind, Toman, UserId};

/// An order, from catalog selection through delivery or rejection.
///
/// The item title and price are snapshots taken at selection time; later
/// catalog edits never alter historical orders. Orders are append-only
/// history and are never deleted.
#[derive(Debug, Clone)]
pub struct Order {
    pub id: OrderId,
    /// Human-shareable code quoted in user/admin conversation.
    pub code: OrderCode,
    pub user_id: UserId,
    pub category: Category,
    pub item_title: String,
    pub price: Toman,
    /// Provenance reference to the catalog item, informational only.
    pub catalog_item_id: Option<ItemId>,
    pub status: OrderStatus,
    pub proof: Option<Proof>,
    /// Admin who approved or rejected the order.
    pub decided_by: Option<UserId>,
    pub rejection_reason: Option<String>,
    pub delivery_note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A payment proof: an opaque platform file handle plus its content kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Proof {
    pub file_id: String,
    pub kind: ProofKind,
}
