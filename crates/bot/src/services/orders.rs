//! Order engine: owns order creation, state transitions, and payment-proof
//! attachment, together with their notification side effects.
//!
//! State machine:
//!
//! ```text
//! awaiting_payment -> proof_submitted -> approved -> delivered
//!        |                  |
//!        +------------------+-> rejected    (terminal)
//!                               cancelled   (terminal)
//! ```
//!
//! Admin decisions are also accepted straight from `awaiting_payment`
//! (decision before the proof arrives); terminal states reject everything,
//! which keeps a double-tapped approve from re-notifying the buyer.

use chrono::Utc;
use tracing::{info, instrument, warn};

use dokan_core::{OrderCode, OrderId, OrderStatus, UserId};

use crate::db::orders::NewOrder;
use crate::db::{Database, RepositoryError};
use crate::error::AppError;
use crate::models::catalog::CatalogItem;
use crate::models::draft::Draft;
use crate::models::order::{Order, Proof};
use crate::models::user::User;
use crate::services::sessions::{AdminSession, AdminSessions};
use crate::telegram::Channel;

/// Attempts before giving up on generating a unique order code. Each retry
/// draws a fresh random suffix, so exhaustion means something is badly wrong
/// with the codes table, not bad luck.
const MAX_CODE_ATTEMPTS: u32 = 5;

/// Outcome of a proof submission.
///
/// `NoOpenOrder` is a recoverable no-op, not an error: users send images
/// unrelated to any purchase, and those are ignored rather than rejected.
#[derive(Debug)]
pub enum ProofOutcome {
    /// Proof attached; admins have been notified.
    Attached(Order),
    /// The user has no `awaiting_payment` order; nothing happened.
    NoOpenOrder,
}

/// The order engine.
///
/// Owns every order mutation and the notifications each one emits. Generic
/// over the outbound [`Channel`] so engine behavior is testable without a
/// network.
pub struct OrderService<C> {
    db: Database,
    channel: C,
    sessions: AdminSessions,
    admins: Vec<UserId>,
    support_url: String,
}

impl<C: Channel> OrderService<C> {
    /// Create a new order engine.
    #[must_use]
    pub fn new(
        db: Database,
        channel: C,
        sessions: AdminSessions,
        admins: Vec<UserId>,
        support_url: String,
    ) -> Self {
        Self {
            db,
            channel,
            sessions,
            admins,
            support_url,
        }
    }

    /// Create an order for a catalog selection.
    ///
    /// The item must still be active at selection time. Title and price are
    /// snapshotted onto the order; a fresh order code is generated, retrying
    /// on the (unlikely) uniqueness collision.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::ItemUnavailable`] for inactive items, or a
    /// database error.
    #[instrument(skip(self, item), fields(user = %user, item_id = %item.id))]
    pub async fn create_order(&self, user: UserId, item: &CatalogItem) -> Result<Order, AppError> {
        self.create_order_with(user, item, || OrderCode::generate(Utc::now(), &mut rand::rng()))
            .await
    }

    /// [`Self::create_order`] with an injected code source.
    ///
    /// Production passes the random generator; tests pass a deterministic
    /// sequence to exercise the collision retry.
    ///
    /// # Errors
    ///
    /// As [`Self::create_order`]; additionally surfaces the conflict as a
    /// database error if every attempt collides.
    pub async fn create_order_with(
        &self,
        user: UserId,
        item: &CatalogItem,
        mut next_code: impl FnMut() -> OrderCode,
    ) -> Result<Order, AppError> {
        if !item.active {
            return Err(AppError::ItemUnavailable);
        }

        let mut last_conflict = None;
        for _ in 0..MAX_CODE_ATTEMPTS {
            let code = next_code();
            match self
                .db
                .orders()
                .insert(
                    NewOrder {
                        code: &code,
                        user_id: user,
                        category: item.category,
                        item_title: &item.title,
                        price: item.price,
                        catalog_item_id: Some(item.id),
                    },
                    Utc::now(),
                )
                .await
            {
                Ok(order) => {
                    info!(code = %order.code, user = %user, "Order created");
                    return Ok(order);
                }
                Err(RepositoryError::Conflict(msg)) => {
                    warn!(code = %code, "Order code collision, regenerating");
                    last_conflict = Some(RepositoryError::Conflict(msg));
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(last_conflict
            .unwrap_or_else(|| RepositoryError::Conflict("order code exhausted".to_owned()))
            .into())
    }

    /// Attach a payment proof to the user's most recent `awaiting_payment`
    /// order and notify every admin with approve/reject controls.
    ///
    /// A user with no open order gets [`ProofOutcome::NoOpenOrder`]: no state
    /// change, no notification.
    ///
    /// # Errors
    ///
    /// Returns a database error if lookup or the transition write fails.
    #[instrument(skip(self, user, proof), fields(user = %user.id))]
    pub async fn attach_proof(&self, user: &User, proof: Proof) -> Result<ProofOutcome, AppError> {
        let Some(order) = self.db.orders().latest_awaiting_payment(user.id).await? else {
            return Ok(ProofOutcome::NoOpenOrder);
        };

        if !self
            .db
            .orders()
            .attach_proof(order.id, &proof, Utc::now())
            .await?
        {
            // Raced with another transition; treat like no open order.
            return Ok(ProofOutcome::NoOpenOrder);
        }

        let order = self.require(order.id).await?;
        info!(code = %order.code, "Proof attached");

        let caption = format!(
            "New payment proof\nFrom: {}\nOrder code: {}\nItem: {}\nPrice: {}",
            user.tag(),
            order.code,
            order.item_title,
            order.price,
        );
        for &admin in &self.admins {
            if let Err(e) = self
                .channel
                .send_proof(admin, &proof, &caption, order.id)
                .await
            {
                warn!(admin = %admin, error = %e, "Failed to notify admin of new proof");
            }
        }

        Ok(ProofOutcome::Attached(order))
    }

    /// Approve an order.
    ///
    /// Accepted from `proof_submitted`, and from `awaiting_payment` when the
    /// admin decides before a proof arrives. Notifies the buyer and opens a
    /// delivery-capture session for the deciding admin.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::OrderNotFound`] or [`AppError::InvalidTransition`]
    /// (including for orders already approved or delivered).
    #[instrument(skip(self), fields(order = %order_id, admin = %admin))]
    pub async fn approve(&self, order_id: OrderId, admin: UserId) -> Result<Order, AppError> {
        let order = self
            .transition_decision(order_id, admin, OrderStatus::Approved)
            .await?;
        info!(code = %order.code, admin = %admin, "Order approved");

        if let Err(e) = self
            .channel
            .send_text(
                order.user_id,
                &format!(
                    "Your payment for order {} was approved. \
                     Service details will be sent to you shortly.",
                    order.code
                ),
            )
            .await
        {
            warn!(user = %order.user_id, error = %e, "Failed to notify user of approval");
        }

        self.sessions
            .begin(admin, AdminSession::AwaitingDelivery { order_id: order.id });

        Ok(order)
    }

    /// Reject an order.
    ///
    /// Same accepted source states as [`Self::approve`]. Opens a
    /// reject-reason-capture session for the deciding admin; the buyer is
    /// notified once the reason arrives.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::OrderNotFound`] or [`AppError::InvalidTransition`].
    #[instrument(skip(self), fields(order = %order_id, admin = %admin))]
    pub async fn reject(&self, order_id: OrderId, admin: UserId) -> Result<Order, AppError> {
        let order = self
            .transition_decision(order_id, admin, OrderStatus::Rejected)
            .await?;
        info!(code = %order.code, admin = %admin, "Order rejected");

        self.sessions.begin(admin, AdminSession::AwaitingRejectReason {
            order_id: order.id,
        });

        Ok(order)
    }

    /// Deliver an approved order: copy the admin's delivery content to the
    /// buyer and record the delivery note.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::OrderNotFound`] or [`AppError::InvalidTransition`]
    /// unless the order is `approved`.
    #[instrument(skip(self, delivery), fields(order = %order_id, admin = %admin))]
    pub async fn finalize_delivery(
        &self,
        order_id: OrderId,
        admin: UserId,
        delivery: &Draft,
    ) -> Result<Order, AppError> {
        let order = self.require(order_id).await?;
        if order.status != OrderStatus::Approved {
            return Err(AppError::InvalidTransition {
                code: order.code,
                from: order.status,
            });
        }

        // Delivery content reaches the buyer even if the bookkeeping write
        // below were to fail; the copy is the part the buyer cares about.
        if let Err(e) = self.channel.copy_draft(order.user_id, delivery).await {
            warn!(user = %order.user_id, error = %e, "Failed to copy delivery content to user");
        }

        let now = Utc::now();
        let note = format!("delivered_by_admin:{admin} at {}", now.to_rfc3339());
        if !self.db.orders().mark_delivered(order_id, &note, now).await? {
            let order = self.require(order_id).await?;
            return Err(AppError::InvalidTransition {
                code: order.code,
                from: order.status,
            });
        }

        let order = self.require(order_id).await?;
        info!(code = %order.code, admin = %admin, "Order delivered");
        Ok(order)
    }

    /// Store the rejection reason on a rejected order and notify the buyer
    /// with the reason and the support contact.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::OrderNotFound`] or [`AppError::InvalidTransition`]
    /// unless the order is `rejected`.
    #[instrument(skip(self, reason), fields(order = %order_id))]
    pub async fn record_rejection_reason(
        &self,
        order_id: OrderId,
        reason: &str,
    ) -> Result<Order, AppError> {
        let order = self.require(order_id).await?;
        if order.status != OrderStatus::Rejected {
            return Err(AppError::InvalidTransition {
                code: order.code,
                from: order.status,
            });
        }

        self.db
            .orders()
            .store_rejection_reason(order_id, reason, Utc::now())
            .await?;

        let order = self.require(order_id).await?;
        if let Err(e) = self
            .channel
            .send_text(
                order.user_id,
                &format!(
                    "Order {} was rejected.\nReason: {reason}\n\
                     If you have questions, contact support: {}",
                    order.code, self.support_url,
                ),
            )
            .await
        {
            warn!(user = %order.user_id, error = %e, "Failed to notify user of rejection reason");
        }

        Ok(order)
    }

    /// Shared approve/reject transition: check the source state, write the
    /// guarded update, and re-read the order.
    async fn transition_decision(
        &self,
        order_id: OrderId,
        admin: UserId,
        status: OrderStatus,
    ) -> Result<Order, AppError> {
        let order = self.require(order_id).await?;
        if !order.status.accepts_decision() {
            return Err(AppError::InvalidTransition {
                code: order.code,
                from: order.status,
            });
        }

        if !self
            .db
            .orders()
            .record_decision(order_id, admin, status, Utc::now())
            .await?
        {
            let order = self.require(order_id).await?;
            return Err(AppError::InvalidTransition {
                code: order.code,
                from: order.status,
            });
        }

        self.require(order_id).await
    }

    async fn require(&self, order_id: OrderId) -> Result<Order, AppError> {
        self.db
            .orders()
            .get(order_id)
            .await?
            .ok_or(AppError::OrderNotFound(order_id))
    }
}
