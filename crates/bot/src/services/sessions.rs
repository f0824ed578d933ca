//! Admin interaction tracker.
//!
//! Multi-step admin actions (capture a broadcast draft, capture delivery
//! content, capture a rejection reason) each wait for exactly one free-form
//! message from the admin who started them. This store sequences those
//! steps: at most one pending session per admin, keyed by admin identity so
//! concurrent admins never collide.
//!
//! Consumption is single-shot: the router takes the session before acting,
//! so a session is spent on the one message it awaited regardless of what
//! handling that message does. The only forward transition is
//! `AwaitingBroadcastDraft -> BroadcastReady`, installed by the router after
//! it captures the draft.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use dokan_core::{OrderId, UserId};

use crate::models::draft::Draft;

/// What a free-form message from an admin will be consumed as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminSession {
    /// The next message becomes the broadcast draft.
    AwaitingBroadcastDraft,
    /// A draft is captured; waiting for the admin to pick a segment.
    BroadcastReady { draft: Draft },
    /// The next message is delivery content for this approved order.
    AwaitingDelivery { order_id: OrderId },
    /// The next message is the rejection reason for this rejected order.
    AwaitingRejectReason { order_id: OrderId },
}

/// In-memory session store, keyed by admin identity.
///
/// Deliberately not persisted: a restart drops in-flight admin prompts and
/// the admin simply restarts the action.
#[derive(Debug, Clone, Default)]
pub struct AdminSessions {
    inner: Arc<Mutex<HashMap<UserId, AdminSession>>>,
}

impl AdminSessions {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start (or replace) the pending session for an admin.
    pub fn begin(&self, admin: UserId, session: AdminSession) {
        self.lock().insert(admin, session);
    }

    /// Consume the pending session for an admin, if any.
    ///
    /// This is the single-shot step: once taken, a second free-form message
    /// finds no session and is ignored.
    pub fn take(&self, admin: UserId) -> Option<AdminSession> {
        self.lock().remove(&admin)
    }

    /// Peek at the pending session without consuming it.
    #[must_use]
    pub fn get(&self, admin: UserId) -> Option<AdminSession> {
        self.lock().get(&admin).copied()
    }

    /// Drop the pending session for an admin (explicit cancel).
    pub fn cancel(&self, admin: UserId) {
        self.lock().remove(&admin);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<UserId, AdminSession>> {
        // A poisoned lock means a panic while holding it; sessions are
        // ephemeral prompts, so continuing with the map as-is is safe.
        self.inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn admin(n: i64) -> UserId {
        UserId::new(n)
    }

    #[test]
    fn test_take_is_single_shot() {
        let sessions = AdminSessions::new();
        sessions.begin(admin(1), AdminSession::AwaitingRejectReason {
            order_id: OrderId::new(9),
        });

        assert!(sessions.take(admin(1)).is_some());
        assert!(sessions.take(admin(1)).is_none());
    }

    #[test]
    fn test_admins_do_not_collide() {
        let sessions = AdminSessions::new();
        sessions.begin(admin(1), AdminSession::AwaitingBroadcastDraft);
        sessions.begin(admin(2), AdminSession::AwaitingDelivery {
            order_id: OrderId::new(3),
        });

        assert_eq!(
            sessions.take(admin(1)),
            Some(AdminSession::AwaitingBroadcastDraft)
        );
        assert_eq!(
            sessions.take(admin(2)),
            Some(AdminSession::AwaitingDelivery {
                order_id: OrderId::new(3)
            })
        );
    }

    #[test]
    fn test_begin_replaces_existing_session() {
        let sessions = AdminSessions::new();
        sessions.begin(admin(1), AdminSession::AwaitingBroadcastDraft);
        sessions.begin(admin(1), AdminSession::AwaitingRejectReason {
            order_id: OrderId::new(4),
        });

        assert_eq!(
            sessions.take(admin(1)),
            Some(AdminSession::AwaitingRejectReason {
                order_id: OrderId::new(4)
            })
        );
    }

    #[test]
    fn test_cancel_clears() {
        let sessions = AdminSessions::new();
        sessions.begin(admin(1), AdminSession::AwaitingBroadcastDraft);
        sessions.cancel(admin(1));
        assert!(sessions.get(admin(1)).is_none());
    }
}
