//! Integration tests for Dokan.
//!
//! Provides a [`TestContext`] wiring the engines to an in-memory database,
//! a recording [`FakeChannel`], and a [`RecordingSleeper`], so order and
//! broadcast behavior is observable without a network or real time delays.
//!
//! # Test Categories
//!
//! - `order_lifecycle` - state machine transitions end to end
//! - `order_codes` - code uniqueness and collision retry
//! - `proof_attachment` - proof binding rules
//! - `broadcast` - delivery loop, failure classification, pacing
//! - `segments` - recipient resolution
//! - `admin_sessions` - interaction tracker semantics

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;

use dokan_bot::db::Database;
use dokan_bot::models::catalog::CatalogItem;
use dokan_bot::models::draft::Draft;
use dokan_bot::models::order::Proof;
use dokan_bot::models::user::{User, UserProfile};
use dokan_bot::services::broadcast::{BroadcastPolicy, Broadcaster, Sleeper};
use dokan_bot::services::orders::OrderService;
use dokan_bot::services::sessions::AdminSessions;
use dokan_bot::telegram::{Channel, TelegramError};
use dokan_core::{Category, OrderId, OrderStatus, Toman, UserId};

/// First test admin.
pub const ADMIN_ONE: UserId = UserId::new(900);
/// Second test admin.
pub const ADMIN_TWO: UserId = UserId::new(901);
/// Support URL handed to the order engine.
pub const SUPPORT_URL: &str = "https://t.me/support";

/// One outbound side effect recorded by [`FakeChannel`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sent {
    Text {
        to: UserId,
        text: String,
    },
    Proof {
        to: UserId,
        order_id: OrderId,
        caption: String,
    },
    Copy {
        to: UserId,
        draft: Draft,
    },
}

/// Scripted failure for a recipient.
#[derive(Debug, Clone, Copy)]
pub enum FailureScript {
    /// 403: recipient blocked the bot.
    Blocked,
    /// 429 with an optional server retry hint.
    RateLimited(Option<Duration>),
    /// Any other API failure.
    Other,
}

impl FailureScript {
    fn to_error(self) -> TelegramError {
        match self {
            Self::Blocked => TelegramError::Api {
                code: 403,
                description: "Forbidden: bot was blocked by the user".into(),
                retry_after: None,
            },
            Self::RateLimited(retry_after) => TelegramError::Api {
                code: 429,
                description: "Too Many Requests: retry later".into(),
                retry_after,
            },
            Self::Other => TelegramError::Api {
                code: 400,
                description: "Bad Request: chat not found".into(),
                retry_after: None,
            },
        }
    }
}

/// Recording channel double; every send succeeds unless scripted otherwise.
#[derive(Debug, Clone, Default)]
pub struct FakeChannel {
    outbox: Arc<Mutex<Vec<Sent>>>,
    failures: Arc<Mutex<HashMap<i64, FailureScript>>>,
}

impl FakeChannel {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Script every delivery to `user` to fail.
    pub fn fail_for(&self, user: UserId, script: FailureScript) {
        self.failures.lock().unwrap().insert(user.as_i64(), script);
    }

    /// Everything sent so far, in order.
    #[must_use]
    pub fn outbox(&self) -> Vec<Sent> {
        self.outbox.lock().unwrap().clone()
    }

    /// Texts delivered to one chat.
    #[must_use]
    pub fn texts_to(&self, user: UserId) -> Vec<String> {
        self.outbox()
            .into_iter()
            .filter_map(|sent| match sent {
                Sent::Text { to, text } if to == user => Some(text),
                _ => None,
            })
            .collect()
    }

    /// Admins who received proof notifications, in send order.
    #[must_use]
    pub fn proof_recipients(&self) -> Vec<UserId> {
        self.outbox()
            .into_iter()
            .filter_map(|sent| match sent {
                Sent::Proof { to, .. } => Some(to),
                _ => None,
            })
            .collect()
    }

    /// Copies delivered to one chat.
    #[must_use]
    pub fn copies_to(&self, user: UserId) -> Vec<Draft> {
        self.outbox()
            .into_iter()
            .filter_map(|sent| match sent {
                Sent::Copy { to, draft } if to == user => Some(draft),
                _ => None,
            })
            .collect()
    }

    fn check(&self, to: UserId) -> Result<(), TelegramError> {
        if let Some(script) = self.failures.lock().unwrap().get(&to.as_i64()) {
            return Err(script.to_error());
        }
        Ok(())
    }
}

impl Channel for FakeChannel {
    async fn send_text(&self, to: UserId, text: &str) -> Result<(), TelegramError> {
        self.check(to)?;
        self.outbox.lock().unwrap().push(Sent::Text {
            to,
            text: text.to_owned(),
        });
        Ok(())
    }

    async fn send_proof(
        &self,
        to: UserId,
        _proof: &Proof,
        caption: &str,
        order_id: OrderId,
    ) -> Result<(), TelegramError> {
        self.check(to)?;
        self.outbox.lock().unwrap().push(Sent::Proof {
            to,
            order_id,
            caption: caption.to_owned(),
        });
        Ok(())
    }

    async fn copy_draft(&self, to: UserId, draft: &Draft) -> Result<(), TelegramError> {
        self.check(to)?;
        self.outbox.lock().unwrap().push(Sent::Copy { to, draft: *draft });
        Ok(())
    }
}

/// Sleeper double that records requested durations instead of waiting.
#[derive(Debug, Clone, Default)]
pub struct RecordingSleeper {
    sleeps: Arc<Mutex<Vec<Duration>>>,
}

impl RecordingSleeper {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Durations requested so far, in order.
    #[must_use]
    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().unwrap().clone()
    }
}

impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.sleeps.lock().unwrap().push(duration);
    }
}

/// Everything a test needs, wired to an isolated in-memory database.
pub struct TestContext {
    pub db: Database,
    pub channel: FakeChannel,
    pub sleeper: RecordingSleeper,
    pub sessions: AdminSessions,
    pub orders: OrderService<FakeChannel>,
    pub broadcaster: Broadcaster<FakeChannel, RecordingSleeper>,
}

impl TestContext {
    /// Build a fresh context; each call gets its own database.
    pub async fn new() -> Self {
        let db = Database::open_in_memory()
            .await
            .expect("in-memory database");
        let channel = FakeChannel::new();
        let sleeper = RecordingSleeper::new();
        let sessions = AdminSessions::new();

        let orders = OrderService::new(
            db.clone(),
            channel.clone(),
            sessions.clone(),
            vec![ADMIN_ONE, ADMIN_TWO],
            SUPPORT_URL.to_owned(),
        );
        let broadcaster = Broadcaster::new(
            db.clone(),
            channel.clone(),
            sleeper.clone(),
            BroadcastPolicy::default(),
        );

        Self {
            db,
            channel,
            sleeper,
            sessions,
            orders,
            broadcaster,
        }
    }

    /// Register a user as seen now.
    pub async fn seed_user(&self, id: i64) -> User {
        self.seed_user_seen_at(id, Utc::now()).await
    }

    /// Register a user with a controlled last-seen instant.
    pub async fn seed_user_seen_at(&self, id: i64, seen_at: chrono::DateTime<Utc>) -> User {
        self.db
            .users()
            .upsert_seen(
                UserId::new(id),
                &UserProfile {
                    username: Some(format!("user{id}")),
                    first_name: Some("Test".to_owned()),
                    last_name: None,
                    language_code: Some("en".to_owned()),
                },
                seen_at,
            )
            .await
            .expect("seed user")
    }

    /// Insert a catalog item and read it back.
    pub async fn seed_item(
        &self,
        category: Category,
        title: &str,
        price: i64,
        active: bool,
    ) -> CatalogItem {
        let id = self
            .db
            .catalog()
            .insert_item(category, title, Toman::new(price), active)
            .await
            .expect("seed item");
        self.db
            .catalog()
            .get_item(id)
            .await
            .expect("read seeded item")
            .expect("seeded item exists")
    }

    /// Current status of an order.
    pub async fn order_status(&self, id: OrderId) -> OrderStatus {
        self.db
            .orders()
            .get(id)
            .await
            .expect("read order")
            .expect("order exists")
            .status
    }

    /// A sample photo proof.
    #[must_use]
    pub fn photo_proof() -> Proof {
        Proof {
            file_id: "photo-file-1".to_owned(),
            kind: dokan_core::ProofKind::Photo,
        }
    }

    /// A draft pointing at an admin-authored message.
    #[must_use]
    pub fn draft_from(admin: UserId, message_id: i64) -> Draft {
        Draft {
            from_chat: admin,
            message_id,
        }
    }
}
