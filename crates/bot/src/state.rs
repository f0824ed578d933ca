//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::BotConfig;
use crate::db::Database;
use crate::services::broadcast::{BroadcastPolicy, Broadcaster, TokioSleeper};
use crate::services::orders::OrderService;
use crate::services::sessions::AdminSessions;
use crate::telegram::TelegramClient;

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`; provides access to configuration, the
/// database, the messaging channel, and the core engines.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: BotConfig,
    db: Database,
    telegram: TelegramClient,
    sessions: AdminSessions,
    orders: OrderService<TelegramClient>,
    broadcaster: Broadcaster<TelegramClient, TokioSleeper>,
}

impl AppState {
    /// Assemble the application state.
    #[must_use]
    pub fn new(config: BotConfig, db: Database, telegram: TelegramClient) -> Self {
        let sessions = AdminSessions::new();
        let orders = OrderService::new(
            db.clone(),
            telegram.clone(),
            sessions.clone(),
            config.admin_ids.clone(),
            config.support_url(),
        );
        let broadcaster = Broadcaster::new(
            db.clone(),
            telegram.clone(),
            TokioSleeper,
            BroadcastPolicy::default(),
        );

        Self {
            inner: Arc::new(AppStateInner {
                config,
                db,
                telegram,
                sessions,
                orders,
                broadcaster,
            }),
        }
    }

    /// Get a reference to the configuration.
    #[must_use]
    pub fn config(&self) -> &BotConfig {
        &self.inner.config
    }

    /// Get a reference to the database handle.
    #[must_use]
    pub fn db(&self) -> &Database {
        &self.inner.db
    }

    /// Get a reference to the Bot API client.
    #[must_use]
    pub fn telegram(&self) -> &TelegramClient {
        &self.inner.telegram
    }

    /// Get a reference to the admin session store.
    #[must_use]
    pub fn sessions(&self) -> &AdminSessions {
        &self.inner.sessions
    }

    /// Get a reference to the order engine.
    #[must_use]
    pub fn orders(&self) -> &OrderService<TelegramClient> {
        &self.inner.orders
    }

    /// Get a reference to the broadcast engine.
    #[must_use]
    pub fn broadcaster(&self) -> &Broadcaster<TelegramClient, TokioSleeper> {
        &self.inner.broadcaster
    }
}
