//! Dokan bot binary.
//!
//! Startup order matters: configuration first (Sentry needs the DSN),
//! Sentry before the tracing subscriber, then the database (running
//! migrations), then the long-poll loop. The loop is the single logical
//! worker: updates are handled one at a time, in arrival order.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::time::Duration;

use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use dokan_bot::config::BotConfig;
use dokan_bot::db::Database;
use dokan_bot::handlers;
use dokan_bot::state::AppState;
use dokan_bot::telegram::TelegramClient;

/// Long-poll timeout per `getUpdates` call.
const POLL_TIMEOUT: Duration = Duration::from_secs(30);
/// Pause before retrying after a failed poll.
const POLL_RETRY_DELAY: Duration = Duration::from_secs(3);

/// Initialize Sentry error tracking and return a guard that must be kept alive.
fn init_sentry(config: &BotConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() {
    // .env is optional; real deployments use actual environment variables.
    let _ = dotenvy::dotenv();

    let config = BotConfig::from_env().expect("Failed to load configuration");

    // Sentry must be initialized before the tracing subscriber.
    let _sentry_guard = init_sentry(&config);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "dokan_bot=info".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    let db = Database::open(&config.database_path)
        .await
        .expect("Failed to open database");

    let telegram = TelegramClient::new(config.bot_token.clone(), config.api_base.clone());
    let state = AppState::new(config, db, telegram);

    tracing::info!("Bot is running");
    poll_loop(&state).await;
}

/// Long-poll forever, dispatching updates sequentially.
async fn poll_loop(state: &AppState) {
    let mut offset = 0_i64;
    loop {
        match state.telegram().get_updates(offset, POLL_TIMEOUT).await {
            Ok(updates) => {
                for update in updates {
                    offset = offset.max(update.update_id + 1);
                    handlers::dispatch(state, update).await;
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "Polling failed");
                tokio::time::sleep(POLL_RETRY_DELAY).await;
            }
        }
    }
}
