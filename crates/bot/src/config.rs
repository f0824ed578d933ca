//! Bot configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `BOT_TOKEN` - Telegram bot token
//! - `SUPPORT_USERNAME` - support handle (without the `@`)
//! - `ADMIN_IDS` - comma-separated admin user ids
//! - `CARD_NUMBER` - card number shown in payment instructions
//!
//! ## Optional
//! - `DATABASE_PATH` - SQLite database file (default: `dokan.db`)
//! - `TELEGRAM_API_BASE` - Bot API base URL override (for tests/proxies)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::path::PathBuf;

use secrecy::SecretString;
use thiserror::Error;

use dokan_core::UserId;

const DEFAULT_DATABASE_PATH: &str = "dokan.db";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Bot application configuration.
#[derive(Debug, Clone)]
pub struct BotConfig {
    /// Telegram bot token (authenticates every API call).
    pub bot_token: SecretString,
    /// SQLite database file path.
    pub database_path: PathBuf,
    /// Admin user ids; these accounts review payments and run broadcasts.
    pub admin_ids: Vec<UserId>,
    /// Support handle, without the `@`.
    pub support_username: String,
    /// Card number shown in payment instructions.
    pub card_number: String,
    /// Bot API base URL override.
    pub api_base: Option<String>,
    /// Sentry DSN for error tracking.
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "production").
    pub sentry_environment: Option<String>,
}

impl BotConfig {
    /// Load configuration from the environment.
    ///
    /// # Errors
    ///
    /// Returns an error when a required variable is missing or unparsable.
    pub fn from_env() -> Result<Self, ConfigError> {
        let bot_token = SecretString::from(required("BOT_TOKEN")?);
        let support_username = required("SUPPORT_USERNAME")?;
        let card_number = required("CARD_NUMBER")?;
        let admin_ids = parse_admin_ids(&required("ADMIN_IDS")?)
            .map_err(|e| ConfigError::InvalidEnvVar("ADMIN_IDS".to_owned(), e))?;

        let database_path =
            PathBuf::from(optional("DATABASE_PATH").unwrap_or_else(|| DEFAULT_DATABASE_PATH.into()));

        Ok(Self {
            bot_token,
            database_path,
            admin_ids,
            support_username,
            card_number,
            api_base: optional("TELEGRAM_API_BASE"),
            sentry_dsn: optional("SENTRY_DSN"),
            sentry_environment: optional("SENTRY_ENVIRONMENT"),
        })
    }

    /// Whether `id` belongs to an admin.
    #[must_use]
    pub fn is_admin(&self, id: UserId) -> bool {
        self.admin_ids.contains(&id)
    }

    /// Deep link to the support chat.
    #[must_use]
    pub fn support_url(&self) -> String {
        format!("https://t.me/{}", self.support_username)
    }
}

fn required(name: &str) -> Result<String, ConfigError> {
    match std::env::var(name) {
        Ok(v) if !v.trim().is_empty() => Ok(v.trim().to_owned()),
        _ => Err(ConfigError::MissingEnvVar(name.to_owned())),
    }
}

fn optional(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

/// Parse a comma-separated admin id list; whitespace is tolerated.
fn parse_admin_ids(raw: &str) -> Result<Vec<UserId>, String> {
    let ids: Vec<UserId> = raw
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse::<i64>()
                .map(UserId::new)
                .map_err(|_| format!("not a numeric user id: {part}"))
        })
        .collect::<Result<_, _>>()?;

    if ids.is_empty() {
        return Err("no admin ids given".to_owned());
    }
    Ok(ids)
}
