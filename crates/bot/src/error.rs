//! Unified error handling for the bot.
//!
//! All handler and service operations return `Result<T, AppError>`. The
//! dispatch boundary converts failures into a short human reply for the
//! affected chat, logs full detail, and captures server-side classes to
//! Sentry when configured.

use thiserror::Error;

use dokan_core::{OrderCode, OrderId, OrderStatus};

use crate::db::RepositoryError;
use crate::telegram::TelegramError;

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("database error: {0}")]
    Database(#[from] RepositoryError),

    /// Messaging-channel operation failed.
    #[error("channel error: {0}")]
    Channel(#[from] TelegramError),

    /// Selected catalog item is inactive or missing.
    #[error("selected item is unavailable")]
    ItemUnavailable,

    /// Referenced order does not exist.
    #[error("order {0} not found")]
    OrderNotFound(OrderId),

    /// State machine operation invoked from a state that does not accept it.
    #[error("order {code} cannot transition from {from}")]
    InvalidTransition {
        code: OrderCode,
        from: OrderStatus,
    },
}

impl AppError {
    /// Short reply for the affected chat. Internal detail never leaks here.
    #[must_use]
    pub const fn user_message(&self) -> &'static str {
        match self {
            Self::Database(_) | Self::Channel(_) => {
                "Something went wrong. Please try again."
            }
            Self::ItemUnavailable => "This item is not available.",
            Self::OrderNotFound(_) => "Order not found.",
            Self::InvalidTransition { .. } => "Order not found or already handled.",
        }
    }

    /// Whether this failure class should be captured to Sentry.
    #[must_use]
    pub const fn is_server_error(&self) -> bool {
        matches!(self, Self::Database(_) | Self::Channel(_))
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = AppError::OrderNotFound(OrderId::new(12));
        assert_eq!(err.to_string(), "order 12 not found");

        let err = AppError::InvalidTransition {
            code: OrderCode::from_stored("ORD-20250923-AB12".into()),
            from: OrderStatus::Delivered,
        };
        assert_eq!(
            err.to_string(),
            "order ORD-20250923-AB12 cannot transition from delivered"
        );
    }

    #[test]
    fn test_user_messages_hide_internals() {
        let err = AppError::Database(RepositoryError::NotFound);
        assert_eq!(err.user_message(), "Something went wrong. Please try again.");
        assert!(err.is_server_error());

        let err = AppError::ItemUnavailable;
        assert_eq!(err.user_message(), "This item is not available.");
        assert!(!err.is_server_error());
    }
}
