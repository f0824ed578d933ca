//! Telegram-related errors and per-recipient failure classification.

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur when calling the Bot API.
#[derive(Debug, Error)]
pub enum TelegramError {
    /// HTTP request failed (transport-level).
    #[error("telegram request failed: {0}")]
    Request(String),

    /// Failed to parse the response body.
    #[error("telegram response error: {0}")]
    Response(String),

    /// The API answered with `ok: false`.
    #[error("telegram api error {code}: {description}")]
    Api {
        code: i64,
        description: String,
        /// Server-suggested delay from `parameters.retry_after`, when rate
        /// limited.
        retry_after: Option<Duration>,
    },
}

/// How a failed delivery to one recipient should be treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryFailure {
    /// The recipient blocked the bot or deactivated their account; they are
    /// unreachable permanently and should be dropped from future runs.
    Blocked,
    /// The platform is throttling the sender; back off before continuing,
    /// honoring the server-suggested delay when present.
    RateLimited(Option<Duration>),
    /// Anything else; count as failed and continue.
    Other,
}

impl TelegramError {
    /// Classify this error for the broadcast loop.
    #[must_use]
    pub fn delivery_failure(&self) -> DeliveryFailure {
        match self {
            Self::Api {
                code,
                description,
                retry_after,
            } => {
                if *code == 403 || description.contains("user is deactivated") {
                    DeliveryFailure::Blocked
                } else if *code == 429 {
                    DeliveryFailure::RateLimited(*retry_after)
                } else {
                    DeliveryFailure::Other
                }
            }
            Self::Request(_) | Self::Response(_) => DeliveryFailure::Other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blocked_classification() {
        let err = TelegramError::Api {
            code: 403,
            description: "Forbidden: bot was blocked by the user".into(),
            retry_after: None,
        };
        assert_eq!(err.delivery_failure(), DeliveryFailure::Blocked);

        let err = TelegramError::Api {
            code: 400,
            description: "Bad Request: user is deactivated".into(),
            retry_after: None,
        };
        assert_eq!(err.delivery_failure(), DeliveryFailure::Blocked);
    }

    #[test]
    fn test_rate_limited_classification() {
        let err = TelegramError::Api {
            code: 429,
            description: "Too Many Requests: retry after 7".into(),
            retry_after: Some(Duration::from_secs(7)),
        };
        assert_eq!(
            err.delivery_failure(),
            DeliveryFailure::RateLimited(Some(Duration::from_secs(7)))
        );

        let err = TelegramError::Api {
            code: 429,
            description: "Too Many Requests".into(),
            retry_after: None,
        };
        assert_eq!(err.delivery_failure(), DeliveryFailure::RateLimited(None));
    }

    #[test]
    fn test_other_classification() {
        let err = TelegramError::Api {
            code: 400,
            description: "Bad Request: chat not found".into(),
            retry_after: None,
        };
        assert_eq!(err.delivery_failure(), DeliveryFailure::Other);

        let err = TelegramError::Request("connection reset".into());
        assert_eq!(err.delivery_failure(), DeliveryFailure::Other);
    }
}
