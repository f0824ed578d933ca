//! User domain types.

use chrono::{DateTime, Utc};

use dokan_core::UserId;

/// A known user of the shop (domain type).
///
/// Created on first interaction and never deleted; `last_seen_at` is
/// refreshed on every inbound event.
#[derive(Debug, Clone)]
pub struct User {
    /// Messaging-platform user id (also the private chat id).
    pub id: UserId,
    /// Platform handle, if the user has one.
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub language_code: Option<String>,
    /// Whether the user receives broadcasts. Revoked automatically when a
    /// broadcast delivery reports the user blocked the bot.
    pub allow_broadcast: bool,
    /// Set when a delivery attempt reports the user blocked the bot or
    /// deactivated their account.
    pub blocked: bool,
    pub created_at: DateTime<Utc>,
    pub last_seen_at: DateTime<Utc>,
}

impl User {
    /// Display tag for admin-facing messages, e.g. `Ada Lovelace (@ada)`.
    #[must_use]
    pub fn tag(&self) -> String {
        let name = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" ");
        let handle = self
            .username
            .as_ref()
            .map_or_else(|| format!("id:{}", self.id), |u| format!("@{u}"));
        if name.is_empty() {
            handle
        } else {
            format!("{name} ({handle})")
        }
    }
}

/// Profile fields refreshed from the messaging platform on every event.
#[derive(Debug, Clone, Default)]
pub struct UserProfile {
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub language_code: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(first: Option<&str>, last: Option<&str>, username: Option<&str>) -> User {
        User {
            id: UserId::new(7),
            username: username.map(String::from),
            first_name: first.map(String::from),
            last_name: last.map(String::from),
            language_code: None,
            allow_broadcast: true,
            blocked: false,
            created_at: Utc::now(),
            last_seen_at: Utc::now(),
        }
    }

    #[test]
    fn test_tag_with_name_and_handle() {
        let user = sample(Some("Ada"), Some("Lovelace"), Some("ada"));
        assert_eq!(user.tag(), "Ada Lovelace (@ada)");
    }

    #[test]
    fn test_tag_without_name_falls_back_to_handle() {
        let user = sample(None, None, Some("ada"));
        assert_eq!(user.tag(), "@ada");
    }

    #[test]
    fn test_tag_without_anything_uses_id() {
        let user = sample(None, None, None);
        assert_eq!(user.tag(), "id:7");
    }
}
