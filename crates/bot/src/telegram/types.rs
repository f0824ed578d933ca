//! Bot API wire types.
//!
//! Only the fields this bot reads are modeled; everything else in the
//! platform payloads is ignored by serde.

use serde::{Deserialize, Serialize};

/// Envelope every Bot API response arrives in.
#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    pub description: Option<String>,
    pub error_code: Option<i64>,
    pub parameters: Option<ResponseParameters>,
}

/// Extra failure detail, notably the rate-limit retry hint.
#[derive(Debug, Deserialize)]
pub struct ResponseParameters {
    pub retry_after: Option<u64>,
}

/// An inbound event from long polling.
#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
    pub callback_query: Option<CallbackQuery>,
}

/// A message in a chat.
#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub from: Option<TgUser>,
    pub chat: Chat,
    pub text: Option<String>,
    pub photo: Option<Vec<PhotoSize>>,
    pub document: Option<Document>,
}

impl Message {
    /// Largest photo size's file id, if this message carries a photo.
    #[must_use]
    pub fn photo_file_id(&self) -> Option<&str> {
        self.photo
            .as_ref()
            .and_then(|sizes| sizes.last())
            .map(|p| p.file_id.as_str())
    }
}

/// The sender of a message or callback.
#[derive(Debug, Clone, Deserialize)]
pub struct TgUser {
    pub id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub language_code: Option<String>,
}

/// A chat (we only ever see private chats).
#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

/// One resolution of a photo.
#[derive(Debug, Clone, Deserialize)]
pub struct PhotoSize {
    pub file_id: String,
}

/// An attached document.
#[derive(Debug, Clone, Deserialize)]
pub struct Document {
    pub file_id: String,
}

/// An inline-keyboard button press.
#[derive(Debug, Clone, Deserialize)]
pub struct CallbackQuery {
    pub id: String,
    pub from: TgUser,
    pub message: Option<Message>,
    pub data: Option<String>,
}

/// Inline keyboard attached to an outbound message.
#[derive(Debug, Clone, Serialize, Default)]
pub struct InlineKeyboardMarkup {
    pub inline_keyboard: Vec<Vec<InlineKeyboardButton>>,
}

impl InlineKeyboardMarkup {
    /// Add a full-width row with a single button.
    #[must_use]
    pub fn row(mut self, button: InlineKeyboardButton) -> Self {
        self.inline_keyboard.push(vec![button]);
        self
    }

    /// Add a row of several buttons.
    #[must_use]
    pub fn row_of(mut self, buttons: Vec<InlineKeyboardButton>) -> Self {
        self.inline_keyboard.push(buttons);
        self
    }
}

/// A single inline-keyboard button.
#[derive(Debug, Clone, Serialize)]
pub struct InlineKeyboardButton {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callback_data: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl InlineKeyboardButton {
    /// A button that fires a callback query.
    #[must_use]
    pub fn callback(text: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            callback_data: Some(data.into()),
            url: None,
        }
    }

    /// A button that opens a URL.
    #[must_use]
    pub fn link(text: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            callback_data: None,
            url: Some(url.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rate_limited_response() {
        let body = r#"{
            "ok": false,
            "error_code": 429,
            "description": "Too Many Requests: retry after 14",
            "parameters": {"retry_after": 14}
        }"#;
        let resp: ApiResponse<serde_json::Value> = serde_json::from_str(body).unwrap();
        assert!(!resp.ok);
        assert_eq!(resp.error_code, Some(429));
        assert_eq!(resp.parameters.and_then(|p| p.retry_after), Some(14));
    }

    #[test]
    fn test_parse_update_with_photo() {
        let body = r#"{
            "update_id": 10,
            "message": {
                "message_id": 44,
                "from": {"id": 7, "first_name": "Ada", "username": "ada"},
                "chat": {"id": 7, "type": "private"},
                "photo": [
                    {"file_id": "small", "width": 90, "height": 90},
                    {"file_id": "large", "width": 800, "height": 800}
                ]
            }
        }"#;
        let update: Update = serde_json::from_str(body).unwrap();
        let message = update.message.unwrap();
        assert_eq!(message.photo_file_id(), Some("large"));
        assert!(message.document.is_none());
    }

    #[test]
    fn test_keyboard_serialization_skips_empty_fields() {
        let kb = InlineKeyboardMarkup::default()
            .row(InlineKeyboardButton::callback("Approve", "adm:approve:3"));
        let json = serde_json::to_string(&kb).unwrap();
        assert!(json.contains("adm:approve:3"));
        assert!(!json.contains("url"));
    }
}
