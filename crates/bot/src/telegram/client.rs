//! Telegram Bot API client.
//!
//! Thin typed wrapper over the HTTP API: every call posts a JSON payload,
//! unwraps the `ApiResponse` envelope, and converts `ok: false` into a
//! [`TelegramError::Api`] carrying the error code and any rate-limit hint.

use std::time::Duration;

use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use dokan_core::{OrderId, ProofKind, UserId};

use super::error::TelegramError;
use super::types::{ApiResponse, InlineKeyboardButton, InlineKeyboardMarkup, Message, Update};
use crate::models::draft::Draft;
use crate::models::order::Proof;

/// Default Bot API base URL.
const API_BASE: &str = "https://api.telegram.org";

/// Telegram Bot API client.
#[derive(Clone)]
pub struct TelegramClient {
    /// HTTP client.
    client: Client,
    /// Bot token for authentication (part of every request URL).
    token: SecretString,
    /// API base URL, overridable for tests.
    api_base: String,
}

impl std::fmt::Debug for TelegramClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramClient")
            .field("token", &"[REDACTED]")
            .field("api_base", &self.api_base)
            .finish_non_exhaustive()
    }
}

#[derive(Serialize)]
struct GetUpdatesPayload {
    offset: i64,
    timeout: u64,
    allowed_updates: &'static [&'static str],
}

#[derive(Serialize)]
struct SendMessagePayload<'a> {
    chat_id: i64,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_markup: Option<&'a InlineKeyboardMarkup>,
}

#[derive(Serialize)]
struct EditMessageTextPayload<'a> {
    chat_id: i64,
    message_id: i64,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_markup: Option<&'a InlineKeyboardMarkup>,
}

#[derive(Serialize)]
struct AnswerCallbackQueryPayload<'a> {
    callback_query_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<&'a str>,
    show_alert: bool,
}

#[derive(Serialize)]
struct CopyMessagePayload {
    chat_id: i64,
    from_chat_id: i64,
    message_id: i64,
}

#[derive(Serialize)]
struct SendFilePayload<'a> {
    chat_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    photo: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    document: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    caption: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_markup: Option<&'a InlineKeyboardMarkup>,
}

impl TelegramClient {
    /// Create a new client.
    ///
    /// `api_base` overrides the production endpoint; tests point it at a
    /// local stub.
    #[must_use]
    pub fn new(token: SecretString, api_base: Option<String>) -> Self {
        Self {
            client: Client::new(),
            token,
            api_base: api_base.unwrap_or_else(|| API_BASE.to_owned()),
        }
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        payload: &impl Serialize,
    ) -> Result<T, TelegramError> {
        let url = format!(
            "{}/bot{}/{method}",
            self.api_base,
            self.token.expose_secret()
        );

        let response = self
            .client
            .post(url)
            .json(payload)
            .send()
            .await
            .map_err(|e| TelegramError::Request(e.to_string()))?;

        let result: ApiResponse<T> = response
            .json()
            .await
            .map_err(|e| TelegramError::Response(e.to_string()))?;

        if !result.ok {
            return Err(TelegramError::Api {
                code: result.error_code.unwrap_or_default(),
                description: result
                    .description
                    .unwrap_or_else(|| "unknown error".to_owned()),
                retry_after: result
                    .parameters
                    .and_then(|p| p.retry_after)
                    .map(Duration::from_secs),
            });
        }

        result
            .result
            .ok_or_else(|| TelegramError::Response("missing result payload".to_owned()))
    }

    /// Long-poll for the next batch of updates.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the API reports one.
    pub async fn get_updates(
        &self,
        offset: i64,
        timeout: Duration,
    ) -> Result<Vec<Update>, TelegramError> {
        self.call(
            "getUpdates",
            &GetUpdatesPayload {
                offset,
                timeout: timeout.as_secs(),
                allowed_updates: &["message", "callback_query"],
            },
        )
        .await
    }

    /// Send plain text, optionally with an inline keyboard.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the API reports one.
    #[instrument(skip(self, text, keyboard), fields(chat = %chat))]
    pub async fn send_message(
        &self,
        chat: UserId,
        text: &str,
        keyboard: Option<&InlineKeyboardMarkup>,
    ) -> Result<Message, TelegramError> {
        let message = self
            .call(
                "sendMessage",
                &SendMessagePayload {
                    chat_id: chat.as_i64(),
                    text,
                    reply_markup: keyboard,
                },
            )
            .await?;
        debug!("Message sent");
        Ok(message)
    }

    /// Replace the text (and keyboard) of a previously sent message.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the API reports one.
    #[instrument(skip(self, text, keyboard), fields(chat = %chat, message_id))]
    pub async fn edit_message_text(
        &self,
        chat: UserId,
        message_id: i64,
        text: &str,
        keyboard: Option<&InlineKeyboardMarkup>,
    ) -> Result<Message, TelegramError> {
        self.call(
            "editMessageText",
            &EditMessageTextPayload {
                chat_id: chat.as_i64(),
                message_id,
                text,
                reply_markup: keyboard,
            },
        )
        .await
    }

    /// Acknowledge a callback query, optionally with a toast or alert.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the API reports one.
    pub async fn answer_callback_query(
        &self,
        callback_id: &str,
        text: Option<&str>,
        show_alert: bool,
    ) -> Result<(), TelegramError> {
        // The result payload is a bare `true`; discard it.
        let _: serde_json::Value = self
            .call(
                "answerCallbackQuery",
                &AnswerCallbackQueryPayload {
                    callback_query_id: callback_id,
                    text,
                    show_alert,
                },
            )
            .await?;
        Ok(())
    }

    async fn send_file(
        &self,
        chat: UserId,
        proof: &Proof,
        caption: &str,
        keyboard: Option<&InlineKeyboardMarkup>,
    ) -> Result<Message, TelegramError> {
        let (method, photo, document) = match proof.kind {
            ProofKind::Photo => ("sendPhoto", Some(proof.file_id.as_str()), None),
            ProofKind::Document => ("sendDocument", None, Some(proof.file_id.as_str())),
        };
        self.call(
            method,
            &SendFilePayload {
                chat_id: chat.as_i64(),
                photo,
                document,
                caption: Some(caption),
                reply_markup: keyboard,
            },
        )
        .await
    }
}

/// Approve/reject controls attached to a forwarded payment proof.
fn approve_reject_controls(order_id: OrderId) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::default().row_of(vec![
        InlineKeyboardButton::callback("Approve", format!("adm:approve:{order_id}")),
        InlineKeyboardButton::callback("Reject", format!("adm:reject:{order_id}")),
    ])
}

impl super::Channel for TelegramClient {
    async fn send_text(&self, to: UserId, text: &str) -> Result<(), TelegramError> {
        self.send_message(to, text, None).await?;
        Ok(())
    }

    async fn send_proof(
        &self,
        to: UserId,
        proof: &Proof,
        caption: &str,
        order_id: OrderId,
    ) -> Result<(), TelegramError> {
        let controls = approve_reject_controls(order_id);
        self.send_file(to, proof, caption, Some(&controls)).await?;
        Ok(())
    }

    async fn copy_draft(&self, to: UserId, draft: &Draft) -> Result<(), TelegramError> {
        let _: serde_json::Value = self
            .call(
                "copyMessage",
                &CopyMessagePayload {
                    chat_id: to.as_i64(),
                    from_chat_id: draft.from_chat.as_i64(),
                    message_id: draft.message_id,
                },
            )
            .await?;
        Ok(())
    }
}
