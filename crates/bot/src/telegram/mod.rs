//! Messaging-channel adapter for the Telegram Bot API.
//!
//! # Modules
//!
//! - `client` - reqwest-based Bot API client (long polling + outbound calls)
//! - `error` - error types and per-recipient failure classification
//! - `types` - wire types for updates, messages, and keyboards

pub mod client;
pub mod error;
pub mod types;

pub use client::TelegramClient;
pub use error::{DeliveryFailure, TelegramError};

use dokan_core::{OrderId, UserId};

use crate::models::draft::Draft;
use crate::models::order::Proof;

/// Outbound side effects the core engines need from the messaging channel.
///
/// [`TelegramClient`] is the production implementation; tests substitute a
/// recording fake so engine behavior is observable without a network.
#[allow(async_fn_in_trait)]
pub trait Channel {
    /// Send plain text to a chat.
    async fn send_text(&self, to: UserId, text: &str) -> Result<(), TelegramError>;

    /// Forward a payment proof to an admin with approve/reject controls.
    async fn send_proof(
        &self,
        to: UserId,
        proof: &Proof,
        caption: &str,
        order_id: OrderId,
    ) -> Result<(), TelegramError>;

    /// Copy a previously-sent message to another chat (the broadcast and
    /// delivery primitive).
    async fn copy_draft(&self, to: UserId, draft: &Draft) -> Result<(), TelegramError>;
}
