//! Inbound message routing.
//!
//! Order of precedence: commands, then admin session routing, then payment
//! proofs. Free-form messages that match none of these are ignored; in
//! particular, admins without an active session can chat with the bot
//! without triggering workflow side effects.

use chrono::Utc;
use tracing::debug;

use dokan_core::{ProofKind, UserId};

use super::menus;
use crate::error::{AppError, Result};
use crate::models::draft::Draft;
use crate::models::order::Proof;
use crate::models::user::{User, UserProfile};
use crate::services::orders::ProofOutcome;
use crate::services::sessions::AdminSession;
use crate::state::AppState;
use crate::telegram::types::Message;

/// Handle one inbound message.
pub async fn handle(state: &AppState, message: Message) -> Result<()> {
    let Some(from) = message.from.clone() else {
        return Ok(());
    };
    let sender = UserId::new(from.id);

    let profile = UserProfile {
        username: from.username,
        first_name: from.first_name,
        last_name: from.last_name,
        language_code: from.language_code,
    };
    let user = state
        .db()
        .users()
        .upsert_seen(sender, &profile, Utc::now())
        .await?;

    if let Some(text) = message.text.as_deref() {
        if text.starts_with("/start") {
            return handle_start(state, sender).await;
        }
        if text.starts_with("/id") {
            state
                .telegram()
                .send_message(sender, &format!("Your ID: {sender}"), None)
                .await?;
            return Ok(());
        }
    }

    if state.config().is_admin(sender)
        && let Some(session) = state.sessions().get(sender)
    {
        return handle_admin_session(state, sender, session, &message).await;
    }

    if let Some(proof) = extract_proof(&message) {
        return handle_proof(state, &user, proof).await;
    }

    debug!(user = %sender, "Unroutable message ignored");
    Ok(())
}

async fn handle_start(state: &AppState, sender: UserId) -> Result<()> {
    let is_admin = state.config().is_admin(sender);
    if !is_admin && state.db().settings().maintenance_enabled().await? {
        state
            .telegram()
            .send_message(
                sender,
                "The bot is under maintenance. Please try again later.",
                Some(&menus::contact_menu(&state.config().support_url())),
            )
            .await?;
        return Ok(());
    }

    state
        .telegram()
        .send_message(
            sender,
            "Hello! Pick an option from the menu:",
            Some(&menus::main_menu(is_admin)),
        )
        .await?;
    Ok(())
}

/// Route one free-form admin message into the session that awaits it.
///
/// Await-style sessions are consumed (single-shot) before acting;
/// `BroadcastReady` awaits a segment button, not a message, so it stays put
/// and the message is ignored.
async fn handle_admin_session(
    state: &AppState,
    admin: UserId,
    session: AdminSession,
    message: &Message,
) -> Result<()> {
    if matches!(session, AdminSession::BroadcastReady { .. }) {
        return Ok(());
    }
    let Some(session) = state.sessions().take(admin) else {
        return Ok(());
    };

    match session {
        AdminSession::AwaitingBroadcastDraft => {
            let draft = Draft {
                from_chat: UserId::new(message.chat.id),
                message_id: message.message_id,
            };
            state
                .sessions()
                .begin(admin, AdminSession::BroadcastReady { draft });
            state
                .telegram()
                .send_message(
                    admin,
                    "Draft saved. Pick the segment to send to:",
                    Some(&menus::segment_menu()),
                )
                .await?;
        }
        AdminSession::AwaitingDelivery { order_id } => {
            let delivery = Draft {
                from_chat: UserId::new(message.chat.id),
                message_id: message.message_id,
            };
            match state.orders().finalize_delivery(order_id, admin, &delivery).await {
                Ok(order) => {
                    state
                        .telegram()
                        .send_message(
                            admin,
                            &format!("Delivery sent to the buyer of order {}.", order.code),
                            None,
                        )
                        .await?;
                }
                Err(e @ (AppError::OrderNotFound(_) | AppError::InvalidTransition { .. })) => {
                    state
                        .telegram()
                        .send_message(admin, e.user_message(), None)
                        .await?;
                }
                Err(e) => return Err(e),
            }
        }
        AdminSession::AwaitingRejectReason { order_id } => {
            let reason = message
                .text
                .as_deref()
                .unwrap_or("(no written explanation)");
            match state.orders().record_rejection_reason(order_id, reason).await {
                Ok(_) => {
                    state
                        .telegram()
                        .send_message(admin, "Reason sent to the buyer.", None)
                        .await?;
                }
                Err(e @ (AppError::OrderNotFound(_) | AppError::InvalidTransition { .. })) => {
                    state
                        .telegram()
                        .send_message(admin, e.user_message(), None)
                        .await?;
                }
                Err(e) => return Err(e),
            }
        }
        AdminSession::BroadcastReady { .. } => {}
    }

    Ok(())
}

async fn handle_proof(state: &AppState, user: &User, proof: Proof) -> Result<()> {
    if !state.config().is_admin(user.id) && state.db().settings().maintenance_enabled().await? {
        state
            .telegram()
            .send_message(
                user.id,
                "The bot is under maintenance. Please try again later.",
                None,
            )
            .await?;
        return Ok(());
    }

    match state.orders().attach_proof(user, proof).await? {
        ProofOutcome::Attached(_) => {
            state
                .telegram()
                .send_message(
                    user.id,
                    "Payment proof received. Support will review it shortly.",
                    None,
                )
                .await?;
        }
        // Unsolicited uploads are ignored, not answered.
        ProofOutcome::NoOpenOrder => {}
    }
    Ok(())
}

fn extract_proof(message: &Message) -> Option<Proof> {
    if let Some(file_id) = message.photo_file_id() {
        return Some(Proof {
            file_id: file_id.to_owned(),
            kind: ProofKind::Photo,
        });
    }
    message.document.as_ref().map(|doc| Proof {
        file_id: doc.file_id.clone(),
        kind: ProofKind::Document,
    })
}
