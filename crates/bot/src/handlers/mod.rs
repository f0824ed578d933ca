//! Inbound update routing.
//!
//! One update is handled at a time; [`dispatch`] is the error boundary that
//! turns any failure into a log entry (and Sentry event for server-side
//! classes) plus a short generic reply to the affected chat.

pub mod callbacks;
pub mod menus;
pub mod messages;

use tracing::error;

use dokan_core::UserId;

use crate::state::AppState;
use crate::telegram::types::Update;

/// Handle one update, absorbing all failures at this boundary.
pub async fn dispatch(state: &AppState, update: Update) {
    let reply_to = reply_target(&update);

    let result = if let Some(message) = update.message {
        messages::handle(state, message).await
    } else if let Some(callback) = update.callback_query {
        callbacks::handle(state, callback).await
    } else {
        Ok(())
    };

    if let Err(e) = result {
        if e.is_server_error() {
            sentry::capture_error(&e);
        }
        error!(error = %e, "Update handling failed");

        if let Some(chat) = reply_to {
            // Best effort; the channel may be the thing that's failing.
            let _ = state
                .telegram()
                .send_message(chat, e.user_message(), None)
                .await;
        }
    }
}

fn reply_target(update: &Update) -> Option<UserId> {
    update
        .message
        .as_ref()
        .and_then(|m| m.from.as_ref())
        .map(|u| UserId::new(u.id))
        .or_else(|| {
            update
                .callback_query
                .as_ref()
                .map(|c| UserId::new(c.from.id))
        })
}
