//! Inline-keyboard callback routing.
//!
//! Callback data follows the `prefix:arg` grammar produced by
//! [`super::menus`]. Unknown data is ignored so stale keyboards from old
//! bot versions cannot error at users.

use std::str::FromStr;

use chrono::Utc;
use tracing::debug;

use dokan_core::{ItemId, OrderId, Segment, UserId};

use super::menus;
use crate::error::{AppError, Result};
use crate::models::user::UserProfile;
use crate::services::sessions::AdminSession;
use crate::state::AppState;
use crate::telegram::types::{CallbackQuery, InlineKeyboardMarkup};

/// Handle one callback query.
pub async fn handle(state: &AppState, callback: CallbackQuery) -> Result<()> {
    let sender = UserId::new(callback.from.id);
    let Some(data) = callback.data.clone() else {
        return Ok(());
    };

    let profile = UserProfile {
        username: callback.from.username.clone(),
        first_name: callback.from.first_name.clone(),
        last_name: callback.from.last_name.clone(),
        language_code: callback.from.language_code.clone(),
    };
    state
        .db()
        .users()
        .upsert_seen(sender, &profile, Utc::now())
        .await?;

    let is_admin = state.config().is_admin(sender);

    // Maintenance gate: navigation stays available, actions do not.
    if !data.starts_with("nav:")
        && !is_admin
        && state.db().settings().maintenance_enabled().await?
    {
        state
            .telegram()
            .answer_callback_query(&callback.id, Some("The bot is under maintenance."), true)
            .await?;
        return Ok(());
    }

    let ctx = CallbackContext {
        state,
        sender,
        is_admin,
        callback: &callback,
    };

    match data.split(':').collect::<Vec<_>>().as_slice() {
        ["nav", target] => ctx.navigate(target).await,
        ["item", id] => ctx.select_item(id).await,
        ["pay", "card"] => ctx.payment_instructions().await,
        ["usr", "toggle_bcast"] => ctx.toggle_broadcast_opt_in().await,
        ["adm", rest @ ..] if ctx.is_admin => ctx.admin_action(rest).await,
        ["adm", ..] => ctx.deny().await,
        _ => {
            debug!(data = %data, "Unknown callback data ignored");
            Ok(())
        }
    }
}

struct CallbackContext<'a> {
    state: &'a AppState,
    sender: UserId,
    is_admin: bool,
    callback: &'a CallbackQuery,
}

impl CallbackContext<'_> {
    async fn ack(&self) -> Result<()> {
        self.state
            .telegram()
            .answer_callback_query(&self.callback.id, None, false)
            .await?;
        Ok(())
    }

    async fn alert(&self, text: &str) -> Result<()> {
        self.state
            .telegram()
            .answer_callback_query(&self.callback.id, Some(text), true)
            .await?;
        Ok(())
    }

    /// Replace the menu message when we know which message the button was
    /// on, otherwise send a fresh one.
    async fn show(&self, text: &str, keyboard: &InlineKeyboardMarkup) -> Result<()> {
        if let Some(message) = &self.callback.message {
            self.state
                .telegram()
                .edit_message_text(self.sender, message.message_id, text, Some(keyboard))
                .await?;
        } else {
            self.state
                .telegram()
                .send_message(self.sender, text, Some(keyboard))
                .await?;
        }
        Ok(())
    }

    async fn deny(&self) -> Result<()> {
        self.alert("You don't have access to this.").await
    }

    async fn navigate(&self, target: &str) -> Result<()> {
        self.ack().await?;
        match target {
            "home" => {
                self.show(
                    "Pick an option from the menu:",
                    &menus::main_menu(self.is_admin),
                )
                .await
            }
            "vpn" => {
                let items = self
                    .state
                    .db()
                    .catalog()
                    .list_active_items(dokan_core::Category::Vpn)
                    .await?;
                self.show("Buy VPN - pick a plan:", &menus::catalog_menu(&items))
                    .await
            }
            "apps" => {
                let items = self
                    .state
                    .db()
                    .catalog()
                    .list_active_items(dokan_core::Category::App)
                    .await?;
                self.show(
                    "App subscriptions - pick a plan:",
                    &menus::catalog_menu(&items),
                )
                .await
            }
            "support" => {
                self.show(
                    "Contact support - tap below to chat directly:",
                    &menus::contact_menu(&self.state.config().support_url()),
                )
                .await
            }
            "settings" => {
                let opted_in = self
                    .state
                    .db()
                    .users()
                    .get(self.sender)
                    .await?
                    .is_none_or(|u| u.allow_broadcast);
                self.show("Account settings:", &menus::settings_menu(opted_in))
                    .await
            }
            "admin" => {
                if self.is_admin {
                    self.show("Admin panel - pick an option:", &menus::admin_menu())
                        .await
                } else {
                    self.deny().await
                }
            }
            _ => Ok(()),
        }
    }

    async fn select_item(&self, raw_id: &str) -> Result<()> {
        let Ok(id) = raw_id.parse::<i64>() else {
            return Ok(());
        };

        let item = self
            .state
            .db()
            .catalog()
            .get_item(ItemId::new(id))
            .await?
            .filter(|item| item.active);
        let Some(item) = item else {
            return self.alert(AppError::ItemUnavailable.user_message()).await;
        };

        self.ack().await?;
        let order = self.state.orders().create_order(self.sender, &item).await?;
        self.show(
            &format!(
                "\"{}\" selected.\nOrder code: {}\n\nTo continue payment:",
                order.item_title, order.code
            ),
            &menus::payment_menu(),
        )
        .await
    }

    async fn payment_instructions(&self) -> Result<()> {
        self.ack().await?;
        self.state
            .telegram()
            .send_message(
                self.sender,
                &format!(
                    "Card number for payment:\n{}\n\n\
                     After paying, send the receipt screenshot here.\n\
                     Keep your order code from this chat at hand.",
                    self.state.config().card_number
                ),
                None,
            )
            .await?;
        Ok(())
    }

    async fn toggle_broadcast_opt_in(&self) -> Result<()> {
        let users = self.state.db().users();
        let opted_in = users
            .get(self.sender)
            .await?
            .is_none_or(|u| u.allow_broadcast);
        users.set_opt_in(self.sender, !opted_in).await?;

        self.state
            .telegram()
            .answer_callback_query(&self.callback.id, Some("Saved."), false)
            .await?;
        self.show("Account settings:", &menus::settings_menu(!opted_in))
            .await
    }

    async fn admin_action(&self, rest: &[&str]) -> Result<()> {
        match rest {
            ["users_count"] => {
                self.ack().await?;
                let now = Utc::now();
                let total = self.state.db().users().count().await?;
                let active = self.state.db().users().count_active(now).await?;
                self.state
                    .telegram()
                    .send_message(
                        self.sender,
                        &format!("Known users: {total}\nActive last 30 days: {active}"),
                        None,
                    )
                    .await?;
                Ok(())
            }
            ["maintenance"] => {
                self.ack().await?;
                let settings = self.state.db().settings();
                let enabled = !settings.maintenance_enabled().await?;
                settings.set_maintenance(enabled).await?;
                let status = if enabled { "enabled" } else { "disabled" };
                self.state
                    .telegram()
                    .send_message(self.sender, &format!("Maintenance mode {status}."), None)
                    .await?;
                Ok(())
            }
            ["broadcast"] => {
                self.ack().await?;
                self.state
                    .sessions()
                    .begin(self.sender, AdminSession::AwaitingBroadcastDraft);
                self.state
                    .telegram()
                    .send_message(
                        self.sender,
                        "Send the broadcast content (text/photo/video/document). \
                         You'll pick the segment next.",
                        None,
                    )
                    .await?;
                Ok(())
            }
            ["approve", raw_id] => self.decide(raw_id, true).await,
            ["reject", raw_id] => self.decide(raw_id, false).await,
            ["bcast_send", raw_segment] => self.send_broadcast(raw_segment).await,
            ["bcast_cancel"] => {
                self.ack().await?;
                self.state.sessions().cancel(self.sender);
                self.show("Broadcast cancelled.", &InlineKeyboardMarkup::default())
                    .await
            }
            _ => Ok(()),
        }
    }

    async fn decide(&self, raw_id: &str, approve: bool) -> Result<()> {
        let Ok(id) = raw_id.parse::<i64>() else {
            return Ok(());
        };
        let order_id = OrderId::new(id);

        let result = if approve {
            self.state.orders().approve(order_id, self.sender).await
        } else {
            self.state.orders().reject(order_id, self.sender).await
        };

        match result {
            Ok(order) => {
                self.ack().await?;
                let prompt = if approve {
                    format!(
                        "Order {} approved.\nSend the delivery message now; \
                         it will be forwarded to the buyer (text or file).",
                        order.code
                    )
                } else {
                    format!(
                        "Order {} rejected.\nSend the reason now; \
                         it will be shown to the buyer.",
                        order.code
                    )
                };
                self.state
                    .telegram()
                    .send_message(self.sender, &prompt, None)
                    .await?;
                Ok(())
            }
            Err(e @ (AppError::OrderNotFound(_) | AppError::InvalidTransition { .. })) => {
                self.alert(e.user_message()).await
            }
            Err(e) => Err(e),
        }
    }

    async fn send_broadcast(&self, raw_segment: &str) -> Result<()> {
        let Some(AdminSession::BroadcastReady { draft }) = self.state.sessions().get(self.sender)
        else {
            return self.alert("No draft pending.").await;
        };
        let Ok(segment) = Segment::from_str(raw_segment) else {
            return self.alert("Unknown segment.").await;
        };

        self.ack().await?;
        self.state.sessions().cancel(self.sender);

        let recipients = self
            .state
            .db()
            .users()
            .list_segment(segment, Utc::now())
            .await?;
        let outcome = self
            .state
            .broadcaster()
            .run(self.sender, &draft, segment, &recipients)
            .await?;

        self.show(
            &format!(
                "Broadcast finished.\nDelivered: {}\nFailed: {}",
                outcome.sent_ok, outcome.sent_fail
            ),
            &InlineKeyboardMarkup::default(),
        )
        .await
    }
}
