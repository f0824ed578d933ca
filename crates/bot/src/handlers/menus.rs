//! Inline keyboard builders.
//!
//! Callback data uses a `prefix:arg` grammar parsed back in
//! [`super::callbacks`]. Layout and wording are incidental; the grammar is
//! the contract.

use crate::models::catalog::CatalogItem;
use crate::telegram::types::{InlineKeyboardButton, InlineKeyboardMarkup};

fn back_to_main() -> InlineKeyboardButton {
    InlineKeyboardButton::callback("Back", "nav:home")
}

/// Main menu shown on /start.
pub fn main_menu(is_admin: bool) -> InlineKeyboardMarkup {
    let mut kb = InlineKeyboardMarkup::default()
        .row(InlineKeyboardButton::callback("Buy VPN", "nav:vpn"))
        .row(InlineKeyboardButton::callback("App subscriptions", "nav:apps"))
        .row(InlineKeyboardButton::callback("Settings", "nav:settings"))
        .row(InlineKeyboardButton::callback("Support", "nav:support"));
    if is_admin {
        kb = kb.row(InlineKeyboardButton::callback("Admin panel", "nav:admin"));
    }
    kb
}

/// One button per active catalog item.
pub fn catalog_menu(items: &[CatalogItem]) -> InlineKeyboardMarkup {
    let mut kb = InlineKeyboardMarkup::default();
    for item in items {
        kb = kb.row(InlineKeyboardButton::callback(
            item.label(),
            format!("item:{}", item.id),
        ));
    }
    kb.row(back_to_main())
}

/// Payment options for a freshly created order.
pub fn payment_menu() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::default()
        .row(InlineKeyboardButton::callback("Pay by card", "pay:card"))
        .row(back_to_main())
}

/// Deep link to the support chat.
pub fn contact_menu(support_url: &str) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::default()
        .row(InlineKeyboardButton::link("Chat with support", support_url))
        .row(back_to_main())
}

/// Per-user settings (broadcast opt-in toggle).
pub fn settings_menu(opted_in: bool) -> InlineKeyboardMarkup {
    let label = if opted_in {
        "Broadcasts: on"
    } else {
        "Broadcasts: off"
    };
    InlineKeyboardMarkup::default()
        .row(InlineKeyboardButton::callback(label, "usr:toggle_bcast"))
        .row(back_to_main())
}

/// Admin panel.
pub fn admin_menu() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::default()
        .row_of(vec![
            InlineKeyboardButton::callback("Broadcast", "adm:broadcast"),
            InlineKeyboardButton::callback("User counts", "adm:users_count"),
        ])
        .row(InlineKeyboardButton::callback(
            "Toggle maintenance",
            "adm:maintenance",
        ))
        .row(back_to_main())
}

/// Segment picker shown once a broadcast draft is captured.
pub fn segment_menu() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::default()
        .row_of(vec![
            InlineKeyboardButton::callback("Send to everyone", "adm:bcast_send:all"),
            InlineKeyboardButton::callback("Active last 30 days", "adm:bcast_send:active30"),
        ])
        .row(InlineKeyboardButton::callback("Cancel", "adm:bcast_cancel"))
}
