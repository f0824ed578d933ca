//! Draft message references.

use dokan_core::UserId;

/// Reference to an admin-submitted message of any content kind, held for
/// later duplication: to broadcast recipients, or to a buyer as delivery
/// content. The platform copies by reference, so the bot never stores the
/// content itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Draft {
    /// Chat the source message lives in.
    pub from_chat: UserId,
    /// Message id within that chat.
    pub message_id: i64,
}
