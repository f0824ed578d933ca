//! Status and category enums for orders, proofs, and broadcast segments.

use serde::{Deserialize, Serialize};

/// Lifecycle status of an order.
///
/// The happy path is `AwaitingPayment -> ProofSubmitted -> Approved ->
/// Delivered`; `Rejected` and `Cancelled` are alternate terminal branches.
/// Terminal states accept no further transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    AwaitingPayment,
    ProofSubmitted,
    Approved,
    Delivered,
    Rejected,
    Cancelled,
}

impl OrderStatus {
    /// Whether no further transition is accepted from this state.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Delivered | Self::Rejected | Self::Cancelled)
    }

    /// Whether an admin decision (approve or reject) is accepted from this
    /// state. `AwaitingPayment` is deliberately included: admins may decide
    /// from partial context before a proof arrives.
    #[must_use]
    pub const fn accepts_decision(&self) -> bool {
        matches!(self, Self::ProofSubmitted | Self::AwaitingPayment)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::AwaitingPayment => "awaiting_payment",
            Self::ProofSubmitted => "proof_submitted",
            Self::Approved => "approved",
            Self::Delivered => "delivered",
            Self::Rejected => "rejected",
            Self::Cancelled => "cancelled",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "awaiting_payment" => Ok(Self::AwaitingPayment),
            "proof_submitted" => Ok(Self::ProofSubmitted),
            "approved" => Ok(Self::Approved),
            "delivered" => Ok(Self::Delivered),
            "rejected" => Ok(Self::Rejected),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(format!("invalid order status: {s}")),
        }
    }
}

/// Catalog category an order belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Vpn,
    App,
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Vpn => write!(f, "vpn"),
            Self::App => write!(f, "app"),
        }
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "vpn" => Ok(Self::Vpn),
            "app" => Ok(Self::App),
            _ => Err(format!("invalid category: {s}")),
        }
    }
}

/// Content kind of a payment proof.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProofKind {
    Photo,
    Document,
}

impl std::fmt::Display for ProofKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Photo => write!(f, "photo"),
            Self::Document => write!(f, "document"),
        }
    }
}

impl std::str::FromStr for ProofKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "photo" => Ok(Self::Photo),
            "document" => Ok(Self::Document),
            _ => Err(format!("invalid proof kind: {s}")),
        }
    }
}

/// Named recipient-selection rule for broadcasts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Segment {
    /// Every user with broadcast opt-in.
    All,
    /// Opted-in users seen within the last 30 days.
    Active30,
}

impl Segment {
    /// Recency window for [`Segment::Active30`], in days.
    pub const ACTIVE_WINDOW_DAYS: i64 = 30;
}

impl std::fmt::Display for Segment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::All => write!(f, "all"),
            Self::Active30 => write!(f, "active30"),
        }
    }
}

impl std::str::FromStr for Segment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(Self::All),
            "active30" => Ok(Self::Active30),
            _ => Err(format!("invalid segment: {s}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_status_round_trip() {
        for status in [
            OrderStatus::AwaitingPayment,
            OrderStatus::ProofSubmitted,
            OrderStatus::Approved,
            OrderStatus::Delivered,
            OrderStatus::Rejected,
            OrderStatus::Cancelled,
        ] {
            assert_eq!(OrderStatus::from_str(&status.to_string()), Ok(status));
        }
        assert!(OrderStatus::from_str("shipped").is_err());
    }

    #[test]
    fn test_terminal_states() {
        assert!(OrderStatus::Delivered.is_terminal());
        assert!(OrderStatus::Rejected.is_terminal());
        assert!(OrderStatus::Cancelled.is_terminal());
        assert!(!OrderStatus::AwaitingPayment.is_terminal());
        assert!(!OrderStatus::ProofSubmitted.is_terminal());
        assert!(!OrderStatus::Approved.is_terminal());
    }

    #[test]
    fn test_decision_states() {
        assert!(OrderStatus::ProofSubmitted.accepts_decision());
        assert!(OrderStatus::AwaitingPayment.accepts_decision());
        assert!(!OrderStatus::Approved.accepts_decision());
        assert!(!OrderStatus::Delivered.accepts_decision());
    }

    #[test]
    fn test_segment_round_trip() {
        assert_eq!(Segment::from_str("all"), Ok(Segment::All));
        assert_eq!(Segment::from_str("active30"), Ok(Segment::Active30));
        assert!(Segment::from_str("active90").is_err());
    }
}
