//! Integer toman price type.
//!
//! All catalog prices are whole toman amounts; there is no fractional unit
//! anywhere in the shop, so this is an `i64` newtype rather than a decimal.

use serde::{Deserialize, Serialize};

/// A price in whole toman.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct Toman(i64);

impl Toman {
    /// Create a price from a whole toman amount.
    #[must_use]
    pub const fn new(amount: i64) -> Self {
        Self(amount)
    }

    /// Get the underlying amount.
    #[must_use]
    pub const fn amount(&self) -> i64 {
        self.0
    }
}

impl From<i64> for Toman {
    fn from(amount: i64) -> Self {
        Self(amount)
    }
}

impl From<Toman> for i64 {
    fn from(price: Toman) -> Self {
        price.0
    }
}

/// Formats with thousands grouping, e.g. `129,000 toman`.
impl std::fmt::Display for Toman {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let digits = self.0.unsigned_abs().to_string();
        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, c) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(c);
        }
        if self.0 < 0 {
            write!(f, "-{grouped} toman")
        } else {
            write!(f, "{grouped} toman")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_grouping() {
        assert_eq!(Toman::new(0).to_string(), "0 toman");
        assert_eq!(Toman::new(950).to_string(), "950 toman");
        assert_eq!(Toman::new(129_000).to_string(), "129,000 toman");
        assert_eq!(Toman::new(1_200_000).to_string(), "1,200,000 toman");
    }

    #[test]
    fn test_conversions() {
        assert_eq!(Toman::from(585_000).amount(), 585_000);
        assert_eq!(i64::from(Toman::new(42)), 42);
    }
}
