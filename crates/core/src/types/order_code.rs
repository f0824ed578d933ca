//! Human-shareable order codes.
//!
//! An order code is the identifier users and admins quote in conversation,
//! distinct from the internal order id. Format: `ORD-YYYYMMDD-XXXX` where
//! `XXXX` is a random uppercase alphanumeric suffix. Collisions are unlikely
//! but not impossible; the order engine retries generation when the unique
//! constraint rejects an insert.

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

const SUFFIX_LEN: usize = 4;
const SUFFIX_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// A human-shareable order code, e.g. `ORD-20250923-AB12`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderCode(String);

impl OrderCode {
    /// Generate a fresh code for the given creation instant.
    ///
    /// The rng is injected so callers (and tests) control determinism.
    pub fn generate<R: Rng + ?Sized>(now: DateTime<Utc>, rng: &mut R) -> Self {
        let suffix: String = (0..SUFFIX_LEN)
            .map(|_| {
                let idx = rng.random_range(0..SUFFIX_CHARSET.len());
                SUFFIX_CHARSET[idx] as char
            })
            .collect();
        Self(format!("ORD-{}-{suffix}", now.format("%Y%m%d")))
    }

    /// Wrap a stored code without validation.
    ///
    /// Used when loading codes back from the database, which is the only
    /// writer and only ever stores generated codes.
    #[must_use]
    pub fn from_stored(code: String) -> Self {
        Self(code)
    }

    /// Get the code as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for OrderCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<OrderCode> for String {
    fn from(code: OrderCode) -> Self {
        code.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_generate_format() {
        let now = Utc.with_ymd_and_hms(2025, 9, 23, 12, 0, 0).unwrap();
        let code = OrderCode::generate(now, &mut rand::rng());
        let s = code.as_str();
        assert_eq!(s.len(), "ORD-20250923-XXXX".len());
        assert!(s.starts_with("ORD-20250923-"));
        assert!(
            s["ORD-20250923-".len()..]
                .bytes()
                .all(|b| SUFFIX_CHARSET.contains(&b))
        );
    }

    #[test]
    fn test_generate_varies() {
        let now = Utc.with_ymd_and_hms(2025, 9, 23, 12, 0, 0).unwrap();
        let mut rng = rand::rng();
        let codes: std::collections::HashSet<_> = (0..64)
            .map(|_| OrderCode::generate(now, &mut rng).to_string())
            .collect();
        // 36^4 possible suffixes; 64 draws colliding entirely is implausible.
        assert!(codes.len() > 1);
    }
}
