//! Business logic services.
//!
//! # Services
//!
//! - `orders` - the order lifecycle engine and its notification side effects
//! - `sessions` - per-admin interaction tracker for multi-step actions
//! - `broadcast` - sequential paced delivery of a draft to a segment

pub mod broadcast;
pub mod orders;
pub mod sessions;

pub use broadcast::{BroadcastOutcome, BroadcastPolicy, Broadcaster, Sleeper, TokioSleeper};
pub use orders::{OrderService, ProofOutcome};
pub use sessions::{AdminSession, AdminSessions};
