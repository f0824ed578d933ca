//! Domain models for the bot.
//!
//! These types represent validated domain objects separate from database row
//! types; the `db` repositories convert between the two.

pub mod catalog;
pub mod draft;
pub mod order;
pub mod user;

pub use catalog::CatalogItem;
pub use draft::Draft;
pub use order::{Order, Proof};
pub use user::{User, UserProfile};
