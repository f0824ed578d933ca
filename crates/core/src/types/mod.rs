//! Core types for Dokan.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod id;
pub mod order_code;
pub mod price;
pub mod status;

pub use id::*;
pub use order_code::OrderCode;
pub use price::Toman;
pub use status::*;
