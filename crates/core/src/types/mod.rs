//! Core types for uShop.
//!
//! This module provides type-safe wrappers for marketplace concepts.

pub mod email;
pub mod id;
pub mod price;
pub mod role;
pub mod score;
pub mod status;

pub use email::{Email, EmailError};
pub use id::*;
pub use price::{MAX_PRICE, PriceRange, PriceRangeError};
pub use role::Role;
pub use score::{Score, ScoreError};
pub use status::*;
