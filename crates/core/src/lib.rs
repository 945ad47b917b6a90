//! uShop Core - Shared domain types.
//!
//! This crate provides the types used across all uShop components:
//! - `api` - JSON API in front of Supabase and the LLM gateway
//! - `cli` - Operator tooling for vendor moderation
//!
//! # Architecture
//!
//! The core crate contains only types and validation - no I/O, no HTTP
//! clients. Row shapes that mirror Supabase tables live in the `api` crate.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, roles, statuses, price ranges, rating scores and emails

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
