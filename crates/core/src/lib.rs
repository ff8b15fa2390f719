//! Greengrocer Core - Shared domain types.
//!
//! This crate provides the domain model used across all Greengrocer
//! components:
//! - `bot` - The conversation engine (router, flows, persistence)
//! - `integration-tests` - End-to-end scenario tests
//!
//! # Architecture
//!
//! The core crate contains only types and their invariants - no I/O, no
//! persistence, no chat-network access. This keeps it lightweight and
//! allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, catalogue records, users and carts, orders,
//!   and phone-number parsing

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
