//! Screen handlers, grouped by flow.
//!
//! Each module adds an `impl` block to [`crate::engine::Bot`]; the router
//! in `engine.rs` decides which handler runs for which event.

mod admin;
mod cart;
mod catalog;
mod orders;
mod start;
