//! Conversation engine for the greengrocer storefront bot.
//!
//! The crate is transport-agnostic: a deployment wires a [`ChatTransport`]
//! implementation and a data directory, then feeds [`Event`]s into
//! [`Bot::handle_event`] from its own event loop. Everything else — the
//! per-conversation state machine, the JSON persistence, the admin
//! tooling — lives here.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod analytics;
pub mod callback;
pub mod config;
mod engine;
pub mod error;
mod flows;
pub mod format;
pub mod keyboards;
pub mod orders_view;
pub mod session;
pub mod store;
pub mod testing;
pub mod transport;

pub use callback::CallbackData;
pub use config::BotConfig;
pub use engine::Bot;
pub use error::{BotError, Result};
pub use session::{BotState, SessionKey};
pub use store::{JsonStore, StoreError};
pub use transport::{Button, ChatTransport, Event, Keyboard, MessageRef, TransportError};
