//! Crate-wide error type.

use crate::config::ConfigError;
use crate::store::StoreError;
use crate::transport::TransportError;

/// Top-level error for the engine.
///
/// Flow handlers recover from expected conditions (bad input, missing
/// entities) by re-rendering a screen; only infrastructure failures
/// propagate out of [`crate::engine::Bot::handle_event`].
#[derive(thiserror::Error, Debug)]
pub enum BotError {
    /// Persistence failure.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// Chat delivery failure.
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// Startup configuration failure.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, BotError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_passes_through() {
        let err = BotError::from(TransportError::ContentUnchanged);
        assert_eq!(err.to_string(), "message content unchanged");
        let err = BotError::from(StoreError::EmptyCart);
        assert_eq!(err.to_string(), "cart is empty");
    }
}
