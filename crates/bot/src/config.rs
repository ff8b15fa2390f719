//! Bot configuration loaded from environment variables.
//!
//! All settings come from the environment (optionally via a `.env` file
//! loaded with `dotenvy`). Configuration is read once at startup; there is
//! no hot reload.

use std::env;
use std::path::PathBuf;

use greengrocer_core::{ChatId, UserId};

/// Errors that can occur when loading configuration.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// A required environment variable is not set.
    #[error("missing required environment variable: {0}")]
    Missing(String),
    /// An environment variable is set but cannot be parsed.
    #[error("invalid value for {name}: {reason}")]
    Invalid {
        /// Variable name.
        name: String,
        /// Why the value was rejected.
        reason: String,
    },
}

/// Runtime configuration for the bot.
#[derive(Debug, Clone)]
pub struct BotConfig {
    /// User ID granted admin access regardless of the persisted flag.
    pub admin_user_id: UserId,
    /// Chat that receives new-order notifications.
    pub admin_chat_id: ChatId,
    /// Directory holding the JSON data files.
    pub data_dir: PathBuf,
    /// Directory that timestamped backups are written under.
    pub backup_dir: PathBuf,
}

impl BotConfig {
    /// Load configuration from the environment.
    ///
    /// Reads a `.env` file first when one is present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if `GREENGROCER_ADMIN_ID` is missing or any
    /// variable fails to parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        // A missing .env file is fine; real deployments set variables directly.
        dotenvy::dotenv().ok();

        let admin_user_id = UserId::new(get_required_i64("GREENGROCER_ADMIN_ID")?);
        // Notifications default to the admin's own chat.
        let admin_chat_id = match get_optional_env("GREENGROCER_ADMIN_CHAT_ID") {
            Some(raw) => ChatId::new(parse_i64("GREENGROCER_ADMIN_CHAT_ID", &raw)?),
            None => ChatId::new(admin_user_id.as_i64()),
        };

        Ok(Self {
            admin_user_id,
            admin_chat_id,
            data_dir: PathBuf::from(get_env_or_default("GREENGROCER_DATA_DIR", "data")),
            backup_dir: PathBuf::from(get_env_or_default("GREENGROCER_BACKUP_DIR", "backups")),
        })
    }

    /// Whether the given user is the configured admin.
    #[must_use]
    pub fn is_configured_admin(&self, user_id: UserId) -> bool {
        self.admin_user_id == user_id
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(name: &str) -> Result<String, ConfigError> {
    env::var(name).map_err(|_| ConfigError::Missing(name.to_owned()))
}

/// Get an optional environment variable; empty values count as unset.
fn get_optional_env(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default fallback.
fn get_env_or_default(name: &str, default: &str) -> String {
    get_optional_env(name).unwrap_or_else(|| default.to_owned())
}

/// Get a required environment variable parsed as `i64`.
fn get_required_i64(name: &str) -> Result<i64, ConfigError> {
    let raw = get_required_env(name)?;
    parse_i64(name, &raw)
}

fn parse_i64(name: &str, raw: &str) -> Result<i64, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::Invalid {
        name: name.to_owned(),
        reason: format!("expected an integer, got {raw:?}"),
    })
}
