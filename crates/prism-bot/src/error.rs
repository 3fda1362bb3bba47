//! Bot error types.

use thiserror::Error;

/// Main bot error type.
#[derive(Error, Debug)]
pub enum BotError {
    #[error("Configuration error: {0}")]
    Config(#[from] anyhow::Error),

    #[error("Discord error: {0}")]
    Discord(#[from] discord_client::DiscordError),

    #[error("Storage error: {0}")]
    Store(#[from] prism_store::StoreError),

    #[error("Command name '{name}' of module '{module}' is already registered")]
    CommandCollision { name: String, module: String },

    #[error("Command not found: {0}")]
    CommandNotFound(String),

    #[error("Transport error: {0}")]
    Transport(String),
}

/// Result type alias for bot errors.
pub type BotResult<T> = Result<T, BotError>;
