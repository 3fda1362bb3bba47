//! Discord client errors.

use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DiscordError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Rate limited, retry after {0:?}")]
    RateLimited(Duration),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid token")]
    InvalidToken,
}
