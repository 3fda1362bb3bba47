//! Discord REST API client.

mod client;
mod error;
mod receiver;
mod types;

pub use client::{DiscordClient, MAX_HISTORY_LIMIT};
pub use error::DiscordError;
pub use receiver::MessageReceiver;
pub use types::*;
