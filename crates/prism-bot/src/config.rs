//! Bot configuration loaded from environment variables.

use anyhow::{Context, Result};
use prism_store::Backend;
use secrecy::SecretString;
use serde::Deserialize;
use std::time::Duration;

/// Bot configuration.
#[derive(Debug, Deserialize)]
pub struct Config {
    /// Discord configuration
    pub discord: DiscordConfig,

    /// Storage configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Bot behaviour
    #[serde(default)]
    pub bot: BotConfig,
}

#[derive(Debug, Deserialize)]
pub struct DiscordConfig {
    /// Bot token
    pub token: SecretString,

    /// REST API base URL
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Comma-separated ids of the channels to watch
    #[serde(default)]
    pub channels: String,

    /// Poll interval for new messages
    #[serde(default = "default_poll_interval", with = "humantime_serde")]
    pub poll_interval: Duration,
}

impl DiscordConfig {
    pub fn channel_ids(&self) -> Vec<String> {
        self.channels
            .split(',')
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(String::from)
            .collect()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// `sqlite` or `postgres`
    #[serde(default)]
    pub backend: Backend,

    /// Connection URL
    #[serde(default = "default_database_url")]
    pub url: String,

    /// Pool size
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BotConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Role required for management and topic commands
    #[serde(default = "default_commander_role")]
    pub commander_role: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            backend: Backend::default(),
            url: default_database_url(),
            max_connections: default_max_connections(),
        }
    }
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            commander_role: default_commander_role(),
        }
    }
}

fn default_api_url() -> String {
    "https://discord.com/api/v10".into()
}

fn default_poll_interval() -> Duration {
    Duration::from_secs(2)
}

fn default_database_url() -> String {
    "sqlite://db/quotes.db".into()
}

fn default_max_connections() -> u32 {
    5
}

fn default_log_level() -> String {
    "info".into()
}

fn default_commander_role() -> String {
    "Prism Commander".into()
}

impl Config {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .separator("__")
                    // Snowflakes must stay strings.
                    .try_parsing(false),
            )
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }
}
