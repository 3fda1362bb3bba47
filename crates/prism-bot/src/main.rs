//! Prism bot - Main entry point.

use anyhow::Context;
use discord_client::{DiscordClient, MessageReceiver};
use prism_bot::modules::standard_modules;
use prism_bot::{BotResult, Config, DiscordTransport, IgnoredUsers, ModuleRegistry, Router};
use prism_store::IgnoredUserRepository;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::signal;
use tokio_stream::StreamExt;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> BotResult<()> {
    // Load configuration
    let config = Config::load().context("Failed to load configuration")?;

    // Initialize logging
    init_logging(&config.bot.log_level);

    info!("Starting Prism...");

    // Storage
    let db = prism_store::connect(
        config.database.backend,
        &config.database.url,
        config.database.max_connections,
    )
    .await
    .context("Failed to connect to database")?;

    let ignored = IgnoredUsers::load(IgnoredUserRepository::new(db.clone())).await?;

    // Discord
    let discord = DiscordClient::new(&config.discord.api_url, &config.discord.token)
        .context("Failed to create Discord client")?;

    let me = discord
        .current_user()
        .await
        .context("Discord API not reachable or token rejected")?;
    info!("Logged in as {} ({})", me.tag(), me.id);

    let channels = config.discord.channel_ids();
    if channels.is_empty() {
        warn!("DISCORD__CHANNELS is empty - no messages will be received");
    }

    // Commands
    let registry = ModuleRegistry::new(standard_modules(
        db.clone(),
        ignored.clone(),
        &config.bot.commander_role,
    ))?;

    let router = Arc::new(Router::new(
        registry,
        ignored,
        Arc::new(DiscordTransport::new(discord.clone())),
        me.id.clone(),
    ));

    info!("Listening on {} channels...", channels.len());

    // Start message receiver
    let receiver = MessageReceiver::new(discord, channels, me.id, config.discord.poll_interval);
    let mut stream = Box::pin(receiver.stream());

    let mut console = BufReader::new(tokio::io::stdin()).lines();
    let mut console_open = true;

    // Main message loop
    loop {
        tokio::select! {
            Some(message) = stream.next() => {
                let router = router.clone();
                tokio::spawn(async move {
                    let outcome = router.handle(&message).await;
                    debug!("Message {}: {:?}", message.message_id, outcome);
                });
            }
            line = console.next_line(), if console_open => {
                match line {
                    Ok(Some(line)) if line.trim() == "quit" => {
                        info!("Quit requested from console");
                        break;
                    }
                    Ok(Some(_)) => {}
                    Ok(None) => console_open = false,
                    Err(e) => {
                        error!("Console read failed: {}", e);
                        console_open = false;
                    }
                }
            }
            _ = signal::ctrl_c() => {
                info!("Shutdown signal received");
                break;
            }
        }
    }

    info!("Shutting down...");
    db.close().await;
    Ok(())
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
