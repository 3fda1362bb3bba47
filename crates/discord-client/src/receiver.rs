//! Message receiver with polling.

use crate::client::{DiscordClient, MAX_HISTORY_LIMIT};
use crate::error::DiscordError;
use crate::types::*;
use std::time::Duration;
use tokio::time::sleep;
use tokio_stream::Stream;
use tracing::{debug, error, info, warn};

/// Back-off applied after a failed poll.
const ERROR_BACKOFF: Duration = Duration::from_secs(5);

/// Polling state of one watched channel.
#[derive(Debug, Clone)]
struct WatchedChannel {
    channel_id: String,
    guild_id: Option<String>,
    /// Newest message already seen.
    cursor: Option<String>,
    primed: bool,
}

/// Message receiver that polls channels for new messages.
pub struct MessageReceiver {
    client: DiscordClient,
    channels: Vec<WatchedChannel>,
    self_id: String,
    poll_interval: Duration,
}

impl MessageReceiver {
    /// Create a new message receiver watching `channel_ids`.
    pub fn new(
        client: DiscordClient,
        channel_ids: Vec<String>,
        self_id: impl Into<String>,
        poll_interval: Duration,
    ) -> Self {
        let channels = channel_ids
            .into_iter()
            .map(|channel_id| WatchedChannel {
                channel_id,
                guild_id: None,
                cursor: None,
                primed: false,
            })
            .collect();

        Self {
            client,
            channels,
            self_id: self_id.into(),
            poll_interval,
        }
    }

    /// Start receiving messages as an async stream.
    ///
    /// Messages already present when the stream starts are never yielded.
    pub fn stream(mut self) -> impl Stream<Item = BotMessage> {
        async_stream::stream! {
            for channel in self.channels.iter_mut() {
                prime(&self.client, channel).await;
            }

            loop {
                let mut backoff = None;

                for channel in self.channels.iter_mut() {
                    match poll(&self.client, channel, &self.self_id).await {
                        Ok(messages) => {
                            for bot_msg in messages {
                                debug!("Received: {} from {}",
                                    preview(&bot_msg.text),
                                    bot_msg.author_id
                                );
                                yield bot_msg;
                            }
                        }
                        Err(DiscordError::RateLimited(wait)) => {
                            backoff = Some(wait.max(self.poll_interval));
                            break;
                        }
                        Err(e) => {
                            error!("Receive error on {}: {}", channel.channel_id, e);
                            backoff = Some(ERROR_BACKOFF);
                        }
                    }
                }

                sleep(backoff.unwrap_or(self.poll_interval)).await;
            }
        }
    }
}

/// Resolve the channel's guild and move its cursor to the newest message.
async fn prime(client: &DiscordClient, channel: &mut WatchedChannel) {
    if channel.guild_id.is_none() {
        match client.get_channel(&channel.channel_id).await {
            Ok(info) => channel.guild_id = info.guild_id,
            Err(e) => warn!("Could not resolve channel {}: {}", channel.channel_id, e),
        }
    }

    match client.latest_messages(&channel.channel_id, 1).await {
        Ok(messages) => {
            channel.cursor = messages.into_iter().next().map(|m| m.id);
            channel.primed = true;
            info!(
                "Watching channel {} (guild {:?})",
                channel.channel_id, channel.guild_id
            );
        }
        Err(e) => warn!("Could not prime channel {}: {}", channel.channel_id, e),
    }
}

/// Fetch messages newer than the cursor, oldest first.
async fn poll(
    client: &DiscordClient,
    channel: &mut WatchedChannel,
    self_id: &str,
) -> Result<Vec<BotMessage>, DiscordError> {
    if !channel.primed {
        prime(client, channel).await;
        return Ok(Vec::new());
    }

    let mut messages = match channel.cursor.as_deref() {
        Some(cursor) => {
            client
                .messages_after(&channel.channel_id, cursor, MAX_HISTORY_LIMIT)
                .await?
        }
        // Empty channel at startup: everything from now on is new.
        None => {
            client
                .latest_messages(&channel.channel_id, MAX_HISTORY_LIMIT)
                .await?
        }
    };

    messages.sort_by(|a, b| snowflake_cmp(&a.id, &b.id));

    if let Some(newest) = messages.last() {
        channel.cursor = Some(newest.id.clone());
    }

    Ok(messages
        .iter()
        .filter_map(|m| BotMessage::from_message(m, channel.guild_id.as_deref(), self_id))
        .collect())
}

fn preview(text: &str) -> &str {
    match text.char_indices().nth(50) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_truncates_on_char_boundary() {
        let text = "é".repeat(60);
        assert_eq!(preview(&text).chars().count(), 50);
        assert_eq!(preview("short"), "short");
    }
}
