//! Discord HTTP client.

use crate::error::DiscordError;
use crate::types::*;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Maximum number of messages Discord returns per history request.
pub const MAX_HISTORY_LIMIT: u8 = 100;

/// Discord REST API client.
#[derive(Clone)]
pub struct DiscordClient {
    client: Client,
    base_url: String,
}

impl DiscordClient {
    /// Create a new Discord client authenticated as a bot.
    pub fn new(base_url: impl Into<String>, token: &SecretString) -> Result<Self, DiscordError> {
        let mut auth = HeaderValue::from_str(&format!("Bot {}", token.expose_secret()))
            .map_err(|_| DiscordError::InvalidToken)?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Get the bot's own user.
    #[instrument(skip(self))]
    pub async fn current_user(&self) -> Result<User, DiscordError> {
        self.fetch(self.client.get(self.url("/users/@me"))).await
    }

    /// Get a channel by id.
    #[instrument(skip(self))]
    pub async fn get_channel(&self, channel_id: &str) -> Result<Channel, DiscordError> {
        self.fetch(self.client.get(self.url(&format!("/channels/{}", channel_id))))
            .await
    }

    /// Get a single message, `None` if it no longer exists.
    #[instrument(skip(self))]
    pub async fn get_message(
        &self,
        channel_id: &str,
        message_id: &str,
    ) -> Result<Option<Message>, DiscordError> {
        let url = self.url(&format!("/channels/{}/messages/{}", channel_id, message_id));
        self.fetch_optional(self.client.get(url)).await
    }

    /// Get messages posted after the given message, newest first.
    #[instrument(skip(self))]
    pub async fn messages_after(
        &self,
        channel_id: &str,
        after: &str,
        limit: u8,
    ) -> Result<Vec<Message>, DiscordError> {
        self.history(channel_id, Some(("after", after)), limit).await
    }

    /// Get messages posted before the given message, newest first.
    #[instrument(skip(self))]
    pub async fn messages_before(
        &self,
        channel_id: &str,
        before: &str,
        limit: u8,
    ) -> Result<Vec<Message>, DiscordError> {
        self.history(channel_id, Some(("before", before)), limit).await
    }

    /// Get the most recent messages of a channel, newest first.
    #[instrument(skip(self))]
    pub async fn latest_messages(
        &self,
        channel_id: &str,
        limit: u8,
    ) -> Result<Vec<Message>, DiscordError> {
        self.history(channel_id, None, limit).await
    }

    async fn history(
        &self,
        channel_id: &str,
        cursor: Option<(&str, &str)>,
        limit: u8,
    ) -> Result<Vec<Message>, DiscordError> {
        let limit = limit.clamp(1, MAX_HISTORY_LIMIT).to_string();
        let mut request = self
            .client
            .get(self.url(&format!("/channels/{}/messages", channel_id)))
            .query(&[("limit", limit.as_str())]);

        if let Some(cursor) = cursor {
            request = request.query(&[cursor]);
        }

        let messages: Vec<Message> = self.fetch(request).await?;
        debug!("Fetched {} messages from {}", messages.len(), channel_id);
        Ok(messages)
    }

    /// Send a message to a channel.
    #[instrument(skip(self, message))]
    pub async fn send_message(
        &self,
        channel_id: &str,
        message: &CreateMessage,
    ) -> Result<Message, DiscordError> {
        let request = self
            .client
            .post(self.url(&format!("/channels/{}/messages", channel_id)))
            .json(message);

        let sent: Message = self.fetch(request).await?;
        debug!("Sent message {} to {}", sent.id, channel_id);
        Ok(sent)
    }

    /// Get a guild member, `None` if the user is not in the guild.
    #[instrument(skip(self))]
    pub async fn get_member(
        &self,
        guild_id: &str,
        user_id: &str,
    ) -> Result<Option<Member>, DiscordError> {
        let url = self.url(&format!("/guilds/{}/members/{}", guild_id, user_id));
        self.fetch_optional(self.client.get(url)).await
    }

    /// Search guild members whose username or nickname starts with `query`.
    #[instrument(skip(self))]
    pub async fn search_members(
        &self,
        guild_id: &str,
        query: &str,
        limit: u16,
    ) -> Result<Vec<Member>, DiscordError> {
        let limit = limit.clamp(1, 1000).to_string();
        let request = self
            .client
            .get(self.url(&format!("/guilds/{}/members/search", guild_id)))
            .query(&[("query", query), ("limit", limit.as_str())]);

        self.fetch(request).await
    }

    /// List guild roles.
    #[instrument(skip(self))]
    pub async fn get_roles(&self, guild_id: &str) -> Result<Vec<Role>, DiscordError> {
        self.fetch(self.client.get(self.url(&format!("/guilds/{}/roles", guild_id))))
            .await
    }

    /// List guild channels.
    #[instrument(skip(self))]
    pub async fn get_channels(&self, guild_id: &str) -> Result<Vec<Channel>, DiscordError> {
        self.fetch(self.client.get(self.url(&format!("/guilds/{}/channels", guild_id))))
            .await
    }

    /// Create a guild role.
    #[instrument(skip(self))]
    pub async fn create_role(&self, guild_id: &str, role: &CreateRole) -> Result<Role, DiscordError> {
        let request = self
            .client
            .post(self.url(&format!("/guilds/{}/roles", guild_id)))
            .json(role);
        self.fetch(request).await
    }

    /// Create a guild channel.
    #[instrument(skip(self))]
    pub async fn create_channel(
        &self,
        guild_id: &str,
        channel: &CreateChannel,
    ) -> Result<Channel, DiscordError> {
        let request = self
            .client
            .post(self.url(&format!("/guilds/{}/channels", guild_id)))
            .json(channel);
        self.fetch(request).await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn fetch<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, DiscordError> {
        let response = check(request.send().await?).await?;
        Ok(response.json().await?)
    }

    async fn fetch_optional<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<Option<T>, DiscordError> {
        match self.fetch(request).await {
            Ok(value) => Ok(Some(value)),
            Err(DiscordError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

/// Map non-success responses to errors.
async fn check(response: Response) -> Result<Response, DiscordError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let url = response.url().path().to_string();
    let body = response.text().await.unwrap_or_default();

    match status {
        StatusCode::NOT_FOUND => Err(DiscordError::NotFound(url)),
        StatusCode::TOO_MANY_REQUESTS => {
            let retry_after = serde_json::from_str::<RateLimitBody>(&body)
                .map(|b| b.retry_after)
                .unwrap_or(1.0);
            warn!("Rate limited on {} for {:.2}s", url, retry_after);
            Err(DiscordError::RateLimited(Duration::from_secs_f64(
                retry_after.max(0.0),
            )))
        }
        _ => {
            warn!("Request to {} failed ({}): {}", url, status, body);
            Err(DiscordError::Api {
                status: status.as_u16(),
                message: body,
            })
        }
    }
}

