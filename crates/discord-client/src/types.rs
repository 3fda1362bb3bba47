//! Discord API types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Channel type for guild text channels.
pub const CHANNEL_TEXT: u8 = 0;

/// Channel type for guild categories.
pub const CHANNEL_CATEGORY: u8 = 4;

/// Permission bit allowing a member to see a channel.
pub const PERMISSION_VIEW_CHANNEL: u64 = 1 << 10;

/// Permission bit allowing a member to post in a channel.
pub const PERMISSION_SEND_MESSAGES: u64 = 1 << 11;

/// Base URL for user avatars.
const CDN_URL: &str = "https://cdn.discordapp.com";

/// Discord user.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct User {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub discriminator: Option<String>,
    #[serde(default)]
    pub global_name: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub bot: bool,
}

impl User {
    /// `name#1234` for legacy accounts, the bare username otherwise.
    pub fn tag(&self) -> String {
        match self.discriminator.as_deref() {
            Some(d) if d != "0" && !d.is_empty() => format!("{}#{}", self.username, d),
            _ => self.username.clone(),
        }
    }

    /// Global display name, falling back to the username.
    pub fn display_name(&self) -> &str {
        self.global_name.as_deref().unwrap_or(&self.username)
    }

    /// CDN URL of the user's avatar, if one is set.
    pub fn avatar_url(&self) -> Option<String> {
        self.avatar
            .as_ref()
            .map(|hash| format!("{}/avatars/{}/{}.png", CDN_URL, self.id, hash))
    }
}

/// Guild member.
#[derive(Debug, Clone, Deserialize)]
pub struct Member {
    #[serde(default)]
    pub user: Option<User>,
    #[serde(default)]
    pub nick: Option<String>,
    #[serde(default)]
    pub roles: Vec<String>,
}

impl Member {
    /// Nickname, then global name, then username.
    pub fn display_name(&self) -> Option<&str> {
        self.nick
            .as_deref()
            .or_else(|| self.user.as_ref().map(User::display_name))
    }
}

/// Guild role.
#[derive(Debug, Clone, Deserialize)]
pub struct Role {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub color: u32,
}

/// Guild channel.
#[derive(Debug, Clone, Deserialize)]
pub struct Channel {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: u8,
    #[serde(default)]
    pub guild_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub parent_id: Option<String>,
}

impl Channel {
    pub fn is_category(&self) -> bool {
        self.kind == CHANNEL_CATEGORY
    }
}

/// Message attachment.
#[derive(Debug, Clone, Deserialize)]
pub struct Attachment {
    pub id: String,
    pub filename: String,
    pub url: String,
}

/// Channel message as returned by the REST API.
#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub id: String,
    pub channel_id: String,
    #[serde(default)]
    pub guild_id: Option<String>,
    pub author: User,
    #[serde(default)]
    pub content: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

/// Embed author block.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct EmbedAuthor {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
}

/// Embed image block.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct EmbedImage {
    pub url: String,
}

/// Embed field.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

/// Rich embed.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct Embed {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<EmbedAuthor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<EmbedImage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<EmbedField>,
}

/// Outgoing message request.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CreateMessage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub embeds: Vec<Embed>,
}

impl CreateMessage {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            embeds: Vec::new(),
        }
    }

    pub fn embed(embed: Embed) -> Self {
        Self {
            content: None,
            embeds: vec![embed],
        }
    }
}

/// Permission overwrite target type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverwriteKind {
    Role,
    Member,
}

impl Serialize for OverwriteKind {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(match self {
            OverwriteKind::Role => 0,
            OverwriteKind::Member => 1,
        })
    }
}

/// Channel permission overwrite. Bit sets are sent as decimal strings.
#[derive(Debug, Clone, Serialize)]
pub struct PermissionOverwrite {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: OverwriteKind,
    pub allow: String,
    pub deny: String,
}

impl PermissionOverwrite {
    pub fn role(id: impl Into<String>, allow: u64, deny: u64) -> Self {
        Self {
            id: id.into(),
            kind: OverwriteKind::Role,
            allow: allow.to_string(),
            deny: deny.to_string(),
        }
    }
}

/// Channel creation request.
#[derive(Debug, Clone, Serialize)]
pub struct CreateChannel {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub permission_overwrites: Vec<PermissionOverwrite>,
}

/// Role creation request.
#[derive(Debug, Clone, Serialize)]
pub struct CreateRole {
    pub name: String,
    pub color: u32,
}

/// Rate limit response body.
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitBody {
    pub retry_after: f64,
}

/// Parsed message for bot processing.
#[derive(Debug, Clone)]
pub struct BotMessage {
    /// Snowflake of the message.
    pub message_id: String,
    /// Channel the message was posted in.
    pub channel_id: String,
    /// Guild owning the channel, `None` for direct messages.
    pub guild_id: Option<String>,
    /// Author's user id.
    pub author_id: String,
    /// Whether the author is a bot account.
    pub author_is_bot: bool,
    /// Whether the author is this bot.
    pub is_self: bool,
    /// The message text.
    pub text: String,
    /// Message timestamp.
    pub timestamp: DateTime<Utc>,
}

impl BotMessage {
    /// Build a bot message from a REST message.
    ///
    /// Messages without text content (attachments only, joins, pins) are skipped.
    pub fn from_message(msg: &Message, guild_id: Option<&str>, self_id: &str) -> Option<Self> {
        if msg.content.is_empty() {
            return None;
        }

        Some(Self {
            message_id: msg.id.clone(),
            channel_id: msg.channel_id.clone(),
            guild_id: msg.guild_id.clone().or_else(|| guild_id.map(String::from)),
            author_id: msg.author.id.clone(),
            author_is_bot: msg.author.bot,
            is_self: msg.author.id == self_id,
            text: msg.content.clone(),
            timestamp: msg.timestamp,
        })
    }
}

/// Compare two snowflakes numerically.
///
/// Snowflakes are decimal strings; a longer string is always the larger id.
pub fn snowflake_cmp(a: &str, b: &str) -> std::cmp::Ordering {
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}
