//! Chat transport seam and its Discord implementation.

use crate::error::BotResult;
use crate::reply::{Card, Reply};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use discord_client::{
    CreateChannel, CreateMessage, CreateRole, DiscordClient, Embed, EmbedAuthor, EmbedField,
    EmbedImage, Member, Message, PermissionOverwrite, CHANNEL_CATEGORY, CHANNEL_TEXT,
    PERMISSION_SEND_MESSAGES, PERMISSION_VIEW_CHANNEL,
};
use std::collections::{HashMap, HashSet};
use tracing::{debug, instrument};

/// Upper bound on members returned by a name search.
const MEMBER_SEARCH_LIMIT: u16 = 1000;

/// A message fetched from channel history.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatMessage {
    pub id: String,
    pub channel_id: String,
    pub author_id: String,
    /// Account-level display name; guild nicknames come from [`ChatTransport::member`].
    pub author_name: String,
    pub author_avatar: Option<String>,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    /// Attachment URLs in upload order.
    pub attachments: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberInfo {
    pub user_id: String,
    pub display_name: String,
    pub tag: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelKind {
    Text,
    Category,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelInfo {
    pub id: String,
    pub name: String,
    pub kind: ChannelKind,
    pub parent_id: Option<String>,
}

/// Everything the command layer needs from the chat platform.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Post a reply to a channel.
    async fn send(&self, channel_id: &str, reply: &Reply) -> BotResult<()>;

    /// Names of the member's roles, `None` if the user is not a member.
    async fn member_roles(&self, guild_id: &str, user_id: &str)
        -> BotResult<Option<HashSet<String>>>;

    async fn message(&self, channel_id: &str, message_id: &str) -> BotResult<Option<ChatMessage>>;

    /// The message posted directly before `message_id`.
    async fn message_before(
        &self,
        channel_id: &str,
        message_id: &str,
    ) -> BotResult<Option<ChatMessage>>;

    async fn member(&self, guild_id: &str, user_id: &str) -> BotResult<Option<MemberInfo>>;

    /// Member whose display name or tag equals `query`, ignoring case.
    async fn find_member(&self, guild_id: &str, query: &str) -> BotResult<Option<MemberInfo>>;

    async fn guild_channels(&self, guild_id: &str) -> BotResult<Vec<ChannelInfo>>;

    /// Create a role and return its id.
    async fn create_role(&self, guild_id: &str, name: &str, colour: u32) -> BotResult<String>;

    /// Create a text channel under `parent_id` that only `role_id` can see.
    async fn create_topic_channel(
        &self,
        guild_id: &str,
        name: &str,
        parent_id: &str,
        role_id: &str,
    ) -> BotResult<ChannelInfo>;
}

/// [`ChatTransport`] backed by the Discord REST API.
#[derive(Clone)]
pub struct DiscordTransport {
    client: DiscordClient,
}

impl DiscordTransport {
    pub fn new(client: DiscordClient) -> Self {
        Self { client }
    }
}

impl From<&Message> for ChatMessage {
    fn from(msg: &Message) -> Self {
        Self {
            id: msg.id.clone(),
            channel_id: msg.channel_id.clone(),
            author_id: msg.author.id.clone(),
            author_name: msg.author.display_name().to_string(),
            author_avatar: msg.author.avatar_url(),
            content: msg.content.clone(),
            timestamp: msg.timestamp,
            attachments: msg.attachments.iter().map(|a| a.url.clone()).collect(),
        }
    }
}

/// Case-insensitive name comparison, with full Unicode case folding.
pub fn same_name(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

fn member_info(member: &Member) -> Option<MemberInfo> {
    let user = member.user.as_ref()?;
    Some(MemberInfo {
        user_id: user.id.clone(),
        display_name: member.display_name().unwrap_or(&user.username).to_string(),
        tag: user.tag(),
    })
}

fn channel_info(channel: discord_client::Channel) -> ChannelInfo {
    let kind = match channel.kind {
        CHANNEL_TEXT => ChannelKind::Text,
        CHANNEL_CATEGORY => ChannelKind::Category,
        _ => ChannelKind::Other,
    };

    ChannelInfo {
        id: channel.id,
        name: channel.name.unwrap_or_default(),
        kind,
        parent_id: channel.parent_id,
    }
}

fn card_embed(card: &Card) -> Embed {
    Embed {
        title: card.title.clone(),
        description: card.description.clone(),
        color: Some(card.colour),
        author: card.author.as_ref().map(|author| EmbedAuthor {
            name: author.name.clone(),
            icon_url: author.icon_url.clone(),
        }),
        timestamp: card.timestamp,
        image: card.image.clone().map(|url| EmbedImage { url }),
        fields: card
            .fields
            .iter()
            .map(|field| EmbedField {
                name: field.name.clone(),
                value: field.value.clone(),
                inline: false,
            })
            .collect(),
    }
}

/// Wire form of a reply.
pub fn create_message(reply: &Reply) -> CreateMessage {
    match reply {
        Reply::Text(text) => CreateMessage::text(text.clone()),
        Reply::Card(card) => CreateMessage::embed(card_embed(card)),
    }
}

#[async_trait]
impl ChatTransport for DiscordTransport {
    async fn send(&self, channel_id: &str, reply: &Reply) -> BotResult<()> {
        self.client
            .send_message(channel_id, &create_message(reply))
            .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn member_roles(
        &self,
        guild_id: &str,
        user_id: &str,
    ) -> BotResult<Option<HashSet<String>>> {
        let Some(member) = self.client.get_member(guild_id, user_id).await? else {
            return Ok(None);
        };

        let names: HashMap<String, String> = self
            .client
            .get_roles(guild_id)
            .await?
            .into_iter()
            .map(|role| (role.id, role.name))
            .collect();

        let roles = member
            .roles
            .iter()
            .filter_map(|id| names.get(id).cloned())
            .collect::<HashSet<_>>();

        debug!("User {} holds {} roles", user_id, roles.len());
        Ok(Some(roles))
    }

    async fn message(&self, channel_id: &str, message_id: &str) -> BotResult<Option<ChatMessage>> {
        let msg = self.client.get_message(channel_id, message_id).await?;
        Ok(msg.as_ref().map(ChatMessage::from))
    }

    async fn message_before(
        &self,
        channel_id: &str,
        message_id: &str,
    ) -> BotResult<Option<ChatMessage>> {
        let messages = self
            .client
            .messages_before(channel_id, message_id, 1)
            .await?;
        Ok(messages.first().map(ChatMessage::from))
    }

    async fn member(&self, guild_id: &str, user_id: &str) -> BotResult<Option<MemberInfo>> {
        let member = self.client.get_member(guild_id, user_id).await?;
        Ok(member.as_ref().and_then(member_info))
    }

    #[instrument(skip(self))]
    async fn find_member(&self, guild_id: &str, query: &str) -> BotResult<Option<MemberInfo>> {
        // Discord searches by prefix; a legacy tag's discriminator is not searchable.
        let prefix = query.split('#').next().unwrap_or(query).trim();
        if prefix.is_empty() {
            return Ok(None);
        }

        let members = self
            .client
            .search_members(guild_id, prefix, MEMBER_SEARCH_LIMIT)
            .await?;

        Ok(members.iter().filter_map(member_info).find(|member| {
            same_name(&member.display_name, query) || same_name(&member.tag, query)
        }))
    }

    async fn guild_channels(&self, guild_id: &str) -> BotResult<Vec<ChannelInfo>> {
        let channels = self.client.get_channels(guild_id).await?;
        Ok(channels.into_iter().map(channel_info).collect())
    }

    async fn create_role(&self, guild_id: &str, name: &str, colour: u32) -> BotResult<String> {
        let role = self
            .client
            .create_role(
                guild_id,
                &CreateRole {
                    name: name.to_string(),
                    color: colour,
                },
            )
            .await?;
        Ok(role.id)
    }

    async fn create_topic_channel(
        &self,
        guild_id: &str,
        name: &str,
        parent_id: &str,
        role_id: &str,
    ) -> BotResult<ChannelInfo> {
        let visible = PERMISSION_VIEW_CHANNEL | PERMISSION_SEND_MESSAGES;

        // The @everyone role shares the guild's id.
        let request = CreateChannel {
            name: name.to_string(),
            kind: CHANNEL_TEXT,
            parent_id: Some(parent_id.to_string()),
            permission_overwrites: vec![
                PermissionOverwrite::role(guild_id, 0, visible),
                PermissionOverwrite::role(role_id, visible, 0),
            ],
        };

        let channel = self.client.create_channel(guild_id, &request).await?;
        Ok(channel_info(channel))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reply::GREEN;

    #[test]
    fn test_text_reply_wire_form() {
        let message = create_message(&Reply::text("Quote added!"));
        assert_eq!(message.content.as_deref(), Some("Quote added!"));
        assert!(message.embeds.is_empty());
    }

    #[test]
    fn test_card_reply_wire_form() {
        let card = Card::new(GREEN)
            .description("hello")
            .author("Alice", None)
            .image("https://cdn.example/cat.png")
            .field("General", "Primary channel: #general.");

        let message = create_message(&card.into());
        assert!(message.content.is_none());

        let embed = &message.embeds[0];
        assert_eq!(embed.color, Some(GREEN));
        assert_eq!(embed.description.as_deref(), Some("hello"));
        assert_eq!(embed.author.as_ref().map(|a| a.name.as_str()), Some("Alice"));
        assert_eq!(
            embed.image.as_ref().map(|i| i.url.as_str()),
            Some("https://cdn.example/cat.png")
        );
        assert_eq!(embed.fields.len(), 1);
        assert!(!embed.fields[0].inline);
    }

    #[test]
    fn test_same_name_folds_unicode() {
        assert!(same_name("Élodie", "élodie"));
        assert!(same_name("ÆON", "æon"));
        assert!(!same_name("Élodie", "elodie"));
    }

    #[tokio::test]
    async fn test_find_member_matches_non_ascii_nickname() {
        use secrecy::SecretString;
        use wiremock::matchers::{method, path, query_param};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/guilds/1/members/search"))
            .and(query_param("query", "élodie"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([{
                "user": { "id": "7", "username": "elo" },
                "nick": "Élodie",
                "roles": []
            }])))
            .mount(&mock_server)
            .await;

        let client =
            DiscordClient::new(mock_server.uri(), &SecretString::new("test-token".into())).unwrap();
        let transport = DiscordTransport::new(client);

        let member = transport.find_member("1", "élodie").await.unwrap().unwrap();
        assert_eq!(member.user_id, "7");
        assert_eq!(member.display_name, "Élodie");
    }
}
