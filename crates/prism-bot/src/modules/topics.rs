//! Opt-in topic channels grouped under registered categories.

use crate::argument::Argument;
use crate::command::{arg, Command, CommandContext, CommandHandler};
use crate::error::BotResult;
use crate::module::Module;
use crate::reply::{Card, Reply, BLUE, WHITE};
use crate::router::REJECTED_CALL;
use crate::transport::{same_name, ChannelInfo, ChannelKind};
use async_trait::async_trait;
use prism_store::{StoreError, TopicRepository};
use tracing::{info, warn};

pub const CATEGORY_NOT_FOUND: &str = "Cannot find specified category.";
pub const CATEGORY_EXISTS: &str = "Topic category already exists.";
pub const CATEGORY_ADDED: &str = "Topic category added.";
pub const CATEGORIES_TITLE: &str = "Supported Topic Categories";
pub const TOPIC_ADDED: &str = "Topic added.";

fn find_category<'a>(channels: &'a [ChannelInfo], name: &str) -> Option<&'a ChannelInfo> {
    channels
        .iter()
        .find(|c| c.kind == ChannelKind::Category && same_name(&c.name, name))
}

/// Register a category and its primary channel.
pub struct AddTopicCategory {
    topics: TopicRepository,
}

impl AddTopicCategory {
    pub fn new(topics: TopicRepository) -> Self {
        Self { topics }
    }
}

#[async_trait]
impl CommandHandler for AddTopicCategory {
    async fn execute(&self, ctx: &CommandContext<'_>, args: &[String]) -> BotResult<Reply> {
        let (Some(category_name), Some(channel_name)) = (arg(args, 0), arg(args, 1)) else {
            return Ok(Reply::text(REJECTED_CALL));
        };
        let Some(guild_id) = ctx.guild_id() else {
            return Ok(Reply::text(CATEGORY_NOT_FOUND));
        };

        let channels = ctx.transport.guild_channels(guild_id).await?;
        let Some(category) = find_category(&channels, category_name) else {
            return Ok(Reply::text(CATEGORY_NOT_FOUND));
        };

        let wanted = channel_name.trim_start_matches('#');
        let Some(primary) = channels.iter().find(|c| {
            c.parent_id.as_deref() == Some(category.id.as_str()) && same_name(&c.name, wanted)
        }) else {
            return Ok(Reply::text(format!(
                "Cannot find '{}' in category '{}'.",
                channel_name, category_name
            )));
        };

        if self.topics.category_exists(&category.id).await? {
            return Ok(Reply::text(CATEGORY_EXISTS));
        }

        match self.topics.add_category(&category.id, &primary.id).await {
            Ok(()) => Ok(Reply::text(CATEGORY_ADDED)),
            Err(StoreError::Duplicate(_)) => Ok(Reply::text(CATEGORY_EXISTS)),
            Err(e) => Err(e.into()),
        }
    }
}

/// List registered categories of this server.
pub struct SeeTopicCategories {
    topics: TopicRepository,
}

impl SeeTopicCategories {
    pub fn new(topics: TopicRepository) -> Self {
        Self { topics }
    }
}

#[async_trait]
impl CommandHandler for SeeTopicCategories {
    async fn execute(&self, ctx: &CommandContext<'_>, _args: &[String]) -> BotResult<Reply> {
        let mut card = Card::new(BLUE).title(CATEGORIES_TITLE);

        let Some(guild_id) = ctx.guild_id() else {
            return Ok(card.into());
        };

        let channels = ctx.transport.guild_channels(guild_id).await?;
        let name_of = |id: &str| channels.iter().find(|c| c.id == id).map(|c| c.name.as_str());

        // Registered categories of other servers are not shown.
        for registered in self.topics.categories().await? {
            let Some(category) = name_of(registered.category_id.as_str()) else {
                continue;
            };
            let primary = name_of(registered.primary_channel_id.as_str()).unwrap_or("unknown");
            card = card.field(category, format!("Primary channel: #{}.", primary));
        }

        Ok(card.into())
    }
}

/// Create a topic: a role and a private channel only that role can see.
pub struct AddTopic {
    topics: TopicRepository,
}

impl AddTopic {
    pub fn new(topics: TopicRepository) -> Self {
        Self { topics }
    }
}

#[async_trait]
impl CommandHandler for AddTopic {
    async fn execute(&self, ctx: &CommandContext<'_>, args: &[String]) -> BotResult<Reply> {
        let (Some(topic_name), Some(category_name)) = (arg(args, 0), arg(args, 1)) else {
            return Ok(Reply::text(REJECTED_CALL));
        };
        let unknown_category = || {
            Reply::text(format!(
                "'{}' does not correspond to a Discord channel/category.",
                category_name
            ))
        };
        let topic_exists = || Reply::text(format!("'{}' already exists as a topic.", topic_name));

        let Some(guild_id) = ctx.guild_id() else {
            return Ok(unknown_category());
        };

        let channels = ctx.transport.guild_channels(guild_id).await?;
        let Some(category) = find_category(&channels, category_name) else {
            return Ok(unknown_category());
        };

        if !self.topics.category_exists(&category.id).await? {
            return Ok(Reply::text(format!(
                "'{}' is not a recognized topic category. Please add it with the !addtopiccategory command.",
                category_name
            )));
        }

        if self.topics.topic_exists(topic_name).await? {
            return Ok(topic_exists());
        }

        // The topic row is written last so a failed guild call leaves nothing stored.
        let role_id = ctx.transport.create_role(guild_id, topic_name, WHITE).await?;
        let channel = ctx
            .transport
            .create_topic_channel(guild_id, topic_name, &category.id, &role_id)
            .await?;

        let topic_id = match self.topics.add_topic(topic_name, &category.id).await {
            Ok(id) => id,
            Err(StoreError::Duplicate(_)) => {
                warn!("Topic {} was added concurrently; role {} is unused", topic_name, role_id);
                return Ok(topic_exists());
            }
            Err(e) => return Err(e.into()),
        };
        self.topics.add_topic_role(topic_id, &role_id).await?;

        info!(
            "Created topic {} (channel {}, role {})",
            topic_name, channel.id, role_id
        );
        Ok(Reply::text(TOPIC_ADDED))
    }
}

pub fn topics_module(topics: TopicRepository, commander_role: &str) -> Module {
    Module::new("Topics")
        .with_command(
            Command::new("addtopiccategory", AddTopicCategory::new(topics.clone()))
                .alias("addtopiccat")
                .argument(Argument::required("categoryName"))
                .argument(Argument::required("primaryChannelName"))
                .require_role(commander_role)
                .help("Add a topic category. primaryChannelName has to be a channel in the provided category. Topic categories house the text channels for topics."),
        )
        .with_command(
            Command::new("seetopiccategories", SeeTopicCategories::new(topics.clone()))
                .alias("seetopiccats")
                .require_role(commander_role)
                .help("See all supported topic categories."),
        )
        .with_command(
            Command::new("addtopic", AddTopic::new(topics))
                .argument(Argument::required("topicName"))
                .argument(Argument::required("categoryName"))
                .require_role(commander_role)
                .help("Add a topic. topicName is the desired channel/role name and categoryName is the category to which it will belong."),
        )
}
