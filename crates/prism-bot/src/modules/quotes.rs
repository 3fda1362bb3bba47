//! Saving and recalling quotes.

use crate::argument::Argument;
use crate::command::{arg, Command, CommandContext, CommandHandler};
use crate::error::BotResult;
use crate::module::Module;
use crate::reply::{Card, Reply, GREEN};
use async_trait::async_trait;
use prism_store::{NewQuote, QuoteRepository, SaveOutcome};
use rand::seq::SliceRandom;
use tracing::debug;

pub const NO_QUOTE_FOUND: &str = "No quote found!";
pub const NO_QUOTES_IN_SERVER: &str = "No quotes found for this server!";
pub const INVALID_QUOTE: &str =
    "Invalid message to quote. It's either from this bot or a duplicate quote.";
pub const QUOTE_ADDED: &str = "Quote added!";
pub const QUOTE_MESSAGE_GONE: &str = "That quote's message no longer exists.";
pub const SERVER_ONLY: &str = "Quotes can only be saved in a server.";

/// Save the preceding message, or the message with the given id, as a quote.
pub struct SaveQuote {
    quotes: QuoteRepository,
}

impl SaveQuote {
    pub fn new(quotes: QuoteRepository) -> Self {
        Self { quotes }
    }
}

#[async_trait]
impl CommandHandler for SaveQuote {
    async fn execute(&self, ctx: &CommandContext<'_>, args: &[String]) -> BotResult<Reply> {
        let Some(guild_id) = ctx.guild_id() else {
            return Ok(Reply::text(SERVER_ONLY));
        };

        let target = match arg(args, 0) {
            Some(message_id) => ctx.transport.message(ctx.channel_id(), message_id).await?,
            None => {
                ctx.transport
                    .message_before(ctx.channel_id(), &ctx.invocation.message_id)
                    .await?
            }
        };

        let Some(message) = target else {
            return Ok(Reply::text(NO_QUOTE_FOUND));
        };

        if message.author_id == ctx.bot_id {
            debug!("Refusing to quote own message {}", message.id);
            return Ok(Reply::text(INVALID_QUOTE));
        }

        let quote = NewQuote {
            guild_id: guild_id.to_string(),
            author_id: message.author_id,
            channel_id: message.channel_id,
            message_id: message.id,
        };

        let text = match self.quotes.save(&quote).await? {
            SaveOutcome::Saved => QUOTE_ADDED,
            SaveOutcome::Duplicate => INVALID_QUOTE,
        };
        Ok(Reply::text(text))
    }
}

/// Say a random quote of the guild.
#[derive(Clone)]
pub struct RandomQuote {
    quotes: QuoteRepository,
}

impl RandomQuote {
    pub fn new(quotes: QuoteRepository) -> Self {
        Self { quotes }
    }

    /// Pick a quote, optionally by `author_id`, and render it as a card.
    pub async fn say(&self, ctx: &CommandContext<'_>, author_id: Option<&str>) -> BotResult<Reply> {
        let Some(guild_id) = ctx.guild_id() else {
            return Ok(Reply::text(NO_QUOTES_IN_SERVER));
        };

        let quotes = self.quotes.for_guild(guild_id, author_id).await?;
        // ThreadRng is not Send; keep it out of the future's state.
        let picked = {
            let mut rng = rand::thread_rng();
            quotes.choose(&mut rng).cloned()
        };
        let Some(quote) = picked else {
            return Ok(Reply::text(NO_QUOTES_IN_SERVER));
        };

        let Some(message) = ctx
            .transport
            .message(&quote.channel_id, &quote.message_id)
            .await?
        else {
            debug!("Quote {} points at a deleted message", quote.id);
            return Ok(Reply::text(QUOTE_MESSAGE_GONE));
        };

        let author_name = match ctx.transport.member(guild_id, &message.author_id).await? {
            Some(member) => member.display_name,
            None => message.author_name.clone(),
        };

        let mut card = Card::new(GREEN)
            .description(message.content.clone())
            .author(author_name, message.author_avatar.clone())
            .timestamp(message.timestamp);

        if let Some(url) = message.attachments.last() {
            card = card.image(url.clone());
        }

        Ok(card.into())
    }
}

#[async_trait]
impl CommandHandler for RandomQuote {
    async fn execute(&self, ctx: &CommandContext<'_>, _args: &[String]) -> BotResult<Reply> {
        self.say(ctx, None).await
    }
}

/// Say a random quote, optionally by a member named by display name or tag.
pub struct GetQuote {
    random: RandomQuote,
}

impl GetQuote {
    pub fn new(random: RandomQuote) -> Self {
        Self { random }
    }
}

#[async_trait]
impl CommandHandler for GetQuote {
    async fn execute(&self, ctx: &CommandContext<'_>, args: &[String]) -> BotResult<Reply> {
        let (Some(author), Some(guild_id)) = (arg(args, 0), ctx.guild_id()) else {
            return self.random.say(ctx, None).await;
        };

        match ctx.transport.find_member(guild_id, author).await? {
            Some(member) => self.random.say(ctx, Some(&member.user_id)).await,
            None => Ok(Reply::text(NO_QUOTE_FOUND)),
        }
    }
}

pub fn quotes_module(quotes: QuoteRepository) -> Module {
    let random = RandomQuote::new(quotes.clone());

    Module::new("Quotes")
        .with_command(
            Command::new("savequote", SaveQuote::new(quotes))
                .alias("sq")
                .argument(Argument::optional("messageId"))
                .help("savequote will save the preceding quote to the database. You can specify an optional message id."),
        )
        .with_command(
            Command::new("quote", GetQuote::new(random.clone()))
                .alias("getquote")
                .alias("q")
                .argument(Argument::optional("author"))
                .help("quote will attempt to say a random quote. You can specify an optional author. The provided author string can be either a nickname or a username."),
        )
        .with_command(
            Command::new("random", random)
                .alias("r")
                .help("random will ... say a random quote. Come on."),
        )
}
