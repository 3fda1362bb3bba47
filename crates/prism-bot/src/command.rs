//! Commands and the handler trait their actions implement.

use crate::argument::Argument;
use crate::caller::Caller;
use crate::error::BotResult;
use crate::reply::Reply;
use crate::transport::ChatTransport;
use async_trait::async_trait;
use discord_client::BotMessage;
use std::sync::Arc;
use tracing::{debug, error};

/// Sent when a command action fails.
pub const GENERIC_FAILURE: &str = "Sorry, something went wrong.";

/// One inbound message, as seen by a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub raw_text: String,
    pub sender_id: String,
    /// `None` for direct messages.
    pub guild_id: Option<String>,
    pub channel_id: String,
    pub message_id: String,
}

impl From<&BotMessage> for Invocation {
    fn from(msg: &BotMessage) -> Self {
        Self {
            raw_text: msg.text.clone(),
            sender_id: msg.author_id.clone(),
            guild_id: msg.guild_id.clone(),
            channel_id: msg.channel_id.clone(),
            message_id: msg.message_id.clone(),
        }
    }
}

/// Per-call collaborators handed to a command action.
pub struct CommandContext<'a> {
    pub invocation: &'a Invocation,
    pub transport: &'a dyn ChatTransport,
    /// User id of the bot itself.
    pub bot_id: &'a str,
}

impl CommandContext<'_> {
    pub fn guild_id(&self) -> Option<&str> {
        self.invocation.guild_id.as_deref()
    }

    pub fn channel_id(&self) -> &str {
        &self.invocation.channel_id
    }

    /// Send a reply to the invoking channel.
    pub async fn reply(&self, reply: &Reply) -> BotResult<()> {
        self.transport.send(self.channel_id(), reply).await
    }
}

/// The trimmed argument at `index`, `None` if absent or blank.
pub fn arg(args: &[String], index: usize) -> Option<&str> {
    args.get(index).map(|a| a.trim()).filter(|a| !a.is_empty())
}

/// Command action.
#[async_trait]
pub trait CommandHandler: Send + Sync {
    /// Run the action and produce the reply for the invoking channel.
    ///
    /// `args` has already passed the command's argument-count check.
    async fn execute(&self, ctx: &CommandContext<'_>, args: &[String]) -> BotResult<Reply>;
}

/// A named, aliasable command.
pub struct Command {
    names: Vec<String>,
    arguments: Vec<Argument>,
    required_roles: Vec<String>,
    help: String,
    handler: Arc<dyn CommandHandler>,
}

impl Command {
    /// Create a command whose canonical name is `name`.
    pub fn new(name: impl Into<String>, handler: impl CommandHandler + 'static) -> Self {
        Self {
            names: vec![name.into()],
            arguments: Vec::new(),
            required_roles: Vec::new(),
            help: String::new(),
            handler: Arc::new(handler),
        }
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.names.push(alias.into());
        self
    }

    pub fn argument(mut self, argument: Argument) -> Self {
        self.arguments.push(argument);
        self
    }

    pub fn require_role(mut self, role: impl Into<String>) -> Self {
        self.required_roles.push(role.into());
        self
    }

    pub fn help(mut self, help: impl Into<String>) -> Self {
        self.help = help.into();
        self
    }

    /// Canonical name.
    pub fn name(&self) -> &str {
        &self.names[0]
    }

    /// Canonical name followed by aliases.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn arguments(&self) -> &[Argument] {
        &self.arguments
    }

    pub fn required_roles(&self) -> &[String] {
        &self.required_roles
    }

    pub fn is_role_gated(&self) -> bool {
        !self.required_roles.is_empty()
    }

    pub fn matches_name(&self, candidate: &str) -> bool {
        self.names.iter().any(|name| name == candidate)
    }

    /// Whether the caller holds every required role.
    pub fn is_authorized(&self, caller: &Caller) -> bool {
        self.required_roles.iter().all(|role| caller.has_role(role))
    }

    /// Every required argument must be present and non-empty. Extra
    /// trailing arguments are accepted.
    pub fn validate_argument_count(&self, args: &[String]) -> bool {
        self.arguments.iter().enumerate().all(|(i, def)| {
            !def.required || args.get(i).is_some_and(|arg| !arg.trim().is_empty())
        })
    }

    /// Run the action and send its reply.
    ///
    /// Action failures are logged and answered with [`GENERIC_FAILURE`].
    pub async fn execute(&self, ctx: &CommandContext<'_>, args: &[String]) {
        debug!("Running !{} with {} args", self.name(), args.len());

        let reply = match self.handler.execute(ctx, args).await {
            Ok(reply) => reply,
            Err(e) => {
                error!("Command !{} failed: {}", self.name(), e);
                Reply::text(GENERIC_FAILURE)
            }
        };

        if let Err(e) = ctx.reply(&reply).await {
            error!("Failed to send reply for !{}: {}", self.name(), e);
        }
    }

    /// `!name required, args [optional, args] - help`
    pub fn render_help(&self) -> String {
        let mut help = format!("!{}", self.name());

        let required: Vec<&str> = self
            .arguments
            .iter()
            .filter(|a| a.required)
            .map(|a| a.name.as_str())
            .collect();
        let optional: Vec<&str> = self
            .arguments
            .iter()
            .filter(|a| !a.required)
            .map(|a| a.name.as_str())
            .collect();

        if !required.is_empty() {
            help.push(' ');
            help.push_str(&required.join(", "));
        }
        if !optional.is_empty() {
            help.push_str(&format!(" [{}]", optional.join(", ")));
        }

        help.push_str(" - ");
        help.push_str(&self.help);
        help
    }
}

impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Command")
            .field("names", &self.names)
            .field("arguments", &self.arguments)
            .field("required_roles", &self.required_roles)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BotError;
    use crate::transport::MockChatTransport;
    use mockall::predicate::eq;

    struct Echo;

    #[async_trait]
    impl CommandHandler for Echo {
        async fn execute(&self, _ctx: &CommandContext<'_>, args: &[String]) -> BotResult<Reply> {
            Ok(Reply::text(args.join("|")))
        }
    }

    struct Failing;

    #[async_trait]
    impl CommandHandler for Failing {
        async fn execute(&self, _ctx: &CommandContext<'_>, _args: &[String]) -> BotResult<Reply> {
            Err(BotError::Transport("boom".into()))
        }
    }

    fn invocation() -> Invocation {
        Invocation {
            raw_text: "!echo".into(),
            sender_id: "7".into(),
            guild_id: Some("1".into()),
            channel_id: "100".into(),
            message_id: "500".into(),
        }
    }

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_matches_name_and_aliases() {
        let cmd = Command::new("savequote", Echo).alias("sq");

        assert!(cmd.matches_name("savequote"));
        assert!(cmd.matches_name("sq"));
        assert!(!cmd.matches_name("SQ"));
        assert_eq!(cmd.name(), "savequote");
    }

    #[test]
    fn test_render_help() {
        let cmd = Command::new("addtopic", Echo)
            .argument(Argument::required("topicName"))
            .argument(Argument::required("categoryName"))
            .help("Add a topic.");
        assert_eq!(cmd.render_help(), "!addtopic topicName, categoryName - Add a topic.");

        let cmd = Command::new("quote", Echo)
            .argument(Argument::optional("author"))
            .help("Say a quote.");
        assert_eq!(cmd.render_help(), "!quote [author] - Say a quote.");

        let cmd = Command::new("random", Echo).help("Random quote.");
        assert_eq!(cmd.render_help(), "!random - Random quote.");
    }

    #[test]
    fn test_validate_argument_count() {
        let cmd = Command::new("addtopic", Echo)
            .argument(Argument::required("topicName"))
            .argument(Argument::required("categoryName"))
            .argument(Argument::optional("note"));

        assert!(cmd.validate_argument_count(&args(&["rust", "Topics"])));
        assert!(cmd.validate_argument_count(&args(&["rust", "Topics", "x", "extra"])));
        assert!(!cmd.validate_argument_count(&args(&["rust"])));
        assert!(!cmd.validate_argument_count(&args(&["", "Topics"])));
        assert!(!cmd.validate_argument_count(&[]));
    }

    #[test]
    fn test_authorization_fails_closed() {
        let open = Command::new("random", Echo);
        let gated = Command::new("aiu", Echo).require_role("Prism Commander");

        let unresolved = Caller::unresolved("7");
        let commander = Caller::with_roles("7", ["Prism Commander", "Other"]);
        let member = Caller::with_roles("7", ["Other"]);

        assert!(open.is_authorized(&unresolved));
        assert!(!gated.is_authorized(&unresolved));
        assert!(gated.is_authorized(&commander));
        assert!(!gated.is_authorized(&member));
    }

    #[tokio::test]
    async fn test_execute_sends_reply() {
        let mut transport = MockChatTransport::new();
        transport
            .expect_send()
            .with(eq("100"), eq(Reply::text("a|b")))
            .times(1)
            .returning(|_, _| Ok(()));

        let inv = invocation();
        let ctx = CommandContext {
            invocation: &inv,
            transport: &transport,
            bot_id: "999",
        };

        Command::new("echo", Echo).execute(&ctx, &args(&["a", "b"])).await;
    }

    #[tokio::test]
    async fn test_execute_reports_generic_failure() {
        let mut transport = MockChatTransport::new();
        transport
            .expect_send()
            .with(eq("100"), eq(Reply::text(GENERIC_FAILURE)))
            .times(1)
            .returning(|_, _| Ok(()));

        let inv = invocation();
        let ctx = CommandContext {
            invocation: &inv,
            transport: &transport,
            bot_id: "999",
        };

        Command::new("fail", Failing).execute(&ctx, &[]).await;
    }
}
