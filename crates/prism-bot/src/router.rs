//! Turns inbound messages into command executions.

use crate::caller::Caller;
use crate::command::{CommandContext, Invocation};
use crate::ignored::IgnoredUsers;
use crate::parser::{self, SIGIL};
use crate::registry::{ModuleRegistry, RESERVED_NAMES};
use crate::reply::Reply;
use crate::transport::ChatTransport;
use discord_client::BotMessage;
use std::sync::Arc;
use tracing::{debug, error};

pub const REJECTED_CALL: &str = "Incorrect argument count or insufficient privilege.";
pub const UNKNOWN_HELP_TOPIC: &str = "Unknown command or insufficient privilege.";

/// What the router did with a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// Sender is on the ignored list.
    Ignored,
    /// No sigil, sent by the bot itself, or not matching the grammar.
    NotCommand,
    /// Well-formed but no module owns the name.
    Unrecognized(String),
    /// Wrong argument count or missing role.
    Rejected(String),
    Help,
    Executed(String),
}

/// Per-message dispatcher shared by all message tasks.
pub struct Router {
    registry: ModuleRegistry,
    ignored: IgnoredUsers,
    transport: Arc<dyn ChatTransport>,
    bot_id: String,
}

impl Router {
    pub fn new(
        registry: ModuleRegistry,
        ignored: IgnoredUsers,
        transport: Arc<dyn ChatTransport>,
        bot_id: impl Into<String>,
    ) -> Self {
        Self {
            registry,
            ignored,
            transport,
            bot_id: bot_id.into(),
        }
    }

    pub fn registry(&self) -> &ModuleRegistry {
        &self.registry
    }

    /// Handle one inbound message.
    pub async fn handle(&self, message: &BotMessage) -> Dispatch {
        if self.ignored.contains(&message.author_id) {
            debug!("Dropping message from ignored user {}", message.author_id);
            return Dispatch::Ignored;
        }

        if message.is_self || !message.text.starts_with(SIGIL) {
            return Dispatch::NotCommand;
        }

        let Some(parsed) = parser::parse(&message.text) else {
            return Dispatch::NotCommand;
        };

        let invocation = Invocation::from(message);

        if RESERVED_NAMES.contains(&parsed.name.as_str()) {
            self.help(&invocation, parsed.args.first().map(String::as_str))
                .await;
            return Dispatch::Help;
        }

        let Some(module) = self.registry.module_for(&parsed.name) else {
            debug!("No module handles !{}", parsed.name);
            return Dispatch::Unrecognized(parsed.name);
        };

        let caller = if module.requires_roles(&parsed.name) {
            self.resolve_caller(&invocation).await
        } else {
            Caller::unresolved(&invocation.sender_id)
        };

        if !module.is_valid_call(&parsed.name, &parsed.args, &caller) {
            debug!("Rejected !{} from {}", parsed.name, invocation.sender_id);
            self.send(&invocation, &Reply::text(REJECTED_CALL)).await;
            return Dispatch::Rejected(parsed.name);
        }

        let ctx = self.context(&invocation);
        if let Err(e) = module.run(&parsed.name, &ctx, &parsed.args).await {
            error!("Dispatch of !{} failed: {}", parsed.name, e);
        }

        Dispatch::Executed(parsed.name)
    }

    /// `help` lists usable commands; `help <name>` shows one command's usage.
    async fn help(&self, invocation: &Invocation, topic: Option<&str>) {
        let topic = topic.map(str::trim).filter(|t| !t.is_empty());

        let reply = match topic {
            None => {
                let caller = if self.registry.has_gated_commands() {
                    self.resolve_caller(invocation).await
                } else {
                    Caller::unresolved(&invocation.sender_id)
                };

                let names: Vec<String> = self
                    .registry
                    .modules()
                    .iter()
                    .flat_map(|module| module.list_command_names(false, Some(&caller)))
                    .collect();

                format!("Available commands: {}", names.join(", "))
            }
            Some(name) => {
                let caller = match self.registry.module_for(name) {
                    Some(module) if module.requires_roles(name) => {
                        self.resolve_caller(invocation).await
                    }
                    _ => Caller::unresolved(&invocation.sender_id),
                };

                self.registry
                    .modules()
                    .iter()
                    .find(|module| module.supports_command(name) && module.is_authorized(name, &caller))
                    .and_then(|module| module.get_help(name).ok())
                    .unwrap_or_else(|| UNKNOWN_HELP_TOPIC.to_string())
            }
        };

        self.send(invocation, &Reply::Text(reply)).await;
    }

    async fn resolve_caller(&self, invocation: &Invocation) -> Caller {
        Caller::resolve(
            self.transport.as_ref(),
            invocation.guild_id.as_deref(),
            &invocation.sender_id,
        )
        .await
    }

    fn context<'a>(&'a self, invocation: &'a Invocation) -> CommandContext<'a> {
        CommandContext {
            invocation,
            transport: self.transport.as_ref(),
            bot_id: &self.bot_id,
        }
    }

    async fn send(&self, invocation: &Invocation, reply: &Reply) {
        if let Err(e) = self.transport.send(&invocation.channel_id, reply).await {
            error!("Failed to send reply: {}", e);
        }
    }
}
