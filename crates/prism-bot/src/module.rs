//! Named groups of related commands.

use crate::caller::Caller;
use crate::command::{Command, CommandContext};
use crate::error::{BotError, BotResult};
use tracing::error;

/// A fixed collection of commands. Built once at startup.
#[derive(Debug)]
pub struct Module {
    name: String,
    commands: Vec<Command>,
}

impl Module {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            commands: Vec::new(),
        }
    }

    pub fn with_command(mut self, command: Command) -> Self {
        self.commands.push(command);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Resolve a canonical name or alias.
    pub fn command(&self, name: &str) -> Option<&Command> {
        self.commands.iter().find(|cmd| cmd.matches_name(name))
    }

    pub fn supports_command(&self, name: &str) -> bool {
        self.command(name).is_some()
    }

    /// Argument count and authorization both pass.
    pub fn is_valid_call(&self, name: &str, args: &[String], caller: &Caller) -> bool {
        self.command(name)
            .is_some_and(|cmd| cmd.validate_argument_count(args) && cmd.is_authorized(caller))
    }

    pub fn is_authorized(&self, name: &str, caller: &Caller) -> bool {
        self.command(name).is_some_and(|cmd| cmd.is_authorized(caller))
    }

    /// Whether authorizing `name` needs the caller's roles.
    pub fn requires_roles(&self, name: &str) -> bool {
        self.command(name).is_some_and(Command::is_role_gated)
    }

    /// Execute `name`. Callers route here only after [`Self::supports_command`].
    pub async fn run(&self, name: &str, ctx: &CommandContext<'_>, args: &[String]) -> BotResult<()> {
        let Some(cmd) = self.command(name) else {
            debug_assert!(false, "module {} routed unknown command {}", self.name, name);
            error!("Module {} has no command {}", self.name, name);
            return Err(BotError::CommandNotFound(name.to_string()));
        };

        cmd.execute(ctx, args).await;
        Ok(())
    }

    /// Command names, optionally with aliases, optionally only those
    /// `caller` may use.
    pub fn list_command_names(&self, include_aliases: bool, caller: Option<&Caller>) -> Vec<String> {
        self.commands
            .iter()
            .filter(|cmd| caller.map_or(true, |caller| cmd.is_authorized(caller)))
            .flat_map(|cmd| {
                let names = if include_aliases {
                    cmd.names()
                } else {
                    &cmd.names()[..1]
                };
                names.iter().cloned()
            })
            .collect()
    }

    pub fn get_help(&self, name: &str) -> BotResult<String> {
        self.command(name)
            .map(Command::render_help)
            .ok_or_else(|| BotError::CommandNotFound(name.to_string()))
    }
}
