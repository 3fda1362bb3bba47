//! Prism: a Discord bot that saves and recalls quotes.
//!
//! Messages flow from the [`discord_client::MessageReceiver`] into the
//! [`Router`], which parses `!name args` commands, finds the owning
//! [`Module`] through the [`ModuleRegistry`] and runs the command.

pub mod argument;
pub mod caller;
pub mod command;
pub mod config;
pub mod error;
pub mod ignored;
pub mod module;
pub mod modules;
pub mod parser;
pub mod registry;
pub mod reply;
pub mod router;
pub mod transport;

pub use argument::Argument;
pub use caller::Caller;
pub use command::{Command, CommandContext, CommandHandler, Invocation};
pub use config::Config;
pub use error::{BotError, BotResult};
pub use ignored::IgnoredUsers;
pub use module::Module;
pub use registry::ModuleRegistry;
pub use reply::{Card, Reply};
pub use router::{Dispatch, Router};
pub use transport::{ChatTransport, DiscordTransport};
