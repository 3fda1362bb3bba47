//! Ignored-user management.

use crate::argument::Argument;
use crate::command::{arg, Command, CommandContext, CommandHandler};
use crate::error::BotResult;
use crate::ignored::IgnoredUsers;
use crate::module::Module;
use crate::reply::Reply;
use crate::router::REJECTED_CALL;
use async_trait::async_trait;
use tracing::error;

const UPDATE_FAILED: &str = "Unable to update the ignored user list.";

pub struct AddIgnoredUser {
    ignored: IgnoredUsers,
}

impl AddIgnoredUser {
    pub fn new(ignored: IgnoredUsers) -> Self {
        Self { ignored }
    }
}

#[async_trait]
impl CommandHandler for AddIgnoredUser {
    async fn execute(&self, _ctx: &CommandContext<'_>, args: &[String]) -> BotResult<Reply> {
        let Some(user_id) = arg(args, 0) else {
            return Ok(Reply::text(REJECTED_CALL));
        };

        let text = match self.ignored.add(user_id).await {
            Ok(true) => "User added to ignore list.",
            Ok(false) => "User is already on the ignored list.",
            Err(e) => {
                error!("Failed to ignore {}: {}", user_id, e);
                UPDATE_FAILED
            }
        };

        Ok(Reply::text(text))
    }
}

pub struct RemoveIgnoredUser {
    ignored: IgnoredUsers,
}

impl RemoveIgnoredUser {
    pub fn new(ignored: IgnoredUsers) -> Self {
        Self { ignored }
    }
}

#[async_trait]
impl CommandHandler for RemoveIgnoredUser {
    async fn execute(&self, _ctx: &CommandContext<'_>, args: &[String]) -> BotResult<Reply> {
        let Some(user_id) = arg(args, 0) else {
            return Ok(Reply::text(REJECTED_CALL));
        };

        let text = match self.ignored.remove(user_id).await {
            Ok(true) => "User removed from ignore list.",
            Ok(false) => "User is not on the ignored list.",
            Err(e) => {
                error!("Failed to unignore {}: {}", user_id, e);
                UPDATE_FAILED
            }
        };

        Ok(Reply::text(text))
    }
}

pub fn management_module(ignored: IgnoredUsers, commander_role: &str) -> Module {
    Module::new("Management")
        .with_command(
            Command::new("addignoreduser", AddIgnoredUser::new(ignored.clone()))
                .alias("aiu")
                .argument(Argument::required("userId"))
                .require_role(commander_role)
                .help("Add a user to the ignored user list by id."),
        )
        .with_command(
            Command::new("removeignoreduser", RemoveIgnoredUser::new(ignored))
                .alias("riu")
                .argument(Argument::required("userId"))
                .require_role(commander_role)
                .help("Remove a user from the ignored user list by id."),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::Invocation;
    use crate::transport::MockChatTransport;
    use prism_store::{Database, IgnoredUserRepository, SqliteDatabase};
    use std::sync::Arc;

    async fn ignored() -> IgnoredUsers {
        let db: Arc<dyn Database> = Arc::new(SqliteDatabase::in_memory().await.unwrap());
        IgnoredUsers::load(IgnoredUserRepository::new(db)).await.unwrap()
    }

    async fn run(handler: &dyn CommandHandler, user_id: &str) -> Reply {
        let transport = MockChatTransport::new();
        let inv = Invocation {
            raw_text: format!("!aiu {}", user_id),
            sender_id: "7".into(),
            guild_id: Some("1".into()),
            channel_id: "100".into(),
            message_id: "500".into(),
        };
        let ctx = CommandContext {
            invocation: &inv,
            transport: &transport,
            bot_id: "999",
        };
        handler.execute(&ctx, &[user_id.to_string()]).await.unwrap()
    }

    #[tokio::test]
    async fn test_add_and_remove_ignored_user() {
        let ignored = ignored().await;
        let add = AddIgnoredUser::new(ignored.clone());
        let remove = RemoveIgnoredUser::new(ignored.clone());

        assert_eq!(run(&add, "42").await, Reply::text("User added to ignore list."));
        assert_eq!(
            run(&add, "42").await,
            Reply::text("User is already on the ignored list.")
        );
        assert!(ignored.contains("42"));

        assert_eq!(run(&remove, "42").await, Reply::text("User removed from ignore list."));
        assert_eq!(
            run(&remove, "42").await,
            Reply::text("User is not on the ignored list.")
        );
        assert!(!ignored.contains("42"));
    }

    #[tokio::test]
    async fn test_commands_require_commander_role() {
        let module = management_module(ignored().await, "Prism Commander");

        assert!(module.requires_roles("aiu"));
        assert!(module.requires_roles("removeignoreduser"));
        assert_eq!(
            module.get_help("riu").unwrap(),
            "!removeignoreduser userId - Remove a user from the ignored user list by id."
        );
    }
}
