//! Module registry built at startup.

use crate::error::{BotError, BotResult};
use crate::module::Module;
use std::collections::HashMap;
use tracing::info;

/// Names the router answers itself.
pub const RESERVED_NAMES: &[&str] = &["help", "h"];

/// The fixed, ordered module set and a name index over it.
#[derive(Debug)]
pub struct ModuleRegistry {
    modules: Vec<Module>,
    index: HashMap<String, usize>,
}

impl ModuleRegistry {
    /// Accept `modules` in order, rejecting any command name or alias that
    /// is reserved or already taken.
    pub fn new(modules: Vec<Module>) -> BotResult<Self> {
        let mut index = HashMap::new();

        for (position, module) in modules.iter().enumerate() {
            for name in module.commands().iter().flat_map(|cmd| cmd.names()) {
                if RESERVED_NAMES.contains(&name.as_str()) || index.contains_key(name) {
                    return Err(BotError::CommandCollision {
                        name: name.clone(),
                        module: module.name().to_string(),
                    });
                }
                index.insert(name.clone(), position);
            }

            info!(
                "Registered module {} ({} commands)",
                module.name(),
                module.commands().len()
            );
        }

        Ok(Self { modules, index })
    }

    /// Module owning `name`, by canonical name or alias.
    pub fn module_for(&self, name: &str) -> Option<&Module> {
        self.index.get(name).map(|&position| &self.modules[position])
    }

    /// Modules in registration order.
    pub fn modules(&self) -> &[Module] {
        &self.modules
    }

    /// Whether any registered command is role-gated.
    pub fn has_gated_commands(&self) -> bool {
        self.modules
            .iter()
            .flat_map(Module::commands)
            .any(|cmd| cmd.is_role_gated())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{Command, CommandContext, CommandHandler};
    use crate::reply::Reply;
    use async_trait::async_trait;

    struct Noop;

    #[async_trait]
    impl CommandHandler for Noop {
        async fn execute(&self, _ctx: &CommandContext<'_>, _args: &[String]) -> BotResult<Reply> {
            Ok(Reply::text("ok"))
        }
    }

    #[test]
    fn test_index_covers_aliases() {
        let registry = ModuleRegistry::new(vec![
            Module::new("Quotes").with_command(Command::new("random", Noop).alias("r")),
            Module::new("Silly").with_command(Command::new("power", Noop).alias("p")),
        ])
        .unwrap();

        assert_eq!(registry.module_for("r").map(Module::name), Some("Quotes"));
        assert_eq!(registry.module_for("power").map(Module::name), Some("Silly"));
        assert!(registry.module_for("unknown").is_none());
        assert!(!registry.has_gated_commands());
    }

    #[test]
    fn test_cross_module_collision_is_rejected() {
        let result = ModuleRegistry::new(vec![
            Module::new("Quotes").with_command(Command::new("random", Noop).alias("r")),
            Module::new("Silly").with_command(Command::new("roll", Noop).alias("r")),
        ]);

        match result {
            Err(BotError::CommandCollision { name, module }) => {
                assert_eq!(name, "r");
                assert_eq!(module, "Silly");
            }
            other => panic!("expected collision, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_duplicate_within_module_is_rejected() {
        let result = ModuleRegistry::new(vec![Module::new("Quotes")
            .with_command(Command::new("quote", Noop).alias("q"))
            .with_command(Command::new("query", Noop).alias("q"))]);

        assert!(matches!(result, Err(BotError::CommandCollision { .. })));
    }

    #[test]
    fn test_reserved_names_are_rejected() {
        let result = ModuleRegistry::new(vec![
            Module::new("Silly").with_command(Command::new("hug", Noop).alias("h"))
        ]);

        assert!(matches!(
            result,
            Err(BotError::CommandCollision { name, .. }) if name == "h"
        ));
    }
}
