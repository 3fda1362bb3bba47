//! Silly commands.

use crate::command::{Command, CommandContext, CommandHandler};
use crate::error::BotResult;
use crate::module::Module;
use crate::reply::Reply;
use async_trait::async_trait;

pub const UNLIMITED_POWER_GIF: &str =
    "https://giphy.com/gifs/power-highqualitygifs-unlimited-hokMyu1PAKfJK";

pub struct UnlimitedPower;

#[async_trait]
impl CommandHandler for UnlimitedPower {
    async fn execute(&self, _ctx: &CommandContext<'_>, _args: &[String]) -> BotResult<Reply> {
        Ok(Reply::text(UNLIMITED_POWER_GIF))
    }
}

pub fn silly_module() -> Module {
    Module::new("Silly").with_command(
        Command::new("power", UnlimitedPower)
            .alias("p")
            .help("U N L I M I T E D P O W E R"),
    )
}
