//! The bot's capability modules.

mod management;
mod quotes;
mod silly;
mod topics;

pub use management::{management_module, AddIgnoredUser, RemoveIgnoredUser};
pub use quotes::{quotes_module, GetQuote, RandomQuote, SaveQuote};
pub use silly::{silly_module, UnlimitedPower};
pub use topics::{topics_module, AddTopic, AddTopicCategory, SeeTopicCategories};

use crate::ignored::IgnoredUsers;
use crate::module::Module;
use prism_store::{Database, QuoteRepository, TopicRepository};
use std::sync::Arc;

/// All modules, in registration order.
pub fn standard_modules(
    db: Arc<dyn Database>,
    ignored: IgnoredUsers,
    commander_role: &str,
) -> Vec<Module> {
    vec![
        quotes_module(QuoteRepository::new(db.clone())),
        silly_module(),
        management_module(ignored, commander_role),
        topics_module(TopicRepository::new(db), commander_role),
    ]
}
