//! Typed access to the bot's tables.

mod ignored_users;
mod quotes;
mod topics;

pub use ignored_users::IgnoredUserRepository;
pub use quotes::QuoteRepository;
pub use topics::TopicRepository;
