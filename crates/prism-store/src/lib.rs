//! Relational storage for the Prism bot.
//!
//! Statements go through the [`Database`] trait so the same repositories run
//! on SQLite and PostgreSQL. The schema is created on connect.

mod database;
mod error;
mod postgres;
mod repository;
mod sqlite;
mod types;

pub use database::{connect, Backend, Database};
pub use error::{StoreError, StoreResult};
pub use postgres::{rewrite_placeholders, PostgresDatabase};
pub use repository::{IgnoredUserRepository, QuoteRepository, TopicRepository};
pub use sqlite::SqliteDatabase;
pub use types::*;
