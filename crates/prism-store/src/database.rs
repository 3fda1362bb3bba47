//! Backend-neutral database interface.

use crate::error::StoreResult;
use crate::postgres::PostgresDatabase;
use crate::sqlite::SqliteDatabase;
use crate::types::{ExecResult, Row, SqlValue};
use async_trait::async_trait;
use serde::Deserialize;
use std::fmt;
use std::sync::Arc;
use tracing::info;

/// Supported storage backends.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    Sqlite,
    Postgres,
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::Sqlite => write!(f, "sqlite"),
            Backend::Postgres => write!(f, "postgres"),
        }
    }
}

/// Row store used by the bot.
///
/// Statements are written with `?` placeholders; backends translate them
/// to their native syntax.
#[async_trait]
pub trait Database: Send + Sync {
    /// Which backend serves this handle.
    fn backend(&self) -> Backend;

    /// Run a query and return every row.
    async fn query_all(&self, sql: &str, params: &[SqlValue]) -> StoreResult<Vec<Row>>;

    /// Run a query and return the first row, if any.
    async fn query_one(&self, sql: &str, params: &[SqlValue]) -> StoreResult<Option<Row>>;

    /// Run a statement. Unique-constraint violations surface as
    /// [`StoreError::Duplicate`](crate::StoreError::Duplicate).
    async fn execute(&self, sql: &str, params: &[SqlValue]) -> StoreResult<ExecResult>;

    /// Close all connections.
    async fn close(&self);
}

/// Connect to the configured backend and make sure the schema exists.
pub async fn connect(
    backend: Backend,
    url: &str,
    max_connections: u32,
) -> StoreResult<Arc<dyn Database>> {
    let db: Arc<dyn Database> = match backend {
        Backend::Sqlite => Arc::new(SqliteDatabase::connect(url, max_connections).await?),
        Backend::Postgres => Arc::new(PostgresDatabase::connect(url, max_connections).await?),
    };

    info!("Connected to {} database", backend);
    Ok(db)
}
