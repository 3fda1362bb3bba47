//! SQLite backend.

use crate::database::{Backend, Database};
use crate::error::{map_sqlx_error, StoreError, StoreResult};
use crate::types::{ExecResult, Row, SqlValue};
use async_trait::async_trait;
use sqlx::query::Query;
use sqlx::sqlite::{SqliteArguments, SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Column, Row as _, Sqlite, SqlitePool, TypeInfo, ValueRef};
use std::str::FromStr;
use tracing::{debug, instrument};

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS quote (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        guild_id TEXT NOT NULL,
        author_id TEXT NOT NULL,
        channel_id TEXT NOT NULL,
        message_id TEXT NOT NULL UNIQUE
    )",
    "CREATE INDEX IF NOT EXISTS quote_guild_author ON quote (guild_id, author_id)",
    "CREATE TABLE IF NOT EXISTS ignored_user (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id TEXT NOT NULL UNIQUE
    )",
    "CREATE TABLE IF NOT EXISTS topic_category (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        category_id TEXT NOT NULL UNIQUE,
        primary_channel_id TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS topic (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE,
        topic_category_id TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS topic_role (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        role_id TEXT NOT NULL,
        topic_id INTEGER NOT NULL REFERENCES topic (id)
    )",
];

/// SQLite-backed row store.
#[derive(Clone)]
pub struct SqliteDatabase {
    pool: SqlitePool,
}

impl SqliteDatabase {
    /// Open (creating if needed) the database file named by `url`.
    pub async fn connect(url: &str, max_connections: u32) -> StoreResult<Self> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);

        if let Some(parent) = options.get_filename().parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections.max(1))
            .connect_with(options)
            .await?;

        let db = Self { pool };
        db.ensure_schema().await?;
        Ok(db)
    }

    /// Private in-memory database.
    ///
    /// Every SQLite connection to `:memory:` is a separate database, so the
    /// pool is pinned to a single connection that never expires.
    pub async fn in_memory() -> StoreResult<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        let db = Self { pool };
        db.ensure_schema().await?;
        Ok(db)
    }

    async fn ensure_schema(&self) -> StoreResult<()> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        debug!("SQLite schema ready");
        Ok(())
    }
}

fn bind_params<'q>(
    mut query: Query<'q, Sqlite, SqliteArguments<'q>>,
    params: &[SqlValue],
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    for param in params {
        query = match param {
            SqlValue::Null => query.bind(None::<String>),
            SqlValue::Int(value) => query.bind(*value),
            SqlValue::Text(value) => query.bind(value.clone()),
        };
    }
    query
}

fn decode_row(row: &SqliteRow) -> StoreResult<Row> {
    let mut out = Row::default();

    for column in row.columns() {
        let idx = column.ordinal();
        let raw = row.try_get_raw(idx)?;

        let value = if raw.is_null() {
            SqlValue::Null
        } else if let Ok(value) = row.try_get::<i64, _>(idx) {
            SqlValue::Int(value)
        } else if let Ok(value) = row.try_get::<String, _>(idx) {
            SqlValue::Text(value)
        } else {
            return Err(StoreError::Decode {
                column: column.name().to_string(),
                reason: format!("unsupported type {}", raw.type_info().name()),
            });
        };

        out.push(column.name(), value);
    }

    Ok(out)
}

#[async_trait]
impl Database for SqliteDatabase {
    fn backend(&self) -> Backend {
        Backend::Sqlite
    }

    #[instrument(skip(self, params))]
    async fn query_all(&self, sql: &str, params: &[SqlValue]) -> StoreResult<Vec<Row>> {
        let rows = bind_params(sqlx::query(sql), params)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(decode_row).collect()
    }

    #[instrument(skip(self, params))]
    async fn query_one(&self, sql: &str, params: &[SqlValue]) -> StoreResult<Option<Row>> {
        let row = bind_params(sqlx::query(sql), params)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(decode_row).transpose()
    }

    #[instrument(skip(self, params))]
    async fn execute(&self, sql: &str, params: &[SqlValue]) -> StoreResult<ExecResult> {
        let result = bind_params(sqlx::query(sql), params)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        let is_insert = sql.trim_start().to_ascii_uppercase().starts_with("INSERT");
        Ok(ExecResult {
            rows_affected: result.rows_affected(),
            last_insert_id: is_insert.then(|| result.last_insert_rowid()),
        })
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}
