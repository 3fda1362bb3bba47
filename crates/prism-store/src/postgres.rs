//! PostgreSQL backend.

use crate::database::{Backend, Database};
use crate::error::{map_sqlx_error, StoreError, StoreResult};
use crate::types::{ExecResult, Row, SqlValue};
use async_trait::async_trait;
use sqlx::postgres::{PgArguments, PgPool, PgPoolOptions, PgRow};
use sqlx::query::Query;
use sqlx::{Column, Postgres, Row as _, TypeInfo, ValueRef};
use tracing::{debug, instrument};

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS quote (
        id BIGSERIAL PRIMARY KEY,
        guild_id TEXT NOT NULL,
        author_id TEXT NOT NULL,
        channel_id TEXT NOT NULL,
        message_id TEXT NOT NULL UNIQUE
    )",
    "CREATE INDEX IF NOT EXISTS quote_guild_author ON quote (guild_id, author_id)",
    "CREATE TABLE IF NOT EXISTS ignored_user (
        id BIGSERIAL PRIMARY KEY,
        user_id TEXT NOT NULL UNIQUE
    )",
    "CREATE TABLE IF NOT EXISTS topic_category (
        id BIGSERIAL PRIMARY KEY,
        category_id TEXT NOT NULL UNIQUE,
        primary_channel_id TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS topic (
        id BIGSERIAL PRIMARY KEY,
        name TEXT NOT NULL UNIQUE,
        topic_category_id TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS topic_role (
        id BIGSERIAL PRIMARY KEY,
        role_id TEXT NOT NULL,
        topic_id BIGINT NOT NULL REFERENCES topic (id)
    )",
];

/// PostgreSQL-backed row store.
#[derive(Clone)]
pub struct PostgresDatabase {
    pool: PgPool,
}

impl PostgresDatabase {
    pub async fn connect(url: &str, max_connections: u32) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections.max(1))
            .connect(url)
            .await?;

        let db = Self { pool };
        db.ensure_schema().await?;
        Ok(db)
    }

    async fn ensure_schema(&self) -> StoreResult<()> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        debug!("Postgres schema ready");
        Ok(())
    }
}

/// Translate `?` placeholders into `$1, $2, ...`.
///
/// Question marks inside single-quoted literals are left alone.
pub fn rewrite_placeholders(sql: &str) -> String {
    let mut out = String::with_capacity(sql.len() + 8);
    let mut in_literal = false;
    let mut n = 0;

    for c in sql.chars() {
        match c {
            '\'' => {
                in_literal = !in_literal;
                out.push(c);
            }
            '?' if !in_literal => {
                n += 1;
                out.push('$');
                out.push_str(&n.to_string());
            }
            _ => out.push(c),
        }
    }

    out
}

fn is_insert(sql: &str) -> bool {
    sql.trim_start().to_ascii_uppercase().starts_with("INSERT")
}

fn bind_params<'q>(
    mut query: Query<'q, Postgres, PgArguments>,
    params: &[SqlValue],
) -> Query<'q, Postgres, PgArguments> {
    for param in params {
        query = match param {
            SqlValue::Null => query.bind(None::<String>),
            SqlValue::Int(value) => query.bind(*value),
            SqlValue::Text(value) => query.bind(value.clone()),
        };
    }
    query
}

fn decode_row(row: &PgRow) -> StoreResult<Row> {
    let mut out = Row::default();

    for column in row.columns() {
        let idx = column.ordinal();
        let raw = row.try_get_raw(idx)?;

        let value = if raw.is_null() {
            SqlValue::Null
        } else if let Ok(value) = row.try_get::<i64, _>(idx) {
            SqlValue::Int(value)
        } else if let Ok(value) = row.try_get::<i32, _>(idx) {
            SqlValue::Int(value.into())
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
impl Database for PostgresDatabase {
    fn backend(&self) -> Backend {
        Backend::Postgres
    }

    #[instrument(skip(self, params))]
    async fn query_all(&self, sql: &str, params: &[SqlValue]) -> StoreResult<Vec<Row>> {
        let sql = rewrite_placeholders(sql);
        let rows = bind_params(sqlx::query(&sql), params)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(decode_row).collect()
    }

    #[instrument(skip(self, params))]
    async fn query_one(&self, sql: &str, params: &[SqlValue]) -> StoreResult<Option<Row>> {
        let sql = rewrite_placeholders(sql);
        let row = bind_params(sqlx::query(&sql), params)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(decode_row).transpose()
    }

    #[instrument(skip(self, params))]
    async fn execute(&self, sql: &str, params: &[SqlValue]) -> StoreResult<ExecResult> {
        let mut rewritten = rewrite_placeholders(sql);

        // Postgres has no last-insert-rowid; ask for the id explicitly.
        if is_insert(sql) {
            rewritten.push_str(" RETURNING id");
            let row = bind_params(sqlx::query(&rewritten), params)
                .fetch_one(&self.pool)
                .await
                .map_err(map_sqlx_error)?;
            let id = decode_row(&row)?.get_i64("id")?;

            return Ok(ExecResult {
                rows_affected: 1,
                last_insert_id: Some(id),
            });
        }

        let result = bind_params(sqlx::query(&rewritten), params)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(ExecResult {
            rows_affected: result.rows_affected(),
            last_insert_id: None,
        })
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}
