//! Query parameters, result rows and stored records.

use crate::error::{StoreError, StoreResult};

/// A bound query parameter or a decoded column value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlValue {
    Null,
    Int(i64),
    Text(String),
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        SqlValue::Text(value.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        SqlValue::Text(value)
    }
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        SqlValue::Int(value)
    }
}

/// One result row, columns in select order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
    columns: Vec<(String, SqlValue)>,
}

impl Row {
    pub fn push(&mut self, name: impl Into<String>, value: SqlValue) {
        self.columns.push((name.into(), value));
    }

    /// Look up a column by name. Postgres folds unquoted identifiers to
    /// lower case, so the comparison ignores ASCII case.
    pub fn get(&self, name: &str) -> Option<&SqlValue> {
        self.columns
            .iter()
            .find(|(column, _)| column.eq_ignore_ascii_case(name))
            .map(|(_, value)| value)
    }

    pub fn get_str(&self, name: &str) -> StoreResult<&str> {
        match self.get(name) {
            Some(SqlValue::Text(value)) => Ok(value),
            Some(other) => Err(StoreError::Decode {
                column: name.to_string(),
                reason: format!("expected text, found {:?}", other),
            }),
            None => Err(StoreError::MissingColumn(name.to_string())),
        }
    }

    pub fn get_i64(&self, name: &str) -> StoreResult<i64> {
        match self.get(name) {
            Some(SqlValue::Int(value)) => Ok(*value),
            Some(SqlValue::Text(value)) => value.parse().map_err(|_| StoreError::Decode {
                column: name.to_string(),
                reason: format!("'{}' is not an integer", value),
            }),
            Some(SqlValue::Null) => Err(StoreError::Decode {
                column: name.to_string(),
                reason: "unexpected NULL".into(),
            }),
            None => Err(StoreError::MissingColumn(name.to_string())),
        }
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Outcome of a statement that returns no rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecResult {
    pub rows_affected: u64,
    /// Id of the inserted row, when the statement was an insert.
    pub last_insert_id: Option<i64>,
}

/// A saved quote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quote {
    pub id: i64,
    pub guild_id: String,
    pub author_id: String,
    pub channel_id: String,
    pub message_id: String,
}

impl Quote {
    pub(crate) fn from_row(row: &Row) -> StoreResult<Self> {
        Ok(Self {
            id: row.get_i64("id")?,
            guild_id: row.get_str("guild_id")?.to_string(),
            author_id: row.get_str("author_id")?.to_string(),
            channel_id: row.get_str("channel_id")?.to_string(),
            message_id: row.get_str("message_id")?.to_string(),
        })
    }
}

/// A quote about to be saved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewQuote {
    pub guild_id: String,
    pub author_id: String,
    pub channel_id: String,
    pub message_id: String,
}

/// Result of a conditional quote insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved,
    Duplicate,
}

/// A channel category that hosts topic channels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicCategory {
    pub category_id: String,
    pub primary_channel_id: String,
}
