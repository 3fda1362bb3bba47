//! Saved quotes.

use crate::database::Database;
use crate::error::{StoreError, StoreResult};
use crate::types::{NewQuote, Quote, SaveOutcome, SqlValue};
use std::sync::Arc;
use tracing::{debug, info, instrument};

#[derive(Clone)]
pub struct QuoteRepository {
    db: Arc<dyn Database>,
}

impl QuoteRepository {
    pub fn new(db: Arc<dyn Database>) -> Self {
        Self { db }
    }

    /// Whether a quote already references `message_id`.
    #[instrument(skip(self))]
    pub async fn exists(&self, message_id: &str) -> StoreResult<bool> {
        let row = self
            .db
            .query_one(
                "SELECT id FROM quote WHERE message_id = ?",
                &[message_id.into()],
            )
            .await?;
        Ok(row.is_some())
    }

    /// Insert unconditionally, returning the new row id.
    #[instrument(skip(self, quote), fields(message_id = %quote.message_id))]
    pub async fn insert(&self, quote: &NewQuote) -> StoreResult<i64> {
        let result = self
            .db
            .execute(
                "INSERT INTO quote (guild_id, author_id, channel_id, message_id) VALUES (?, ?, ?, ?)",
                &[
                    quote.guild_id.as_str().into(),
                    quote.author_id.as_str().into(),
                    quote.channel_id.as_str().into(),
                    quote.message_id.as_str().into(),
                ],
            )
            .await?;

        result
            .last_insert_id
            .ok_or_else(|| StoreError::MissingColumn("id".into()))
    }

    /// Save a quote unless its message was already quoted.
    ///
    /// The existence check and the insert are separate statements; a
    /// concurrent save of the same message loses at the unique constraint
    /// and is reported as a duplicate as well.
    pub async fn save(&self, quote: &NewQuote) -> StoreResult<SaveOutcome> {
        if self.exists(&quote.message_id).await? {
            debug!("Message {} already quoted", quote.message_id);
            return Ok(SaveOutcome::Duplicate);
        }

        match self.insert(quote).await {
            Ok(id) => {
                info!("Saved quote {} for guild {}", id, quote.guild_id);
                Ok(SaveOutcome::Saved)
            }
            Err(StoreError::Duplicate(_)) => Ok(SaveOutcome::Duplicate),
            Err(e) => Err(e),
        }
    }

    /// Quotes of a guild, optionally restricted to one author.
    #[instrument(skip(self))]
    pub async fn for_guild(&self, guild_id: &str, author_id: Option<&str>) -> StoreResult<Vec<Quote>> {
        const COLUMNS: &str = "SELECT id, guild_id, author_id, channel_id, message_id FROM quote";

        let rows = match author_id {
            Some(author_id) => {
                self.db
                    .query_all(
                        &format!("{COLUMNS} WHERE guild_id = ? AND author_id = ? ORDER BY id"),
                        &[guild_id.into(), author_id.into()],
                    )
                    .await?
            }
            None => {
                self.db
                    .query_all(
                        &format!("{COLUMNS} WHERE guild_id = ? ORDER BY id"),
                        &[SqlValue::from(guild_id)],
                    )
                    .await?
            }
        };

        rows.iter().map(Quote::from_row).collect()
    }
}
