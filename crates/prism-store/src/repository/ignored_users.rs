//! Users whose messages the bot ignores.

use crate::database::Database;
use crate::error::StoreResult;
use std::sync::Arc;
use tracing::instrument;

#[derive(Clone)]
pub struct IgnoredUserRepository {
    db: Arc<dyn Database>,
}

impl IgnoredUserRepository {
    pub fn new(db: Arc<dyn Database>) -> Self {
        Self { db }
    }

    pub async fn all(&self) -> StoreResult<Vec<String>> {
        let rows = self
            .db
            .query_all("SELECT user_id FROM ignored_user ORDER BY id", &[])
            .await?;

        rows.iter()
            .map(|row| row.get_str("user_id").map(str::to_string))
            .collect()
    }

    /// Fails with [`StoreError::Duplicate`](crate::StoreError::Duplicate)
    /// if the user is already stored.
    #[instrument(skip(self))]
    pub async fn add(&self, user_id: &str) -> StoreResult<()> {
        self.db
            .execute(
                "INSERT INTO ignored_user (user_id) VALUES (?)",
                &[user_id.into()],
            )
            .await?;
        Ok(())
    }

    /// Returns whether a row was removed.
    #[instrument(skip(self))]
    pub async fn remove(&self, user_id: &str) -> StoreResult<bool> {
        let result = self
            .db
            .execute(
                "DELETE FROM ignored_user WHERE user_id = ?",
                &[user_id.into()],
            )
            .await?;
        Ok(result.rows_affected > 0)
    }
}
