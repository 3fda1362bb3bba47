//! Topic categories, topics and their roles.

use crate::database::Database;
use crate::error::{StoreError, StoreResult};
use crate::types::TopicCategory;
use std::sync::Arc;
use tracing::{info, instrument};

#[derive(Clone)]
pub struct TopicRepository {
    db: Arc<dyn Database>,
}

impl TopicRepository {
    pub fn new(db: Arc<dyn Database>) -> Self {
        Self { db }
    }

    pub async fn category_exists(&self, category_id: &str) -> StoreResult<bool> {
        let row = self
            .db
            .query_one(
                "SELECT id FROM topic_category WHERE category_id = ?",
                &[category_id.into()],
            )
            .await?;
        Ok(row.is_some())
    }

    #[instrument(skip(self))]
    pub async fn add_category(&self, category_id: &str, primary_channel_id: &str) -> StoreResult<()> {
        self.db
            .execute(
                "INSERT INTO topic_category (category_id, primary_channel_id) VALUES (?, ?)",
                &[category_id.into(), primary_channel_id.into()],
            )
            .await?;
        info!("Registered topic category {}", category_id);
        Ok(())
    }

    pub async fn categories(&self) -> StoreResult<Vec<TopicCategory>> {
        let rows = self
            .db
            .query_all(
                "SELECT category_id, primary_channel_id FROM topic_category ORDER BY id",
                &[],
            )
            .await?;

        rows.iter()
            .map(|row| {
                Ok(TopicCategory {
                    category_id: row.get_str("category_id")?.to_string(),
                    primary_channel_id: row.get_str("primary_channel_id")?.to_string(),
                })
            })
            .collect()
    }

    /// Topic names are compared lower-cased.
    pub async fn topic_exists(&self, name: &str) -> StoreResult<bool> {
        let row = self
            .db
            .query_one(
                "SELECT id FROM topic WHERE name = ?",
                &[name.to_lowercase().into()],
            )
            .await?;
        Ok(row.is_some())
    }

    /// Store a topic under `category_id` and return its id.
    #[instrument(skip(self))]
    pub async fn add_topic(&self, name: &str, category_id: &str) -> StoreResult<i64> {
        let result = self
            .db
            .execute(
                "INSERT INTO topic (name, topic_category_id) VALUES (?, ?)",
                &[name.to_lowercase().into(), category_id.into()],
            )
            .await?;

        result
            .last_insert_id
            .ok_or_else(|| StoreError::MissingColumn("id".into()))
    }

    #[instrument(skip(self))]
    pub async fn add_topic_role(&self, topic_id: i64, role_id: &str) -> StoreResult<()> {
        self.db
            .execute(
                "INSERT INTO topic_role (role_id, topic_id) VALUES (?, ?)",
                &[role_id.into(), topic_id.into()],
            )
            .await?;
        Ok(())
    }
}
