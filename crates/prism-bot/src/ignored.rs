//! In-memory mirror of the ignored-user table.

use crate::error::BotResult;
use parking_lot::RwLock;
use prism_store::{IgnoredUserRepository, StoreError};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

struct Inner {
    users: RwLock<Arc<HashSet<String>>>,
    /// Serializes writers so a storage write and its cache swap are atomic
    /// with respect to other writers.
    write_lock: Mutex<()>,
    repository: IgnoredUserRepository,
}

/// Users whose messages the router drops before parsing.
///
/// Readers take a snapshot of the current set; writers persist first and
/// then replace the whole set.
#[derive(Clone)]
pub struct IgnoredUsers {
    inner: Arc<Inner>,
}

impl IgnoredUsers {
    /// Load the current list from storage.
    pub async fn load(repository: IgnoredUserRepository) -> BotResult<Self> {
        let users: HashSet<String> = repository.all().await?.into_iter().collect();
        info!("Loaded {} ignored users", users.len());

        Ok(Self {
            inner: Arc::new(Inner {
                users: RwLock::new(Arc::new(users)),
                write_lock: Mutex::new(()),
                repository,
            }),
        })
    }

    pub fn snapshot(&self) -> Arc<HashSet<String>> {
        self.inner.users.read().clone()
    }

    pub fn contains(&self, user_id: &str) -> bool {
        self.snapshot().contains(user_id)
    }

    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot().is_empty()
    }

    /// Add `user_id`. Returns `false` if the user was already ignored.
    ///
    /// On a storage failure the cache is left unchanged.
    pub async fn add(&self, user_id: &str) -> BotResult<bool> {
        let _guard = self.inner.write_lock.lock().await;

        if self.contains(user_id) {
            return Ok(false);
        }

        let added = match self.inner.repository.add(user_id).await {
            Ok(()) => true,
            // Stored by someone else; still mirror it.
            Err(StoreError::Duplicate(_)) => false,
            Err(e) => return Err(e.into()),
        };

        self.swap(|users| {
            users.insert(user_id.to_string());
        });

        if added {
            info!("Ignoring user {}", user_id);
        }
        Ok(added)
    }

    /// Remove `user_id`. Returns `false` if the user was not ignored.
    ///
    /// On a storage failure the cache is left unchanged.
    pub async fn remove(&self, user_id: &str) -> BotResult<bool> {
        let _guard = self.inner.write_lock.lock().await;

        if !self.contains(user_id) {
            return Ok(false);
        }

        self.inner.repository.remove(user_id).await?;
        self.swap(|users| {
            users.remove(user_id);
        });

        info!("No longer ignoring user {}", user_id);
        Ok(true)
    }

    fn swap(&self, update: impl FnOnce(&mut HashSet<String>)) {
        let mut next = (*self.snapshot()).clone();
        update(&mut next);
        *self.inner.users.write() = Arc::new(next);
    }
}

impl std::fmt::Debug for IgnoredUsers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IgnoredUsers")
            .field("users", &self.snapshot())
            .finish()
    }
}
