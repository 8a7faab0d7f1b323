//! Failure-tolerant access to the long-term memory store.
//!
//! The relay must behave identically (minus recall context) with no store
//! configured, an empty store, or a store that errors or hangs. Every call
//! is bounded by the gateway's timeout, and every failure degrades:
//! recall yields an empty list, store yields `false`.

use std::future::Future;
use std::time::Duration;

use adabrain_types::error::MemoryError;
use adabrain_types::memory::MemoryRecord;

use crate::lazy::LazyShared;

use super::box_store::BoxMemoryStore;

/// Gateway in front of the process-wide memory store.
pub struct MemoryGateway {
    store: LazyShared<BoxMemoryStore>,
    timeout: Duration,
}

impl MemoryGateway {
    pub fn new(store: LazyShared<BoxMemoryStore>, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    /// A gateway with no store behind it. Recall is always empty.
    pub fn disabled() -> Self {
        Self::new(
            LazyShared::unavailable("memory store", "no memory store configured"),
            Duration::from_secs(1),
        )
    }

    /// Construct the store now instead of on first use.
    ///
    /// Returns whether a store is available.
    pub async fn warm(&self) -> bool {
        self.store.get().await.is_some()
    }

    /// Up to `limit` snippets relevant to `query` for `user_id`.
    ///
    /// Never fails: an absent, empty, failing or slow store yields an
    /// empty list. Never asks the store for more results than it holds.
    pub async fn recall(&self, user_id: &str, query: &str, limit: usize) -> Vec<String> {
        let Some(store) = self.store.get().await else {
            return Vec::new();
        };

        let held = match self.bounded(store.count()).await {
            Ok(n) => n,
            Err(err) => {
                tracing::debug!(error = %err, "Memory count failed, recalling nothing");
                return Vec::new();
            }
        };

        let wanted = limit.min(usize::try_from(held).unwrap_or(usize::MAX));
        if wanted == 0 {
            return Vec::new();
        }

        match self.bounded(store.query(user_id, query, wanted)).await {
            Ok(mut snippets) => {
                snippets.retain(|s| !s.is_empty());
                snippets.truncate(limit);
                snippets
            }
            Err(err) => {
                tracing::debug!(%user_id, error = %err, "Memory recall failed");
                Vec::new()
            }
        }
    }

    /// Persist `content` for `user_id`. Best effort: failures are logged
    /// and reported as `false`, never raised.
    pub async fn store(&self, user_id: &str, content: &str) -> bool {
        let Some(store) = self.store.get().await else {
            tracing::debug!(%user_id, "No memory store, dropping memory");
            return false;
        };

        let record = MemoryRecord::new(user_id, content);
        match self.bounded(store.add(&record)).await {
            Ok(()) => {
                tracing::debug!(%user_id, memory_id = %record.id, "Memory stored");
                true
            }
            Err(err) => {
                tracing::warn!(%user_id, error = %err, "Failed to store memory");
                false
            }
        }
    }

    /// Close the store if it was ever constructed.
    pub async fn shutdown(&self) {
        if let Some(store) = self.store.get_if_initialized() {
            store.close().await;
        }
    }

    async fn bounded<T>(
        &self,
        fut: impl Future<Output = Result<T, MemoryError>>,
    ) -> Result<T, MemoryError> {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(MemoryError::Timeout(self.timeout.as_millis() as u64)),
        }
    }
}
