//! MemoryStore trait definition.
//!
//! Stores user-scoped text snippets and answers free-text queries with a
//! ranked list of snippet contents. Ranking is the store's business.

use adabrain_types::error::MemoryError;
use adabrain_types::memory::MemoryRecord;

/// Trait for long-term memory backends.
///
/// Uses native async fn in traits (RPITIT, Rust 2024 edition).
/// Implementations live in adabrain-infra (e.g., `SqliteMemoryStore`).
pub trait MemoryStore: Send + Sync {
    /// Total number of records held, across all users.
    fn count(&self) -> impl std::future::Future<Output = Result<u64, MemoryError>> + Send;

    /// Up to `limit` snippet contents for `user_id`, most relevant first.
    fn query(
        &self,
        user_id: &str,
        query: &str,
        limit: usize,
    ) -> impl std::future::Future<Output = Result<Vec<String>, MemoryError>> + Send;

    /// Persist one record.
    fn add(
        &self,
        record: &MemoryRecord,
    ) -> impl std::future::Future<Output = Result<(), MemoryError>> + Send;

    /// Release connections. Called once at process shutdown.
    fn close(&self) -> impl std::future::Future<Output = ()> + Send;
}
