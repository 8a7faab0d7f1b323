//! BoxMemoryStore -- object-safe dynamic dispatch wrapper for MemoryStore.
//!
//! Same blanket-impl pattern as `BoxAgentBackend`:
//! 1. Define an object-safe `MemoryStoreDyn` trait with boxed futures
//! 2. Blanket-impl `MemoryStoreDyn` for all `T: MemoryStore`
//! 3. `BoxMemoryStore` wraps `Box<dyn MemoryStoreDyn>` and delegates

use std::future::Future;
use std::pin::Pin;

use adabrain_types::error::MemoryError;
use adabrain_types::memory::MemoryRecord;

use super::store::MemoryStore;

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Object-safe version of [`MemoryStore`] with boxed futures.
pub trait MemoryStoreDyn: Send + Sync {
    fn count_boxed(&self) -> BoxFuture<'_, Result<u64, MemoryError>>;

    fn query_boxed<'a>(
        &'a self,
        user_id: &'a str,
        query: &'a str,
        limit: usize,
    ) -> BoxFuture<'a, Result<Vec<String>, MemoryError>>;

    fn add_boxed<'a>(&'a self, record: &'a MemoryRecord) -> BoxFuture<'a, Result<(), MemoryError>>;

    fn close_boxed(&self) -> BoxFuture<'_, ()>;
}

impl<T: MemoryStore> MemoryStoreDyn for T {
    fn count_boxed(&self) -> BoxFuture<'_, Result<u64, MemoryError>> {
        Box::pin(self.count())
    }

    fn query_boxed<'a>(
        &'a self,
        user_id: &'a str,
        query: &'a str,
        limit: usize,
    ) -> BoxFuture<'a, Result<Vec<String>, MemoryError>> {
        Box::pin(self.query(user_id, query, limit))
    }

    fn add_boxed<'a>(&'a self, record: &'a MemoryRecord) -> BoxFuture<'a, Result<(), MemoryError>> {
        Box::pin(self.add(record))
    }

    fn close_boxed(&self) -> BoxFuture<'_, ()> {
        Box::pin(self.close())
    }
}

/// Type-erased memory store, selected at runtime.
pub struct BoxMemoryStore {
    inner: Box<dyn MemoryStoreDyn>,
}

impl BoxMemoryStore {
    pub fn new<T: MemoryStore + 'static>(store: T) -> Self {
        Self {
            inner: Box::new(store),
        }
    }

    pub async fn count(&self) -> Result<u64, MemoryError> {
        self.inner.count_boxed().await
    }

    pub async fn query(
        &self,
        user_id: &str,
        query: &str,
        limit: usize,
    ) -> Result<Vec<String>, MemoryError> {
        self.inner.query_boxed(user_id, query, limit).await
    }

    pub async fn add(&self, record: &MemoryRecord) -> Result<(), MemoryError> {
        self.inner.add_boxed(record).await
    }

    pub async fn close(&self) {
        self.inner.close_boxed().await
    }
}
