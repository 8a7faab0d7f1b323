//! In-memory store for relay tests.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use adabrain_types::error::MemoryError;
use adabrain_types::memory::MemoryRecord;

use crate::lazy::LazyShared;

use super::box_store::BoxMemoryStore;
use super::gateway::MemoryGateway;
use super::store::MemoryStore;

/// Store that keeps records in a vector and returns them in insertion order.
#[derive(Clone, Default)]
pub(crate) struct FakeStore {
    records: Arc<Mutex<Vec<MemoryRecord>>>,
}

impl FakeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn gateway(&self) -> MemoryGateway {
        MemoryGateway::new(
            LazyShared::ready("memory store", BoxMemoryStore::new(self.clone())),
            Duration::from_secs(2),
        )
    }

    pub fn records(&self) -> Vec<MemoryRecord> {
        self.records.lock().unwrap().clone()
    }
}

impl MemoryStore for FakeStore {
    async fn count(&self) -> Result<u64, MemoryError> {
        Ok(self.records.lock().unwrap().len() as u64)
    }

    async fn query(
        &self,
        user_id: &str,
        _query: &str,
        limit: usize,
    ) -> Result<Vec<String>, MemoryError> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.user_id == user_id)
            .take(limit)
            .map(|r| r.content.clone())
            .collect())
    }

    async fn add(&self, record: &MemoryRecord) -> Result<(), MemoryError> {
        self.records.lock().unwrap().push(record.clone());
        Ok(())
    }

    async fn close(&self) {}
}
