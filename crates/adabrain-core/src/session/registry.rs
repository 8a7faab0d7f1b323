//! Process-wide map of live connections to their sessions.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use tokio::sync::Mutex;

use super::state::Session;

/// Opaque identifier of one client connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// A session shared between the connection task and the registry.
///
/// Only the owning connection ever locks it during normal operation, so
/// messages from one client are processed strictly in arrival order.
pub type SharedSession = Arc<Mutex<Session>>;

/// Registry of live sessions, keyed by connection.
///
/// An entry exists exactly while its connection is open.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    next_id: AtomicU64,
    sessions: DashMap<ConnectionId, SharedSession>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a fresh session for a newly opened connection.
    pub fn open(&self) -> (ConnectionId, SharedSession) {
        let id = ConnectionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let session = Arc::new(Mutex::new(Session::new()));
        self.sessions.insert(id, Arc::clone(&session));
        (id, session)
    }

    /// Remove the entry for `id`. Returns the session if it was present.
    pub fn close(&self, id: ConnectionId) -> Option<SharedSession> {
        self.sessions.remove(&id).map(|(_, session)| session)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Remove and return every entry.
    pub fn drain(&self) -> Vec<(ConnectionId, SharedSession)> {
        let ids: Vec<ConnectionId> = self.sessions.iter().map(|entry| *entry.key()).collect();
        ids.into_iter()
            .filter_map(|id| self.close(id).map(|session| (id, session)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_assigns_distinct_ids() {
        let registry = SessionRegistry::new();
        let (a, _) = registry.open();
        let (b, _) = registry.open();
        assert_ne!(a, b);
        assert_eq!(registry.len(), 2);
        assert_eq!(a.to_string(), "conn-0");
    }

    #[test]
    fn test_close_removes_entry_once() {
        let registry = SessionRegistry::new();
        let (id, _) = registry.open();
        assert!(registry.close(id).is_some());
        assert!(registry.close(id).is_none());
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_registered_session_is_shared() {
        let registry = SessionRegistry::new();
        let (id, session) = registry.open();
        session.lock().await.authenticate("u1");

        let closed = registry.close(id).unwrap();
        assert!(Arc::ptr_eq(&closed, &session));
        assert_eq!(closed.lock().await.user_id(), "u1");
    }

    #[test]
    fn test_drain_empties_registry() {
        let registry = SessionRegistry::new();
        for _ in 0..3 {
            registry.open();
        }
        let drained = registry.drain();
        assert_eq!(drained.len(), 3);
        assert!(registry.is_empty());
    }
}
