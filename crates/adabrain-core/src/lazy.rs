//! Lazily constructed, process-wide shared clients.
//!
//! The memory store and the upstream agent backend are each built once, on
//! first use, and then shared by every connection. [`LazyShared`] wraps a
//! `tokio::sync::OnceCell` so concurrent first callers wait on a single
//! construction. A failed construction is not cached: the next caller
//! retries, and until then the dependency reads as absent.

use std::fmt::Display;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio::sync::OnceCell;

type BoxedInit<T> = Pin<Box<dyn Future<Output = Result<T, String>> + Send>>;
type Factory<T> = Box<dyn Fn() -> BoxedInit<T> + Send + Sync>;

/// A shared instance built on first use by an async factory.
pub struct LazyShared<T> {
    name: &'static str,
    cell: OnceCell<Arc<T>>,
    factory: Factory<T>,
}

impl<T: Send + Sync + 'static> LazyShared<T> {
    /// Create a cell that builds its value with `factory` on first [`get`](Self::get).
    pub fn new<F, Fut, E>(name: &'static str, factory: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        E: Display + 'static,
    {
        let factory: Factory<T> = Box::new(move || -> BoxedInit<T> {
            let fut = factory();
            Box::pin(async move { fut.await.map_err(|e| e.to_string()) })
        });
        Self {
            name,
            cell: OnceCell::new(),
            factory,
        }
    }

    /// Create a cell that already holds `value`.
    pub fn ready(name: &'static str, value: T) -> Self {
        Self {
            name,
            cell: OnceCell::new_with(Some(Arc::new(value))),
            factory: Box::new(|| -> BoxedInit<T> {
                Box::pin(async { Err("already initialized".to_string()) })
            }),
        }
    }

    /// Create a cell whose dependency is not configured at all.
    pub fn unavailable(name: &'static str, reason: impl Into<String>) -> Self {
        let reason = reason.into();
        Self::new(name, move || {
            let reason = reason.clone();
            async move { Err::<T, String>(reason) }
        })
    }

    /// Get the shared instance, constructing it if this is the first use.
    ///
    /// Returns `None` when construction fails; the failure is logged.
    pub async fn get(&self) -> Option<Arc<T>> {
        let result = self
            .cell
            .get_or_try_init(|| async { (self.factory)().await.map(Arc::new) })
            .await;

        match result {
            Ok(value) => Some(Arc::clone(value)),
            Err(err) => {
                tracing::debug!(client = self.name, error = %err, "Shared client unavailable");
                None
            }
        }
    }

    /// The instance if it has already been constructed. Never constructs.
    pub fn get_if_initialized(&self) -> Option<Arc<T>> {
        self.cell.get().cloned()
    }
}

impl<T> std::fmt::Debug for LazyShared<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LazyShared")
            .field("name", &self.name)
            .field("initialized", &self.cell.initialized())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn concurrent_first_use_constructs_once() {
        let builds = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&builds);
        let cell = Arc::new(LazyShared::new("test", move || {
            let counter = Arc::clone(&counter);
            async move {
                tokio::time::sleep(Duration::from_millis(10)).await;
                counter.fetch_add(1, Ordering::SeqCst);
                Ok::<_, String>(42u32)
            }
        }));

        let mut tasks = Vec::new();
        for _ in 0..16 {
            let cell = Arc::clone(&cell);
            tasks.push(tokio::spawn(async move { cell.get().await }));
        }
        for task in tasks {
            assert_eq!(task.await.unwrap().as_deref(), Some(&42));
        }
        assert_eq!(builds.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_construction_is_retried() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&attempts);
        let cell = LazyShared::new("flaky", move || {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            async move {
                if n == 0 {
                    Err("not yet".to_string())
                } else {
                    Ok("ready")
                }
            }
        });

        assert!(cell.get().await.is_none());
        assert!(cell.get_if_initialized().is_none());
        assert_eq!(cell.get().await.as_deref(), Some(&"ready"));
        assert_eq!(attempts.load(Ordering::SeqCst), 2);

        // Further calls reuse the built value
        assert!(cell.get().await.is_some());
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn ready_and_unavailable_cells() {
        let ready = LazyShared::ready("ready", 7u8);
        assert_eq!(ready.get_if_initialized().as_deref(), Some(&7));
        assert_eq!(ready.get().await.as_deref(), Some(&7));

        let missing: LazyShared<u8> = LazyShared::unavailable("missing", "not configured");
        assert!(missing.get().await.is_none());
        assert!(missing.get_if_initialized().is_none());
    }

    #[test]
    fn debug_impl() {
        let cell = LazyShared::ready("dbg", 1u8);
        let debug = format!("{cell:?}");
        assert!(debug.contains("LazyShared"));
        assert!(debug.contains("dbg"));
    }
}
