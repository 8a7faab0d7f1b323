//! Per-session event fan-out with revocable, ordered subscriptions.
//!
//! A backend keeps one [`SubscriberHub`] per upstream session and
//! publishes every [`AgentEvent`] into it. Each [`Subscription`] owns the
//! receiving end of an unbounded mpsc channel, so events arrive in publish
//! order. Dropping a subscription removes it from the hub and closes its
//! channel; events published afterwards are discarded and `publish`
//! reports [`Delivery::Closed`].

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use dashmap::DashMap;
use tokio::sync::mpsc;

use adabrain_types::agent::AgentEvent;

/// Result of publishing one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Delivered to this many live subscriptions.
    Delivered(usize),
    /// No live subscription; the event was discarded.
    Closed,
}

#[derive(Default)]
struct HubInner {
    next_id: AtomicU64,
    senders: DashMap<u64, mpsc::UnboundedSender<AgentEvent>>,
}

/// Fan-out point for one upstream session's events.
#[derive(Clone, Default)]
pub struct SubscriberHub {
    inner: Arc<HubInner>,
}

impl SubscriberHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new subscription that receives all future events.
    pub fn subscribe(&self) -> Subscription {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::unbounded_channel();
        self.inner.senders.insert(id, tx);
        Subscription {
            id,
            rx,
            hub: Arc::downgrade(&self.inner),
        }
    }

    /// Deliver `event` to every live subscription.
    pub fn publish(&self, event: AgentEvent) -> Delivery {
        let mut delivered = 0;
        let mut dead = Vec::new();

        for entry in self.inner.senders.iter() {
            if entry.value().send(event.clone()).is_ok() {
                delivered += 1;
            } else {
                dead.push(*entry.key());
            }
        }
        for id in dead {
            self.inner.senders.remove(&id);
        }

        if delivered == 0 {
            Delivery::Closed
        } else {
            Delivery::Delivered(delivered)
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.senders.len()
    }

    /// Drop every subscription's sender; receivers then see end of stream.
    pub fn close(&self) {
        self.inner.senders.clear();
    }
}

impl std::fmt::Debug for SubscriberHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriberHub")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

/// Receiving end of one turn's event stream.
///
/// Released exactly once, on drop, on every exit path of its owner.
pub struct Subscription {
    id: u64,
    rx: mpsc::UnboundedReceiver<AgentEvent>,
    hub: Weak<HubInner>,
}

impl Subscription {
    /// Next event in publish order, or `None` once the hub closed.
    pub async fn next(&mut self) -> Option<AgentEvent> {
        self.rx.recv().await
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.rx.close();
        if let Some(hub) = self.hub.upgrade() {
            hub.senders.remove(&self.id);
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}
