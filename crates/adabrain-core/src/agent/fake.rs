//! Scripted in-process backend for tests.

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use dashmap::DashMap;

use adabrain_types::agent::{AgentEvent, AgentHandle};
use adabrain_types::error::AgentError;

use crate::lazy::LazyShared;

use super::backend::AgentBackend;
use super::box_backend::BoxAgentBackend;
use super::gateway::AgentGateway;
use super::subscription::{Subscription, SubscriberHub};

#[derive(Default)]
struct FakeState {
    next_id: AtomicU64,
    hubs: DashMap<String, SubscriberHub>,
    created: Mutex<Vec<(String, String)>>,
    sent: Mutex<Vec<String>>,
    destroyed: AtomicUsize,
    cancelled: AtomicUsize,
    script: Mutex<Vec<AgentEvent>>,
    fail_create: AtomicBool,
    fail_destroy: AtomicBool,
    fail_send: AtomicBool,
    close_after_script: AtomicBool,
}

/// Backend that publishes a fixed script of events on every `send`.
#[derive(Clone, Default)]
pub(crate) struct FakeBackend {
    state: Arc<FakeState>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn gateway(&self) -> AgentGateway {
        AgentGateway::new(
            LazyShared::ready("upstream agent", BoxAgentBackend::new(self.clone())),
            "test-model",
        )
    }

    pub fn script(&self, events: Vec<AgentEvent>) {
        *self.state.script.lock().unwrap() = events;
    }

    pub fn fail_create(&self, fail: bool) {
        self.state.fail_create.store(fail, Ordering::SeqCst);
    }

    pub fn fail_destroy(&self, fail: bool) {
        self.state.fail_destroy.store(fail, Ordering::SeqCst);
    }

    pub fn fail_send(&self, fail: bool) {
        self.state.fail_send.store(fail, Ordering::SeqCst);
    }

    /// End the event stream right after the scripted events.
    pub fn close_after_script(&self, close: bool) {
        self.state.close_after_script.store(close, Ordering::SeqCst);
    }

    pub fn created_prompts(&self) -> Vec<String> {
        self.state
            .created
            .lock()
            .unwrap()
            .iter()
            .map(|(_, prompt)| prompt.clone())
            .collect()
    }

    pub fn created_models(&self) -> Vec<String> {
        self.state
            .created
            .lock()
            .unwrap()
            .iter()
            .map(|(model, _)| model.clone())
            .collect()
    }

    pub fn sent_prompts(&self) -> Vec<String> {
        self.state.sent.lock().unwrap().clone()
    }

    pub fn destroyed_count(&self) -> usize {
        self.state.destroyed.load(Ordering::SeqCst)
    }

    pub fn cancelled_count(&self) -> usize {
        self.state.cancelled.load(Ordering::SeqCst)
    }

    /// Hub of the most recently created session.
    pub fn latest_hub(&self) -> SubscriberHub {
        let id = self.state.next_id.load(Ordering::SeqCst).saturating_sub(1);
        self.state
            .hubs
            .get(&format!("fake-{id}"))
            .map(|hub| hub.clone())
            .expect("no session created")
    }

    /// Subscriptions currently alive across all sessions.
    pub fn live_subscriptions(&self) -> usize {
        self.state
            .hubs
            .iter()
            .map(|hub| hub.subscriber_count())
            .sum()
    }
}

impl AgentBackend for FakeBackend {
    fn name(&self) -> &str {
        "fake"
    }

    async fn create_session(
        &self,
        model: &str,
        system_prompt: &str,
    ) -> Result<AgentHandle, AgentError> {
        if self.state.fail_create.load(Ordering::SeqCst) {
            return Err(AgentError::SessionCreate("scripted failure".to_string()));
        }
        let id = format!("fake-{}", self.state.next_id.fetch_add(1, Ordering::SeqCst));
        self.state.hubs.insert(id.clone(), SubscriberHub::new());
        self.state
            .created
            .lock()
            .unwrap()
            .push((model.to_string(), system_prompt.to_string()));
        Ok(AgentHandle::new(id))
    }

    fn subscribe(&self, handle: &AgentHandle) -> Result<Subscription, AgentError> {
        self.state
            .hubs
            .get(handle.id())
            .map(|hub| hub.subscribe())
            .ok_or_else(|| AgentError::UnknownSession(handle.id().to_string()))
    }

    async fn send(&self, handle: &AgentHandle, prompt: &str) -> Result<(), AgentError> {
        if self.state.fail_send.load(Ordering::SeqCst) {
            return Err(AgentError::Send("scripted failure".to_string()));
        }
        self.state.sent.lock().unwrap().push(prompt.to_string());
        let hub = self
            .state
            .hubs
            .get(handle.id())
            .map(|hub| hub.clone())
            .ok_or_else(|| AgentError::UnknownSession(handle.id().to_string()))?;
        let script = self.state.script.lock().unwrap().clone();
        for event in script {
            hub.publish(event);
        }
        if self.state.close_after_script.load(Ordering::SeqCst) {
            hub.close();
        }
        Ok(())
    }

    async fn cancel(&self, _handle: &AgentHandle) -> Result<(), AgentError> {
        self.state.cancelled.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn destroy(&self, handle: AgentHandle) -> Result<(), AgentError> {
        self.state.destroyed.fetch_add(1, Ordering::SeqCst);
        if self.state.fail_destroy.load(Ordering::SeqCst) {
            return Err(AgentError::Destroy("scripted failure".to_string()));
        }
        if let Some((_, hub)) = self.state.hubs.remove(handle.id()) {
            hub.close();
        }
        Ok(())
    }

    async fn shutdown(&self) {}
}
