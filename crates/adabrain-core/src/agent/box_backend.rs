//! BoxAgentBackend -- object-safe dynamic dispatch wrapper for AgentBackend.
//!
//! 1. Define an object-safe `AgentBackendDyn` trait with boxed futures
//! 2. Blanket-impl `AgentBackendDyn` for all `T: AgentBackend`
//! 3. `BoxAgentBackend` wraps `Box<dyn AgentBackendDyn>` and delegates

use std::future::Future;
use std::pin::Pin;

use adabrain_types::agent::AgentHandle;
use adabrain_types::error::AgentError;

use super::backend::AgentBackend;
use super::subscription::Subscription;

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Object-safe version of [`AgentBackend`] with boxed futures.
///
/// This trait exists solely to enable dynamic dispatch.
pub trait AgentBackendDyn: Send + Sync {
    fn name(&self) -> &str;

    fn create_session_boxed<'a>(
        &'a self,
        model: &'a str,
        system_prompt: &'a str,
    ) -> BoxFuture<'a, Result<AgentHandle, AgentError>>;

    fn subscribe(&self, handle: &AgentHandle) -> Result<Subscription, AgentError>;

    fn send_boxed<'a>(
        &'a self,
        handle: &'a AgentHandle,
        prompt: &'a str,
    ) -> BoxFuture<'a, Result<(), AgentError>>;

    fn cancel_boxed<'a>(&'a self, handle: &'a AgentHandle) -> BoxFuture<'a, Result<(), AgentError>>;

    fn destroy_boxed(&self, handle: AgentHandle) -> BoxFuture<'_, Result<(), AgentError>>;

    fn shutdown_boxed(&self) -> BoxFuture<'_, ()>;
}

impl<T: AgentBackend> AgentBackendDyn for T {
    fn name(&self) -> &str {
        AgentBackend::name(self)
    }

    fn create_session_boxed<'a>(
        &'a self,
        model: &'a str,
        system_prompt: &'a str,
    ) -> BoxFuture<'a, Result<AgentHandle, AgentError>> {
        Box::pin(self.create_session(model, system_prompt))
    }

    fn subscribe(&self, handle: &AgentHandle) -> Result<Subscription, AgentError> {
        AgentBackend::subscribe(self, handle)
    }

    fn send_boxed<'a>(
        &'a self,
        handle: &'a AgentHandle,
        prompt: &'a str,
    ) -> BoxFuture<'a, Result<(), AgentError>> {
        Box::pin(self.send(handle, prompt))
    }

    fn cancel_boxed<'a>(&'a self, handle: &'a AgentHandle) -> BoxFuture<'a, Result<(), AgentError>> {
        Box::pin(self.cancel(handle))
    }

    fn destroy_boxed(&self, handle: AgentHandle) -> BoxFuture<'_, Result<(), AgentError>> {
        Box::pin(self.destroy(handle))
    }

    fn shutdown_boxed(&self) -> BoxFuture<'_, ()> {
        Box::pin(self.shutdown())
    }
}

/// Type-erased agent backend for runtime backend selection.
pub struct BoxAgentBackend {
    inner: Box<dyn AgentBackendDyn>,
}

impl BoxAgentBackend {
    /// Wrap a concrete `AgentBackend` in a type-erased box.
    pub fn new<T: AgentBackend + 'static>(backend: T) -> Self {
        Self {
            inner: Box::new(backend),
        }
    }

    pub fn name(&self) -> &str {
        self.inner.name()
    }

    pub async fn create_session(
        &self,
        model: &str,
        system_prompt: &str,
    ) -> Result<AgentHandle, AgentError> {
        self.inner.create_session_boxed(model, system_prompt).await
    }

    pub fn subscribe(&self, handle: &AgentHandle) -> Result<Subscription, AgentError> {
        self.inner.subscribe(handle)
    }

    pub async fn send(&self, handle: &AgentHandle, prompt: &str) -> Result<(), AgentError> {
        self.inner.send_boxed(handle, prompt).await
    }

    pub async fn cancel(&self, handle: &AgentHandle) -> Result<(), AgentError> {
        self.inner.cancel_boxed(handle).await
    }

    pub async fn destroy(&self, handle: AgentHandle) -> Result<(), AgentError> {
        self.inner.destroy_boxed(handle).await
    }

    pub async fn shutdown(&self) {
        self.inner.shutdown_boxed().await
    }
}
