//! AgentBackend trait definition.
//!
//! The core abstraction every upstream conversational agent implements:
//! create a configured session, subscribe to its events, send a prompt,
//! cancel an in-flight turn, and destroy the session.

use adabrain_types::agent::AgentHandle;
use adabrain_types::error::AgentError;

use super::subscription::Subscription;

/// Trait for upstream agent backends.
///
/// Uses native async fn in traits (RPITIT, Rust 2024 edition). `send`
/// only hands the prompt over; the response arrives as events on any
/// [`Subscription`] taken for the same handle.
///
/// Implementations live in adabrain-infra (e.g., `OpenAiCompatBackend`).
pub trait AgentBackend: Send + Sync {
    /// Human-readable backend name (e.g., "openai-compat").
    fn name(&self) -> &str;

    /// Create an upstream session configured with `model` and `system_prompt`.
    fn create_session(
        &self,
        model: &str,
        system_prompt: &str,
    ) -> impl std::future::Future<Output = Result<AgentHandle, AgentError>> + Send;

    /// Start receiving events for `handle`. Dropping the subscription revokes it.
    fn subscribe(&self, handle: &AgentHandle) -> Result<Subscription, AgentError>;

    /// Send a prompt into the session. Returns once the prompt is accepted.
    fn send(
        &self,
        handle: &AgentHandle,
        prompt: &str,
    ) -> impl std::future::Future<Output = Result<(), AgentError>> + Send;

    /// Abandon the in-flight turn of `handle`, if any.
    fn cancel(
        &self,
        handle: &AgentHandle,
    ) -> impl std::future::Future<Output = Result<(), AgentError>> + Send;

    /// Tear the session down. Consumes the handle.
    fn destroy(
        &self,
        handle: AgentHandle,
    ) -> impl std::future::Future<Output = Result<(), AgentError>> + Send;

    /// Stop the backend client. Called once at process shutdown.
    fn shutdown(&self) -> impl std::future::Future<Output = ()> + Send;
}
