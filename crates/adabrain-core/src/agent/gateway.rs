//! Gateway to the process-wide upstream agent backend.
//!
//! An absent or unconfigured backend is a designed degraded mode, not an
//! error: `create_session` returns `None` and the relay falls back to
//! echoing. Teardown calls are best-effort and never fail.

use adabrain_types::agent::AgentHandle;
use adabrain_types::error::AgentError;

use crate::lazy::LazyShared;

use super::box_backend::BoxAgentBackend;
use super::subscription::Subscription;

/// Gateway in front of the shared upstream agent backend.
pub struct AgentGateway {
    backend: LazyShared<BoxAgentBackend>,
    model: String,
}

impl AgentGateway {
    pub fn new(backend: LazyShared<BoxAgentBackend>, model: impl Into<String>) -> Self {
        Self {
            backend,
            model: model.into(),
        }
    }

    /// A gateway with no backend. Every turn is answered in echo mode.
    pub fn disabled() -> Self {
        Self::new(
            LazyShared::unavailable("upstream agent", "no upstream agent configured"),
            "none",
        )
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Create an upstream session with `system_prompt`.
    ///
    /// `None` when the backend is unavailable or refuses the session.
    pub async fn create_session(&self, system_prompt: &str) -> Option<AgentHandle> {
        let backend = self.backend.get().await?;
        match backend.create_session(&self.model, system_prompt).await {
            Ok(handle) => {
                tracing::info!(
                    backend = backend.name(),
                    upstream_session = handle.id(),
                    model = %self.model,
                    "Upstream session created"
                );
                Some(handle)
            }
            Err(err) => {
                tracing::error!(error = %err, "Failed to create upstream session");
                None
            }
        }
    }

    pub fn subscribe(&self, handle: &AgentHandle) -> Result<Subscription, AgentError> {
        self.initialized()?.subscribe(handle)
    }

    pub async fn send(&self, handle: &AgentHandle, prompt: &str) -> Result<(), AgentError> {
        self.initialized()?.send(handle, prompt).await
    }

    /// Best-effort abandonment of the in-flight turn.
    pub async fn cancel(&self, handle: &AgentHandle) {
        let Ok(backend) = self.initialized() else {
            return;
        };
        if let Err(err) = backend.cancel(handle).await {
            tracing::debug!(upstream_session = handle.id(), error = %err, "Upstream cancel failed");
        }
    }

    /// Best-effort teardown. Failures are logged and swallowed.
    pub async fn destroy(&self, handle: AgentHandle) {
        let Ok(backend) = self.initialized() else {
            return;
        };
        let id = handle.id().to_string();
        match backend.destroy(handle).await {
            Ok(()) => tracing::debug!(upstream_session = %id, "Upstream session destroyed"),
            Err(err) => {
                tracing::debug!(upstream_session = %id, error = %err, "Upstream destroy failed")
            }
        }
    }

    /// Stop the backend client if it was ever constructed.
    pub async fn shutdown(&self) {
        if let Some(backend) = self.backend.get_if_initialized() {
            backend.shutdown().await;
            tracing::info!(backend = backend.name(), "Upstream agent client stopped");
        }
    }

    /// A handle can only exist once the backend was built, so this lookup
    /// never constructs.
    fn initialized(&self) -> Result<std::sync::Arc<BoxAgentBackend>, AgentError> {
        self.backend
            .get_if_initialized()
            .ok_or_else(|| AgentError::Unavailable("upstream agent not initialized".to_string()))
    }
}
