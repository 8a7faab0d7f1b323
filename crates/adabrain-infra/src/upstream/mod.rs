//! OpenAI-compatible upstream agent backend.
//!
//! [`OpenAiAgentBackend`] implements [`AgentBackend`] on top of any
//! chat-completions API (OpenAI, a local Ollama or LM Studio server, a
//! Claude proxy). An upstream session is a system prompt plus the running
//! transcript, kept in this process. Each `send` spawns one streaming
//! request whose fragments are published into the session's
//! [`SubscriberHub`] as `Delta` events, followed by one `Final` (or
//! `Idle` for an empty reply, or `Error`).
//!
//! At most one request per session is in flight: a new `send` cancels the
//! previous one, as do `cancel`, `destroy` and `shutdown`. A prompt joins
//! the transcript only together with its reply, so cancelled, abandoned
//! and failed requests leave no trace in later ones.

pub mod request;
pub mod streaming;

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_openai::Client;
use async_openai::config::OpenAIConfig;
use async_openai::types::chat::CreateChatCompletionRequest;
use dashmap::DashMap;
use futures_util::StreamExt;
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use adabrain_core::agent::backend::AgentBackend;
use adabrain_core::agent::subscription::{Delivery, Subscription, SubscriberHub};
use adabrain_types::agent::{AgentEvent, AgentHandle};
use adabrain_types::chat::HistoryEntry;
use adabrain_types::config::UpstreamConfig;
use adabrain_types::error::AgentError;

use self::request::build_request;
use self::streaming::map_chat_stream;

/// Per-session state held by the backend.
struct UpstreamSession {
    model: String,
    system_prompt: String,
    transcript: Mutex<Vec<HistoryEntry>>,
    hub: SubscriberHub,
    in_flight: Mutex<Option<CancellationToken>>,
}

impl UpstreamSession {
    /// Record a completed exchange.
    async fn commit(&self, prompt: HistoryEntry, reply: &str) {
        let mut transcript = self.transcript.lock().await;
        transcript.push(prompt);
        transcript.push(HistoryEntry::assistant(reply));
    }

    /// Cancel the in-flight request, if any.
    async fn abort(&self) {
        if let Some(token) = self.in_flight.lock().await.take() {
            token.cancel();
        }
    }
}

/// Agent backend for OpenAI-compatible chat-completions APIs.
///
/// Does NOT derive Debug: the `async_openai::Client` holds the API key.
pub struct OpenAiAgentBackend {
    client: Client<OpenAIConfig>,
    max_tokens: u32,
    next_id: AtomicU64,
    sessions: DashMap<String, Arc<UpstreamSession>>,
    shutdown: CancellationToken,
}

impl OpenAiAgentBackend {
    pub fn new(base_url: &str, api_key: SecretString, max_tokens: u32) -> Self {
        let openai_config = OpenAIConfig::new()
            .with_api_key(api_key.expose_secret())
            .with_api_base(base_url);

        Self {
            client: Client::with_config(openai_config),
            max_tokens,
            next_id: AtomicU64::new(0),
            sessions: DashMap::new(),
            shutdown: CancellationToken::new(),
        }
    }

    /// Build a backend from configuration.
    ///
    /// `Unavailable` when no base URL is configured or the API key
    /// variable is unset or empty; the relay then runs in echo mode.
    pub fn from_config(config: &UpstreamConfig) -> Result<Self, AgentError> {
        let base_url = config
            .base_url
            .as_deref()
            .filter(|url| !url.is_empty())
            .ok_or_else(|| AgentError::Unavailable("no upstream base_url configured".to_string()))?;

        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|key| !key.is_empty())
            .map(SecretString::from)
            .ok_or_else(|| {
                AgentError::Unavailable(format!("{} is not set", config.api_key_env))
            })?;

        Ok(Self::new(base_url, api_key, config.max_tokens))
    }

    fn session(&self, handle: &AgentHandle) -> Result<Arc<UpstreamSession>, AgentError> {
        self.sessions
            .get(handle.id())
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| AgentError::UnknownSession(handle.id().to_string()))
    }

    #[cfg(test)]
    fn session_count(&self) -> usize {
        self.sessions.len()
    }
}

/// Stream one reply, publishing each fragment as a `Delta`.
///
/// Returns the full reply text, or `None` when nobody is listening any
/// more and the rest of the reply was abandoned.
async fn stream_reply(
    client: &Client<OpenAIConfig>,
    request: CreateChatCompletionRequest,
    hub: &SubscriberHub,
) -> Result<Option<String>, AgentError> {
    let stream = client
        .chat()
        .create_stream(request)
        .await
        .map_err(|e| AgentError::Send(e.to_string()))?;

    let mut fragments = map_chat_stream(stream);
    let mut reply = String::new();

    while let Some(fragment) = fragments.next().await {
        let text = fragment?;
        reply.push_str(&text);
        if hub.publish(AgentEvent::Delta { text }) == Delivery::Closed {
            return Ok(None);
        }
    }

    Ok(Some(reply))
}

/// Drive one request to completion and publish its terminal event.
async fn run_request(
    upstream_id: String,
    session: Arc<UpstreamSession>,
    client: Client<OpenAIConfig>,
    request: CreateChatCompletionRequest,
    prompt: HistoryEntry,
    token: CancellationToken,
) {
    let outcome = tokio::select! {
        _ = token.cancelled() => {
            tracing::debug!(upstream_session = %upstream_id, "Upstream request cancelled");
            return;
        }
        outcome = stream_reply(&client, request, &session.hub) => outcome,
    };

    match outcome {
        Ok(Some(reply)) if reply.is_empty() => {
            session.hub.publish(AgentEvent::Idle);
        }
        Ok(Some(reply)) => {
            session.commit(prompt, &reply).await;
            tracing::debug!(upstream_session = %upstream_id, chars = reply.len(), "Upstream reply complete");
            session.hub.publish(AgentEvent::Final { text: reply });
        }
        Ok(None) => {
            tracing::debug!(upstream_session = %upstream_id, "No listener, reply abandoned");
        }
        Err(err) => {
            tracing::warn!(upstream_session = %upstream_id, error = %err, "Upstream request failed");
            session.hub.publish(AgentEvent::Error {
                message: err.to_string(),
            });
        }
    }
}

impl AgentBackend for OpenAiAgentBackend {
    fn name(&self) -> &str {
        "openai-compatible"
    }

    async fn create_session(
        &self,
        model: &str,
        system_prompt: &str,
    ) -> Result<AgentHandle, AgentError> {
        if self.shutdown.is_cancelled() {
            return Err(AgentError::SessionCreate("backend is shutting down".to_string()));
        }

        let id = format!("upstream-{}", self.next_id.fetch_add(1, Ordering::Relaxed));
        self.sessions.insert(
            id.clone(),
            Arc::new(UpstreamSession {
                model: model.to_string(),
                system_prompt: system_prompt.to_string(),
                transcript: Mutex::new(Vec::new()),
                hub: SubscriberHub::new(),
                in_flight: Mutex::new(None),
            }),
        );
        Ok(AgentHandle::new(id))
    }

    fn subscribe(&self, handle: &AgentHandle) -> Result<Subscription, AgentError> {
        Ok(self.session(handle)?.hub.subscribe())
    }

    async fn send(&self, handle: &AgentHandle, prompt: &str) -> Result<(), AgentError> {
        let session = self.session(handle)?;

        let token = self.shutdown.child_token();
        if let Some(previous) = session.in_flight.lock().await.replace(token.clone()) {
            previous.cancel();
        }

        let prompt = HistoryEntry::user(prompt);
        let request = {
            let mut messages = session.transcript.lock().await.clone();
            messages.push(prompt.clone());
            build_request(&session.model, &session.system_prompt, &messages, self.max_tokens)
        };

        tokio::spawn(run_request(
            handle.id().to_string(),
            session,
            self.client.clone(),
            request,
            prompt,
            token,
        ));
        Ok(())
    }

    async fn cancel(&self, handle: &AgentHandle) -> Result<(), AgentError> {
        self.session(handle)?.abort().await;
        Ok(())
    }

    async fn destroy(&self, handle: AgentHandle) -> Result<(), AgentError> {
        let (_, session) = self
            .sessions
            .remove(handle.id())
            .ok_or_else(|| AgentError::UnknownSession(handle.id().to_string()))?;
        session.abort().await;
        session.hub.close();
        Ok(())
    }

    async fn shutdown(&self) {
        self.shutdown.cancel();
        for entry in self.sessions.iter() {
            entry.value().hub.close();
        }
        self.sessions.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend() -> OpenAiAgentBackend {
        OpenAiAgentBackend::new(
            "http://127.0.0.1:9/v1",
            SecretString::from("test-key".to_string()),
            256,
        )
    }

    #[tokio::test]
    async fn test_session_lifecycle() {
        let backend = backend();
        let handle = backend.create_session("gpt-4o", "You are Ada.").await.unwrap();
        assert_eq!(backend.session_count(), 1);

        let subscription = backend.subscribe(&handle).unwrap();
        drop(subscription);

        backend.cancel(&handle).await.unwrap();
        backend.destroy(handle).await.unwrap();
        assert_eq!(backend.session_count(), 0);
    }

    #[tokio::test]
    async fn test_prompt_joins_transcript_only_with_its_reply() {
        let backend = backend();
        let handle = backend.create_session("gpt-4o", "You are Ada.").await.unwrap();
        let session = backend.session(&handle).unwrap();

        // Nothing listens on the discard port, so this request can only fail.
        backend.send(&handle, "hi").await.unwrap();
        backend.cancel(&handle).await.unwrap();
        assert!(session.transcript.lock().await.is_empty());

        session.commit(HistoryEntry::user("hi"), "hello!").await;
        let transcript = session.transcript.lock().await.clone();
        assert_eq!(
            transcript,
            vec![HistoryEntry::user("hi"), HistoryEntry::assistant("hello!")]
        );
    }

    #[tokio::test]
    async fn test_unknown_session_is_reported() {
        let backend = backend();
        let stale = AgentHandle::new("upstream-99");
        assert!(matches!(
            backend.subscribe(&stale),
            Err(AgentError::UnknownSession(_))
        ));
        assert!(matches!(
            backend.send(&stale, "hi").await,
            Err(AgentError::UnknownSession(_))
        ));
        assert!(matches!(
            backend.destroy(stale).await,
            Err(AgentError::UnknownSession(_))
        ));
    }

    #[tokio::test]
    async fn test_session_ids_are_distinct() {
        let backend = backend();
        let a = backend.create_session("m", "p").await.unwrap();
        let b = backend.create_session("m", "p").await.unwrap();
        assert_ne!(a.id(), b.id());
    }

    #[tokio::test]
    async fn test_shutdown_clears_sessions_and_refuses_new_ones() {
        let backend = backend();
        backend.create_session("m", "p").await.unwrap();
        backend.shutdown().await;
        assert_eq!(backend.session_count(), 0);
        assert!(matches!(
            backend.create_session("m", "p").await,
            Err(AgentError::SessionCreate(_))
        ));
    }

    #[test]
    fn test_from_config_requires_base_url() {
        let config = UpstreamConfig::default();
        assert!(matches!(
            OpenAiAgentBackend::from_config(&config),
            Err(AgentError::Unavailable(_))
        ));
    }

    #[test]
    fn test_from_config_requires_api_key() {
        let config = UpstreamConfig {
            base_url: Some("http://localhost:11434/v1".to_string()),
            api_key_env: "ADA_TEST_UNSET_UPSTREAM_KEY".to_string(),
            ..UpstreamConfig::default()
        };
        assert!(matches!(
            OpenAiAgentBackend::from_config(&config),
            Err(AgentError::Unavailable(msg)) if msg.contains("ADA_TEST_UNSET_UPSTREAM_KEY")
        ));
    }

    #[test]
    fn test_from_config_with_key() {
        // SAFETY: This test is single-threaded and restores the env var immediately.
        unsafe {
            std::env::set_var("ADA_TEST_UPSTREAM_KEY", "sk-test");
        }
        let config = UpstreamConfig {
            base_url: Some("http://localhost:11434/v1".to_string()),
            api_key_env: "ADA_TEST_UPSTREAM_KEY".to_string(),
            ..UpstreamConfig::default()
        };
        let backend = OpenAiAgentBackend::from_config(&config);
        unsafe {
            std::env::remove_var("ADA_TEST_UPSTREAM_KEY");
        }
        assert!(backend.is_ok());
    }
}
