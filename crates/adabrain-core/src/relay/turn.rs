//! The turn protocol: one inbound chat message in, an ordered stream of
//! client messages out.
//!
//! Ordering: the turn consumes its [`Subscription`] sequentially and
//! forwards every `Delta` to the sink before the terminal message, so
//! per-connection ordering holds by construction. The subscription is a
//! local owned by [`Relay::stream_turn`] and is revoked when it goes out of
//! scope, on every exit path. Events the upstream publishes after that
//! are rejected by the hub and discarded.

use tokio::time::Instant;

use adabrain_types::agent::{AgentEvent, AgentHandle};
use adabrain_types::chat::HistoryEntry;
use adabrain_types::error::SinkError;
use adabrain_types::protocol::ServerMessage;

use crate::prompt::augment_with_memories;
use crate::session::state::Session;

use super::Relay;
use super::sink::ClientSink;

const TIMEOUT_MESSAGE: &str = "Response timed out — Ada might be thinking really hard! 🦄";

/// Maximum characters of user text written to logs.
const LOG_PREVIEW_CHARS: usize = 80;

/// How a turn ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnOutcome {
    /// No upstream session was obtainable; the input was echoed back.
    Echoed,
    /// The upstream sent a final message.
    Completed,
    /// The upstream went idle without a final message.
    Idle,
    /// The upstream reported an error mid-turn.
    UpstreamFailed,
    /// The upstream session could not be subscribed to or refused the prompt.
    Unreachable,
    /// No terminal event arrived before the deadline.
    TimedOut,
}

/// Echo-mode acknowledgement.
pub fn echo_reply(user_text: &str) -> ServerMessage {
    ServerMessage::AssistantMessage {
        content: format!("💙🦄 [Echo Mode] Ada received: {user_text}"),
        streaming: false,
    }
}

fn upstream_error(message: impl std::fmt::Display) -> ServerMessage {
    ServerMessage::error(format!("Ada Marie encountered an issue: {message}"))
}

/// At most `max` characters of `text`.
pub(crate) fn preview(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

impl Relay {
    /// Run one chat turn for `session`.
    ///
    /// Returns `Err` only when the client can no longer be written to.
    pub async fn run_turn<S: ClientSink>(
        &self,
        session: &mut Session,
        user_text: &str,
        sink: &S,
    ) -> Result<TurnOutcome, SinkError> {
        tracing::info!(
            session_id = %session.short_id(),
            user_id = session.user_id(),
            mode = %session.mode(),
            text = preview(user_text, LOG_PREVIEW_CHARS),
            "Turn started"
        );

        let user_id = session.user_id().to_string();
        let Some(handle) = session
            .ensure_upstream(&self.agent, self.character.system_prompt())
            .await
        else {
            sink.send(echo_reply(user_text)).await?;
            return Ok(TurnOutcome::Echoed);
        };

        let memories = self
            .memory
            .recall(&user_id, user_text, self.options.recall_limit)
            .await;
        if !memories.is_empty() {
            tracing::debug!(count = memories.len(), "Injecting recalled memories");
        }
        let prompt = augment_with_memories(user_text, &memories);

        let (outcome, reply) = match self.stream_turn(handle, &prompt, sink).await {
            Ok(done) => done,
            Err(err) => {
                // The client is gone; stop the upstream from generating for nobody.
                self.agent.cancel(handle).await;
                return Err(err);
            }
        };

        if outcome == TurnOutcome::Unreachable {
            // Start over with a fresh upstream session on the next message.
            session.release_upstream(&self.agent).await;
        }
        if let Some(text) = reply.filter(|t| !t.is_empty()) {
            session.record(HistoryEntry::assistant(text));
        }

        tracing::info!(session_id = %session.short_id(), outcome = ?outcome, "Turn finished");
        Ok(outcome)
    }

    /// Subscribe, send, and relay events until a terminal event or the
    /// deadline. Returns the outcome and, for a turn that completed, the
    /// assistant text to record.
    async fn stream_turn<S: ClientSink>(
        &self,
        handle: &AgentHandle,
        prompt: &str,
        sink: &S,
    ) -> Result<(TurnOutcome, Option<String>), SinkError> {
        let mut subscription = match self.agent.subscribe(handle) {
            Ok(subscription) => subscription,
            Err(err) => {
                tracing::error!(upstream_session = handle.id(), error = %err, "Subscribe failed");
                sink.send(upstream_error(&err)).await?;
                return Ok((TurnOutcome::Unreachable, None));
            }
        };

        if let Err(err) = self.agent.send(handle, prompt).await {
            tracing::error!(upstream_session = handle.id(), error = %err, "Send failed");
            sink.send(upstream_error(&err)).await?;
            return Ok((TurnOutcome::Unreachable, None));
        }

        let deadline = Instant::now() + self.options.turn_timeout;
        let mut buffer = String::new();

        loop {
            match tokio::time::timeout_at(deadline, subscription.next()).await {
                Ok(Some(AgentEvent::Delta { text })) => {
                    buffer.push_str(&text);
                    sink.send(ServerMessage::AssistantDelta { content: text })
                        .await?;
                }
                Ok(Some(AgentEvent::Final { text })) => {
                    let recorded = if text.is_empty() { buffer } else { text.clone() };
                    sink.send(ServerMessage::AssistantMessage {
                        content: text,
                        streaming: false,
                    })
                    .await?;
                    return Ok((TurnOutcome::Completed, Some(recorded)));
                }
                Ok(Some(AgentEvent::Idle)) => {
                    return Ok((TurnOutcome::Idle, Some(buffer)));
                }
                Ok(Some(AgentEvent::Error { message })) => {
                    tracing::warn!(upstream_session = handle.id(), %message, "Upstream turn failed");
                    sink.send(upstream_error(&message)).await?;
                    return Ok((TurnOutcome::UpstreamFailed, None));
                }
                Ok(None) => {
                    tracing::warn!(upstream_session = handle.id(), "Upstream stream closed mid-turn");
                    sink.send(upstream_error("the response stream closed unexpectedly"))
                        .await?;
                    return Ok((TurnOutcome::UpstreamFailed, None));
                }
                Err(_) => {
                    drop(subscription);
                    tracing::warn!(
                        upstream_session = handle.id(),
                        timeout_secs = self.options.turn_timeout.as_secs(),
                        "Turn timed out"
                    );
                    self.agent.cancel(handle).await;
                    sink.send(ServerMessage::error(TIMEOUT_MESSAGE)).await?;
                    return Ok((TurnOutcome::TimedOut, None));
                }
            }
        }
    }
}
