//! Inbound frame dispatch.
//!
//! Every text frame from a client lands in [`Relay::handle_frame`]. Protocol
//! errors are answered with an `error` message and leave the session
//! untouched; the connection always stays open.

use adabrain_types::chat::HistoryEntry;
use adabrain_types::error::SinkError;
use adabrain_types::protocol::{ClientMessage, ServerMessage};

use crate::session::state::Session;

use super::Relay;
use super::sink::ClientSink;

/// Characters of stored content echoed back in `memory_stored`.
const STORED_PREVIEW_CHARS: usize = 50;

impl Relay {
    /// Decode and act on one inbound text frame.
    ///
    /// Returns `Err` only when the client can no longer be written to;
    /// the caller should then close the connection.
    pub async fn handle_frame<S: ClientSink>(
        &self,
        session: &mut Session,
        raw: &str,
        sink: &S,
    ) -> Result<(), SinkError> {
        let message = match ClientMessage::parse(raw) {
            Ok(message) => message,
            Err(err) => {
                tracing::debug!(session_id = %session.short_id(), error = %err, "Rejected frame");
                return sink.send(err.into()).await;
            }
        };

        match message {
            ClientMessage::Ping => sink.send(ServerMessage::Pong).await,

            ClientMessage::Auth { user_id } => {
                session.authenticate(user_id);
                tracing::info!(
                    session_id = %session.short_id(),
                    user_id = session.user_id(),
                    auth = ?session.auth_state(),
                    "Session authenticated"
                );
                sink.send(ServerMessage::AuthOk {
                    user_id: session.user_id().to_string(),
                    session_id: session.session_id(),
                })
                .await
            }

            ClientMessage::SetMode { mode } => match session.change_mode(&mode, &self.agent).await {
                Ok(mode) => {
                    tracing::info!(session_id = %session.short_id(), %mode, "Mode changed");
                    sink.send(ServerMessage::ModeChanged { mode }).await
                }
                Err(err) => sink.send(err.into()).await,
            },

            ClientMessage::Message { content } => {
                let text = content.trim();
                if text.is_empty() {
                    return Ok(());
                }
                session.record(HistoryEntry::user(text));
                self.run_turn(session, text, sink).await.map(|_| ())
            }

            ClientMessage::StoreMemory { content } => {
                let content = content.trim();
                if content.is_empty() {
                    return Ok(());
                }
                self.memory.store(session.user_id(), content).await;
                let echoed: String = content.chars().take(STORED_PREVIEW_CHARS).collect();
                sink.send(ServerMessage::MemoryStored { content: echoed })
                    .await
            }

            ClientMessage::Recall { query } => {
                let data = self
                    .memory
                    .recall(session.user_id(), &query, self.options.recall_limit)
                    .await;
                sink.send(ServerMessage::Memories { data }).await
            }

            ClientMessage::GetCharacter => {
                sink.send(ServerMessage::Character {
                    data: self.character.document().clone(),
                })
                .await
            }

            ClientMessage::GetSession => sink.send(session.info()).await,
        }
    }
}
