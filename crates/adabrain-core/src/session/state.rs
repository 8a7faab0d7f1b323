//! The per-connection session state machine.
//!
//! Two orthogonal axes:
//! - identity: `Unauthenticated` (user "anonymous") until an `auth`
//!   message, then `Active`; the user id may be reassigned at any time.
//! - upstream handle: absent until the first chat message creates it,
//!   dropped (after a best-effort destroy) on mode change and on close.
//!   Mode changes never eagerly recreate it.

use uuid::Uuid;

use adabrain_types::agent::AgentHandle;
use adabrain_types::chat::HistoryEntry;
use adabrain_types::error::ProtocolError;
use adabrain_types::mode::Mode;
use adabrain_types::protocol::ServerMessage;

use crate::agent::gateway::AgentGateway;
use crate::prompt::compose_system_prompt;

/// Identity used until the client authenticates.
pub const ANONYMOUS_USER: &str = "anonymous";

/// Authentication state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    Unauthenticated,
    Active,
}

/// Server-side state for one client connection.
#[derive(Debug)]
pub struct Session {
    session_id: Uuid,
    user_id: String,
    auth: AuthState,
    mode: Mode,
    upstream: Option<AgentHandle>,
    history: Vec<HistoryEntry>,
}

impl Session {
    pub fn new() -> Self {
        Self {
            session_id: Uuid::new_v4(),
            user_id: ANONYMOUS_USER.to_string(),
            auth: AuthState::Unauthenticated,
            mode: Mode::Normal,
            upstream: None,
            history: Vec::new(),
        }
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// First 8 characters of the session id, for log lines.
    pub fn short_id(&self) -> String {
        self.session_id.simple().to_string()[..8].to_string()
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn auth_state(&self) -> AuthState {
        self.auth
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    pub fn upstream(&self) -> Option<&AgentHandle> {
        self.upstream.as_ref()
    }

    /// Set the caller-declared identity. Moves the session to `Active`.
    pub fn authenticate(&mut self, user_id: impl Into<String>) {
        self.user_id = user_id.into();
        self.auth = AuthState::Active;
    }

    pub fn record(&mut self, entry: HistoryEntry) {
        self.history.push(entry);
    }

    /// Run the mode-change protocol.
    ///
    /// An unknown mode is rejected with no state change. Otherwise the
    /// current upstream session (if any) is destroyed, best effort, and the
    /// handle cleared before the mode is updated. The next chat message
    /// recreates the upstream session with the new prompt.
    pub async fn change_mode(
        &mut self,
        requested: &str,
        agent: &AgentGateway,
    ) -> Result<Mode, ProtocolError> {
        let mode: Mode = requested
            .parse()
            .map_err(|_| ProtocolError::UnknownMode(requested.to_string()))?;

        self.release_upstream(agent).await;
        self.mode = mode;
        Ok(mode)
    }

    /// Make sure an upstream session exists, creating it lazily with the
    /// system prompt composed for the current mode.
    ///
    /// `None` when no upstream session is obtainable.
    pub async fn ensure_upstream(
        &mut self,
        agent: &AgentGateway,
        base_prompt: &str,
    ) -> Option<&AgentHandle> {
        if self.upstream.is_none() {
            let system_prompt = compose_system_prompt(base_prompt, self.mode);
            self.upstream = agent.create_session(&system_prompt).await;
        }
        self.upstream.as_ref()
    }

    /// Destroy the upstream session, if any. Never fails.
    pub async fn release_upstream(&mut self, agent: &AgentGateway) {
        if let Some(handle) = self.upstream.take() {
            agent.destroy(handle).await;
        }
    }

    /// Snapshot reply for `get_session`.
    pub fn info(&self) -> ServerMessage {
        ServerMessage::SessionInfo {
            session_id: self.session_id,
            user_id: self.user_id.clone(),
            mode: self.mode,
            history_length: self.history.len(),
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
