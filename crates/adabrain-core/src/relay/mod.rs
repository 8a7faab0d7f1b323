//! The relay: owns the shared gateways and the session registry, and
//! drives every client connection through them.
//!
//! One [`Relay`] exists per process. Connection tasks call
//! [`Relay::open_connection`], feed each inbound frame to
//! [`Relay::handle_frame`], and call [`Relay::close_connection`] when the
//! socket goes away.

pub mod dispatch;
pub mod sink;
pub mod turn;

use std::time::Duration;

use adabrain_types::character::CharacterCard;
use adabrain_types::config::RelayConfig;

use crate::agent::gateway::AgentGateway;
use crate::memory::gateway::MemoryGateway;
use crate::session::registry::{ConnectionId, SessionRegistry, SharedSession};

/// Tunables for the turn protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelayOptions {
    /// Deadline for one streamed turn.
    pub turn_timeout: Duration,
    /// Maximum snippets recalled per turn and per `recall` request.
    pub recall_limit: usize,
}

impl Default for RelayOptions {
    fn default() -> Self {
        Self {
            turn_timeout: Duration::from_secs(120),
            recall_limit: 3,
        }
    }
}

impl From<&RelayConfig> for RelayOptions {
    fn from(config: &RelayConfig) -> Self {
        Self {
            turn_timeout: Duration::from_secs(config.turn_timeout_secs),
            recall_limit: config.recall_limit,
        }
    }
}

/// Process-wide relay state shared by every connection task.
pub struct Relay {
    agent: AgentGateway,
    memory: MemoryGateway,
    character: CharacterCard,
    registry: SessionRegistry,
    options: RelayOptions,
}

impl Relay {
    pub fn new(
        agent: AgentGateway,
        memory: MemoryGateway,
        character: CharacterCard,
        options: RelayOptions,
    ) -> Self {
        Self {
            agent,
            memory,
            character,
            registry: SessionRegistry::new(),
            options,
        }
    }

    pub fn agent(&self) -> &AgentGateway {
        &self.agent
    }

    pub fn memory(&self) -> &MemoryGateway {
        &self.memory
    }

    pub fn character(&self) -> &CharacterCard {
        &self.character
    }

    /// Register a new connection with a fresh anonymous session.
    pub async fn open_connection(&self) -> (ConnectionId, SharedSession) {
        let (id, session) = self.registry.open();
        let session_id = session.lock().await.session_id();
        tracing::info!(connection = %id, %session_id, "Client connected");
        (id, session)
    }

    /// Remove the connection's entry and tear down its upstream session.
    ///
    /// Safe to call more than once; later calls are no-ops.
    pub async fn close_connection(&self, id: ConnectionId) {
        let Some(session) = self.registry.close(id) else {
            return;
        };
        let mut session = session.lock().await;
        session.release_upstream(&self.agent).await;
        tracing::info!(
            connection = %id,
            session_id = %session.session_id(),
            user_id = session.user_id(),
            "Client disconnected"
        );
    }

    pub fn active_connections(&self) -> usize {
        self.registry.len()
    }

    /// Tear down every remaining session, then stop the shared clients.
    pub async fn shutdown(&self) {
        let drained = self.registry.drain();
        let count = drained.len();
        for (id, session) in drained {
            // A session locked by a streaming turn is left to the backend shutdown below.
            match session.try_lock() {
                Ok(mut session) => session.release_upstream(&self.agent).await,
                Err(_) => tracing::warn!(connection = %id, "Session busy in a turn, not waiting for it"),
            }
        }
        if count > 0 {
            tracing::info!(sessions = count, "Drained open sessions");
        }

        self.agent.shutdown().await;
        self.memory.shutdown().await;
    }
}
