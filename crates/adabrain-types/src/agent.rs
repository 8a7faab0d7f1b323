//! Upstream agent types: the session handle and the per-turn event variant.

/// Opaque handle to a session living in the upstream agent backend.
///
/// Deliberately not `Clone`: a relay session owns at most one handle and
/// gives it up by value when the upstream session is destroyed.
#[derive(Debug, PartialEq, Eq)]
pub struct AgentHandle {
    id: String,
}

impl AgentHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    /// Backend-assigned identifier of the upstream session.
    pub fn id(&self) -> &str {
        &self.id
    }
}

/// One event emitted by the upstream agent during a turn.
///
/// A turn is terminated by exactly one `Final`, `Idle` or `Error`
/// (or by the relay's deadline).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentEvent {
    /// Incremental content fragment.
    Delta { text: String },
    /// The complete terminal message.
    Final { text: String },
    /// The turn is complete with no further content.
    Idle,
    /// The upstream reported a failure for this turn.
    Error { message: String },
}
