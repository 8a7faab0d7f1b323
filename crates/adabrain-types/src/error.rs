use thiserror::Error;

/// Errors from the long-term memory store.
///
/// Never surfaced to clients: the memory gateway turns these into an
/// empty recall or a logged, dropped write.
#[derive(Debug, Error)]
pub enum MemoryError {
    #[error("memory store unavailable: {0}")]
    Unavailable(String),

    #[error("memory query failed: {0}")]
    Query(String),

    #[error("memory write failed: {0}")]
    Storage(String),

    #[error("memory store timed out after {0}ms")]
    Timeout(u64),
}

/// Errors from the upstream conversational agent.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("upstream agent unavailable: {0}")]
    Unavailable(String),

    #[error("failed to create upstream session: {0}")]
    SessionCreate(String),

    #[error("unknown upstream session '{0}'")]
    UnknownSession(String),

    #[error("failed to send prompt upstream: {0}")]
    Send(String),

    #[error("upstream stream error: {0}")]
    Stream(String),

    #[error("failed to destroy upstream session: {0}")]
    Destroy(String),
}

/// Client protocol errors. Always reported to the client; the connection
/// stays open and no session state changes.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("Invalid JSON")]
    InvalidJson,

    #[error("Invalid message: {0}")]
    Malformed(String),

    #[error("Unknown message type: {0}")]
    UnknownType(String),

    #[error("Unknown mode: {0}")]
    UnknownMode(String),
}

/// Failure to deliver a message to a client connection.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("client connection closed")]
    Closed,

    #[error("failed to encode outbound message: {0}")]
    Encode(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protocol_error_display_is_client_facing() {
        assert_eq!(ProtocolError::InvalidJson.to_string(), "Invalid JSON");
        assert_eq!(
            ProtocolError::UnknownType("dance".to_string()).to_string(),
            "Unknown message type: dance"
        );
        assert_eq!(
            ProtocolError::UnknownMode("bogus".to_string()).to_string(),
            "Unknown mode: bogus"
        );
    }

    #[test]
    fn test_memory_error_display() {
        let err = MemoryError::Timeout(2000);
        assert_eq!(err.to_string(), "memory store timed out after 2000ms");
    }

    #[test]
    fn test_agent_error_display() {
        let err = AgentError::UnknownSession("abc".to_string());
        assert_eq!(err.to_string(), "unknown upstream session 'abc'");
    }
}
