//! Client wire protocol.
//!
//! Inbound frames are JSON objects with a `type` discriminator and
//! type-specific fields. A frame without `type` is a chat `message`.
//! Outbound frames use the same `type`-tagged shape.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::ProtocolError;
use crate::mode::Mode;

/// A decoded inbound client message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientMessage {
    Ping,
    Auth { user_id: String },
    /// Requested mode, validated by the session before any state change.
    SetMode { mode: String },
    Message { content: String },
    StoreMemory { content: String },
    Recall { query: String },
    GetCharacter,
    GetSession,
}

/// Loose envelope shape; every field is optional on the wire.
#[derive(Debug, Deserialize)]
struct RawEnvelope {
    /// Any JSON value; a non-string discriminator is an unknown type.
    #[serde(rename = "type")]
    kind: Option<Value>,
    user_id: Option<String>,
    mode: Option<String>,
    content: Option<String>,
    query: Option<String>,
}

impl ClientMessage {
    /// Decode one text frame.
    ///
    /// Missing fields take the protocol defaults: `auth` without
    /// `user_id` is "anonymous", `set_mode` without `mode` is "normal",
    /// and absent text fields are empty.
    pub fn parse(raw: &str) -> Result<Self, ProtocolError> {
        let value: Value = serde_json::from_str(raw).map_err(|_| ProtocolError::InvalidJson)?;
        let envelope = RawEnvelope::deserialize(value)
            .map_err(|e| ProtocolError::Malformed(e.to_string()))?;

        let kind = match envelope.kind {
            None => "message".to_string(),
            Some(Value::String(kind)) => kind,
            Some(other) => return Err(ProtocolError::UnknownType(other.to_string())),
        };
        let message = match kind.as_str() {
            "ping" => ClientMessage::Ping,
            "auth" => ClientMessage::Auth {
                user_id: envelope
                    .user_id
                    .unwrap_or_else(|| "anonymous".to_string()),
            },
            "set_mode" => ClientMessage::SetMode {
                mode: envelope.mode.unwrap_or_else(|| Mode::Normal.to_string()),
            },
            "message" => ClientMessage::Message {
                content: envelope.content.unwrap_or_default(),
            },
            "store_memory" => ClientMessage::StoreMemory {
                content: envelope.content.unwrap_or_default(),
            },
            "recall" => ClientMessage::Recall {
                query: envelope.query.unwrap_or_default(),
            },
            "get_character" => ClientMessage::GetCharacter,
            "get_session" => ClientMessage::GetSession,
            other => return Err(ProtocolError::UnknownType(other.to_string())),
        };
        Ok(message)
    }
}

/// An outbound message to the client.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    Pong,
    AuthOk {
        user_id: String,
        session_id: Uuid,
    },
    ModeChanged {
        mode: Mode,
    },
    Error {
        content: String,
    },
    /// Incremental content fragment of a streamed turn.
    AssistantDelta {
        content: String,
    },
    /// Terminal content of a turn.
    AssistantMessage {
        content: String,
        streaming: bool,
    },
    MemoryStored {
        content: String,
    },
    Memories {
        data: Vec<String>,
    },
    Character {
        data: Value,
    },
    SessionInfo {
        session_id: Uuid,
        user_id: String,
        mode: Mode,
        history_length: usize,
    },
}

impl ServerMessage {
    pub fn error(content: impl Into<String>) -> Self {
        ServerMessage::Error {
            content: content.into(),
        }
    }

    /// Wire `type` of this message.
    pub fn kind(&self) -> &'static str {
        match self {
            ServerMessage::Pong => "pong",
            ServerMessage::AuthOk { .. } => "auth_ok",
            ServerMessage::ModeChanged { .. } => "mode_changed",
            ServerMessage::Error { .. } => "error",
            ServerMessage::AssistantDelta { .. } => "assistant_delta",
            ServerMessage::AssistantMessage { .. } => "assistant_message",
            ServerMessage::MemoryStored { .. } => "memory_stored",
            ServerMessage::Memories { .. } => "memories",
            ServerMessage::Character { .. } => "character",
            ServerMessage::SessionInfo { .. } => "session_info",
        }
    }
}

impl From<ProtocolError> for ServerMessage {
    fn from(err: ProtocolError) -> Self {
        ServerMessage::error(err.to_string())
    }
}
