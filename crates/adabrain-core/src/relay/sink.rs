//! Outbound path to one client connection.
//!
//! Every message for a connection goes through a single [`ClientSink`].
//! The production sink is [`ChannelSink`]: it encodes each message to a
//! JSON text frame and queues it for the connection's only writer task,
//! so frames are never interleaved on the socket.

use std::future::Future;

use tokio::sync::mpsc;

use adabrain_types::error::SinkError;
use adabrain_types::protocol::ServerMessage;

/// Destination for messages addressed to one client.
pub trait ClientSink: Send + Sync {
    /// Queue `message` for delivery. Fails once the client is gone.
    fn send(&self, message: ServerMessage) -> impl Future<Output = Result<(), SinkError>> + Send;
}

/// Sink that feeds encoded text frames to a writer task.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::Sender<String>,
}

impl ChannelSink {
    /// Create a sink and the receiving half the writer task drains.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<String>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }
}

impl ClientSink for ChannelSink {
    async fn send(&self, message: ServerMessage) -> Result<(), SinkError> {
        let frame =
            serde_json::to_string(&message).map_err(|e| SinkError::Encode(e.to_string()))?;
        self.tx.send(frame).await.map_err(|_| SinkError::Closed)
    }
}

/// Sink that records every message, for tests.
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct RecordingSink {
    messages: std::sync::Mutex<Vec<ServerMessage>>,
}

#[cfg(test)]
impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove and return everything recorded so far.
    pub fn take(&self) -> Vec<ServerMessage> {
        std::mem::take(&mut *self.messages.lock().unwrap())
    }

    pub fn kinds(&self) -> Vec<&'static str> {
        self.messages.lock().unwrap().iter().map(|m| m.kind()).collect()
    }
}

#[cfg(test)]
impl ClientSink for RecordingSink {
    async fn send(&self, message: ServerMessage) -> Result<(), SinkError> {
        self.messages.lock().unwrap().push(message);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_channel_sink_encodes_json_frames_in_order() {
        let (sink, mut rx) = ChannelSink::channel(8);
        sink.send(ServerMessage::Pong).await.unwrap();
        sink.send(ServerMessage::AssistantDelta {
            content: "He".to_string(),
        })
        .await
        .unwrap();

        let first: serde_json::Value = serde_json::from_str(&rx.recv().await.unwrap()).unwrap();
        assert_eq!(first["type"], "pong");
        let second: serde_json::Value = serde_json::from_str(&rx.recv().await.unwrap()).unwrap();
        assert_eq!(second["type"], "assistant_delta");
        assert_eq!(second["content"], "He");
    }

    #[tokio::test]
    async fn test_channel_sink_reports_closed_writer() {
        let (sink, rx) = ChannelSink::channel(1);
        drop(rx);
        let err = sink.send(ServerMessage::Pong).await.unwrap_err();
        assert!(matches!(err, SinkError::Closed));
    }
}
