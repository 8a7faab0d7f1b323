//! WebSocket handler for client conversations.
//!
//! Each upgraded socket becomes one relay connection with its own session.
//! The socket is split: a writer task owns the sending half and drains the
//! connection's [`ChannelSink`], while the read loop hands every text frame
//! to [`Relay::handle_frame`](adabrain_core::relay::Relay::handle_frame).
//! Frames from one client are handled strictly in order; a streamed turn
//! completes (or times out) before the next frame is read.
//!
//! When the client goes away the writer task exits and drops its receiver,
//! so the next queued message fails with `SinkError::Closed` and any turn
//! in progress is cancelled.

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures_util::{SinkExt, StreamExt};
use tracing::Instrument;

use adabrain_core::relay::sink::ChannelSink;

use crate::state::AppState;

/// Outbound frames buffered per connection before backpressure applies.
const OUTBOUND_CAPACITY: usize = 64;

/// Upgrade an HTTP request to a relay WebSocket connection.
///
/// This is mounted at both `/` and `/ws` in the router.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_ws_connection(socket, state))
}

async fn handle_ws_connection(socket: WebSocket, state: AppState) {
    let relay = state.relay;
    let (connection, session) = relay.open_connection().await;
    let span = tracing::info_span!("connection", id = %connection);

    let (mut ws_sender, mut ws_receiver) = socket.split();
    let (sink, mut outbound) = ChannelSink::channel(OUTBOUND_CAPACITY);

    let writer = tokio::spawn(
        async move {
            while let Some(frame) = outbound.recv().await {
                if ws_sender.send(Message::Text(frame.into())).await.is_err() {
                    // Client disconnected
                    break;
                }
            }
            let _ = ws_sender.close().await;
        }
        .instrument(span.clone()),
    );

    async {
        while let Some(msg_result) = ws_receiver.next().await {
            match msg_result {
                Ok(Message::Text(text)) => {
                    let mut guard = session.lock().await;
                    if let Err(err) = relay.handle_frame(&mut guard, text.as_str(), &sink).await {
                        tracing::debug!(error = %err, "Client sink closed");
                        break;
                    }
                }
                Ok(Message::Close(_)) => break,
                Err(err) => {
                    tracing::debug!("WebSocket receive error: {err}");
                    break;
                }
                // Binary, ping and pong frames are handled by axum/tungstenite.
                Ok(_) => {}
            }
        }
    }
    .instrument(span.clone())
    .await;

    drop(sink);
    relay.close_connection(connection).await;
    if let Err(err) = writer.await {
        tracing::warn!(parent: &span, error = %err, "WebSocket writer task failed");
    }
}
