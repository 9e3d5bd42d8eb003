// SPDX-FileCopyrightText: 2026 Intervox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! WebSocket attachment for interview sessions.
//!
//! Each accepted socket is split into a writer task fed by a per-connection
//! mpsc channel and a read loop that dispatches frames through the protocol
//! handler. Both halves share a cancellation token, so ending the interview
//! or closing the session tears the whole connection down.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use futures::{SinkExt, StreamExt};
use intervox_core::SessionId;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::connections::OUTBOUND_BUFFER;
use crate::protocol::{message_types, HandlerFlow, OutboundEnvelope, ProtocolHandler};
use crate::server::RealtimeState;

/// WebSocket upgrade handler for GET /ws/interview/{session_id}.
///
/// The session must already exist; the upgrade is refused with 404 otherwise.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Path(session_id): Path<String>,
    State(state): State<RealtimeState>,
) -> Response {
    let session_id = SessionId(session_id);
    if state.registry.get(&session_id).is_err() {
        return (StatusCode::NOT_FOUND, "unknown session").into_response();
    }
    ws.on_upgrade(move |socket| handle_socket(socket, state, session_id))
}

/// Handle an individual WebSocket connection.
async fn handle_socket(socket: WebSocket, state: RealtimeState, session_id: SessionId) {
    let (ws_sender, mut ws_receiver) = socket.split();

    let (tx, rx) = mpsc::channel::<String>(OUTBOUND_BUFFER);
    let token = CancellationToken::new();
    let connection_id = state
        .connections
        .connect(&session_id, tx, token.clone());

    // Welcome envelope confirming the attachment.
    let welcome = OutboundEnvelope::new(message_types::CONNECTED)
        .with_session(&session_id)
        .to_json();
    state
        .connections
        .send_to(&session_id, &connection_id, welcome)
        .await;

    let sender_task = tokio::spawn(forward_outbound(rx, token.clone(), ws_sender));

    let handler = ProtocolHandler::new(
        state.registry.clone(),
        state.connections.clone(),
        state.gateway.clone(),
    );

    loop {
        tokio::select! {
            _ = token.cancelled() => break,
            msg = ws_receiver.next() => match msg {
                Some(Ok(Message::Text(text))) => {
                    let flow = handler
                        .dispatch(&session_id, &connection_id, text.as_str())
                        .await;
                    if flow == HandlerFlow::EndSession {
                        // Cancels every attached connection, ours included.
                        state.connections.close_session(&session_id);
                        break;
                    }
                }
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {} // Binary, ping/pong handled by the ws layer.
                Some(Err(e)) => {
                    debug!(session_id = %session_id, error = %e, "socket read error");
                    break;
                }
            },
        }
    }

    // Cleanup: detach, then tell the remaining participants.
    state.connections.disconnect(&session_id, &connection_id);
    if state.connections.connection_count(&session_id) > 0 {
        let note = OutboundEnvelope::new(message_types::PARTICIPANT_DISCONNECTED)
            .with_session(&session_id)
            .to_json();
        state.connections.broadcast(&session_id, &note).await;
    }
    token.cancel();
    let _ = sender_task.await;
    debug!(session_id = %session_id, connection_id = %connection_id, "connection closed");
}

/// Writer task: forwards queued envelopes to the socket until the channel
/// closes, the socket rejects a write, or the connection token fires.
///
/// The select is biased towards the channel, and on cancellation anything
/// still queued is flushed before the socket closes. Ending an interview
/// queues the `interview_ended` broadcast and then cancels every attached
/// connection; without the flush that final envelope would race the
/// cancellation and sometimes never reach the participant.
async fn forward_outbound<S>(mut rx: mpsc::Receiver<String>, token: CancellationToken, mut sink: S)
where
    S: futures::Sink<Message> + Unpin,
{
    loop {
        tokio::select! {
            biased;
            msg = rx.recv() => match msg {
                Some(msg) => {
                    if sink.send(Message::Text(msg.into())).await.is_err() {
                        break;
                    }
                }
                None => break,
            },
            _ = token.cancelled() => {
                while let Ok(msg) = rx.try_recv() {
                    if sink.send(Message::Text(msg.into())).await.is_err() {
                        break;
                    }
                }
                break;
            }
        }
    }
    let _ = sink.close().await;
}
