// SPDX-FileCopyrightText: 2026 Intervox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wire protocol and dispatch for interview WebSocket traffic.
//!
//! Client -> Server (JSON):
//! ```json
//! {"type": "text_message", "content": "My answer...", "user_id": "applicant-1"}
//! {"type": "audio_chunk", "data": "<base64>", "mime_type": "audio/webm"}
//! {"type": "video_frame", "data": "<base64 jpeg>"}
//! {"type": "ping"}
//! {"type": "end_interview"}
//! ```
//!
//! Server -> Client (JSON):
//! ```json
//! {"type": "connected", "session_id": "...", "timestamp": "..."}
//! {"type": "text_message", "content": "...", "user_id": "...", "timestamp": "..."}
//! {"type": "ai_response", "content": "...", "timestamp": "..."}
//! {"type": "interview_ended", "content": "<report text>", "timestamp": "..."}
//! ```

use std::sync::Arc;

use base64::Engine;
use intervox_core::{AiGateway, ConnectionId, IntervoxError, Report, SessionId, SessionStatus};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use intervox_session::SessionRegistry;

use crate::connections::ConnectionManager;

/// Message type constants for both directions.
pub mod message_types {
    // Client -> server.
    pub const TEXT_MESSAGE: &str = "text_message";
    pub const AUDIO_CHUNK: &str = "audio_chunk";
    pub const VIDEO_FRAME: &str = "video_frame";
    pub const PING: &str = "ping";
    pub const END_INTERVIEW: &str = "end_interview";

    // Server -> client.
    pub const CONNECTED: &str = "connected";
    pub const AI_RESPONSE: &str = "ai_response";
    pub const AUDIO_RECEIVED: &str = "audio_received";
    pub const VIDEO_ANALYSIS: &str = "video_analysis";
    pub const PONG: &str = "pong";
    pub const INTERVIEW_ENDED: &str = "interview_ended";
    pub const PARTICIPANT_DISCONNECTED: &str = "participant_disconnected";
    pub const UNKNOWN_KIND: &str = "unknown_kind";
    pub const MALFORMED_MESSAGE: &str = "malformed_message";
    pub const ERROR: &str = "error";
}

/// WebSocket message from a client.
#[derive(Debug, Deserialize)]
pub struct InboundEnvelope {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub content: Option<String>,
    /// Base64 payload for audio and video messages.
    #[serde(default)]
    pub data: Option<String>,
    /// Media type of the payload, e.g. "audio/webm".
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
}

/// WebSocket message to clients.
#[derive(Debug, Serialize)]
pub struct OutboundEnvelope {
    #[serde(rename = "type")]
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    pub timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    /// Media type of an acknowledged audio payload.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

impl OutboundEnvelope {
    pub fn new(kind: &'static str) -> Self {
        Self {
            kind,
            session_id: None,
            content: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
            user_id: None,
            mime_type: None,
        }
    }

    pub fn with_session(mut self, session_id: &SessionId) -> Self {
        self.session_id = Some(session_id.to_string());
        self
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn with_user(mut self, user_id: Option<String>) -> Self {
        self.user_id = user_id;
        self
    }

    pub fn with_mime_type(mut self, mime_type: Option<String>) -> Self {
        self.mime_type = mime_type;
        self
    }

    /// Serializes to the wire string. The envelope has no non-serializable
    /// fields, so this cannot fail.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| String::from("{}"))
    }
}

/// What the socket loop should do after a message is handled.
#[derive(Debug, PartialEq, Eq)]
pub enum HandlerFlow {
    /// Keep reading from the socket.
    Continue,
    /// The interview ended; tear down every connection of the session.
    EndSession,
}

/// Dispatches decoded client messages onto the session state machine and
/// fans results back out over the connection manager.
pub struct ProtocolHandler {
    registry: Arc<SessionRegistry>,
    connections: Arc<ConnectionManager>,
    gateway: Arc<dyn AiGateway>,
}

impl ProtocolHandler {
    pub fn new(
        registry: Arc<SessionRegistry>,
        connections: Arc<ConnectionManager>,
        gateway: Arc<dyn AiGateway>,
    ) -> Self {
        Self {
            registry,
            connections,
            gateway,
        }
    }

    /// Handles one raw text frame from a client.
    ///
    /// Malformed or unknown messages are answered with an error envelope to
    /// the sender only; they never disturb other participants or the session.
    pub async fn dispatch(
        &self,
        session_id: &SessionId,
        connection_id: &ConnectionId,
        raw: &str,
    ) -> HandlerFlow {
        let envelope: InboundEnvelope = match serde_json::from_str(raw) {
            Ok(v) => v,
            Err(e) => {
                debug!(session_id = %session_id, error = %e, "malformed client message");
                self.send_error(
                    session_id,
                    connection_id,
                    message_types::MALFORMED_MESSAGE,
                    "message is not a valid envelope",
                )
                .await;
                return HandlerFlow::Continue;
            }
        };

        match envelope.kind.as_str() {
            message_types::TEXT_MESSAGE => self.on_text(session_id, connection_id, envelope).await,
            message_types::AUDIO_CHUNK => self.on_audio(session_id, connection_id, envelope).await,
            message_types::VIDEO_FRAME => self.on_video(session_id, connection_id, envelope).await,
            message_types::PING => {
                let pong = OutboundEnvelope::new(message_types::PONG).to_json();
                self.connections.send_to(session_id, connection_id, pong).await;
                HandlerFlow::Continue
            }
            message_types::END_INTERVIEW => self.on_end(session_id, connection_id).await,
            other => {
                debug!(session_id = %session_id, kind = other, "unknown message type");
                self.send_error(
                    session_id,
                    connection_id,
                    message_types::UNKNOWN_KIND,
                    &format!("unknown message type: {other}"),
                )
                .await;
                HandlerFlow::Continue
            }
        }
    }

    async fn on_text(
        &self,
        session_id: &SessionId,
        connection_id: &ConnectionId,
        envelope: InboundEnvelope,
    ) -> HandlerFlow {
        let Some(content) = envelope.content.filter(|c| !c.is_empty()) else {
            self.send_error(
                session_id,
                connection_id,
                message_types::MALFORMED_MESSAGE,
                "text_message requires content",
            )
            .await;
            return HandlerFlow::Continue;
        };

        let handle = match self.registry.get(session_id) {
            Ok(handle) => handle,
            Err(e) => {
                self.send_error(session_id, connection_id, message_types::ERROR, &e.to_string())
                    .await;
                return HandlerFlow::Continue;
            }
        };
        let mut session = handle.lock().await;
        if session.status() != SessionStatus::Active {
            let e = IntervoxError::not_active("submit_text", session.status());
            drop(session);
            self.send_error(session_id, connection_id, message_types::ERROR, &e.to_string())
                .await;
            return HandlerFlow::Continue;
        }

        // Echo only once the session has accepted the message, so observers
        // never see applicant text addressed to an unknown or ended session.
        // The echo still precedes the backend call: participants see the
        // message even if the backend stalls.
        let echo = OutboundEnvelope::new(message_types::TEXT_MESSAGE)
            .with_content(content.clone())
            .with_user(envelope.user_id)
            .to_json();
        self.connections.broadcast(session_id, &echo).await;

        match session.submit_text(self.gateway.as_ref(), &content).await {
            Ok(turn) => {
                let reply = OutboundEnvelope::new(message_types::AI_RESPONSE)
                    .with_content(turn.content)
                    .to_json();
                self.connections.broadcast(session_id, &reply).await;
            }
            Err(e) => {
                warn!(session_id = %session_id, error = %e, "text exchange failed");
                self.send_error(session_id, connection_id, message_types::ERROR, &e.to_string())
                    .await;
            }
        }
        HandlerFlow::Continue
    }

    async fn on_audio(
        &self,
        session_id: &SessionId,
        connection_id: &ConnectionId,
        envelope: InboundEnvelope,
    ) -> HandlerFlow {
        let bytes = match Self::decode_payload(envelope.data) {
            Ok(bytes) => bytes,
            Err(msg) => {
                self.send_error(session_id, connection_id, message_types::MALFORMED_MESSAGE, &msg)
                    .await;
                return HandlerFlow::Continue;
            }
        };

        let accepted = match self.registry.get(session_id) {
            Ok(handle) => handle.lock().await.submit_audio_chunk(&bytes),
            Err(e) => Err(e),
        };

        match accepted {
            Ok(true) => {
                // The ack names the media type the chunk arrived with so the
                // client can match it to an outstanding recording.
                let ack = OutboundEnvelope::new(message_types::AUDIO_RECEIVED)
                    .with_mime_type(envelope.mime_type)
                    .to_json();
                self.connections.send_to(session_id, connection_id, ack).await;
            }
            Ok(false) => {}
            Err(e) => {
                self.send_error(session_id, connection_id, message_types::ERROR, &e.to_string())
                    .await;
            }
        }
        HandlerFlow::Continue
    }

    async fn on_video(
        &self,
        session_id: &SessionId,
        connection_id: &ConnectionId,
        envelope: InboundEnvelope,
    ) -> HandlerFlow {
        let bytes = match Self::decode_payload(envelope.data) {
            Ok(bytes) => bytes,
            Err(msg) => {
                self.send_error(session_id, connection_id, message_types::MALFORMED_MESSAGE, &msg)
                    .await;
                return HandlerFlow::Continue;
            }
        };

        let result = match self.registry.get(session_id) {
            Ok(handle) => {
                let mut session = handle.lock().await;
                session
                    .submit_video_frame(self.gateway.as_ref(), &bytes)
                    .await
            }
            Err(e) => Err(e),
        };

        match result {
            Ok(Some(turn)) => {
                let analysis = OutboundEnvelope::new(message_types::VIDEO_ANALYSIS)
                    .with_content(turn.content)
                    .to_json();
                self.connections.broadcast(session_id, &analysis).await;
            }
            // Analysis is best-effort; a skipped frame is silent.
            Ok(None) => {}
            Err(e) => {
                self.send_error(session_id, connection_id, message_types::ERROR, &e.to_string())
                    .await;
            }
        }
        HandlerFlow::Continue
    }

    async fn on_end(
        &self,
        session_id: &SessionId,
        connection_id: &ConnectionId,
    ) -> HandlerFlow {
        let result: Result<Report, IntervoxError> = match self.registry.get(session_id) {
            Ok(handle) => {
                let mut session = handle.lock().await;
                session.end(self.gateway.as_ref()).await
            }
            Err(e) => Err(e),
        };

        match result {
            Ok(report) => {
                let ended = OutboundEnvelope::new(message_types::INTERVIEW_ENDED)
                    .with_session(session_id)
                    .with_content(report.content)
                    .to_json();
                self.connections.broadcast(session_id, &ended).await;
                self.registry.remove(session_id);
                HandlerFlow::EndSession
            }
            Err(e) => {
                warn!(session_id = %session_id, error = %e, "end interview failed");
                self.send_error(session_id, connection_id, message_types::ERROR, &e.to_string())
                    .await;
                HandlerFlow::Continue
            }
        }
    }

    fn decode_payload(data: Option<String>) -> Result<Vec<u8>, String> {
        let Some(data) = data else {
            return Err("missing base64 data field".to_string());
        };
        base64::engine::general_purpose::STANDARD
            .decode(&data)
            .map_err(|e| format!("invalid base64 payload: {e}"))
    }

    /// Error envelopes are always unicast so one faulty client never
    /// pollutes other participants' view of the session.
    async fn send_error(
        &self,
        session_id: &SessionId,
        connection_id: &ConnectionId,
        kind: &'static str,
        message: &str,
    ) {
        let envelope = OutboundEnvelope::new(kind).with_content(message).to_json();
        self.connections
            .send_to(session_id, connection_id, envelope)
            .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use intervox_core::Modality;
    use intervox_session::{null_sender, InterviewSession};
    use intervox_test_utils::MockGateway;
    use tokio::sync::mpsc;
    use tokio_util::sync::CancellationToken;

    struct Fixture {
        handler: ProtocolHandler,
        gateway: Arc<MockGateway>,
        registry: Arc<SessionRegistry>,
        connections: Arc<ConnectionManager>,
        session_id: SessionId,
    }

    async fn fixture(modality: Modality, responses: Vec<String>) -> Fixture {
        let gateway = Arc::new(MockGateway::with_responses(responses));
        let registry = Arc::new(SessionRegistry::new());
        let connections = Arc::new(ConnectionManager::new());

        let session = InterviewSession::initiate(
            gateway.as_ref(),
            "applicant-1",
            None,
            modality,
            8,
            null_sender(),
        )
        .await
        .unwrap();
        let session_id = session.id().clone();
        registry.insert(session);

        let handler = ProtocolHandler::new(
            registry.clone(),
            connections.clone(),
            gateway.clone(),
        );
        Fixture {
            handler,
            gateway,
            registry,
            connections,
            session_id,
        }
    }

    fn attach(fx: &Fixture) -> (ConnectionId, mpsc::Receiver<String>) {
        let (tx, rx) = mpsc::channel(64);
        let id = fx
            .connections
            .connect(&fx.session_id, tx, CancellationToken::new());
        (id, rx)
    }

    fn parse(raw: &str) -> serde_json::Value {
        serde_json::from_str(raw).unwrap()
    }

    #[tokio::test]
    async fn ping_is_answered_only_to_sender() {
        let fx = fixture(Modality::Text, vec!["Hello!".into()]).await;
        let (a, mut rx_a) = attach(&fx);
        let (_b, mut rx_b) = attach(&fx);

        let flow = fx
            .handler
            .dispatch(&fx.session_id, &a, r#"{"type": "ping"}"#)
            .await;
        assert_eq!(flow, HandlerFlow::Continue);
        assert_eq!(parse(&rx_a.recv().await.unwrap())["type"], "pong");
        assert!(rx_b.try_recv().is_err());
    }

    #[tokio::test]
    async fn text_message_echoes_then_broadcasts_reply() {
        let fx = fixture(
            Modality::Text,
            vec!["Hello!".into(), "Why Rust?".into()],
        )
        .await;
        let (a, mut rx_a) = attach(&fx);
        let (_b, mut rx_b) = attach(&fx);

        let raw = r#"{"type": "text_message", "content": "I like systems work", "user_id": "applicant-1"}"#;
        fx.handler.dispatch(&fx.session_id, &a, raw).await;

        for rx in [&mut rx_a, &mut rx_b] {
            let echo = parse(&rx.recv().await.unwrap());
            assert_eq!(echo["type"], "text_message");
            assert_eq!(echo["content"], "I like systems work");
            assert_eq!(echo["user_id"], "applicant-1");
            let reply = parse(&rx.recv().await.unwrap());
            assert_eq!(reply["type"], "ai_response");
            assert_eq!(reply["content"], "Why Rust?");
        }
    }

    #[tokio::test]
    async fn text_message_without_content_errors_sender_only() {
        let fx = fixture(Modality::Text, vec!["Hello!".into()]).await;
        let (a, mut rx_a) = attach(&fx);
        let (_b, mut rx_b) = attach(&fx);

        fx.handler
            .dispatch(&fx.session_id, &a, r#"{"type": "text_message"}"#)
            .await;
        assert_eq!(
            parse(&rx_a.recv().await.unwrap())["type"],
            "malformed_message"
        );
        assert!(rx_b.try_recv().is_err());
    }

    #[tokio::test]
    async fn malformed_and_unknown_messages_get_error_envelopes() {
        let fx = fixture(Modality::Text, vec!["Hello!".into()]).await;
        let (a, mut rx_a) = attach(&fx);

        fx.handler
            .dispatch(&fx.session_id, &a, "this is not json")
            .await;
        assert_eq!(
            parse(&rx_a.recv().await.unwrap())["type"],
            "malformed_message"
        );

        fx.handler
            .dispatch(&fx.session_id, &a, r#"{"type": "teleport"}"#)
            .await;
        let err = parse(&rx_a.recv().await.unwrap());
        assert_eq!(err["type"], "unknown_kind");
        assert!(err["content"].as_str().unwrap().contains("teleport"));
    }

    #[tokio::test]
    async fn audio_chunk_is_acked_to_sender() {
        let fx = fixture(Modality::Video, vec!["Hello!".into()]).await;
        let (a, mut rx_a) = attach(&fx);

        let payload = base64::engine::general_purpose::STANDARD.encode(b"pcm");
        let raw = format!(
            r#"{{"type": "audio_chunk", "data": "{payload}", "mime_type": "audio/webm"}}"#
        );
        fx.handler.dispatch(&fx.session_id, &a, &raw).await;
        let ack = parse(&rx_a.recv().await.unwrap());
        assert_eq!(ack["type"], "audio_received");
        assert_eq!(ack["mime_type"], "audio/webm");
    }

    #[test]
    fn envelope_omits_absent_optional_fields() {
        let json = parse(&OutboundEnvelope::new(message_types::PONG).to_json());
        assert_eq!(json["type"], "pong");
        let object = json.as_object().unwrap();
        assert!(!object.contains_key("mime_type"));
        assert!(!object.contains_key("content"));
        assert!(!object.contains_key("session_id"));
        assert!(!object.contains_key("user_id"));
    }

    #[tokio::test]
    async fn video_frame_broadcasts_analysis() {
        let fx = fixture(
            Modality::Video,
            vec!["Hello!".into(), "Confident posture.".into()],
        )
        .await;
        let (a, mut rx_a) = attach(&fx);

        let payload = base64::engine::general_purpose::STANDARD.encode(b"jpeg");
        let raw = format!(r#"{{"type": "video_frame", "data": "{payload}"}}"#);
        fx.handler.dispatch(&fx.session_id, &a, &raw).await;

        let analysis = parse(&rx_a.recv().await.unwrap());
        assert_eq!(analysis["type"], "video_analysis");
        assert_eq!(
            analysis["content"],
            "[Video Analysis: Confident posture.]"
        );
    }

    #[tokio::test]
    async fn video_frame_on_text_session_errors() {
        let fx = fixture(Modality::Text, vec!["Hello!".into()]).await;
        let (a, mut rx_a) = attach(&fx);

        let payload = base64::engine::general_purpose::STANDARD.encode(b"jpeg");
        let raw = format!(r#"{{"type": "video_frame", "data": "{payload}"}}"#);
        fx.handler.dispatch(&fx.session_id, &a, &raw).await;
        assert_eq!(parse(&rx_a.recv().await.unwrap())["type"], "error");
    }

    #[tokio::test]
    async fn end_interview_broadcasts_report_and_removes_session() {
        let fx = fixture(
            Modality::Text,
            vec!["Hello!".into(), "Solid candidate.".into()],
        )
        .await;
        let (a, mut rx_a) = attach(&fx);
        let (_b, mut rx_b) = attach(&fx);

        let flow = fx
            .handler
            .dispatch(&fx.session_id, &a, r#"{"type": "end_interview"}"#)
            .await;
        assert_eq!(flow, HandlerFlow::EndSession);
        for rx in [&mut rx_a, &mut rx_b] {
            let ended = parse(&rx.recv().await.unwrap());
            assert_eq!(ended["type"], "interview_ended");
            assert_eq!(ended["content"], "Solid candidate.");
        }
        assert!(fx.registry.get(&fx.session_id).is_err());
    }

    #[tokio::test]
    async fn end_failure_keeps_session_and_flow() {
        let fx = fixture(Modality::Text, vec!["Hello!".into()]).await;
        let (a, mut rx_a) = attach(&fx);
        fx.gateway.set_failing(true);

        let flow = fx
            .handler
            .dispatch(&fx.session_id, &a, r#"{"type": "end_interview"}"#)
            .await;
        assert_eq!(flow, HandlerFlow::Continue);
        assert_eq!(parse(&rx_a.recv().await.unwrap())["type"], "error");
        assert!(fx.registry.get(&fx.session_id).is_ok());
    }

    #[tokio::test]
    async fn unknown_session_id_errors_without_panicking() {
        let fx = fixture(Modality::Text, vec!["Hello!".into()]).await;
        let other = SessionId::generate();
        let (tx, mut rx) = mpsc::channel(64);
        let conn = fx.connections.connect(&other, tx, CancellationToken::new());

        fx.handler
            .dispatch(&other, &conn, r#"{"type": "text_message", "content": "hi"}"#)
            .await;
        // The not-found error only; the message is never echoed.
        assert_eq!(parse(&rx.recv().await.unwrap())["type"], "error");
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn text_to_ended_session_is_not_echoed() {
        let fx = fixture(
            Modality::Text,
            vec!["Hello!".into(), "Solid candidate.".into()],
        )
        .await;
        {
            let handle = fx.registry.get(&fx.session_id).unwrap();
            handle.lock().await.end(fx.gateway.as_ref()).await.unwrap();
        }
        let (a, mut rx_a) = attach(&fx);
        let (_b, mut rx_b) = attach(&fx);

        fx.handler
            .dispatch(
                &fx.session_id,
                &a,
                r#"{"type": "text_message", "content": "one more thing"}"#,
            )
            .await;

        // The sender gets the invalid-state error; the other participant
        // sees nothing at all.
        let err = parse(&rx_a.recv().await.unwrap());
        assert_eq!(err["type"], "error");
        assert!(err["content"].as_str().unwrap().contains("completed"));
        assert!(rx_a.try_recv().is_err());
        assert!(rx_b.try_recv().is_err());
    }
}
