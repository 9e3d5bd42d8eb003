// SPDX-FileCopyrightText: 2026 Intervox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers for the interview REST API.
//!
//! Handles POST /v1/interviews and GET /health.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use intervox_core::{Modality, ProfileSnapshot};
use intervox_session::InterviewSession;

use crate::server::RealtimeState;

/// Request body for POST /v1/interviews.
#[derive(Debug, Deserialize)]
pub struct CreateInterviewRequest {
    /// Applicant the interview is for.
    pub applicant_id: String,
    /// Interview channel; defaults to text.
    #[serde(default)]
    pub modality: Option<Modality>,
    /// Inline profile snapshot; when present it takes precedence over the
    /// profile store lookup.
    #[serde(default)]
    pub profile: Option<ProfileSnapshot>,
}

/// Response body for POST /v1/interviews.
#[derive(Debug, Serialize)]
pub struct CreateInterviewResponse {
    /// Newly created session identifier. Connect the WebSocket with this.
    pub session_id: String,
    pub status: String,
    /// The interviewer's opening turn.
    pub greeting: String,
    /// ISO 8601 session start timestamp.
    pub started_at: String,
}

/// Response body for GET /health.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub active_sessions: usize,
    pub uptime_secs: u64,
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// POST /v1/interviews
///
/// Creates a session: loads the applicant's profile (best-effort), requests
/// the opening greeting from the backend, and registers the session for
/// WebSocket attachment.
pub async fn post_interviews(
    State(state): State<RealtimeState>,
    Json(body): Json<CreateInterviewRequest>,
) -> Response {
    if body.applicant_id.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "applicant_id must not be empty".to_string(),
            }),
        )
            .into_response();
    }
    let modality = body.modality.unwrap_or(Modality::Text);

    // A profile-store outage degrades the interview to a generic one
    // instead of blocking session creation.
    let snapshot = match body.profile {
        Some(snapshot) => Some(snapshot),
        None => match state.profiles.load_profile(&body.applicant_id).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(applicant_id = %body.applicant_id, error = %e, "profile lookup failed");
                None
            }
        },
    };

    match InterviewSession::initiate(
        state.gateway.as_ref(),
        &body.applicant_id,
        snapshot,
        modality,
        state.history_window,
        state.events.clone(),
    )
    .await
    {
        Ok(session) => {
            let response = CreateInterviewResponse {
                session_id: session.id().to_string(),
                status: session.status().to_string(),
                greeting: session
                    .greeting()
                    .map(|t| t.content.clone())
                    .unwrap_or_default(),
                started_at: session.started_at().to_rfc3339(),
            };
            state.registry.insert(session);
            (StatusCode::CREATED, Json(response)).into_response()
        }
        Err(e) => {
            error!(applicant_id = %body.applicant_id, error = %e, "session creation failed");
            (
                StatusCode::BAD_GATEWAY,
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            )
                .into_response()
        }
    }
}

/// GET /health
pub async fn get_health(State(state): State<RealtimeState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        active_sessions: state.registry.len(),
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_request_deserializes_minimal() {
        let req: CreateInterviewRequest =
            serde_json::from_str(r#"{"applicant_id": "applicant-1"}"#).unwrap();
        assert_eq!(req.applicant_id, "applicant-1");
        assert!(req.modality.is_none());
        assert!(req.profile.is_none());
    }

    #[test]
    fn create_request_accepts_inline_profile() {
        let req: CreateInterviewRequest = serde_json::from_str(
            r#"{"applicant_id": "applicant-1", "profile": {"name": "Jane Doe", "skills": ["Python"]}}"#,
        )
        .unwrap();
        let profile = req.profile.unwrap();
        assert_eq!(profile.name.as_deref(), Some("Jane Doe"));
        assert_eq!(profile.skills, vec!["Python".to_string()]);
    }

    #[test]
    fn create_request_accepts_video_modality() {
        let req: CreateInterviewRequest =
            serde_json::from_str(r#"{"applicant_id": "applicant-1", "modality": "video"}"#)
                .unwrap();
        assert_eq!(req.modality, Some(Modality::Video));
    }

    #[test]
    fn health_response_serializes() {
        let json = serde_json::to_value(HealthResponse {
            status: "ok".into(),
            active_sessions: 2,
            uptime_secs: 30,
        })
        .unwrap();
        assert_eq!(json["status"], "ok");
        assert_eq!(json["active_sessions"], 2);
    }
}
