// SPDX-FileCopyrightText: 2026 Intervox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-session state machine for one interview.
//!
//! A session is `active` from creation until it is explicitly ended
//! (`completed`) or administratively evicted (`cancelled`). Terminal states
//! admit no transitions. All mutation goes through `&mut self`; the registry
//! wraps each session in its own lock, which linearizes history appends and
//! backend calls for that session while leaving other sessions untouched.

use base64::Engine;
use chrono::{DateTime, Utc};
use intervox_core::{
    AiGateway, IntervoxError, Modality, ProfileSnapshot, PromptPart, Report, SessionId,
    SessionRecord, SessionStatus, TurnKind, TurnRecord, TurnRole,
};
use tracing::{debug, info, warn};

use crate::context::InterviewContext;
use crate::events::{EventSender, SessionEvent};
use crate::history::ConversationHistory;
use crate::report::ReportGenerator;

/// Instruction sent with each video frame.
const FRAME_ANALYSIS_INSTRUCTION: &str =
    "Please analyze this video frame from the interview. Comment briefly on the \
     candidate's appearance, body language, and professionalism.";

/// The state machine driving one interview conversation.
#[derive(Debug)]
pub struct InterviewSession {
    id: SessionId,
    applicant_id: String,
    status: SessionStatus,
    started_at: DateTime<Utc>,
    ended_at: Option<DateTime<Utc>>,
    last_activity: DateTime<Utc>,
    context: InterviewContext,
    history: ConversationHistory,
    /// Number of recent turns included when prompting the backend. Bounds
    /// request size at the cost of long-range context.
    history_window: usize,
    /// Audio is accepted but not transcribed; chunks are only counted.
    audio_chunks_buffered: usize,
    backend_connected: bool,
    /// Cached report so a repeated `end` returns identical content.
    report: Option<Report>,
    events: EventSender,
}

impl InterviewSession {
    /// Creates a session: builds the interview context, requests the opening
    /// greeting from the backend, and appends it as the first turn.
    ///
    /// This is the only operation where a backend failure fails the session
    /// itself; afterwards the conversation degrades instead of dying.
    pub async fn initiate(
        gateway: &dyn AiGateway,
        applicant_id: impl Into<String>,
        snapshot: Option<ProfileSnapshot>,
        modality: Modality,
        history_window: usize,
        events: EventSender,
    ) -> Result<Self, IntervoxError> {
        let applicant_id = applicant_id.into();
        let context = InterviewContext::new(snapshot.as_ref(), modality);

        let greeting = gateway
            .generate(vec![
                PromptPart::text(context.system_prompt()),
                PromptPart::text(context.opening_instruction()),
            ])
            .await?;

        let now = Utc::now();
        let mut session = Self {
            id: SessionId::generate(),
            applicant_id,
            status: SessionStatus::Active,
            started_at: now,
            ended_at: None,
            last_activity: now,
            context,
            history: ConversationHistory::new(),
            history_window,
            audio_chunks_buffered: 0,
            backend_connected: true,
            report: None,
            events,
        };

        let turn = session
            .history
            .append(TurnRole::Interviewer, TurnKind::Greeting, greeting);
        session.emit(SessionEvent::SessionUpserted(session.record()));
        session.emit_turn(&turn);

        info!(
            session_id = %session.id,
            applicant_id = %session.applicant_id,
            modality = %modality,
            "interview session initiated"
        );
        Ok(session)
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn applicant_id(&self) -> &str {
        &self.applicant_id
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn modality(&self) -> Modality {
        self.context.modality()
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn ended_at(&self) -> Option<DateTime<Utc>> {
        self.ended_at
    }

    pub fn last_activity(&self) -> DateTime<Utc> {
        self.last_activity
    }

    pub fn history(&self) -> &ConversationHistory {
        &self.history
    }

    /// The greeting turn, present from creation onwards.
    pub fn greeting(&self) -> Option<&intervox_core::ConversationTurn> {
        self.history.turns().first()
    }

    /// Appends the applicant's message, asks the backend for the next
    /// interviewer turn over a bounded history window, and appends it.
    ///
    /// A backend failure here leaves the session `active` so the applicant
    /// can retry; the applicant's turn stays in the history.
    pub async fn submit_text(
        &mut self,
        gateway: &dyn AiGateway,
        content: &str,
    ) -> Result<intervox_core::ConversationTurn, IntervoxError> {
        self.ensure_active("submit_text")?;
        self.touch();

        let applicant_turn = self
            .history
            .append(TurnRole::Applicant, TurnKind::Text, content);
        self.emit_turn(&applicant_turn);

        let reply = gateway.generate(self.window_prompt()).await?;

        let interviewer_turn = self
            .history
            .append(TurnRole::Interviewer, TurnKind::Text, reply);
        self.emit_turn(&interviewer_turn);

        debug!(
            session_id = %self.id,
            turns = self.history.len(),
            "text exchange completed"
        );
        Ok(interviewer_turn)
    }

    /// Sends one video frame for visual commentary.
    ///
    /// Only valid for `video` sessions. Analysis is best-effort: when the
    /// backend is not connected or errors, the result is `Ok(None)` and the
    /// interview continues.
    pub async fn submit_video_frame(
        &mut self,
        gateway: &dyn AiGateway,
        frame: &[u8],
    ) -> Result<Option<intervox_core::ConversationTurn>, IntervoxError> {
        self.ensure_active("submit_video_frame")?;
        if self.modality() != Modality::Video {
            return Err(IntervoxError::InvalidState {
                operation: "submit_video_frame",
                reason: format!("session modality is {}", self.modality()),
            });
        }
        self.touch();

        if !self.backend_connected {
            return Ok(None);
        }

        let encoded = base64::engine::general_purpose::STANDARD.encode(frame);
        let result = gateway
            .generate(vec![
                PromptPart::text(self.context.system_prompt()),
                PromptPart::text(FRAME_ANALYSIS_INSTRUCTION),
                PromptPart::jpeg(encoded),
            ])
            .await;

        match result {
            Ok(analysis) => {
                let turn = self.history.append(
                    TurnRole::Interviewer,
                    TurnKind::VideoAnalysis,
                    format!("[Video Analysis: {analysis}]"),
                );
                self.emit_turn(&turn);
                Ok(Some(turn))
            }
            Err(e) => {
                warn!(session_id = %self.id, error = %e, "frame analysis failed (best-effort)");
                Ok(None)
            }
        }
    }

    /// Accepts an audio chunk for later processing.
    ///
    /// The backend offers no real-time transcription, so chunks are only
    /// counted. Returns whether the chunk was accepted.
    pub fn submit_audio_chunk(&mut self, bytes: &[u8]) -> Result<bool, IntervoxError> {
        self.ensure_active("submit_audio_chunk")?;
        if bytes.is_empty() {
            return Ok(false);
        }
        self.touch();
        self.audio_chunks_buffered += 1;
        debug!(
            session_id = %self.id,
            buffered = self.audio_chunks_buffered,
            "audio chunk accepted without transcription"
        );
        Ok(true)
    }

    /// Ends the session: stamps the end time, generates the report, and
    /// transitions to `completed`.
    ///
    /// Repeated calls on a completed session return the cached report
    /// unchanged. A report-generation failure reverts the end stamp and
    /// leaves the session `active` so `end` can be retried.
    pub async fn end(&mut self, gateway: &dyn AiGateway) -> Result<Report, IntervoxError> {
        if let Some(report) = &self.report {
            return Ok(report.clone());
        }
        self.ensure_active("end")?;

        self.ended_at = Some(Utc::now());
        let report = match ReportGenerator::generate(gateway, self).await {
            Ok(report) => report,
            Err(e) => {
                // Keep the session endable: drop the stamp and stay active.
                self.ended_at = None;
                return Err(e);
            }
        };

        self.status = SessionStatus::Completed;
        self.backend_connected = false;
        self.report = Some(report.clone());
        self.emit(SessionEvent::SessionUpserted(self.record()));
        self.emit(SessionEvent::ReportGenerated(report.clone()));

        info!(
            session_id = %self.id,
            duration_minutes = report.duration_minutes,
            total_questions = report.total_questions,
            "interview session completed"
        );
        Ok(report)
    }

    /// Administrative cancellation (idle eviction). Idempotent on terminal
    /// sessions.
    pub fn cancel(&mut self) {
        if self.status.is_terminal() {
            return;
        }
        self.status = SessionStatus::Cancelled;
        self.ended_at = Some(Utc::now());
        self.backend_connected = false;
        self.emit(SessionEvent::SessionUpserted(self.record()));
        info!(session_id = %self.id, "interview session cancelled");
    }

    /// Session row as handed to the external store.
    pub fn record(&self) -> SessionRecord {
        SessionRecord {
            id: self.id.clone(),
            applicant_id: self.applicant_id.clone(),
            modality: self.modality(),
            status: self.status,
            started_at: self.started_at,
            ended_at: self.ended_at,
        }
    }

    fn ensure_active(&self, operation: &'static str) -> Result<(), IntervoxError> {
        if self.status != SessionStatus::Active {
            return Err(IntervoxError::not_active(operation, self.status));
        }
        Ok(())
    }

    fn touch(&mut self) {
        self.last_activity = Utc::now();
    }

    /// Bounded prompt: system context plus the last `history_window` turns,
    /// each attributed by role.
    fn window_prompt(&self) -> Vec<PromptPart> {
        let mut parts = vec![PromptPart::text(self.context.system_prompt())];
        for turn in self.history.recent(self.history_window) {
            let speaker = match turn.role {
                TurnRole::Applicant => "Candidate",
                TurnRole::Interviewer => "Interviewer",
            };
            parts.push(PromptPart::text(format!("{speaker}: {}", turn.content)));
        }
        parts
    }

    fn emit(&self, event: SessionEvent) {
        // The persistence side-channel may be absent (tests, tooling);
        // a closed channel is not an error here.
        let _ = self.events.send(event);
    }

    fn emit_turn(&self, turn: &intervox_core::ConversationTurn) {
        self.emit(SessionEvent::TurnAppended(TurnRecord {
            id: uuid::Uuid::new_v4().to_string(),
            session_id: self.id.clone(),
            turn: turn.clone(),
        }));
    }
}
