// SPDX-FileCopyrightText: 2026 Intervox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Assessment-report generation for ended sessions.
//!
//! The report is derived from the conversation transcript plus timing
//! metadata. Only the narrative assessment comes from the backend; counts
//! and duration are computed locally so they stay exact even when the
//! backend paraphrases.

use chrono::{DateTime, Utc};
use intervox_core::{AiGateway, IntervoxError, PromptPart, Report, SessionStatus, TurnKind, TurnRole};
use tracing::debug;

use crate::session::InterviewSession;

const ASSESSMENT_INSTRUCTION: &str = "\
Based on the interview conversation below, write a structured assessment of the candidate.

Cover these sections:
1. Overall performance rating
2. Communication skills
3. Technical competency
4. Strengths
5. Areas for improvement
6. Hiring recommendation
7. Summary

Interview transcript:
";

/// Builds the end-of-interview report for a session.
pub struct ReportGenerator;

impl ReportGenerator {
    /// Generates the assessment via the backend and assembles the report.
    ///
    /// Called with the end timestamp already stamped on the session; the
    /// caller owns the state transition and rolls the stamp back on failure.
    pub async fn generate(
        gateway: &dyn AiGateway,
        session: &InterviewSession,
    ) -> Result<Report, IntervoxError> {
        let ended_at = session.ended_at().unwrap_or_else(Utc::now);
        let prompt = Self::assessment_prompt(session);
        let content = gateway.generate(vec![PromptPart::text(prompt)]).await?;

        let report = Report {
            id: uuid::Uuid::new_v4().to_string(),
            session_id: session.id().clone(),
            applicant_id: session.applicant_id().to_string(),
            duration_minutes: duration_minutes(session.started_at(), ended_at),
            total_questions: session.history().interviewer_turns(),
            content,
            generated_at: Utc::now(),
            status: SessionStatus::Completed,
        };
        debug!(
            session_id = %report.session_id,
            duration_minutes = report.duration_minutes,
            total_questions = report.total_questions,
            "report assembled"
        );
        Ok(report)
    }

    /// The assessment prompt: fixed instruction plus the spoken transcript.
    /// Video-analysis turns are interviewer-side commentary, not dialogue,
    /// and are left out.
    fn assessment_prompt(session: &InterviewSession) -> String {
        let mut prompt = String::from(ASSESSMENT_INSTRUCTION);
        for turn in session.history().turns() {
            if !matches!(turn.kind, TurnKind::Text | TurnKind::Greeting) {
                continue;
            }
            let speaker = match turn.role {
                TurnRole::Applicant => "Candidate",
                TurnRole::Interviewer => "Interviewer",
            };
            prompt.push_str(speaker);
            prompt.push_str(": ");
            prompt.push_str(&turn.content);
            prompt.push('\n');
        }
        prompt
    }
}

/// Whole minutes between start and end, floored. Clamped at zero so clock
/// skew can never produce a negative duration.
pub(crate) fn duration_minutes(start: DateTime<Utc>, end: DateTime<Utc>) -> i64 {
    (end - start).num_minutes().max(0)
}
