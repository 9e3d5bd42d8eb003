// SPDX-FileCopyrightText: 2026 Intervox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared across the Intervox workspace.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Unique identifier for an interview session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl SessionId {
    /// Generates a fresh random id. UUIDv4 keeps the collision probability
    /// cryptographically negligible across restarts.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Unique identifier for one attached duplex connection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectionId(pub String);

impl ConnectionId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lifecycle status of an interview session.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    /// Conversation in progress; all submit operations are valid.
    Active,
    /// Ended via explicit `end`; terminal.
    Completed,
    /// Ended administratively (idle eviction); terminal.
    Cancelled,
}

impl SessionStatus {
    /// Terminal states admit no further transitions.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

/// Channel type of the interview.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Modality {
    /// Text-only conversation.
    Text,
    /// Text plus audio chunks and image frames.
    Video,
}

/// Attribution of a conversation turn.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    Applicant,
    Interviewer,
}

/// Sub-kind tag on a turn's content.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TurnKind {
    Text,
    Greeting,
    VideoAnalysis,
}

/// One message in the conversation, attributed to applicant or interviewer.
///
/// `seq` positions are assigned at append time and are strictly increasing
/// within a session, never reused.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: TurnRole,
    pub kind: TurnKind,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub seq: u64,
}

/// Immutable candidate-profile snapshot captured at session creation.
///
/// Every field is optional; prompt construction substitutes placeholders for
/// anything missing, so a session can always start without a resume.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileSnapshot {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub experience_count: usize,
}

/// Structured interview report, immutable once generated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub id: String,
    pub session_id: SessionId,
    pub applicant_id: String,
    /// Whole minutes between session start and end, floored.
    pub duration_minutes: i64,
    /// Number of interviewer turns, counted as questions asked.
    pub total_questions: usize,
    /// Narrative assessment text from the generative backend. Opaque here.
    pub content: String,
    pub generated_at: DateTime<Utc>,
    pub status: SessionStatus,
}

/// Session row as handed to the external session store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: SessionId,
    pub applicant_id: String,
    pub modality: Modality,
    pub status: SessionStatus,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
}

/// Turn row as handed to the external session store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnRecord {
    pub id: String,
    pub session_id: SessionId,
    pub turn: ConversationTurn,
}
