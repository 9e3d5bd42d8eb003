// SPDX-FileCopyrightText: 2026 Intervox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Store traits for the external persistence collaborators.
//!
//! All three stores are best-effort sinks: the conversation keeps running
//! when they are unreachable, and callers log failures instead of
//! propagating them. `ProfileStore` is the one read path, used at session
//! initiation.

use async_trait::async_trait;

use crate::error::IntervoxError;
use crate::types::{ProfileSnapshot, Report, SessionRecord, TurnRecord};

/// Read-only candidate profile lookup.
#[async_trait]
pub trait ProfileStore: Send + Sync + 'static {
    /// Loads the profile snapshot for an applicant, or `Ok(None)` when the
    /// applicant has no stored profile.
    async fn load_profile(
        &self,
        applicant_id: &str,
    ) -> Result<Option<ProfileSnapshot>, IntervoxError>;
}

/// Persistence sink for session rows and conversation turns.
#[async_trait]
pub trait SessionStore: Send + Sync + 'static {
    /// Inserts or updates the session row.
    async fn upsert_session(&self, record: &SessionRecord) -> Result<(), IntervoxError>;

    /// Appends one conversation turn.
    async fn append_turn(&self, record: &TurnRecord) -> Result<(), IntervoxError>;
}

/// Persistence sink for generated reports.
#[async_trait]
pub trait ReportStore: Send + Sync + 'static {
    async fn insert_report(&self, report: &Report) -> Result<(), IntervoxError>;
}
