// SPDX-FileCopyrightText: 2026 Intervox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory store implementations capturing writes for assertions.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use intervox_core::{
    IntervoxError, ProfileSnapshot, ProfileStore, Report, ReportStore, SessionRecord,
    SessionStore, TurnRecord,
};

/// In-memory `ProfileStore` backed by a map.
#[derive(Default)]
pub struct MemoryProfileStore {
    profiles: Mutex<HashMap<String, ProfileSnapshot>>,
}

impl MemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, applicant_id: impl Into<String>, snapshot: ProfileSnapshot) {
        self.profiles.lock().await.insert(applicant_id.into(), snapshot);
    }
}

#[async_trait]
impl ProfileStore for MemoryProfileStore {
    async fn load_profile(
        &self,
        applicant_id: &str,
    ) -> Result<Option<ProfileSnapshot>, IntervoxError> {
        Ok(self.profiles.lock().await.get(applicant_id).cloned())
    }
}

/// In-memory `SessionStore` + `ReportStore` recording every write.
///
/// With `failing` set, every write fails with a persistence error; the
/// conversation layer is expected to log and continue.
#[derive(Default)]
pub struct MemorySink {
    pub sessions: Mutex<Vec<SessionRecord>>,
    pub turns: Mutex<Vec<TurnRecord>>,
    pub reports: Mutex<Vec<Report>>,
    failing: AtomicBool,
}

impl MemorySink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), IntervoxError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(IntervoxError::Persistence {
                source: Box::new(std::io::Error::other("memory sink is failing")),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl SessionStore for MemorySink {
    async fn upsert_session(&self, record: &SessionRecord) -> Result<(), IntervoxError> {
        self.check()?;
        let mut sessions = self.sessions.lock().await;
        if let Some(existing) = sessions.iter_mut().find(|s| s.id == record.id) {
            *existing = record.clone();
        } else {
            sessions.push(record.clone());
        }
        Ok(())
    }

    async fn append_turn(&self, record: &TurnRecord) -> Result<(), IntervoxError> {
        self.check()?;
        self.turns.lock().await.push(record.clone());
        Ok(())
    }
}

#[async_trait]
impl ReportStore for MemorySink {
    async fn insert_report(&self, report: &Report) -> Result<(), IntervoxError> {
        self.check()?;
        self.reports.lock().await.push(report.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use intervox_core::{Modality, SessionId, SessionStatus};

    fn record(id: &SessionId, status: SessionStatus) -> SessionRecord {
        SessionRecord {
            id: id.clone(),
            applicant_id: "applicant-1".into(),
            modality: Modality::Text,
            status,
            started_at: Utc::now(),
            ended_at: None,
        }
    }

    #[tokio::test]
    async fn profile_store_round_trip() {
        let store = MemoryProfileStore::new();
        store
            .insert(
                "applicant-1",
                ProfileSnapshot {
                    name: Some("Jane Doe".into()),
                    ..ProfileSnapshot::default()
                },
            )
            .await;
        let loaded = store.load_profile("applicant-1").await.unwrap().unwrap();
        assert_eq!(loaded.name.as_deref(), Some("Jane Doe"));
        assert!(store.load_profile("nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn upsert_replaces_by_id() {
        let sink = MemorySink::new();
        let id = SessionId::generate();
        sink.upsert_session(&record(&id, SessionStatus::Active))
            .await
            .unwrap();
        sink.upsert_session(&record(&id, SessionStatus::Completed))
            .await
            .unwrap();
        let sessions = sink.sessions.lock().await;
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].status, SessionStatus::Completed);
    }

    #[tokio::test]
    async fn failing_mode_returns_persistence_error() {
        let sink = MemorySink::new();
        sink.set_failing(true);
        let err = sink
            .upsert_session(&record(&SessionId::generate(), SessionStatus::Active))
            .await
            .unwrap_err();
        assert!(err.is_non_fatal());
    }
}
