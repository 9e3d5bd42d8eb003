// SPDX-FileCopyrightText: 2026 Intervox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shared registry of live interview sessions.
//!
//! Each session sits behind its own async mutex inside a concurrent map, so
//! operations on different sessions never contend. Holding a session's lock
//! across its backend call is deliberate: it serializes turns within one
//! interview, which is what keeps sequence numbers gap-free.

use std::sync::Arc;

use chrono::{Duration, Utc};
use dashmap::DashMap;
use intervox_core::{IntervoxError, SessionId};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::session::InterviewSession;

/// A live session handle. Lock it to operate on the session.
pub type SessionHandle = Arc<Mutex<InterviewSession>>;

/// Concurrent map of all in-memory sessions.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: DashMap<SessionId, SessionHandle>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a freshly created session and returns its handle.
    pub fn insert(&self, session: InterviewSession) -> SessionHandle {
        let id = session.id().clone();
        let handle = Arc::new(Mutex::new(session));
        self.sessions.insert(id.clone(), handle.clone());
        debug!(session_id = %id, live = self.sessions.len(), "session registered");
        handle
    }

    /// Looks up a session by id.
    pub fn get(&self, id: &SessionId) -> Result<SessionHandle, IntervoxError> {
        self.sessions
            .get(id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| IntervoxError::NotFound(id.to_string()))
    }

    /// Removes a session from the registry. Idempotent: removing an unknown
    /// id is a no-op. Existing handles stay usable until dropped.
    pub fn remove(&self, id: &SessionId) -> Option<SessionHandle> {
        self.sessions.remove(id).map(|(_, handle)| handle)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Cancels and removes every session idle longer than `idle_timeout`.
    /// Returns the evicted ids.
    pub async fn evict_idle(&self, idle_timeout: Duration) -> Vec<SessionId> {
        let candidates: Vec<SessionId> = self
            .sessions
            .iter()
            .map(|entry| entry.key().clone())
            .collect();

        let cutoff = Utc::now() - idle_timeout;
        let mut evicted = Vec::new();
        for id in candidates {
            let Some(handle) = self.sessions.get(&id).map(|e| e.value().clone()) else {
                continue;
            };
            let mut session = handle.lock().await;
            if session.last_activity() >= cutoff {
                continue;
            }
            session.cancel();
            drop(session);
            self.sessions.remove(&id);
            info!(session_id = %id, "idle session evicted");
            evicted.push(id);
        }
        evicted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::null_sender;
    use intervox_core::{Modality, SessionStatus};
    use intervox_test_utils::MockGateway;

    async fn registered_session(
        gateway: &MockGateway,
        registry: &SessionRegistry,
    ) -> (SessionId, SessionHandle) {
        let session = InterviewSession::initiate(
            gateway,
            "applicant-1",
            None,
            Modality::Text,
            8,
            null_sender(),
        )
        .await
        .unwrap();
        let id = session.id().clone();
        let handle = registry.insert(session);
        (id, handle)
    }

    #[tokio::test]
    async fn insert_then_get_returns_same_session() {
        let gateway = MockGateway::new();
        let registry = SessionRegistry::new();
        let (id, _handle) = registered_session(&gateway, &registry).await;

        let fetched = registry.get(&id).unwrap();
        assert_eq!(*fetched.lock().await.id(), id);
    }

    #[tokio::test]
    async fn get_unknown_id_is_not_found() {
        let registry = SessionRegistry::new();
        let err = registry.get(&SessionId::generate()).unwrap_err();
        assert!(matches!(err, IntervoxError::NotFound(_)));
    }

    #[tokio::test]
    async fn remove_is_idempotent() {
        let gateway = MockGateway::new();
        let registry = SessionRegistry::new();
        let (id, _handle) = registered_session(&gateway, &registry).await;

        assert!(registry.remove(&id).is_some());
        assert!(registry.remove(&id).is_none());
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn concurrent_submissions_keep_sequence_gap_free() {
        let gateway = Arc::new(MockGateway::new());
        let registry = SessionRegistry::new();
        let (_id, handle) = registered_session(&gateway, &registry).await;

        let mut tasks = Vec::new();
        for i in 0..8 {
            let handle = handle.clone();
            let gateway = gateway.clone();
            tasks.push(tokio::spawn(async move {
                let mut session = handle.lock().await;
                session
                    .submit_text(gateway.as_ref(), &format!("answer {i}"))
                    .await
                    .unwrap();
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        let session = handle.lock().await;
        // Greeting plus 8 applicant/interviewer pairs.
        assert_eq!(session.history().len(), 17);
        for (i, turn) in session.history().turns().iter().enumerate() {
            assert_eq!(turn.seq, i as u64);
        }
    }

    #[tokio::test]
    async fn evict_idle_cancels_only_stale_sessions() {
        let gateway = MockGateway::new();
        let registry = SessionRegistry::new();
        let (stale_id, stale_handle) = registered_session(&gateway, &registry).await;
        let (fresh_id, _fresh_handle) = registered_session(&gateway, &registry).await;

        // Zero timeout makes everything below "now" stale; refresh one first.
        tokio::time::sleep(std::time::Duration::from_millis(200)).await;
        registry
            .get(&fresh_id)
            .unwrap()
            .lock()
            .await
            .submit_audio_chunk(b"keepalive")
            .unwrap();

        let evicted = registry.evict_idle(Duration::milliseconds(100)).await;
        assert_eq!(evicted, vec![stale_id.clone()]);
        assert!(registry.get(&stale_id).is_err());
        assert!(registry.get(&fresh_id).is_ok());
        assert_eq!(
            stale_handle.lock().await.status(),
            SessionStatus::Cancelled
        );
    }
}
