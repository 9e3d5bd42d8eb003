// SPDX-FileCopyrightText: 2026 Intervox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain-event side-channel for best-effort persistence.
//!
//! Sessions emit events on an unbounded channel instead of calling the
//! stores inline, so storage latency or outages never touch conversational
//! turnaround. A single worker task consumes the channel and writes to the
//! external stores; every failure is logged and dropped.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, warn};

use intervox_core::{Report, ReportStore, SessionRecord, SessionStore, TurnRecord};

/// An event describing a persistence-worthy change to a session.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// Session created, status changed, or end time stamped.
    SessionUpserted(SessionRecord),
    /// A turn was appended to the conversation.
    TurnAppended(TurnRecord),
    /// A report was generated for a completed session.
    ReportGenerated(Report),
}

/// Sender half handed to each session. Unbounded so emitting never awaits.
pub type EventSender = mpsc::UnboundedSender<SessionEvent>;

/// Creates the event channel.
pub fn event_channel() -> (EventSender, mpsc::UnboundedReceiver<SessionEvent>) {
    mpsc::unbounded_channel()
}

/// Creates a sender whose events go nowhere. For tests and tooling that do
/// not care about persistence.
pub fn null_sender() -> EventSender {
    let (tx, _rx) = mpsc::unbounded_channel();
    tx
}

/// Spawns the persistence consumer.
///
/// Runs until the last sender is dropped. Store failures are logged at
/// `warn` and never propagated; the conversation must outlive any storage
/// hiccup.
pub fn spawn_persistence_worker(
    mut rx: mpsc::UnboundedReceiver<SessionEvent>,
    session_store: Arc<dyn SessionStore>,
    report_store: Arc<dyn ReportStore>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            match event {
                SessionEvent::SessionUpserted(record) => {
                    if let Err(e) = session_store.upsert_session(&record).await {
                        warn!(session_id = %record.id, error = %e, "session upsert failed (non-fatal)");
                    }
                }
                SessionEvent::TurnAppended(record) => {
                    if let Err(e) = session_store.append_turn(&record).await {
                        warn!(session_id = %record.session_id, error = %e, "turn append failed (non-fatal)");
                    }
                }
                SessionEvent::ReportGenerated(report) => {
                    if let Err(e) = report_store.insert_report(&report).await {
                        warn!(session_id = %report.session_id, error = %e, "report insert failed (non-fatal)");
                    }
                }
            }
        }
        debug!("persistence worker stopped: event channel closed");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use intervox_core::{Modality, SessionId, SessionStatus};
    use intervox_test_utils::MemorySink;

    fn session_record(id: &SessionId) -> SessionRecord {
        SessionRecord {
            id: id.clone(),
            applicant_id: "applicant-1".into(),
            modality: Modality::Text,
            status: SessionStatus::Active,
            started_at: Utc::now(),
            ended_at: None,
        }
    }

    #[tokio::test]
    async fn worker_writes_events_to_stores() {
        let sink = MemorySink::new();
        let (tx, rx) = event_channel();
        let handle = spawn_persistence_worker(rx, sink.clone(), sink.clone());

        let id = SessionId::generate();
        tx.send(SessionEvent::SessionUpserted(session_record(&id)))
            .unwrap();
        drop(tx);
        handle.await.unwrap();

        assert_eq!(sink.sessions.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn store_failures_are_swallowed() {
        let sink = MemorySink::new();
        sink.set_failing(true);
        let (tx, rx) = event_channel();
        let handle = spawn_persistence_worker(rx, sink.clone(), sink.clone());

        let id = SessionId::generate();
        tx.send(SessionEvent::SessionUpserted(session_record(&id)))
            .unwrap();
        tx.send(SessionEvent::SessionUpserted(session_record(&id)))
            .unwrap();
        drop(tx);
        // Worker must finish cleanly despite every write failing.
        handle.await.unwrap();
        assert!(sink.sessions.lock().await.is_empty());
    }

    #[tokio::test]
    async fn null_sender_discards_events() {
        let tx = null_sender();
        // Receiver is gone; send errors are the caller's signal to ignore.
        let id = SessionId::generate();
        assert!(tx
            .send(SessionEvent::SessionUpserted(session_record(&id)))
            .is_err());
    }
}
