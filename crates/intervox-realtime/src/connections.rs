// SPDX-FileCopyrightText: 2026 Intervox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tracking of live duplex connections per session.
//!
//! Each attached WebSocket is represented by an mpsc sender feeding its
//! writer task plus a cancellation token that tears the socket down. A dead
//! connection reveals itself as a failed send; broadcast prunes it and keeps
//! going, so one dropped participant never stalls the rest of the session.

use dashmap::DashMap;
use intervox_core::{ConnectionId, SessionId};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Outbound channel depth per connection. A slow reader gets this much
/// buffering before sends start failing and the connection is pruned.
pub const OUTBOUND_BUFFER: usize = 64;

struct Connection {
    id: ConnectionId,
    tx: mpsc::Sender<String>,
    token: CancellationToken,
}

/// Registry of live connections, keyed by session.
///
/// A session may have several simultaneous connections (applicant plus
/// observers); a connection belongs to exactly one session.
#[derive(Default)]
pub struct ConnectionManager {
    connections: DashMap<SessionId, Vec<Connection>>,
}

impl ConnectionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches a connection to a session and returns its id.
    pub fn connect(
        &self,
        session_id: &SessionId,
        tx: mpsc::Sender<String>,
        token: CancellationToken,
    ) -> ConnectionId {
        let id = ConnectionId::generate();
        self.connections
            .entry(session_id.clone())
            .or_default()
            .push(Connection {
                id: id.clone(),
                tx,
                token,
            });
        debug!(session_id = %session_id, connection_id = %id, "connection attached");
        id
    }

    /// Detaches a connection. Idempotent: unknown ids are a no-op.
    pub fn disconnect(&self, session_id: &SessionId, connection_id: &ConnectionId) {
        let mut empty = false;
        if let Some(mut entry) = self.connections.get_mut(session_id) {
            entry.retain(|c| c.id != *connection_id);
            empty = entry.is_empty();
        }
        if empty {
            self.connections
                .remove_if(session_id, |_, conns| conns.is_empty());
        }
    }

    /// Number of connections currently attached to a session.
    pub fn connection_count(&self, session_id: &SessionId) -> usize {
        self.connections
            .get(session_id)
            .map(|entry| entry.len())
            .unwrap_or(0)
    }

    /// Sends a payload to one connection. Returns false when the connection
    /// is gone or its channel is full; the caller treats both as delivered
    /// best-effort.
    pub async fn send_to(
        &self,
        session_id: &SessionId,
        connection_id: &ConnectionId,
        payload: String,
    ) -> bool {
        let tx = self.connections.get(session_id).and_then(|entry| {
            entry
                .iter()
                .find(|c| c.id == *connection_id)
                .map(|c| c.tx.clone())
        });
        match tx {
            Some(tx) => tx.send(payload).await.is_ok(),
            None => false,
        }
    }

    /// Sends a payload to every connection of a session, pruning any whose
    /// channel has closed. Returns the number of successful deliveries.
    pub async fn broadcast(&self, session_id: &SessionId, payload: &str) -> usize {
        // Clone the senders out first; awaiting while holding a map guard
        // would block other connection changes on this shard.
        let targets: Vec<(ConnectionId, mpsc::Sender<String>)> = match self
            .connections
            .get(session_id)
        {
            Some(entry) => entry.iter().map(|c| (c.id.clone(), c.tx.clone())).collect(),
            None => return 0,
        };

        let mut delivered = 0;
        let mut dead = Vec::new();
        for (id, tx) in targets {
            if tx.send(payload.to_string()).await.is_ok() {
                delivered += 1;
            } else {
                dead.push(id);
            }
        }
        for id in dead {
            warn!(session_id = %session_id, connection_id = %id, "pruning dead connection");
            self.disconnect(session_id, &id);
        }
        delivered
    }

    /// Cancels and removes every connection of a session. Used when the
    /// interview ends or the session is evicted.
    pub fn close_session(&self, session_id: &SessionId) -> usize {
        match self.connections.remove(session_id) {
            Some((_, conns)) => {
                for conn in &conns {
                    conn.token.cancel();
                }
                debug!(session_id = %session_id, closed = conns.len(), "session connections closed");
                conns.len()
            }
            None => 0,
        }
    }
}
