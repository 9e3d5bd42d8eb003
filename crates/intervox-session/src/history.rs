// SPDX-FileCopyrightText: 2026 Intervox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ordered, append-only conversation log for one session.
//!
//! Sequence numbers are assigned by the single append path and are strictly
//! increasing with no gaps or reuse. Concurrent callers are serialized by
//! the per-session lock in the registry, so the log itself needs no
//! interior synchronization.

use chrono::Utc;
use intervox_core::{ConversationTurn, TurnKind, TurnRole};

/// Append-only sequence of conversation turns.
#[derive(Debug, Clone, Default)]
pub struct ConversationHistory {
    turns: Vec<ConversationTurn>,
    next_seq: u64,
}

impl ConversationHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a turn, assigning the next sequence number and a timestamp.
    pub fn append(
        &mut self,
        role: TurnRole,
        kind: TurnKind,
        content: impl Into<String>,
    ) -> ConversationTurn {
        let turn = ConversationTurn {
            role,
            kind,
            content: content.into(),
            timestamp: Utc::now(),
            seq: self.next_seq,
        };
        self.next_seq += 1;
        self.turns.push(turn.clone());
        turn
    }

    pub fn turns(&self) -> &[ConversationTurn] {
        &self.turns
    }

    /// The last `n` turns, oldest first.
    pub fn recent(&self, n: usize) -> &[ConversationTurn] {
        let start = self.turns.len().saturating_sub(n);
        &self.turns[start..]
    }

    /// Number of interviewer turns; reported as the question count.
    pub fn interviewer_turns(&self) -> usize {
        self.turns
            .iter()
            .filter(|t| t.role == TurnRole::Interviewer)
            .count()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}
