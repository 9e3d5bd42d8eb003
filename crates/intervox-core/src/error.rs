// SPDX-FileCopyrightText: 2026 Intervox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Intervox interview engine.

use thiserror::Error;

use crate::types::SessionStatus;

/// The primary error type used across all Intervox collaborator traits and
/// core operations.
#[derive(Debug, Error)]
pub enum IntervoxError {
    /// No session exists for the given id.
    #[error("session not found: {0}")]
    NotFound(String),

    /// Operation is not valid for the session's current state
    /// (e.g. submitting text to a completed session).
    #[error("invalid state: {operation} rejected: {reason}")]
    InvalidState {
        operation: &'static str,
        reason: String,
    },

    /// Generative backend unreachable or returned a non-success status.
    #[error("backend error: {message}")]
    Backend {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Backend responded, but the payload did not match the expected schema.
    #[error("malformed backend response: {0}")]
    MalformedResponse(String),

    /// Inbound envelope or payload could not be decoded.
    #[error("malformed input: {0}")]
    MalformedInput(String),

    /// Downstream store failure. Always non-fatal to the live conversation;
    /// callers log and continue.
    #[error("persistence error: {source}")]
    Persistence {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Configuration errors (invalid TOML, missing required fields).
    #[error("configuration error: {0}")]
    Config(String),

    /// Transport-level connection errors (bind failure, closed channel).
    #[error("channel error: {message}")]
    Channel {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl IntervoxError {
    /// Shorthand for a backend error without an underlying source.
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
            source: None,
        }
    }

    /// Rejection of an operation on a session that is not `active`.
    pub fn not_active(operation: &'static str, status: SessionStatus) -> Self {
        Self::InvalidState {
            operation,
            reason: format!("session is {status}"),
        }
    }

    /// True for errors that must never interrupt a live conversation.
    pub fn is_non_fatal(&self) -> bool {
        matches!(self, Self::Persistence { .. })
    }
}
