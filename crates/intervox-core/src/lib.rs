// SPDX-FileCopyrightText: 2026 Intervox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Intervox interview engine.
//!
//! This crate provides the error taxonomy, shared types, and collaborator
//! trait definitions used throughout the Intervox workspace. The generative
//! backend and persistence stores are consumed through the traits defined
//! here.

pub mod error;
pub mod traits;
pub mod types;

pub use error::IntervoxError;
pub use traits::{AiGateway, ProfileStore, PromptPart, ReportStore, SessionStore};
pub use types::{
    ConnectionId, ConversationTurn, Modality, ProfileSnapshot, Report, SessionId,
    SessionRecord, SessionStatus, TurnKind, TurnRecord, TurnRole,
};
