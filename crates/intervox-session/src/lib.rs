// SPDX-FileCopyrightText: 2026 Intervox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Interview session lifecycle: per-session state machine, shared registry,
//! conversation history, and end-of-interview report generation.

pub mod context;
pub mod events;
pub mod history;
pub mod registry;
pub mod report;
pub mod session;

pub use context::InterviewContext;
pub use events::{event_channel, null_sender, spawn_persistence_worker, EventSender, SessionEvent};
pub use history::ConversationHistory;
pub use registry::{SessionHandle, SessionRegistry};
pub use report::ReportGenerator;
pub use session::InterviewSession;
