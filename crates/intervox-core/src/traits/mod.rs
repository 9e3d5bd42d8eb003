// SPDX-FileCopyrightText: 2026 Intervox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collaborator traits implemented outside the core.

pub mod gateway;
pub mod store;

pub use gateway::{AiGateway, PromptPart};
pub use store::{ProfileStore, ReportStore, SessionStore};
