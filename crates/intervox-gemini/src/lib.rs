// SPDX-FileCopyrightText: 2026 Intervox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gemini provider for the Intervox interview engine.
//!
//! Wraps the `generateContent` REST endpoint behind the [`AiGateway`] trait
//! so the session layer never sees the wire format.
//!
//! [`AiGateway`]: intervox_core::AiGateway

pub mod client;
pub mod types;

pub use client::GeminiClient;
