// SPDX-FileCopyrightText: 2026 Intervox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Layered configuration for the Intervox interview engine.

pub mod loader;
pub mod model;

pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::{AgentConfig, GeminiConfig, IntervoxConfig, ServerConfig, SessionConfig};
