// SPDX-FileCopyrightText: 2026 Intervox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./intervox.toml` > `~/.config/intervox/intervox.toml`
//! > `/etc/intervox/intervox.toml` with environment variable overrides via
//! the `INTERVOX_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::IntervoxConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/intervox/intervox.toml` (system-wide)
/// 3. `~/.config/intervox/intervox.toml` (user XDG config)
/// 4. `./intervox.toml` (local directory)
/// 5. `INTERVOX_*` environment variables
pub fn load_config() -> Result<IntervoxConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(IntervoxConfig::default()))
        .merge(Toml::file("/etc/intervox/intervox.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("intervox/intervox.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("intervox.toml"))
        .merge(env_provider())
        .extract()
}

/// Load configuration from a TOML string only (no XDG lookup).
///
/// Used for testing and explicit inline configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<IntervoxConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(IntervoxConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<IntervoxConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(IntervoxConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Create the environment variable provider using explicit `map()` for
/// section-to-dot mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")` so that key names
/// containing underscores stay unambiguous: `INTERVOX_GEMINI_API_KEY` must
/// map to `gemini.api_key`, not `gemini.api.key`.
fn env_provider() -> Env {
    Env::prefixed("INTERVOX_").map(|key| {
        let key_str = key.as_str();
        let mapped = key_str
            .replacen("agent_", "agent.", 1)
            .replacen("server_", "server.", 1)
            .replacen("gemini_", "gemini.", 1)
            .replacen("session_", "session.", 1)
            .replacen("storage_", "storage.", 1);
        mapped.into()
    })
}
