// SPDX-FileCopyrightText: 2026 Chatore Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports the XDG hierarchy: `./chatore.toml` > `~/.config/chatore/chatore.toml`
//! > `/etc/chatore/chatore.toml`, with environment variable overrides via the
//! `CHATORE_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::ChatoreConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/chatore/chatore.toml` (system-wide)
/// 3. `~/.config/chatore/chatore.toml` (user XDG config)
/// 4. `./chatore.toml` (local directory)
/// 5. `CHATORE_*` environment variables
pub fn load_config() -> Result<ChatoreConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(ChatoreConfig::default()))
        .merge(Toml::file("/etc/chatore/chatore.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("chatore/chatore.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("chatore.toml"))
        .merge(env_provider())
        .extract()
}

/// Load configuration from an inline TOML string only (no XDG lookup).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<ChatoreConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(ChatoreConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<ChatoreConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(ChatoreConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Create the environment variable provider using explicit `map()` for
/// section-to-dot mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")` to avoid ambiguity with
/// underscore-containing key names: `CHATORE_STORAGE_TIER_SNAPSHOT_PATH` must
/// map to `storage.tier_snapshot_path`, not `storage.tier.snapshot.path`.
fn env_provider() -> Env {
    Env::prefixed("CHATORE_").map(|key| {
        // `key` is the lowercased env var name with prefix stripped.
        let key_str = key.as_str();
        let mapped = key_str
            .replacen("agent_", "agent.", 1)
            .replacen("tiers_", "tiers.", 1)
            .replacen("storage_", "storage.", 1)
            .replacen("sweep_", "sweep.", 1);
        mapped.into()
    })
}
