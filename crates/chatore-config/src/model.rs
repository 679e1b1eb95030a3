// SPDX-FileCopyrightText: 2026 Chatore Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Chatore bot core.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, producing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level Chatore configuration.
///
/// Loaded from TOML files following the XDG hierarchy, with environment
/// variable overrides. All sections are optional and default to the limits
/// the bot has always shipped with.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ChatoreConfig {
    /// Bot identity and logging settings.
    #[serde(default)]
    pub agent: AgentConfig,

    /// Subscription tier limits and features.
    #[serde(default)]
    pub tiers: TiersConfig,

    /// Snapshot persistence settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Inactivity-decay sweep settings.
    #[serde(default)]
    pub sweep: SweepConfig,
}

/// Bot identity and logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    /// Display name of the bot.
    #[serde(default = "default_agent_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: default_agent_name(),
            log_level: default_log_level(),
        }
    }
}

fn default_agent_name() -> String {
    "chatore".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Limits and metadata for one subscription tier.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TierConfig {
    /// Human-readable tier name shown to users.
    pub display_name: String,

    /// Number of recent conversation turns included in the LLM context.
    pub context_limit: usize,

    /// Requests allowed per accounting window.
    pub requests_per_window: u32,

    /// Monthly price in USD (0 for free).
    #[serde(default)]
    pub price_usd: f64,

    /// Feature bullet points shown in plan displays.
    #[serde(default)]
    pub features: Vec<String>,
}

/// Per-tier configuration with the shared window length.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TiersConfig {
    /// Length of the rolling accounting window, in hours.
    #[serde(default = "default_window_hours")]
    pub window_hours: u64,

    /// Free tier limits.
    #[serde(default = "default_free_tier")]
    pub free: TierConfig,

    /// Premium tier limits.
    #[serde(default = "default_premium_tier")]
    pub premium: TierConfig,
}

impl Default for TiersConfig {
    fn default() -> Self {
        Self {
            window_hours: default_window_hours(),
            free: default_free_tier(),
            premium: default_premium_tier(),
        }
    }
}

fn default_window_hours() -> u64 {
    12
}

fn default_free_tier() -> TierConfig {
    TierConfig {
        display_name: "Free Tier".to_string(),
        context_limit: 12,
        requests_per_window: 40,
        price_usd: 0.0,
        features: vec![
            "12 message context".to_string(),
            "40 requests per 12 hours".to_string(),
            "Memory system".to_string(),
            "Standard personality".to_string(),
        ],
    }
}

fn default_premium_tier() -> TierConfig {
    TierConfig {
        display_name: "Premium Tier".to_string(),
        context_limit: 25,
        requests_per_window: 200,
        price_usd: 1.50,
        features: vec![
            "25 message context".to_string(),
            "200 requests per 12 hours".to_string(),
            "Enhanced memory system".to_string(),
            "Custom personality system".to_string(),
            "Priority support".to_string(),
        ],
    }
}

/// Snapshot persistence configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path of the conversation snapshot file (memories, history, prefs).
    #[serde(default = "default_memory_snapshot_path")]
    pub memory_snapshot_path: String,

    /// Path of the tier snapshot file (tiers, usage counters).
    #[serde(default = "default_tier_snapshot_path")]
    pub tier_snapshot_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            memory_snapshot_path: default_memory_snapshot_path(),
            tier_snapshot_path: default_tier_snapshot_path(),
        }
    }
}

fn data_file(name: &str) -> String {
    dirs::data_dir()
        .map(|p| p.join("chatore").join(name))
        .unwrap_or_else(|| std::path::PathBuf::from(name))
        .to_string_lossy()
        .into_owned()
}

fn default_memory_snapshot_path() -> String {
    data_file("bot_memory.json")
}

fn default_tier_snapshot_path() -> String {
    data_file("user_tiers.json")
}

/// Inactivity-decay sweep configuration.
///
/// Users idle longer than `idle_hours` have their stored conversation turns
/// truncated to `keep_turns`, both lazily on their next turn and by a
/// background sweep every `interval_secs`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SweepConfig {
    /// Background sweep interval in seconds.
    #[serde(default = "default_sweep_interval_secs")]
    pub interval_secs: u64,

    /// Hours of inactivity before a user's context decays.
    #[serde(default = "default_idle_hours")]
    pub idle_hours: u64,

    /// Turns retained after decay.
    #[serde(default = "default_keep_turns")]
    pub keep_turns: usize,

    /// Hard cap on stored turns per user, regardless of tier.
    #[serde(default = "default_max_turns")]
    pub max_turns: usize,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_sweep_interval_secs(),
            idle_hours: default_idle_hours(),
            keep_turns: default_keep_turns(),
            max_turns: default_max_turns(),
        }
    }
}

fn default_sweep_interval_secs() -> u64 {
    3600 // 1 hour
}

fn default_idle_hours() -> u64 {
    3
}

fn default_keep_turns() -> usize {
    3
}

fn default_max_turns() -> usize {
    25
}
