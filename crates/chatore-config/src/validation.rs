// SPDX-FileCopyrightText: 2026 Chatore Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde
//! attributes, such as non-zero limits and non-empty snapshot paths.

use crate::diagnostic::ConfigError;
use crate::model::{ChatoreConfig, TierConfig};

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &ChatoreConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if config.tiers.window_hours == 0 {
        errors.push(ConfigError::Validation {
            message: "tiers.window_hours must be at least 1".to_string(),
        });
    }

    validate_tier("tiers.free", &config.tiers.free, &mut errors);
    validate_tier("tiers.premium", &config.tiers.premium, &mut errors);

    // Premium must not be a downgrade relative to free.
    if config.tiers.premium.context_limit < config.tiers.free.context_limit {
        errors.push(ConfigError::Validation {
            message: format!(
                "tiers.premium.context_limit ({}) must be >= tiers.free.context_limit ({})",
                config.tiers.premium.context_limit, config.tiers.free.context_limit
            ),
        });
    }
    if config.tiers.premium.requests_per_window < config.tiers.free.requests_per_window {
        errors.push(ConfigError::Validation {
            message: format!(
                "tiers.premium.requests_per_window ({}) must be >= tiers.free.requests_per_window ({})",
                config.tiers.premium.requests_per_window, config.tiers.free.requests_per_window
            ),
        });
    }

    if config.storage.memory_snapshot_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.memory_snapshot_path must not be empty".to_string(),
        });
    }
    if config.storage.tier_snapshot_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.tier_snapshot_path must not be empty".to_string(),
        });
    }
    if !config.storage.memory_snapshot_path.trim().is_empty()
        && config.storage.memory_snapshot_path == config.storage.tier_snapshot_path
    {
        errors.push(ConfigError::Validation {
            message: "storage.memory_snapshot_path and storage.tier_snapshot_path must differ"
                .to_string(),
        });
    }

    if config.sweep.interval_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "sweep.interval_secs must be at least 1".to_string(),
        });
    }
    if config.sweep.keep_turns == 0 {
        errors.push(ConfigError::Validation {
            message: "sweep.keep_turns must be at least 1".to_string(),
        });
    }
    if config.sweep.max_turns < config.sweep.keep_turns {
        errors.push(ConfigError::Validation {
            message: format!(
                "sweep.max_turns ({}) must be >= sweep.keep_turns ({})",
                config.sweep.max_turns, config.sweep.keep_turns
            ),
        });
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

fn validate_tier(section: &str, tier: &TierConfig, errors: &mut Vec<ConfigError>) {
    if tier.display_name.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: format!("{section}.display_name must not be empty"),
        });
    }
    if tier.context_limit == 0 {
        errors.push(ConfigError::Validation {
            message: format!("{section}.context_limit must be at least 1"),
        });
    }
    if tier.requests_per_window == 0 {
        errors.push(ConfigError::Validation {
            message: format!("{section}.requests_per_window must be at least 1"),
        });
    }
    if tier.price_usd < 0.0 {
        errors.push(ConfigError::Validation {
            message: format!(
                "{section}.price_usd must be non-negative, got {}",
                tier.price_usd
            ),
        });
    }
}
