// SPDX-FileCopyrightText: 2026 Chatore Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Static per-tier limit table, built once from configuration.

use chrono::Duration;

use chatore_config::model::{TierConfig, TiersConfig};
use chatore_core::Tier;

/// Resolved limits for one tier.
#[derive(Debug, Clone, PartialEq)]
pub struct TierLimits {
    /// Human-readable tier name.
    pub display_name: String,
    /// Recent turns included in the LLM context.
    pub context_limit: usize,
    /// Requests allowed per window.
    pub requests_per_window: u32,
    /// Monthly price in USD.
    pub price_usd: f64,
    /// Feature bullet points for plan displays.
    pub features: Vec<String>,
}

impl From<&TierConfig> for TierLimits {
    fn from(cfg: &TierConfig) -> Self {
        Self {
            display_name: cfg.display_name.clone(),
            context_limit: cfg.context_limit,
            requests_per_window: cfg.requests_per_window,
            price_usd: cfg.price_usd,
            features: cfg.features.clone(),
        }
    }
}

/// Immutable tier limit table. Not persisted; rebuilt from config at startup.
#[derive(Debug, Clone)]
pub struct TierTable {
    free: TierLimits,
    premium: TierLimits,
    window: Duration,
}

impl TierTable {
    pub fn new(config: &TiersConfig) -> Self {
        Self {
            free: TierLimits::from(&config.free),
            premium: TierLimits::from(&config.premium),
            window: Duration::hours(config.window_hours as i64),
        }
    }

    /// Limits for the given tier.
    pub fn limits(&self, tier: Tier) -> &TierLimits {
        match tier {
            Tier::Free => &self.free,
            Tier::Premium => &self.premium,
        }
    }

    /// Length of the rolling accounting window.
    pub fn window(&self) -> Duration {
        self.window
    }
}

impl Default for TierTable {
    fn default() -> Self {
        Self::new(&TiersConfig::default())
    }
}
