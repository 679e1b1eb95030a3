// SPDX-FileCopyrightText: 2026 Chatore Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared across the Chatore workspace.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Opaque user identity (platform-assigned snowflake, treated as a token).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for UserId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Subscription tier. Free never expires; Premium carries an expiry and is
/// lazily downgraded once it has passed.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    #[default]
    Free,
    Premium,
}

/// Point-in-time view of a user's quota, returned by admission checks
/// regardless of the outcome so callers can display it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageSnapshot {
    /// Requests consumed in the current window.
    pub current: u32,
    /// The tier's per-window request limit.
    pub limit: u32,
    /// Tier the limit was taken from.
    pub tier: Tier,
    /// When the current window rolls over.
    pub resets_at: DateTime<Utc>,
}

/// Outbound events published by the core for a notifier collaborator.
///
/// Delivery is fire-and-forget: publishing never blocks and failure to
/// deliver never fails the operation that produced the event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundEvent {
    /// A user was granted a premium subscription.
    PremiumGranted {
        user_id: UserId,
        months: u32,
        expires_at: DateTime<Utc>,
    },
}
