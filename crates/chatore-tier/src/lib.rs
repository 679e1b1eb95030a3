// SPDX-FileCopyrightText: 2026 Chatore Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Subscription tiers and rolling-window rate limiting for Chatore.
//!
//! The [`UsageLedger`] decides whether a user may make an LLM-backed request
//! and tracks premium subscription terms. Time-dependent transitions (window
//! rollover, premium expiry) are evaluated lazily on access.

pub mod ledger;
pub mod table;

pub use ledger::{
    PremiumEntry, TierRecord, TierSnapshot, TierStats, UsageCounter, UsageLedger, UsageStats,
};
pub use table::{TierLimits, TierTable};
