// SPDX-FileCopyrightText: 2026 Chatore Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Chatore bot.
//!
//! Provides the shared error type, identifier and tier types, and the traits
//! implemented by external collaborators (LLM provider, notifier). The
//! stateful components live in `chatore-tier` and `chatore-memory`.

pub mod error;
pub mod traits;
pub mod types;

pub use error::ChatoreError;
pub use traits::{Notifier, ProviderAdapter};
pub use types::{OutboundEvent, Tier, UsageSnapshot, UserId};
