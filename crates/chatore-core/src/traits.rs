// SPDX-FileCopyrightText: 2026 Chatore Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Traits at the seams between the core and its external collaborators.
//!
//! The generative-AI call and outbound user notifications are external to the
//! core: the engine only needs `generate(prompt) -> text` and a sink for
//! [`OutboundEvent`]s. Retries, key rotation, and message rendering live
//! behind these traits.

use async_trait::async_trait;

use crate::error::ChatoreError;
use crate::types::OutboundEvent;

/// Adapter for the generative-AI text completion call.
#[async_trait]
pub trait ProviderAdapter: Send + Sync + 'static {
    /// Human-readable name of this provider (for logs).
    fn name(&self) -> &str;

    /// Produce a reply for the given prompt.
    ///
    /// May fail; the caller decides whether to surface or retry. The core
    /// never charges quota for a failed generation.
    async fn generate(&self, prompt: &str) -> Result<String, ChatoreError>;
}

/// Consumer of outbound events (e.g., the premium welcome DM sender).
#[async_trait]
pub trait Notifier: Send + Sync + 'static {
    /// Deliver one event. Errors are logged by the dispatch loop and never
    /// propagate back to the operation that published the event.
    async fn notify(&self, event: &OutboundEvent) -> Result<(), ChatoreError>;
}
