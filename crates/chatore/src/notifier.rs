// SPDX-FileCopyrightText: 2026 Chatore Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outbound event delivery.
//!
//! The ledger publishes fire-and-forget events (currently premium welcome
//! notifications) on an mpsc channel; [`run_notifier`] drains that channel
//! and hands each event to a [`Notifier`]. Delivery failures are logged and
//! dropped, matching the events' best-effort contract.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use chatore_core::{ChatoreError, Notifier, OutboundEvent};

/// Notifier that writes events to the log instead of a chat surface.
///
/// The stand-in delivery target when no messaging platform is attached.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, event: &OutboundEvent) -> Result<(), ChatoreError> {
        match event {
            OutboundEvent::PremiumGranted {
                user_id,
                months,
                expires_at,
            } => {
                info!(
                    user_id = %user_id,
                    months,
                    %expires_at,
                    "welcome to premium: higher limits and a longer context are active"
                );
            }
        }
        Ok(())
    }
}

/// Drain events from `rx` until the channel closes, delivering each through
/// `notifier`. A failed delivery is logged and the loop continues.
pub async fn run_notifier(mut rx: mpsc::Receiver<OutboundEvent>, notifier: Arc<dyn Notifier>) {
    while let Some(event) = rx.recv().await {
        if let Err(e) = notifier.notify(&event).await {
            warn!(error = %e, "event delivery failed, dropping");
        }
    }
    debug!("event channel closed, notifier stopping");
}
