// SPDX-FileCopyrightText: 2026 Chatore Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Periodic inactivity-decay sweep.
//!
//! Decay also happens lazily when an idle user sends their next message;
//! the sweep bounds how long a dormant user's full context sits in memory
//! and on disk.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::engine::ChatEngine;

/// Runs [`ChatEngine::sweep_once`] on a fixed interval until cancelled.
pub struct SweepRunner {
    engine: Arc<ChatEngine>,
    interval: Duration,
}

impl SweepRunner {
    pub fn new(engine: Arc<ChatEngine>, interval: Duration) -> Self {
        Self { engine, interval }
    }

    /// Run until the cancellation token fires. The first pass happens one
    /// full interval after start, not immediately.
    pub async fn run(self, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // interval() fires its first tick immediately; consume it.
        ticker.tick().await;

        info!(interval_secs = self.interval.as_secs(), "sweep runner started");
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let decayed = self.engine.sweep_once().await;
                    debug!(decayed = decayed.len(), "sweep pass complete");
                }
                _ = cancel.cancelled() => {
                    info!("shutdown signal received, stopping sweep runner");
                    break;
                }
            }
        }
    }
}
