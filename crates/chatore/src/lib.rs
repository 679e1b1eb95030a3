// SPDX-FileCopyrightText: 2026 Chatore Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chatore engine and command plumbing.
//!
//! Ties the usage ledger, conversation store, and snapshot persistence into
//! a [`ChatEngine`](engine::ChatEngine) that a chat surface can drive, plus
//! the background sweep, outbound notification loop, and CLI commands.

pub mod engine;
pub mod notifier;
pub mod shutdown;
pub mod status;
pub mod sweep;

pub use engine::{ChatEngine, ChatReply, DisconnectedProvider};
pub use notifier::{LogNotifier, run_notifier};
pub use sweep::SweepRunner;
