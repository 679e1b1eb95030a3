// SPDX-FileCopyrightText: 2026 Chatore Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Durable JSON snapshot persistence for Chatore state.

pub mod snapshot;

pub use snapshot::{load_snapshot, save_snapshot};
