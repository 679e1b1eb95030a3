// SPDX-FileCopyrightText: 2026 Chatore Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-user memory for Chatore: permanent facts, rolling conversation
//! context, inactivity decay, and prompt context assembly.

pub mod context;
pub mod store;
pub mod types;

pub use store::{ConversationStore, DecayPolicy, MemorySnapshot, DEFAULT_LANGUAGE, MEMORY_TEXT_MAX};
pub use types::{ConversationTurn, IndexedMemory, MemoryEntry, StoreStats, UserPreferences};
