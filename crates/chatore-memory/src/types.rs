// SPDX-FileCopyrightText: 2026 Chatore Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Record types stored by the conversation store.
//!
//! Snapshot field names (`memory`, `timestamp`, ...) are kept stable for
//! interop with existing snapshot files.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A permanent fact about a user. Never auto-deleted; only user-initiated
/// add/edit/delete touch these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryEntry {
    #[serde(rename = "memory")]
    pub text: String,
    #[serde(rename = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// One recorded message/response exchange.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub user_message: String,
    pub bot_response: String,
    #[serde(rename = "timestamp")]
    pub created_at: DateTime<Utc>,
}

/// Per-user preferences.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserPreferences {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

/// A memory entry paired with its current list index, for listing flows that
/// feed an index-addressed edit or delete.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexedMemory {
    pub index: usize,
    pub memory: String,
    pub timestamp: DateTime<Utc>,
}

/// Aggregate store counts for owner displays.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoreStats {
    pub total_users: usize,
    pub total_memories: usize,
    pub total_conversations: usize,
}
