// SPDX-FileCopyrightText: 2026 Chatore Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory conversation store: permanent memories, rolling context, decay.
//!
//! Two independently-lifecycled memory classes per user: an unbounded
//! append-only list of permanent facts, and a bounded sliding window of
//! recent turns. The rolling window decays when the user goes idle; the
//! permanent list never does.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use chatore_config::model::SweepConfig;
use chatore_core::UserId;

use crate::types::{ConversationTurn, IndexedMemory, MemoryEntry, StoreStats, UserPreferences};

/// Maximum length of one permanent memory, in characters.
pub const MEMORY_TEXT_MAX: usize = 500;

/// Language assumed when a user never set one.
pub const DEFAULT_LANGUAGE: &str = "english";

/// Memory markers left by the guided welcome setup.
const SETUP_MARKERS: [&str; 5] = ["name:", "age:", "hobbies:", "occupation:", "likes:"];

/// When and how far the rolling context decays.
#[derive(Debug, Clone, PartialEq)]
pub struct DecayPolicy {
    /// Idle time after which the context decays.
    pub idle_after: Duration,
    /// Turns retained after decay.
    pub keep_turns: usize,
    /// Hard cap on stored turns per user.
    pub max_turns: usize,
}

impl Default for DecayPolicy {
    fn default() -> Self {
        Self::from(&SweepConfig::default())
    }
}

impl From<&SweepConfig> for DecayPolicy {
    fn from(cfg: &SweepConfig) -> Self {
        Self {
            idle_after: Duration::hours(cfg.idle_hours as i64),
            keep_turns: cfg.keep_turns,
            max_turns: cfg.max_turns,
        }
    }
}

/// Whole-state snapshot of the store, persisted as one JSON file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemorySnapshot {
    #[serde(default)]
    pub user_memories: HashMap<UserId, Vec<MemoryEntry>>,
    #[serde(default)]
    pub conversation_history: HashMap<UserId, Vec<ConversationTurn>>,
    #[serde(default)]
    pub user_preferences: HashMap<UserId, UserPreferences>,
    #[serde(default)]
    pub user_last_activity: HashMap<UserId, DateTime<Utc>>,
}

/// Per-user memories and conversation history.
///
/// Purely in-memory; persistence is the caller's job via
/// [`snapshot`](Self::snapshot) / [`restore`](Self::restore). Records are
/// created lazily on first reference and removed only by
/// [`clear_user`](Self::clear_user) or the decay/FIFO rules.
pub struct ConversationStore {
    policy: DecayPolicy,
    memories: HashMap<UserId, Vec<MemoryEntry>>,
    history: HashMap<UserId, Vec<ConversationTurn>>,
    preferences: HashMap<UserId, UserPreferences>,
    last_activity: HashMap<UserId, DateTime<Utc>>,
}

impl ConversationStore {
    pub fn new(policy: DecayPolicy) -> Self {
        Self {
            policy,
            memories: HashMap::new(),
            history: HashMap::new(),
            preferences: HashMap::new(),
            last_activity: HashMap::new(),
        }
    }

    pub fn policy(&self) -> &DecayPolicy {
        &self.policy
    }

    /// Record the user as active now.
    pub fn touch(&mut self, user: &UserId) {
        self.touch_at(user, Utc::now());
    }

    pub fn touch_at(&mut self, user: &UserId, now: DateTime<Utc>) {
        self.last_activity.insert(user.clone(), now);
    }

    /// Append a permanent memory. Text beyond [`MEMORY_TEXT_MAX`] characters
    /// is truncated. Pure append: no dedup, no semantic merge.
    pub fn add_memory(&mut self, user: &UserId, text: &str) {
        self.add_memory_at(user, text, Utc::now());
    }

    pub fn add_memory_at(&mut self, user: &UserId, text: &str, now: DateTime<Utc>) {
        self.touch_at(user, now);
        self.memories
            .entry(user.clone())
            .or_default()
            .push(MemoryEntry {
                text: clamp_chars(text, MEMORY_TEXT_MAX),
                created_at: now,
                updated_at: None,
            });
    }

    /// Memories with their current indices.
    ///
    /// Indices are positional and shift on delete: they are only valid for
    /// the lifetime of a single listing + action round-trip.
    pub fn list_memories(&self, user: &UserId) -> Vec<IndexedMemory> {
        self.memories
            .get(user)
            .map(|entries| {
                entries
                    .iter()
                    .enumerate()
                    .map(|(index, entry)| IndexedMemory {
                        index,
                        memory: entry.text.clone(),
                        timestamp: entry.created_at,
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Replace the memory at `index`. Returns `false` if out of range.
    pub fn edit_memory(&mut self, user: &UserId, index: usize, text: &str) -> bool {
        self.edit_memory_at(user, index, text, Utc::now())
    }

    pub fn edit_memory_at(
        &mut self,
        user: &UserId,
        index: usize,
        text: &str,
        now: DateTime<Utc>,
    ) -> bool {
        let Some(entries) = self.memories.get_mut(user) else {
            return false;
        };
        let Some(entry) = entries.get_mut(index) else {
            return false;
        };
        entry.text = clamp_chars(text, MEMORY_TEXT_MAX);
        entry.updated_at = Some(now);
        self.touch_at(user, now);
        true
    }

    /// Remove the memory at `index`, shifting later indices down.
    /// Returns `false` if out of range.
    pub fn delete_memory(&mut self, user: &UserId, index: usize) -> bool {
        self.delete_memory_at(user, index, Utc::now())
    }

    pub fn delete_memory_at(&mut self, user: &UserId, index: usize, now: DateTime<Utc>) -> bool {
        let Some(entries) = self.memories.get_mut(user) else {
            return false;
        };
        if index >= entries.len() {
            return false;
        }
        entries.remove(index);
        self.touch_at(user, now);
        true
    }

    /// Record one message/response exchange.
    ///
    /// Runs the inactivity decay pass against the user's previous activity
    /// timestamp, then touches the activity clock, appends, and truncates to
    /// the hard cap from the front (oldest dropped first).
    pub fn record_turn(&mut self, user: &UserId, user_message: &str, bot_response: &str) {
        self.record_turn_at(user, user_message, bot_response, Utc::now());
    }

    pub fn record_turn_at(
        &mut self,
        user: &UserId,
        user_message: &str,
        bot_response: &str,
        now: DateTime<Utc>,
    ) {
        self.decay_if_inactive_at(user, now);
        self.touch_at(user, now);

        let turns = self.history.entry(user.clone()).or_default();
        turns.push(ConversationTurn {
            user_message: user_message.to_string(),
            bot_response: bot_response.to_string(),
            created_at: now,
        });
        let max = self.policy.max_turns;
        if turns.len() > max {
            turns.drain(..turns.len() - max);
        }
    }

    /// Truncate the user's rolling context if they have been idle longer
    /// than the decay policy allows. Returns whether anything was dropped.
    ///
    /// Idempotent: a user already at or below the retention floor is left
    /// untouched.
    pub fn decay_if_inactive_at(&mut self, user: &UserId, now: DateTime<Utc>) -> bool {
        let Some(&last_active) = self.last_activity.get(user) else {
            return false;
        };
        if now - last_active <= self.policy.idle_after {
            return false;
        }
        let Some(turns) = self.history.get_mut(user) else {
            return false;
        };
        if turns.len() <= self.policy.keep_turns {
            return false;
        }
        let dropped = turns.len() - self.policy.keep_turns;
        turns.drain(..dropped);
        debug!(user_id = %user, dropped, kept = self.policy.keep_turns, "idle context decayed");
        true
    }

    /// Apply the decay rule to every known user.
    ///
    /// Returns the users whose context was truncated. Pure iteration plus
    /// conditional truncation; re-running on already-decayed users is a no-op.
    pub fn sweep_inactive(&mut self) -> Vec<UserId> {
        self.sweep_inactive_at(Utc::now())
    }

    pub fn sweep_inactive_at(&mut self, now: DateTime<Utc>) -> Vec<UserId> {
        let users: Vec<UserId> = self.last_activity.keys().cloned().collect();
        let mut decayed = Vec::new();
        for user in users {
            if self.decay_if_inactive_at(&user, now) {
                decayed.push(user);
            }
        }
        decayed
    }

    /// True iff the user has no permanent memories and no recorded turns.
    /// Used to trigger the onboarding flow.
    pub fn is_new_user(&self, user: &UserId) -> bool {
        let has_memories = self.memories.get(user).is_some_and(|m| !m.is_empty());
        let has_turns = self.history.get(user).is_some_and(|h| !h.is_empty());
        !(has_memories || has_turns)
    }

    /// True once any permanent memory carries a structured profile marker
    /// from the guided welcome setup.
    pub fn has_completed_setup(&self, user: &UserId) -> bool {
        self.memories.get(user).is_some_and(|entries| {
            entries.iter().any(|entry| {
                let text = entry.text.to_lowercase();
                SETUP_MARKERS.iter().any(|marker| text.contains(marker))
            })
        })
    }

    /// Hard-delete every record for the user. Irreversible.
    pub fn clear_user(&mut self, user: &UserId) {
        self.memories.remove(user);
        self.history.remove(user);
        self.preferences.remove(user);
        self.last_activity.remove(user);
    }

    /// Set the user's preferred reply language.
    pub fn set_language(&mut self, user: &UserId, language: &str) {
        self.preferences.entry(user.clone()).or_default().language = Some(language.to_string());
    }

    /// The user's preferred reply language, defaulting to
    /// [`DEFAULT_LANGUAGE`].
    pub fn language(&self, user: &UserId) -> String {
        self.preferences
            .get(user)
            .and_then(|p| p.language.clone())
            .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string())
    }

    /// The user's stored turns, oldest first.
    pub fn turns(&self, user: &UserId) -> &[ConversationTurn] {
        self.history.get(user).map(Vec::as_slice).unwrap_or(&[])
    }

    pub(crate) fn memory_entries(&self, user: &UserId) -> &[MemoryEntry] {
        self.memories.get(user).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Aggregate counts for owner displays.
    pub fn stats(&self) -> StoreStats {
        StoreStats {
            total_users: self.memories.len(),
            total_memories: self.memories.values().map(Vec::len).sum(),
            total_conversations: self.history.values().map(Vec::len).sum(),
        }
    }

    /// Whole-state copy for persistence.
    pub fn snapshot(&self) -> MemorySnapshot {
        MemorySnapshot {
            user_memories: self.memories.clone(),
            conversation_history: self.history.clone(),
            user_preferences: self.preferences.clone(),
            user_last_activity: self.last_activity.clone(),
        }
    }

    /// Replace in-memory state from a loaded snapshot.
    pub fn restore(&mut self, snapshot: MemorySnapshot) {
        self.memories = snapshot.user_memories;
        self.history = snapshot.conversation_history;
        self.preferences = snapshot.user_preferences;
        self.last_activity = snapshot.user_last_activity;
    }
}

impl Default for ConversationStore {
    fn default() -> Self {
        Self::new(DecayPolicy::default())
    }
}

/// Truncate to at most `max` characters, respecting char boundaries.
fn clamp_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        text.chars().take(max).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: &str) -> UserId {
        UserId::from(id)
    }

    fn store() -> ConversationStore {
        ConversationStore::default()
    }

    #[test]
    fn add_then_list_round_trip() {
        let mut store = store();
        store.add_memory(&user("7"), "Loves cats");
        let listed = store.list_memories(&user("7"));
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].index, 0);
        assert_eq!(listed[0].memory, "Loves cats");
    }

    #[test]
    fn edit_replaces_in_place_and_stamps_updated_at() {
        let mut store = store();
        let now = Utc::now();
        store.add_memory_at(&user("7"), "Loves cats", now);
        assert!(store.edit_memory_at(&user("7"), 0, "Loves dogs", now));
        let listed = store.list_memories(&user("7"));
        assert_eq!(listed[0].memory, "Loves dogs");
        assert_eq!(store.memory_entries(&user("7"))[0].updated_at, Some(now));
    }

    #[test]
    fn edit_out_of_range_returns_false() {
        let mut store = store();
        store.add_memory(&user("u"), "one");
        assert!(!store.edit_memory(&user("u"), 1, "two"));
        assert!(!store.edit_memory(&user("missing"), 0, "two"));
    }

    #[test]
    fn delete_shifts_later_indices_down() {
        let mut store = store();
        let u = user("u");
        store.add_memory(&u, "a");
        store.add_memory(&u, "b");
        store.add_memory(&u, "c");
        assert!(store.delete_memory(&u, 1));

        let listed = store.list_memories(&u);
        let texts: Vec<&str> = listed.iter().map(|m| m.memory.as_str()).collect();
        assert_eq!(texts, vec!["a", "c"]);
        assert_eq!(listed[1].index, 1);
    }

    #[test]
    fn delete_out_of_range_returns_false() {
        let mut store = store();
        store.add_memory(&user("u"), "only");
        assert!(!store.delete_memory(&user("u"), 5));
        assert!(!store.delete_memory(&user("missing"), 0));
    }

    #[test]
    fn long_memory_is_clamped_to_limit() {
        let mut store = store();
        store.add_memory(&user("u"), &"x".repeat(600));
        let listed = store.list_memories(&user("u"));
        assert_eq!(listed[0].memory.chars().count(), MEMORY_TEXT_MAX);
    }

    #[test]
    fn fifo_cap_keeps_most_recent_turns_in_order() {
        let mut store = store();
        let u = user("u");
        let now = Utc::now();
        for i in 0..30 {
            store.record_turn_at(&u, &format!("msg {i}"), &format!("reply {i}"), now);
        }
        let turns = store.turns(&u);
        assert_eq!(turns.len(), 25);
        assert_eq!(turns[0].user_message, "msg 5");
        assert_eq!(turns[24].user_message, "msg 29");
    }

    #[test]
    fn decay_truncates_before_appending() {
        let mut store = store();
        let u = user("u");
        let old = Utc::now() - Duration::hours(4);
        for i in 0..10 {
            store.record_turn_at(&u, &format!("msg {i}"), "reply", old);
        }
        assert_eq!(store.turns(&u).len(), 10);

        // 4 hours idle: history decays to 3 before the new turn lands.
        store.record_turn_at(&u, "back again", "welcome back", Utc::now());
        let turns = store.turns(&u);
        assert_eq!(turns.len(), 4);
        assert_eq!(turns[0].user_message, "msg 7");
        assert_eq!(turns[3].user_message, "back again");
    }

    #[test]
    fn no_decay_within_idle_window() {
        let mut store = store();
        let u = user("u");
        let recent = Utc::now() - Duration::hours(2);
        for i in 0..10 {
            store.record_turn_at(&u, &format!("msg {i}"), "reply", recent);
        }
        store.record_turn_at(&u, "still here", "hi", Utc::now());
        assert_eq!(store.turns(&u).len(), 11);
    }

    #[test]
    fn decay_is_reversible_going_forward() {
        let mut store = store();
        let u = user("u");
        let old = Utc::now() - Duration::hours(5);
        for i in 0..8 {
            store.record_turn_at(&u, &format!("msg {i}"), "reply", old);
        }
        let now = Utc::now();
        store.record_turn_at(&u, "hello", "hi", now);
        assert_eq!(store.turns(&u).len(), 4);

        // Active again: subsequent turns accumulate normally.
        store.record_turn_at(&u, "more", "sure", now + Duration::minutes(1));
        assert_eq!(store.turns(&u).len(), 5);
    }

    #[test]
    fn sweep_decays_all_idle_users_and_is_idempotent() {
        let mut store = store();
        let idle = user("idle");
        let active = user("active");
        let old = Utc::now() - Duration::hours(4);
        for i in 0..6 {
            store.record_turn_at(&idle, &format!("i{i}"), "r", old);
            store.record_turn_at(&active, &format!("a{i}"), "r", Utc::now());
        }

        let decayed = store.sweep_inactive();
        assert_eq!(decayed, vec![idle.clone()]);
        assert_eq!(store.turns(&idle).len(), 3);
        assert_eq!(store.turns(&active).len(), 6);

        // Second pass finds nothing more to drop.
        assert!(store.sweep_inactive().is_empty());
        assert_eq!(store.turns(&idle).len(), 3);
    }

    #[test]
    fn sweep_skips_users_at_or_below_retention_floor() {
        let mut store = store();
        let u = user("u");
        let old = Utc::now() - Duration::hours(4);
        store.record_turn_at(&u, "one", "r", old);
        store.record_turn_at(&u, "two", "r", old);
        assert!(store.sweep_inactive().is_empty());
        assert_eq!(store.turns(&u).len(), 2);
    }

    #[test]
    fn new_user_until_first_memory_or_turn() {
        let mut store = store();
        assert!(store.is_new_user(&user("a")));

        store.add_memory(&user("a"), "fact");
        assert!(!store.is_new_user(&user("a")));

        store.record_turn(&user("b"), "hi", "hello");
        assert!(!store.is_new_user(&user("b")));
    }

    #[test]
    fn setup_detection_matches_profile_markers() {
        let mut store = store();
        let u = user("u");
        store.add_memory(&u, "Enjoys hiking");
        assert!(!store.has_completed_setup(&u));

        store.add_memory(&u, "Name: Sam, Hobbies: chess");
        assert!(store.has_completed_setup(&u));
    }

    #[test]
    fn clear_user_removes_everything() {
        let mut store = store();
        let u = user("u");
        store.add_memory(&u, "fact");
        store.record_turn(&u, "hi", "hello");
        store.set_language(&u, "spanish");
        store.clear_user(&u);

        assert!(store.is_new_user(&u));
        assert!(store.list_memories(&u).is_empty());
        assert!(store.turns(&u).is_empty());
        assert_eq!(store.language(&u), DEFAULT_LANGUAGE);
    }

    #[test]
    fn language_defaults_to_english() {
        let mut store = store();
        assert_eq!(store.language(&user("u")), "english");
        store.set_language(&user("u"), "hindi");
        assert_eq!(store.language(&user("u")), "hindi");
    }

    #[test]
    fn stats_counts_across_users() {
        let mut store = store();
        store.add_memory(&user("a"), "one");
        store.add_memory(&user("a"), "two");
        store.add_memory(&user("b"), "three");
        store.record_turn(&user("a"), "hi", "hello");

        let stats = store.stats();
        assert_eq!(stats.total_users, 2);
        assert_eq!(stats.total_memories, 3);
        assert_eq!(stats.total_conversations, 1);
    }

    #[test]
    fn snapshot_restore_round_trip() {
        let mut store = store();
        let u = user("u");
        store.add_memory(&u, "fact");
        store.record_turn(&u, "hi", "hello");
        store.set_language(&u, "french");

        let snapshot = store.snapshot();
        let mut restored = ConversationStore::default();
        restored.restore(snapshot);

        assert_eq!(restored.list_memories(&u).len(), 1);
        assert_eq!(restored.turns(&u).len(), 1);
        assert_eq!(restored.language(&u), "french");
        assert!(!restored.is_new_user(&u));
    }

    #[test]
    fn snapshot_uses_stable_field_names() {
        let mut store = store();
        let u = user("u1");
        store.add_memory(&u, "fact");
        store.record_turn(&u, "hi", "hello");

        let json = serde_json::to_value(store.snapshot()).unwrap();
        let memory = &json["user_memories"]["u1"][0];
        assert_eq!(memory["memory"], "fact");
        assert!(memory.get("timestamp").is_some());
        assert!(memory.get("updated_at").is_none(), "unset updated_at omitted");

        let turn = &json["conversation_history"]["u1"][0];
        assert_eq!(turn["user_message"], "hi");
        assert_eq!(turn["bot_response"], "hello");
        assert!(turn.get("timestamp").is_some());
        assert!(json["user_last_activity"].get("u1").is_some());
    }

    #[test]
    fn empty_snapshot_deserializes_to_default() {
        let snapshot: MemorySnapshot = serde_json::from_str("{}").unwrap();
        assert!(snapshot.user_memories.is_empty());
        assert!(snapshot.conversation_history.is_empty());
    }
}
