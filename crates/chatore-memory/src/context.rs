// SPDX-FileCopyrightText: 2026 Chatore Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Prompt context assembly.
//!
//! Flattens a user's permanent memories and recent turns into the plain-text
//! block handed to the model alongside the incoming message.

use std::fmt::Write as _;

use chatore_core::UserId;

use crate::store::ConversationStore;

/// Characters of each message kept in the transcript.
const TRANSCRIPT_MESSAGE_MAX: usize = 150;

impl ConversationStore {
    /// Build the context string for the user's next prompt.
    ///
    /// Permanent memories come first as a single semicolon-joined line, then
    /// the last `turn_limit` turns as a numbered transcript with each side of
    /// an exchange cut to 150 characters. `turn_limit` is the caller's
    /// tier-dependent window, distinct from the store's hard cap. Empty
    /// sections are omitted entirely; a user with no data gets `""`.
    pub fn context(&self, user: &UserId, turn_limit: usize) -> String {
        let mut out = String::new();

        let memories = self.memory_entries(user);
        if !memories.is_empty() {
            let facts: Vec<&str> = memories.iter().map(|m| m.text.as_str()).collect();
            let _ = writeln!(
                out,
                "What I remember about this user (permanent): {}\n",
                facts.join("; ")
            );
        }

        let turns = self.turns(user);
        if !turns.is_empty() {
            let start = turns.len().saturating_sub(turn_limit);
            let recent = &turns[start..];
            let _ = writeln!(
                out,
                "Recent conversation context (last {} messages):",
                recent.len()
            );
            for (i, turn) in recent.iter().enumerate() {
                let _ = writeln!(
                    out,
                    "{}. User: '{}...' | Bot: '{}...'",
                    i + 1,
                    clip(&turn.user_message),
                    clip(&turn.bot_response)
                );
            }
        }

        out
    }
}

fn clip(text: &str) -> &str {
    match text.char_indices().nth(TRANSCRIPT_MESSAGE_MAX) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}
