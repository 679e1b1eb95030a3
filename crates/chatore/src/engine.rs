// SPDX-FileCopyrightText: 2026 Chatore Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The chat engine that coordinates admission, context, and generation.
//!
//! One message flows through: quota check, context assembly with the tier's
//! turn window, LLM call, then (only on success) the turn is recorded, the
//! counter charged, and both snapshots saved. Persistence failures after a
//! successful answer are logged, never surfaced to the user.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, mpsc};
use tracing::{debug, info, warn};

use chatore_config::model::ChatoreConfig;
use chatore_core::{ChatoreError, OutboundEvent, ProviderAdapter, UsageSnapshot, UserId};
use chatore_memory::{ConversationStore, DecayPolicy, IndexedMemory, StoreStats};
use chatore_store::{load_snapshot, save_snapshot};
use chatore_tier::{PremiumEntry, TierStats, TierTable, UsageLedger, UsageStats};

/// Outcome of one user message.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatReply {
    /// The generated response, already recorded and charged.
    Answer(String),
    /// The user is over quota; the snapshot carries the display numbers.
    RateLimited(UsageSnapshot),
}

/// Coordinates the usage ledger, conversation store, and LLM provider.
///
/// Shared-state components sit behind `tokio::sync::Mutex` so one engine can
/// be cloned behind an `Arc` across handler tasks.
pub struct ChatEngine {
    bot_name: String,
    ledger: Mutex<UsageLedger>,
    store: Mutex<ConversationStore>,
    provider: Arc<dyn ProviderAdapter>,
    memory_path: PathBuf,
    tier_path: PathBuf,
}

impl ChatEngine {
    /// Build an engine from configuration, restoring both snapshots from
    /// disk. Missing or corrupt snapshot files start empty.
    pub async fn new(
        config: &ChatoreConfig,
        provider: Arc<dyn ProviderAdapter>,
        events: Option<mpsc::Sender<OutboundEvent>>,
    ) -> Self {
        let tier_path = PathBuf::from(&config.storage.tier_snapshot_path);
        let memory_path = PathBuf::from(&config.storage.memory_snapshot_path);

        let mut ledger = UsageLedger::new(TierTable::new(&config.tiers));
        if let Some(sender) = events {
            ledger = ledger.with_events(sender);
        }
        ledger.restore(load_snapshot(&tier_path).await);

        let mut store = ConversationStore::new(DecayPolicy::from(&config.sweep));
        store.restore(load_snapshot(&memory_path).await);

        info!(
            bot_name = config.agent.name.as_str(),
            provider = provider.name(),
            "chat engine initialized"
        );

        Self {
            bot_name: config.agent.name.clone(),
            ledger: Mutex::new(ledger),
            store: Mutex::new(store),
            provider,
            memory_path,
            tier_path,
        }
    }

    /// Handle one user message end to end.
    ///
    /// The quota is charged only after the provider answered: a failed
    /// generation costs nothing and records nothing.
    pub async fn handle_message(
        &self,
        user: &UserId,
        message: &str,
    ) -> Result<ChatReply, ChatoreError> {
        let (allowed, usage, turn_limit) = {
            let mut ledger = self.ledger.lock().await;
            let (allowed, usage) = ledger.can_request(user);
            let turn_limit = ledger.context_limit(user);
            (allowed, usage, turn_limit)
        };
        if !allowed {
            info!(
                user_id = %user,
                current = usage.current,
                limit = usage.limit,
                "request denied, quota exhausted"
            );
            return Ok(ChatReply::RateLimited(usage));
        }
        let (context, language) = {
            let store = self.store.lock().await;
            (store.context(user, turn_limit), store.language(user))
        };

        let prompt = build_prompt(&self.bot_name, &language, &context, message);
        let response = self.provider.generate(&prompt).await?;

        self.store.lock().await.record_turn(user, message, &response);
        self.ledger.lock().await.increment(user);
        self.persist_or_warn().await;

        debug!(user_id = %user, chars = response.len(), "response recorded");
        Ok(ChatReply::Answer(response))
    }

    /// Store a permanent memory for the user.
    pub async fn add_memory(&self, user: &UserId, text: &str) {
        self.store.lock().await.add_memory(user, text);
        self.persist_or_warn().await;
    }

    /// Replace the memory at `index`.
    pub async fn edit_memory(
        &self,
        user: &UserId,
        index: usize,
        text: &str,
    ) -> Result<(), ChatoreError> {
        if !self.store.lock().await.edit_memory(user, index, text) {
            return Err(ChatoreError::NotFound(format!(
                "memory {index} for user {user}"
            )));
        }
        self.persist_or_warn().await;
        Ok(())
    }

    /// Delete the memory at `index`, shifting later indices down.
    pub async fn delete_memory(&self, user: &UserId, index: usize) -> Result<(), ChatoreError> {
        if !self.store.lock().await.delete_memory(user, index) {
            return Err(ChatoreError::NotFound(format!(
                "memory {index} for user {user}"
            )));
        }
        self.persist_or_warn().await;
        Ok(())
    }

    /// The user's memories with their current indices.
    pub async fn list_memories(&self, user: &UserId) -> Vec<IndexedMemory> {
        self.store.lock().await.list_memories(user)
    }

    /// Grant a premium subscription. Returns the expiry timestamp.
    pub async fn grant_premium(&self, user: &UserId, months: u32) -> DateTime<Utc> {
        let expires_at = self.ledger.lock().await.grant_premium(user, months);
        self.persist_or_warn().await;
        expires_at
    }

    /// Detailed usage statistics for plan displays.
    pub async fn usage_stats(&self, user: &UserId) -> UsageStats {
        self.ledger.lock().await.usage_stats(user)
    }

    /// Aggregate tier counts.
    pub async fn tier_stats(&self) -> TierStats {
        self.ledger.lock().await.tier_stats()
    }

    /// Aggregate store counts.
    pub async fn store_stats(&self) -> StoreStats {
        self.store.lock().await.stats()
    }

    /// The premium roster, oldest subscription first.
    pub async fn premium_users(&self) -> Vec<PremiumEntry> {
        self.ledger.lock().await.premium_users()
    }

    /// Set the user's preferred reply language.
    pub async fn set_language(&self, user: &UserId, language: &str) {
        self.store.lock().await.set_language(user, language);
        self.persist_or_warn().await;
    }

    pub async fn language(&self, user: &UserId) -> String {
        self.store.lock().await.language(user)
    }

    /// True iff the user has no memories and no recorded turns yet.
    pub async fn is_new_user(&self, user: &UserId) -> bool {
        self.store.lock().await.is_new_user(user)
    }

    /// True once the user completed the guided welcome setup.
    pub async fn has_completed_setup(&self, user: &UserId) -> bool {
        self.store.lock().await.has_completed_setup(user)
    }

    /// Hard-delete every record for the user, across both components.
    pub async fn clear_user(&self, user: &UserId) {
        self.store.lock().await.clear_user(user);
        self.ledger.lock().await.clear_user(user);
        self.persist_or_warn().await;
        info!(user_id = %user, "user data cleared");
    }

    /// Run one inactivity-decay pass over all users and persist if anything
    /// changed. Returns the users whose context was truncated.
    pub async fn sweep_once(&self) -> Vec<UserId> {
        let decayed = self.store.lock().await.sweep_inactive();
        if !decayed.is_empty() {
            info!(users = decayed.len(), "inactivity sweep decayed contexts");
            self.persist_or_warn().await;
        }
        decayed
    }

    /// Save both snapshots to disk.
    pub async fn save(&self) -> Result<(), ChatoreError> {
        let tier_snapshot = self.ledger.lock().await.snapshot();
        let memory_snapshot = self.store.lock().await.snapshot();
        save_snapshot(&self.tier_path, &tier_snapshot).await?;
        save_snapshot(&self.memory_path, &memory_snapshot).await?;
        Ok(())
    }

    async fn persist_or_warn(&self) {
        if let Err(e) = self.save().await {
            warn!(error = %e, "snapshot save failed, state kept in memory");
        }
    }
}

/// Provider used when no LLM backend is attached, as in maintenance
/// commands. Every generation attempt fails with a provider error.
pub struct DisconnectedProvider;

#[async_trait::async_trait]
impl ProviderAdapter for DisconnectedProvider {
    fn name(&self) -> &str {
        "disconnected"
    }

    async fn generate(&self, _prompt: &str) -> Result<String, ChatoreError> {
        Err(ChatoreError::Provider {
            message: "no llm provider configured".to_string(),
            source: None,
        })
    }
}

/// Assemble the prompt handed to the provider: persona line, stored context,
/// then the incoming message.
fn build_prompt(bot_name: &str, language: &str, context: &str, message: &str) -> String {
    let mut prompt = format!(
        "You are {bot_name}, a friendly chat companion. Reply in {language}, \
         naturally and briefly.\n"
    );
    if !context.is_empty() {
        prompt.push('\n');
        prompt.push_str(context);
    }
    prompt.push('\n');
    prompt.push_str(&format!("The user just said: \"{message}\""));
    prompt
}
