// SPDX-FileCopyrightText: 2026 Chatore Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `chatore status` command implementation.
//!
//! Reads both snapshot files and prints tier and memory statistics. Missing
//! snapshots read as empty state rather than an error.

use std::path::Path;

use serde::Serialize;

use chatore_config::model::ChatoreConfig;
use chatore_core::ChatoreError;
use chatore_memory::{ConversationStore, DecayPolicy, StoreStats};
use chatore_store::load_snapshot;
use chatore_tier::{TierStats, TierTable, UsageLedger};

/// Structured status output for `--json` mode.
#[derive(Debug, Serialize)]
pub struct StatusReport {
    pub agent_name: String,
    pub tiers: TierStats,
    pub memory: StoreStats,
}

/// Collect statistics from the stored snapshots.
pub async fn collect_status(config: &ChatoreConfig) -> StatusReport {
    let mut ledger = UsageLedger::new(TierTable::new(&config.tiers));
    ledger.restore(load_snapshot(Path::new(&config.storage.tier_snapshot_path)).await);

    let mut store = ConversationStore::new(DecayPolicy::from(&config.sweep));
    store.restore(load_snapshot(Path::new(&config.storage.memory_snapshot_path)).await);

    StatusReport {
        agent_name: config.agent.name.clone(),
        tiers: ledger.tier_stats(),
        memory: store.stats(),
    }
}

/// Run the `chatore status` command.
///
/// If `--json` is passed, outputs structured JSON for scripting.
pub async fn run_status(config: &ChatoreConfig, json: bool) -> Result<(), ChatoreError> {
    let report = collect_status(config).await;

    if json {
        let rendered = serde_json::to_string_pretty(&report)
            .map_err(|e| ChatoreError::Internal(format!("status serialization failed: {e}")))?;
        println!("{rendered}");
        return Ok(());
    }

    println!("{} status", report.agent_name);
    println!(
        "  users: {} ({} free, {} premium, {:.1}% premium)",
        report.tiers.total_users,
        report.tiers.free_users,
        report.tiers.premium_users,
        report.tiers.premium_percentage,
    );
    println!(
        "  memory: {} users, {} permanent memories, {} stored turns",
        report.memory.total_users, report.memory.total_memories, report.memory.total_conversations,
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config(dir: &Path) -> ChatoreConfig {
        let mut config = ChatoreConfig::default();
        config.storage.memory_snapshot_path =
            dir.join("bot_memory.json").to_string_lossy().into_owned();
        config.storage.tier_snapshot_path =
            dir.join("user_tiers.json").to_string_lossy().into_owned();
        config
    }

    #[tokio::test]
    async fn status_with_no_snapshots_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let report = collect_status(&test_config(dir.path())).await;
        assert_eq!(report.agent_name, "chatore");
        assert_eq!(report.tiers.total_users, 0);
        assert_eq!(report.memory.total_users, 0);
    }

    #[tokio::test]
    async fn status_reflects_saved_snapshots() {
        use chatore_core::UserId;

        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());

        let mut store = ConversationStore::default();
        store.add_memory(&UserId::from("u1"), "fact");
        chatore_store::save_snapshot(
            Path::new(&config.storage.memory_snapshot_path),
            &store.snapshot(),
        )
        .await
        .unwrap();

        let report = collect_status(&config).await;
        assert_eq!(report.memory.total_users, 1);
        assert_eq!(report.memory.total_memories, 1);
    }

    #[tokio::test]
    async fn json_report_serializes() {
        let dir = tempfile::tempdir().unwrap();
        let report = collect_status(&test_config(dir.path())).await;
        let json = serde_json::to_value(&report).unwrap();
        assert!(json.get("tiers").is_some());
        assert!(json.get("memory").is_some());
    }
}
