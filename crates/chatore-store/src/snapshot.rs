// SPDX-FileCopyrightText: 2026 Chatore Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Whole-state JSON snapshots on disk.
//!
//! State lives in memory; each snapshot write serializes the full state and
//! replaces the file via a temp-file rename, so a crash mid-write leaves the
//! previous snapshot intact. Loads degrade to the default state instead of
//! failing: a missing or corrupt file must never keep the bot from starting.

use std::path::Path;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use chatore_core::ChatoreError;

/// Load a snapshot, falling back to `T::default()` when the file is absent
/// or unreadable. A corrupt file is logged and ignored, not propagated.
pub async fn load_snapshot<T>(path: &Path) -> T
where
    T: DeserializeOwned + Default,
{
    let raw = match tokio::fs::read_to_string(path).await {
        Ok(raw) => raw,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "no snapshot file, starting fresh");
            return T::default();
        }
        Err(err) => {
            warn!(path = %path.display(), error = %err, "snapshot unreadable, starting fresh");
            return T::default();
        }
    };
    match serde_json::from_str(&raw) {
        Ok(state) => state,
        Err(err) => {
            warn!(path = %path.display(), error = %err, "snapshot corrupt, starting fresh");
            T::default()
        }
    }
}

/// Serialize `state` and atomically replace the snapshot at `path`.
///
/// Parent directories are created as needed. The write goes to a `.tmp`
/// sibling first and is renamed into place.
pub async fn save_snapshot<T>(path: &Path, state: &T) -> Result<(), ChatoreError>
where
    T: Serialize,
{
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(ChatoreError::persistence)?;
    }

    let json = serde_json::to_string_pretty(state).map_err(ChatoreError::persistence)?;
    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, json.as_bytes())
        .await
        .map_err(ChatoreError::persistence)?;
    tokio::fs::rename(&tmp, path)
        .await
        .map_err(ChatoreError::persistence)?;
    debug!(path = %path.display(), bytes = json.len(), "snapshot saved");
    Ok(())
}
