// SPDX-FileCopyrightText: 2026 Chatore Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Chatore bot core.

use thiserror::Error;

/// The primary error type used across Chatore core operations.
///
/// Expected control-flow outcomes (quota exhaustion, out-of-range memory
/// indices) are communicated through return values, not through this enum.
/// Only genuinely exceptional conditions surface here.
#[derive(Debug, Error)]
pub enum ChatoreError {
    /// Configuration errors (invalid TOML, missing required fields).
    #[error("configuration error: {0}")]
    Config(String),

    /// Snapshot persistence errors (file I/O, serialization).
    ///
    /// Persistence failures are logged and non-fatal: the in-memory state
    /// remains authoritative and is re-saved on the next save cycle.
    #[error("persistence error: {source}")]
    Persistence {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// LLM provider errors (API failure, timeout, empty response).
    #[error("provider error: {message}")]
    Provider {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A referenced record does not exist (e.g., memory index out of range).
    #[error("not found: {0}")]
    NotFound(String),

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ChatoreError {
    /// Wrap an I/O or serialization error as a persistence failure.
    pub fn persistence<E>(source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Persistence {
            source: Box::new(source),
        }
    }
}
