//! Storage boundary: a small key-value surface modeled on the hash, list,
//! and sorted-set shapes the engine persists into.
//!
//! Per-user key layout:
//!
//! | Key | Shape | Holds |
//! |-----|-------|-------|
//! | `mood:{user}:{date}` | list | emotion entries for one day, oldest first |
//! | `mood:meta:{user}:{date}` | hash | day-level triggers and notes |
//! | `memories:{user}` | list | memory records, newest first |
//! | `history:{user}` | list | chat turns, newest first |
//! | `reminders:{user}` | zset | reminder ids scored by due epoch seconds |
//! | `reminders:data:{user}` | hash | reminder id → full record |
//!
//! Callers treat the store as unreliable: reads that fail degrade to
//! empty defaults and writes that fail are logged, never fatal to a turn.

pub mod mem;

use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::config::StoreConfig;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("key not found: {0}")]
    NotFound(String),
    #[error("key {0} holds a different shape than the operation expects")]
    WrongShape(String),
    #[error("index {index} out of range for list {key}")]
    OutOfRange { key: String, index: i64 },
}

/// Async key-value operations over string payloads. List and sorted-set
/// index conventions follow the usual KV-server contract: ranges are
/// inclusive and negative indices count from the tail (`-1` is the last
/// element).
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Set one field in a hash, creating the hash if absent.
    async fn hash_set(&self, key: &str, field: &str, value: &str) -> Result<(), StoreError>;

    /// All fields of a hash; empty map when the key is absent.
    async fn hash_get_all(&self, key: &str) -> Result<HashMap<String, String>, StoreError>;

    /// Prepend to a list, creating it if absent.
    async fn list_push_front(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Append to a list, creating it if absent.
    async fn list_push_back(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Inclusive range; empty when the key is absent or the range is empty.
    async fn list_range(&self, key: &str, start: i64, stop: i64) -> Result<Vec<String>, StoreError>;

    /// Drop everything outside the inclusive range.
    async fn list_trim(&self, key: &str, start: i64, stop: i64) -> Result<(), StoreError>;

    /// Overwrite the element at `index`. Errors when the key or index is missing.
    async fn list_set(&self, key: &str, index: i64, value: &str) -> Result<(), StoreError>;

    /// Upsert a member with the given score.
    async fn zset_add(&self, key: &str, member: &str, score: f64) -> Result<(), StoreError>;

    /// Members with `min <= score <= max`, ascending by score.
    async fn zset_range_by_score(
        &self,
        key: &str,
        min: f64,
        max: f64,
    ) -> Result<Vec<String>, StoreError>;

    /// Remove a member; no-op when absent.
    async fn zset_remove(&self, key: &str, member: &str) -> Result<(), StoreError>;

    /// Schedule the key to vanish after `ttl`. No-op on missing keys.
    async fn expire(&self, key: &str, ttl: Duration) -> Result<(), StoreError>;

    /// Connectivity probe for health checks.
    async fn ping(&self) -> Result<(), StoreError>;
}

/// Key builders. Every persisted key goes through these so the layout
/// stays in one place.
pub mod keys {
    use chrono::NaiveDate;

    pub fn mood_log(user_id: &str, date: NaiveDate) -> String {
        format!("mood:{user_id}:{date}")
    }

    pub fn mood_meta(user_id: &str, date: NaiveDate) -> String {
        format!("mood:meta:{user_id}:{date}")
    }

    pub fn memories(user_id: &str) -> String {
        format!("memories:{user_id}")
    }

    pub fn history(user_id: &str) -> String {
        format!("history:{user_id}")
    }

    pub fn reminder_index(user_id: &str) -> String {
        format!("reminders:{user_id}")
    }

    pub fn reminder_data(user_id: &str) -> String {
        format!("reminders:data:{user_id}")
    }
}

/// Day-denominated TTLs, as every retention knob in config is in days.
pub fn ttl_days(days: u64) -> Duration {
    Duration::from_secs(days * 86_400)
}

/// Instantiate the configured store backend.
pub fn create_store(config: &StoreConfig) -> Result<Arc<dyn KvStore>> {
    match config.backend.as_str() {
        "memory" => Ok(Arc::new(mem::InMemoryStore::new())),
        other => anyhow::bail!("unknown store backend: {other}. Supported: memory"),
    }
}
