//! Memory persistence — write path and list maintenance.
//!
//! A user's memories live in one list, newest first. [`create_memory`] is
//! the single write entry point: build the record, prepend it, trim the
//! list to the cap, refresh the TTL. Reads tolerate malformed rows by
//! skipping them; losing one record beats failing the whole list.

use anyhow::Result;
use chrono::Utc;
use tracing::warn;
use uuid::Uuid;

use crate::config::StoreConfig;
use crate::emotion::Emotion;
use crate::kv::{keys, ttl_days, KvStore};
use crate::memory::types::{Memory, MemoryType};

/// Admit one remembered moment into the user's memory list.
#[allow(clippy::too_many_arguments)]
pub async fn create_memory(
    store: &dyn KvStore,
    store_config: &StoreConfig,
    user_id: &str,
    content: &str,
    memory_type: MemoryType,
    importance: f64,
    emotion: Emotion,
    tags: Vec<String>,
) -> Result<Memory> {
    let now = Utc::now();

    // 1. Build the record
    let memory = Memory {
        id: Uuid::now_v7(),
        user_id: user_id.to_string(),
        content: content.to_string(),
        memory_type,
        importance: importance.clamp(0.0, 1.0),
        emotion,
        tags: normalize_tags(tags),
        created_at: now,
        last_accessed_at: now,
        embedding: None,
    };

    // 2. Prepend, keeping the list newest-first
    let key = keys::memories(user_id);
    store.list_push_front(&key, &serde_json::to_string(&memory)?).await?;

    // 3. Trim to the per-user cap
    let cap = store_config.memory_cap.max(1) as i64;
    store.list_trim(&key, 0, cap - 1).await?;

    // 4. Refresh the retention window
    store.expire(&key, ttl_days(store_config.memory_ttl_days)).await?;

    Ok(memory)
}

/// Every surviving memory, newest first. Malformed rows are skipped with
/// a warning.
pub async fn list_memories(store: &dyn KvStore, user_id: &str) -> Result<Vec<Memory>> {
    let key = keys::memories(user_id);
    let raw = store.list_range(&key, 0, -1).await?;
    Ok(parse_memories(&raw, &key))
}

pub async fn get_memory(store: &dyn KvStore, user_id: &str, id: Uuid) -> Result<Option<Memory>> {
    let memories = list_memories(store, user_id).await?;
    Ok(memories.into_iter().find(|m| m.id == id))
}

/// Mark a memory as recalled: bump `last_accessed_at` and rewrite it in
/// place. Returns `false` when the id is unknown. The engine's per-user
/// lock serializes the scan-then-set against concurrent writers.
pub async fn touch_memory(store: &dyn KvStore, user_id: &str, id: Uuid) -> Result<bool> {
    let key = keys::memories(user_id);
    let raw = store.list_range(&key, 0, -1).await?;

    // 1. Locate the record's slot
    for (index, item) in raw.iter().enumerate() {
        let Ok(mut memory) = serde_json::from_str::<Memory>(item) else {
            continue;
        };
        if memory.id != id {
            continue;
        }

        // 2. Rewrite that slot only
        memory.last_accessed_at = Utc::now();
        store
            .list_set(&key, index as i64, &serde_json::to_string(&memory)?)
            .await?;
        return Ok(true);
    }
    Ok(false)
}

/// Lowercase, drop blanks, dedup preserving first occurrence. An empty
/// result becomes `["general"]` so the tags-never-empty invariant holds
/// at the write boundary.
fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for tag in tags {
        let tag = tag.trim().to_lowercase();
        if !tag.is_empty() && !out.contains(&tag) {
            out.push(tag);
        }
    }
    if out.is_empty() {
        out.push("general".to_string());
    }
    out
}

fn parse_memories(raw: &[String], key: &str) -> Vec<Memory> {
    raw.iter()
        .filter_map(|item| match serde_json::from_str::<Memory>(item) {
            Ok(memory) => Some(memory),
            Err(err) => {
                warn!(key, error = %err, "skipping malformed memory record");
                None
            }
        })
        .collect()
}
