//! Per-user memory statistics, derived from the live list on demand.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::kv::KvStore;
use crate::memory::store::list_memories;
use crate::memory::types::MemoryType;

/// Response from a stats request.
#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub total_memories: u64,
    /// Counts per type; every type is present, zero or not.
    pub by_type: BTreeMap<String, u64>,
    pub average_importance: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oldest_memory: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub newest_memory: Option<DateTime<Utc>>,
}

/// Compute memory statistics for one user.
pub async fn memory_stats(store: &dyn KvStore, user_id: &str) -> Result<StatsResponse> {
    let memories = list_memories(store, user_id).await?;

    let mut by_type: BTreeMap<String, u64> = MemoryType::ALL
        .iter()
        .map(|mt| (mt.as_str().to_string(), 0))
        .collect();
    for memory in &memories {
        *by_type.entry(memory.memory_type.as_str().to_string()).or_insert(0) += 1;
    }

    let total = memories.len() as u64;
    let average_importance = if memories.is_empty() {
        0.0
    } else {
        memories.iter().map(|m| m.importance).sum::<f64>() / memories.len() as f64
    };

    Ok(StatsResponse {
        total_memories: total,
        by_type,
        average_importance,
        oldest_memory: memories.iter().map(|m| m.created_at).min(),
        newest_memory: memories.iter().map(|m| m.created_at).max(),
    })
}
