//! Raw conversation log.
//!
//! A capped, newest-first list of turns per user. This is the verbatim
//! record; anything worth keeping long-term goes through the memory
//! admission path instead.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::StoreConfig;
use crate::kv::{keys, ttl_days, KvStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Companion,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Companion => "companion",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One logged turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

/// Log one turn: prepend, trim to the cap, refresh the TTL.
pub async fn append_turn(
    store: &dyn KvStore,
    store_config: &StoreConfig,
    user_id: &str,
    role: Role,
    content: &str,
) -> Result<()> {
    let turn = ChatTurn {
        role,
        content: content.to_string(),
        timestamp: Utc::now(),
    };
    let key = keys::history(user_id);
    store.list_push_front(&key, &serde_json::to_string(&turn)?).await?;
    let cap = store_config.history_cap.max(1) as i64;
    store.list_trim(&key, 0, cap - 1).await?;
    store.expire(&key, ttl_days(store_config.memory_ttl_days)).await?;
    Ok(())
}

/// The most recent `limit` turns, newest first.
pub async fn recent_turns(
    store: &dyn KvStore,
    user_id: &str,
    limit: usize,
) -> Result<Vec<ChatTurn>> {
    let key = keys::history(user_id);
    // A lossy `as` cast would wrap huge limits negative and drop rows.
    let stop = i64::try_from(limit.max(1)).map_or(i64::MAX, |l| l - 1);
    let raw = store.list_range(&key, 0, stop).await?;
    Ok(raw
        .iter()
        .filter_map(|item| match serde_json::from_str::<ChatTurn>(item) {
            Ok(turn) => Some(turn),
            Err(err) => {
                warn!(key, error = %err, "skipping malformed history row");
                None
            }
        })
        .collect())
}
