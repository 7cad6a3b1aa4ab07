//! Gift and occasion reminders.
//!
//! Two keys per user: a sorted set indexing reminder ids by due time
//! (epoch seconds), and a hash holding the full records. Range queries on
//! the index answer "what's coming up"; completion removes the id from
//! the index but keeps the record.

use anyhow::Result;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::kv::{keys, KvStore};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GiftSuggestion {
    pub idea: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GiftReminder {
    pub id: Uuid,
    pub user_id: String,
    /// What the date is: "birthday", "six-month anniversary", ...
    pub occasion: String,
    /// When the occasion lands.
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub suggested_gifts: Vec<GiftSuggestion>,
    pub is_completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Create a reminder: write the record, then index it by due time.
pub async fn create_reminder(
    store: &dyn KvStore,
    user_id: &str,
    occasion: &str,
    date: DateTime<Utc>,
    suggested_gifts: Vec<GiftSuggestion>,
    notes: Option<String>,
) -> Result<GiftReminder> {
    let reminder = GiftReminder {
        id: Uuid::now_v7(),
        user_id: user_id.to_string(),
        occasion: occasion.to_string(),
        date,
        suggested_gifts,
        is_completed: false,
        notes,
        created_at: Utc::now(),
    };

    let member = reminder.id.to_string();
    store
        .hash_set(
            &keys::reminder_data(user_id),
            &member,
            &serde_json::to_string(&reminder)?,
        )
        .await?;
    store
        .zset_add(&keys::reminder_index(user_id), &member, date.timestamp() as f64)
        .await?;
    Ok(reminder)
}

/// Reminders due between now and `within_days` from now, soonest first.
pub async fn upcoming_reminders(
    store: &dyn KvStore,
    user_id: &str,
    within_days: u32,
) -> Result<Vec<GiftReminder>> {
    let now = Utc::now();
    let horizon = now + ChronoDuration::days(i64::from(within_days));
    let ids = store
        .zset_range_by_score(
            &keys::reminder_index(user_id),
            now.timestamp() as f64,
            horizon.timestamp() as f64,
        )
        .await?;
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let data = store.hash_get_all(&keys::reminder_data(user_id)).await?;
    let mut out = Vec::new();
    for id in ids {
        let Some(raw) = data.get(&id) else {
            warn!(user_id, id, "reminder indexed but record missing, skipping");
            continue;
        };
        match serde_json::from_str::<GiftReminder>(raw) {
            // The index is cleaned on completion; the record is the truth.
            Ok(reminder) if !reminder.is_completed => out.push(reminder),
            Ok(_) => {}
            Err(err) => warn!(user_id, id, error = %err, "skipping malformed reminder record"),
        }
    }
    Ok(out)
}

/// Mark a reminder done and drop it from the due-time index. Returns
/// `false` when the id is unknown.
pub async fn complete_reminder(store: &dyn KvStore, user_id: &str, id: Uuid) -> Result<bool> {
    let member = id.to_string();
    let data = store.hash_get_all(&keys::reminder_data(user_id)).await?;
    let Some(raw) = data.get(&member) else {
        return Ok(false);
    };
    let mut reminder: GiftReminder = match serde_json::from_str(raw) {
        Ok(reminder) => reminder,
        Err(err) => {
            warn!(user_id, %id, error = %err, "completing a malformed reminder record");
            store.zset_remove(&keys::reminder_index(user_id), &member).await?;
            return Ok(false);
        }
    };

    reminder.is_completed = true;
    store
        .hash_set(
            &keys::reminder_data(user_id),
            &member,
            &serde_json::to_string(&reminder)?,
        )
        .await?;
    store.zset_remove(&keys::reminder_index(user_id), &member).await?;
    Ok(true)
}
