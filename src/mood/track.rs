//! Mood log persistence.
//!
//! Writes go through [`record_emotion`]; everything else re-derives from
//! the per-day entry lists. Reads are best-effort: a failing store or a
//! malformed row degrades to neutral defaults instead of erroring, so the
//! conversation layer above never stalls on mood.

use anyhow::Result;
use chrono::{Duration as ChronoDuration, Utc};
use std::collections::{BTreeSet, HashMap};
use tracing::warn;

use super::{aggregate, MoodTracking, MoodTrends};
use crate::config::{MoodConfig, StoreConfig};
use crate::emotion::{Emotion, EmotionEntry};
use crate::kv::{keys, ttl_days, KvStore};

/// Widest day window a read will scan; `days` arrives unchecked from
/// query parameters.
const MAX_WINDOW_DAYS: u32 = 366;

/// Append one classified reading to today's log and refresh the day's TTL.
pub async fn record_emotion(
    store: &dyn KvStore,
    store_config: &StoreConfig,
    user_id: &str,
    emotion: &Emotion,
    trigger: Option<&str>,
) -> Result<()> {
    let now = Utc::now();
    let date = now.date_naive();
    let entry = EmotionEntry {
        emotion: emotion.primary,
        intensity: emotion.intensity.clamp(0.0, 1.0),
        timestamp: now,
        context: emotion.context.clone(),
    };

    let key = keys::mood_log(user_id, date);
    store.list_push_back(&key, &serde_json::to_string(&entry)?).await?;
    store.expire(&key, ttl_days(store_config.mood_ttl_days)).await?;

    if let Some(trigger) = trigger {
        add_trigger(store, store_config, user_id, trigger).await?;
    }
    Ok(())
}

/// Record what set off today's mood (read-modify-write on the day's meta
/// hash; the engine's per-user lock keeps this race-free).
async fn add_trigger(
    store: &dyn KvStore,
    store_config: &StoreConfig,
    user_id: &str,
    trigger: &str,
) -> Result<()> {
    let date = Utc::now().date_naive();
    let key = keys::mood_meta(user_id, date);

    let meta = store.hash_get_all(&key).await?;
    let mut triggers: BTreeSet<String> = meta
        .get("triggers")
        .and_then(|raw| serde_json::from_str(raw).ok())
        .unwrap_or_default();
    triggers.insert(trigger.to_string());

    store.hash_set(&key, "triggers", &serde_json::to_string(&triggers)?).await?;
    store.expire(&key, ttl_days(store_config.mood_ttl_days)).await?;
    Ok(())
}

/// Attach a free-text note to today's mood.
pub async fn set_note(
    store: &dyn KvStore,
    store_config: &StoreConfig,
    user_id: &str,
    note: &str,
) -> Result<()> {
    let date = Utc::now().date_naive();
    let key = keys::mood_meta(user_id, date);
    store.hash_set(&key, "notes", note).await?;
    store.expire(&key, ttl_days(store_config.mood_ttl_days)).await?;
    Ok(())
}

/// Today's aggregate mood. Neutral when there is no data or the store is
/// unreachable.
pub async fn current_mood(store: &dyn KvStore, mood_config: &MoodConfig, user_id: &str) -> Emotion {
    let date = Utc::now().date_naive();
    let key = keys::mood_log(user_id, date);
    let raw = match store.list_range(&key, 0, -1).await {
        Ok(raw) => raw,
        Err(err) => {
            warn!(user_id, error = %err, "mood log read failed, reporting neutral");
            return Emotion::neutral();
        }
    };
    let entries = parse_entries(&raw, &key);
    aggregate::weighted_mood(&entries, Utc::now(), mood_config.decay_hours)
}

/// Day summaries for the last `days` days (capped at a year), oldest
/// first. Days without entries are simply absent.
pub async fn history(
    store: &dyn KvStore,
    mood_config: &MoodConfig,
    user_id: &str,
    days: u32,
) -> Vec<MoodTracking> {
    let days = days.min(MAX_WINDOW_DAYS);
    let now = Utc::now();
    let today = now.date_naive();
    let mut out = Vec::new();

    for offset in (0..i64::from(days)).rev() {
        let date = today - ChronoDuration::days(offset);
        let log_key = keys::mood_log(user_id, date);
        let raw = match store.list_range(&log_key, 0, -1).await {
            Ok(raw) => raw,
            Err(err) => {
                warn!(user_id, %date, error = %err, "mood log read failed, skipping day");
                continue;
            }
        };
        let entries = parse_entries(&raw, &log_key);
        if entries.is_empty() {
            continue;
        }

        let meta = match store.hash_get_all(&keys::mood_meta(user_id, date)).await {
            Ok(meta) => meta,
            Err(err) => {
                warn!(user_id, %date, error = %err, "mood meta read failed, continuing without");
                HashMap::new()
            }
        };
        let triggers: BTreeSet<String> = meta
            .get("triggers")
            .and_then(|raw| serde_json::from_str(raw).ok())
            .unwrap_or_default();
        let notes = meta.get("notes").cloned().filter(|n| !n.is_empty());

        out.push(MoodTracking {
            user_id: user_id.to_string(),
            date,
            overall_mood: aggregate::weighted_mood(&entries, now, mood_config.decay_hours),
            mood_history: entries,
            triggers,
            notes,
        });
    }
    out
}

/// Trend summary over the last `days` days of available data.
pub async fn trends(
    store: &dyn KvStore,
    mood_config: &MoodConfig,
    user_id: &str,
    days: u32,
) -> MoodTrends {
    let daily = history(store, mood_config, user_id, days).await;
    aggregate::trend_summary(&daily, mood_config.trend_recent_days, mood_config.trend_threshold)
}

fn parse_entries(raw: &[String], key: &str) -> Vec<EmotionEntry> {
    raw.iter()
        .filter_map(|item| match serde_json::from_str::<EmotionEntry>(item) {
            Ok(entry) => Some(entry),
            Err(err) => {
                warn!(key, error = %err, "skipping malformed mood entry");
                None
            }
        })
        .collect()
}
