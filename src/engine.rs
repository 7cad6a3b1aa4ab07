//! The engine — every exposed operation funnels through here.
//!
//! Holds the shared state (store, classifier, config) plus a per-user
//! lock registry. Anything that writes for a user runs under that user's
//! lock, so turns apply in arrival order and read-modify-write paths
//! (memory touches, reminder completion) never interleave. Reads run
//! lock-free.
//!
//! Failure policy: a user turn must always produce an answer. Writes that
//! fail are logged and dropped; reads that fail degrade to empty or
//! neutral defaults. Only explicitly administrative calls (stats, health,
//! reminder creation) surface their errors.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::RapportConfig;
use crate::emotion::classifier::EmotionClassifier;
use crate::emotion::Emotion;
use crate::history::{self, ChatTurn, Role};
use crate::kv::{KvStore, StoreError};
use crate::memory::stats::StatsResponse;
use crate::memory::types::{Memory, MemoryType};
use crate::memory::{heuristics, relevance};
use crate::mood::{track, MoodTracking, MoodTrends};
use crate::reminders::{self, GiftReminder, GiftSuggestion};

/// What one recorded turn produced.
#[derive(Debug, Serialize)]
pub struct TurnOutcome {
    /// The reading the turn was classified with.
    pub emotion: Emotion,
    /// The admitted memory, when the turn cleared the admission gate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory_created: Option<Memory>,
}

/// Ambient context for composing the next companion reply.
#[derive(Debug, Serialize)]
pub struct ContextBundle {
    pub current_mood: Emotion,
    pub relevant_memories: Vec<Memory>,
}

pub struct Engine {
    store: Arc<dyn KvStore>,
    classifier: EmotionClassifier,
    config: Arc<RapportConfig>,
    /// One lock per user id, created on first use and never evicted: the
    /// registry grows with the set of user ids seen since startup, not
    /// with request volume.
    user_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl Engine {
    pub fn new(
        store: Arc<dyn KvStore>,
        classifier: EmotionClassifier,
        config: Arc<RapportConfig>,
    ) -> Self {
        Self {
            store,
            classifier,
            config,
            user_locks: Mutex::new(HashMap::new()),
        }
    }

    async fn user_lock(&self, user_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.user_locks.lock().await;
        locks
            .entry(user_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Process one user turn: classify, log mood and history, and admit a
    /// memory when the turn earns one. Never fails; whatever could not be
    /// written is logged and skipped.
    pub async fn record_turn(&self, user_id: &str, text: &str, trigger: Option<&str>) -> TurnOutcome {
        let lock = self.user_lock(user_id).await;
        let _guard = lock.lock().await;

        // 1. Classify the turn
        let emotion = self.classifier.classify(text).await;

        // 2. Append to today's mood log
        if let Err(err) =
            track::record_emotion(&*self.store, &self.config.store, user_id, &emotion, trigger).await
        {
            warn!(user_id, error = %err, "mood write failed, continuing turn");
        }

        // 3. Append to the raw history log
        if let Err(err) =
            history::append_turn(&*self.store, &self.config.store, user_id, Role::User, text).await
        {
            warn!(user_id, error = %err, "history write failed, continuing turn");
        }

        // 4. Memory admission
        let memory_created = if heuristics::should_remember(text, &emotion) {
            let importance = heuristics::importance(text, &emotion);
            let memory_type = heuristics::memory_type(text);
            let tags = heuristics::extract_tags(text);
            match crate::memory::store::create_memory(
                &*self.store,
                &self.config.store,
                user_id,
                text,
                memory_type,
                importance,
                emotion.clone(),
                tags,
            )
            .await
            {
                Ok(memory) => Some(memory),
                Err(err) => {
                    warn!(user_id, error = %err, "memory write failed, moment lost");
                    None
                }
            }
        } else {
            None
        };

        debug!(
            user_id,
            emotion = %emotion.primary,
            remembered = memory_created.is_some(),
            "turn recorded"
        );
        TurnOutcome {
            emotion,
            memory_created,
        }
    }

    /// Current mood plus the memories most relevant to the turn being
    /// composed. Both halves degrade independently.
    pub async fn get_context(&self, user_id: &str, turn_text: &str) -> ContextBundle {
        let current_mood = track::current_mood(&*self.store, &self.config.mood, user_id).await;
        let relevant_memories = relevance::rank_for_context(
            self.all_memories(user_id).await,
            turn_text,
            Utc::now(),
        );
        ContextBundle {
            current_mood,
            relevant_memories,
        }
    }

    /// Explicit memory search, ranked by the query-mode score.
    pub async fn search_memories(
        &self,
        user_id: &str,
        query: &str,
        limit: Option<usize>,
        types: Option<&[MemoryType]>,
    ) -> Vec<Memory> {
        let limit = limit.unwrap_or(self.config.retrieval.max_results);
        relevance::rank_by_query(self.all_memories(user_id).await, query, limit, types)
    }

    pub async fn get_memory(&self, user_id: &str, id: Uuid) -> Option<Memory> {
        self.all_memories(user_id).await.into_iter().find(|m| m.id == id)
    }

    /// Mark a memory as recalled. `false` when the id is unknown.
    pub async fn touch_memory(&self, user_id: &str, id: Uuid) -> anyhow::Result<bool> {
        let lock = self.user_lock(user_id).await;
        let _guard = lock.lock().await;
        crate::memory::store::touch_memory(&*self.store, user_id, id).await
    }

    pub async fn get_trends(&self, user_id: &str, days: Option<u32>) -> MoodTrends {
        let days = days.unwrap_or(self.config.mood.trend_window_days);
        track::trends(&*self.store, &self.config.mood, user_id, days).await
    }

    pub async fn mood_history(&self, user_id: &str, days: Option<u32>) -> Vec<MoodTracking> {
        let days = days.unwrap_or(self.config.mood.trend_window_days);
        track::history(&*self.store, &self.config.mood, user_id, days).await
    }

    /// Attach a note to today's mood.
    pub async fn annotate_mood(&self, user_id: &str, note: &str) -> anyhow::Result<()> {
        let lock = self.user_lock(user_id).await;
        let _guard = lock.lock().await;
        track::set_note(&*self.store, &self.config.store, user_id, note).await
    }

    /// Log a turn on behalf of the reply-composition layer (companion
    /// turns; user turns are logged by [`Engine::record_turn`]).
    pub async fn append_history(&self, user_id: &str, role: Role, content: &str) -> anyhow::Result<()> {
        let lock = self.user_lock(user_id).await;
        let _guard = lock.lock().await;
        history::append_turn(&*self.store, &self.config.store, user_id, role, content).await
    }

    pub async fn recent_history(&self, user_id: &str, limit: Option<usize>) -> Vec<ChatTurn> {
        let limit = limit.unwrap_or(self.config.store.history_cap);
        match history::recent_turns(&*self.store, user_id, limit).await {
            Ok(turns) => turns,
            Err(err) => {
                warn!(user_id, error = %err, "history read failed, returning empty");
                Vec::new()
            }
        }
    }

    pub async fn create_reminder(
        &self,
        user_id: &str,
        occasion: &str,
        date: DateTime<Utc>,
        suggested_gifts: Vec<GiftSuggestion>,
        notes: Option<String>,
    ) -> anyhow::Result<GiftReminder> {
        let lock = self.user_lock(user_id).await;
        let _guard = lock.lock().await;
        reminders::create_reminder(&*self.store, user_id, occasion, date, suggested_gifts, notes)
            .await
    }

    pub async fn upcoming_reminders(&self, user_id: &str, within_days: u32) -> Vec<GiftReminder> {
        match reminders::upcoming_reminders(&*self.store, user_id, within_days).await {
            Ok(upcoming) => upcoming,
            Err(err) => {
                warn!(user_id, error = %err, "reminder read failed, returning empty");
                Vec::new()
            }
        }
    }

    pub async fn complete_reminder(&self, user_id: &str, id: Uuid) -> anyhow::Result<bool> {
        let lock = self.user_lock(user_id).await;
        let _guard = lock.lock().await;
        reminders::complete_reminder(&*self.store, user_id, id).await
    }

    pub async fn stats(&self, user_id: &str) -> anyhow::Result<StatsResponse> {
        crate::memory::stats::memory_stats(&*self.store, user_id).await
    }

    /// Store connectivity probe.
    pub async fn health(&self) -> Result<(), StoreError> {
        self.store.ping().await
    }

    /// Full memory list with read failures degraded to empty.
    async fn all_memories(&self, user_id: &str) -> Vec<Memory> {
        match crate::memory::store::list_memories(&*self.store, user_id).await {
            Ok(memories) => memories,
            Err(err) => {
                warn!(user_id, error = %err, "memory read failed, treating as empty");
                Vec::new()
            }
        }
    }
}
