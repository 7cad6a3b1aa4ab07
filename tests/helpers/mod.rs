#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{Duration, Utc};
use uuid::Uuid;

use rapport::completion::CompletionProvider;
use rapport::config::RapportConfig;
use rapport::emotion::classifier::EmotionClassifier;
use rapport::emotion::{Emotion, EmotionEntry, EmotionLabel};
use rapport::engine::Engine;
use rapport::kv::mem::InMemoryStore;
use rapport::kv::{keys, KvStore, StoreError};
use rapport::memory::types::{Memory, MemoryType};

/// Default config with classifier pacing disabled so tests never sleep.
pub fn test_config() -> RapportConfig {
    let mut config = RapportConfig::default();
    config.classifier.min_interval_ms = 0;
    config
}

/// Engine over a fresh in-memory store and the offline lexicon. Returns the
/// store too so tests can seed or inspect raw keys.
pub fn test_engine() -> (Arc<Engine>, Arc<InMemoryStore>) {
    test_engine_with(test_config())
}

pub fn test_engine_with(config: RapportConfig) -> (Arc<Engine>, Arc<InMemoryStore>) {
    let store = Arc::new(InMemoryStore::new());
    let classifier = EmotionClassifier::new(None, &config.classifier);
    let engine = Engine::new(store.clone(), classifier, Arc::new(config));
    (Arc::new(engine), store)
}

/// Engine whose classifier calls the given provider instead of the lexicon.
pub fn engine_with_provider(
    provider: Arc<dyn CompletionProvider>,
) -> (Arc<Engine>, Arc<InMemoryStore>) {
    let config = test_config();
    let store = Arc::new(InMemoryStore::new());
    let classifier = EmotionClassifier::new(Some(provider), &config.classifier);
    let engine = Engine::new(store.clone(), classifier, Arc::new(config));
    (Arc::new(engine), store)
}

/// Engine over a store whose every operation fails.
pub fn failing_engine() -> Arc<Engine> {
    let config = test_config();
    let classifier = EmotionClassifier::new(None, &config.classifier);
    Arc::new(Engine::new(
        Arc::new(FailingStore),
        classifier,
        Arc::new(config),
    ))
}

/// Write one raw mood entry dated `days_ago`, so multi-day series can be
/// built without waiting for real days to pass.
pub async fn seed_mood_entry(
    store: &dyn KvStore,
    user_id: &str,
    days_ago: i64,
    label: EmotionLabel,
    intensity: f64,
) {
    let timestamp = Utc::now() - Duration::days(days_ago);
    let entry = EmotionEntry {
        emotion: label,
        intensity,
        timestamp,
        context: None,
    };
    let key = keys::mood_log(user_id, timestamp.date_naive());
    store
        .list_push_back(&key, &serde_json::to_string(&entry).unwrap())
        .await
        .unwrap();
}

/// Push a fully-specified memory record, bypassing admission heuristics.
/// Newest-first order is the caller's responsibility (later seeds land first).
pub async fn seed_memory(
    store: &dyn KvStore,
    user_id: &str,
    content: &str,
    memory_type: MemoryType,
    importance: f64,
    label: EmotionLabel,
    tags: &[&str],
    age_days: i64,
) -> Memory {
    let created = Utc::now() - Duration::days(age_days);
    let memory = Memory {
        id: Uuid::now_v7(),
        user_id: user_id.to_string(),
        content: content.to_string(),
        memory_type,
        importance,
        emotion: Emotion::new(label, 0.8),
        tags: tags.iter().map(|t| t.to_string()).collect(),
        created_at: created,
        last_accessed_at: created,
        embedding: None,
    };
    store
        .list_push_front(
            &keys::memories(user_id),
            &serde_json::to_string(&memory).unwrap(),
        )
        .await
        .unwrap();
    memory
}

/// Completion provider that always returns the same reply.
pub struct StaticProvider(pub String);

#[async_trait::async_trait]
impl CompletionProvider for StaticProvider {
    async fn complete(&self, _prompt: &str) -> anyhow::Result<String> {
        Ok(self.0.clone())
    }
}

/// Completion provider that always errors.
pub struct FailingProvider;

#[async_trait::async_trait]
impl CompletionProvider for FailingProvider {
    async fn complete(&self, _prompt: &str) -> anyhow::Result<String> {
        anyhow::bail!("provider offline")
    }
}

fn down() -> StoreError {
    StoreError::Unavailable("store offline".into())
}

/// Store whose every operation fails, for exercising degraded paths.
pub struct FailingStore;

#[async_trait::async_trait]
impl KvStore for FailingStore {
    async fn hash_set(&self, _key: &str, _field: &str, _value: &str) -> Result<(), StoreError> {
        Err(down())
    }

    async fn hash_get_all(&self, _key: &str) -> Result<HashMap<String, String>, StoreError> {
        Err(down())
    }

    async fn list_push_front(&self, _key: &str, _value: &str) -> Result<(), StoreError> {
        Err(down())
    }

    async fn list_push_back(&self, _key: &str, _value: &str) -> Result<(), StoreError> {
        Err(down())
    }

    async fn list_range(&self, _key: &str, _start: i64, _stop: i64) -> Result<Vec<String>, StoreError> {
        Err(down())
    }

    async fn list_trim(&self, _key: &str, _start: i64, _stop: i64) -> Result<(), StoreError> {
        Err(down())
    }

    async fn list_set(&self, _key: &str, _index: i64, _value: &str) -> Result<(), StoreError> {
        Err(down())
    }

    async fn zset_add(&self, _key: &str, _member: &str, _score: f64) -> Result<(), StoreError> {
        Err(down())
    }

    async fn zset_range_by_score(
        &self,
        _key: &str,
        _min: f64,
        _max: f64,
    ) -> Result<Vec<String>, StoreError> {
        Err(down())
    }

    async fn zset_remove(&self, _key: &str, _member: &str) -> Result<(), StoreError> {
        Err(down())
    }

    async fn expire(&self, _key: &str, _ttl: StdDuration) -> Result<(), StoreError> {
        Err(down())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Err(down())
    }
}
