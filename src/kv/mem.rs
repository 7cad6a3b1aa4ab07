//! Process-local [`KvStore`] backend.
//!
//! Single `Mutex<HashMap>` guarding typed values, with lazy expiry: a key
//! past its deadline is dropped on next touch. Good for tests, demos, and
//! single-node deployments that accept volatility.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use super::{KvStore, StoreError};

#[derive(Debug)]
enum Value {
    Hash(HashMap<String, String>),
    List(VecDeque<String>),
    Zset(Vec<(f64, String)>),
}

#[derive(Debug)]
struct Entry {
    value: Value,
    expires_at: Option<Instant>,
}

impl Entry {
    fn new(value: Value) -> Self {
        Self {
            value,
            expires_at: None,
        }
    }

    fn expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|deadline| deadline <= now)
    }
}

#[derive(Debug, Default)]
pub struct InMemoryStore {
    data: Mutex<HashMap<String, Entry>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn guard(&self) -> Result<MutexGuard<'_, HashMap<String, Entry>>, StoreError> {
        self.data
            .lock()
            .map_err(|_| StoreError::Unavailable("store lock poisoned".into()))
    }

    /// Drops the entry if its deadline has passed, so reads never see
    /// expired data.
    fn purge_if_expired(map: &mut HashMap<String, Entry>, key: &str) {
        let now = Instant::now();
        if map.get(key).is_some_and(|entry| entry.expired(now)) {
            map.remove(key);
        }
    }
}

/// Inclusive range with tail-relative negative indices. `None` means the
/// range selects nothing.
fn normalize_range(len: usize, start: i64, stop: i64) -> Option<(usize, usize)> {
    if len == 0 {
        return None;
    }
    let len = len as i64;
    let mut start = if start < 0 { len + start } else { start };
    let mut stop = if stop < 0 { len + stop } else { stop };
    start = start.max(0);
    stop = stop.min(len - 1);
    if start > stop || start >= len || stop < 0 {
        return None;
    }
    Some((start as usize, stop as usize))
}

#[async_trait]
impl KvStore for InMemoryStore {
    async fn hash_set(&self, key: &str, field: &str, value: &str) -> Result<(), StoreError> {
        let mut map = self.guard()?;
        Self::purge_if_expired(&mut map, key);
        let entry = map
            .entry(key.to_string())
            .or_insert_with(|| Entry::new(Value::Hash(HashMap::new())));
        match &mut entry.value {
            Value::Hash(hash) => {
                hash.insert(field.to_string(), value.to_string());
                Ok(())
            }
            _ => Err(StoreError::WrongShape(key.to_string())),
        }
    }

    async fn hash_get_all(&self, key: &str) -> Result<HashMap<String, String>, StoreError> {
        let mut map = self.guard()?;
        Self::purge_if_expired(&mut map, key);
        match map.get(key).map(|entry| &entry.value) {
            None => Ok(HashMap::new()),
            Some(Value::Hash(hash)) => Ok(hash.clone()),
            Some(_) => Err(StoreError::WrongShape(key.to_string())),
        }
    }

    async fn list_push_front(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut map = self.guard()?;
        Self::purge_if_expired(&mut map, key);
        let entry = map
            .entry(key.to_string())
            .or_insert_with(|| Entry::new(Value::List(VecDeque::new())));
        match &mut entry.value {
            Value::List(list) => {
                list.push_front(value.to_string());
                Ok(())
            }
            _ => Err(StoreError::WrongShape(key.to_string())),
        }
    }

    async fn list_push_back(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut map = self.guard()?;
        Self::purge_if_expired(&mut map, key);
        let entry = map
            .entry(key.to_string())
            .or_insert_with(|| Entry::new(Value::List(VecDeque::new())));
        match &mut entry.value {
            Value::List(list) => {
                list.push_back(value.to_string());
                Ok(())
            }
            _ => Err(StoreError::WrongShape(key.to_string())),
        }
    }

    async fn list_range(&self, key: &str, start: i64, stop: i64) -> Result<Vec<String>, StoreError> {
        let mut map = self.guard()?;
        Self::purge_if_expired(&mut map, key);
        match map.get(key).map(|entry| &entry.value) {
            None => Ok(Vec::new()),
            Some(Value::List(list)) => {
                let Some((lo, hi)) = normalize_range(list.len(), start, stop) else {
                    return Ok(Vec::new());
                };
                Ok(list.iter().skip(lo).take(hi - lo + 1).cloned().collect())
            }
            Some(_) => Err(StoreError::WrongShape(key.to_string())),
        }
    }

    async fn list_trim(&self, key: &str, start: i64, stop: i64) -> Result<(), StoreError> {
        let mut map = self.guard()?;
        Self::purge_if_expired(&mut map, key);
        match map.get_mut(key).map(|entry| &mut entry.value) {
            None => Ok(()),
            Some(Value::List(list)) => {
                match normalize_range(list.len(), start, stop) {
                    // Range selects nothing: trim empties the list.
                    None => list.clear(),
                    Some((lo, hi)) => {
                        list.truncate(hi + 1);
                        list.drain(..lo);
                    }
                }
                Ok(())
            }
            Some(_) => Err(StoreError::WrongShape(key.to_string())),
        }
    }

    async fn list_set(&self, key: &str, index: i64, value: &str) -> Result<(), StoreError> {
        let mut map = self.guard()?;
        Self::purge_if_expired(&mut map, key);
        match map.get_mut(key).map(|entry| &mut entry.value) {
            None => Err(StoreError::NotFound(key.to_string())),
            Some(Value::List(list)) => {
                let len = list.len() as i64;
                let idx = if index < 0 { len + index } else { index };
                if idx < 0 || idx >= len {
                    return Err(StoreError::OutOfRange {
                        key: key.to_string(),
                        index,
                    });
                }
                list[idx as usize] = value.to_string();
                Ok(())
            }
            Some(_) => Err(StoreError::WrongShape(key.to_string())),
        }
    }

    async fn zset_add(&self, key: &str, member: &str, score: f64) -> Result<(), StoreError> {
        let mut map = self.guard()?;
        Self::purge_if_expired(&mut map, key);
        let entry = map
            .entry(key.to_string())
            .or_insert_with(|| Entry::new(Value::Zset(Vec::new())));
        match &mut entry.value {
            Value::Zset(zset) => {
                zset.retain(|(_, m)| m != member);
                zset.push((score, member.to_string()));
                zset.sort_by(|a, b| {
                    a.0.partial_cmp(&b.0)
                        .unwrap_or(std::cmp::Ordering::Equal)
                        .then_with(|| a.1.cmp(&b.1))
                });
                Ok(())
            }
            _ => Err(StoreError::WrongShape(key.to_string())),
        }
    }

    async fn zset_range_by_score(
        &self,
        key: &str,
        min: f64,
        max: f64,
    ) -> Result<Vec<String>, StoreError> {
        let mut map = self.guard()?;
        Self::purge_if_expired(&mut map, key);
        match map.get(key).map(|entry| &entry.value) {
            None => Ok(Vec::new()),
            Some(Value::Zset(zset)) => Ok(zset
                .iter()
                .filter(|(score, _)| *score >= min && *score <= max)
                .map(|(_, member)| member.clone())
                .collect()),
            Some(_) => Err(StoreError::WrongShape(key.to_string())),
        }
    }

    async fn zset_remove(&self, key: &str, member: &str) -> Result<(), StoreError> {
        let mut map = self.guard()?;
        Self::purge_if_expired(&mut map, key);
        match map.get_mut(key).map(|entry| &mut entry.value) {
            None => Ok(()),
            Some(Value::Zset(zset)) => {
                zset.retain(|(_, m)| m != member);
                Ok(())
            }
            Some(_) => Err(StoreError::WrongShape(key.to_string())),
        }
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<(), StoreError> {
        let mut map = self.guard()?;
        Self::purge_if_expired(&mut map, key);
        if let Some(entry) = map.get_mut(key) {
            entry.expires_at = Some(Instant::now() + ttl);
        }
        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.guard().map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn hash_set_and_get_all() {
        let store = InMemoryStore::new();
        store.hash_set("h", "a", "1").await.unwrap();
        store.hash_set("h", "b", "2").await.unwrap();
        store.hash_set("h", "a", "3").await.unwrap();

        let all = store.hash_get_all("h").await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all["a"], "3");
        assert_eq!(all["b"], "2");
    }

    #[tokio::test]
    async fn missing_hash_reads_empty() {
        let store = InMemoryStore::new();
        assert!(store.hash_get_all("nope").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn list_push_and_range() {
        let store = InMemoryStore::new();
        store.list_push_back("l", "a").await.unwrap();
        store.list_push_back("l", "b").await.unwrap();
        store.list_push_front("l", "z").await.unwrap();

        let all = store.list_range("l", 0, -1).await.unwrap();
        assert_eq!(all, vec!["z", "a", "b"]);

        let tail = store.list_range("l", -2, -1).await.unwrap();
        assert_eq!(tail, vec!["a", "b"]);

        let head = store.list_range("l", 0, 0).await.unwrap();
        assert_eq!(head, vec!["z"]);

        // Out-of-bounds ranges clamp rather than error.
        let clamped = store.list_range("l", 1, 99).await.unwrap();
        assert_eq!(clamped, vec!["a", "b"]);
        assert!(store.list_range("l", 5, 9).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn list_trim_keeps_window() {
        let store = InMemoryStore::new();
        for i in 0..6 {
            store.list_push_back("l", &i.to_string()).await.unwrap();
        }
        store.list_trim("l", 0, 2).await.unwrap();
        assert_eq!(store.list_range("l", 0, -1).await.unwrap(), vec!["0", "1", "2"]);

        // An empty window empties the list.
        store.list_trim("l", 5, 1).await.unwrap();
        assert!(store.list_range("l", 0, -1).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn list_set_replaces_in_place() {
        let store = InMemoryStore::new();
        store.list_push_back("l", "a").await.unwrap();
        store.list_push_back("l", "b").await.unwrap();

        store.list_set("l", 1, "B").await.unwrap();
        assert_eq!(store.list_range("l", 0, -1).await.unwrap(), vec!["a", "B"]);

        store.list_set("l", -2, "A").await.unwrap();
        assert_eq!(store.list_range("l", 0, -1).await.unwrap(), vec!["A", "B"]);

        let err = store.list_set("l", 7, "x").await.unwrap_err();
        assert!(matches!(err, StoreError::OutOfRange { .. }));

        let err = store.list_set("missing", 0, "x").await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn zset_ranges_by_score() {
        let store = InMemoryStore::new();
        store.zset_add("z", "far", 300.0).await.unwrap();
        store.zset_add("z", "near", 100.0).await.unwrap();
        store.zset_add("z", "mid", 200.0).await.unwrap();

        let all = store.zset_range_by_score("z", f64::MIN, f64::MAX).await.unwrap();
        assert_eq!(all, vec!["near", "mid", "far"]);

        let window = store.zset_range_by_score("z", 100.0, 200.0).await.unwrap();
        assert_eq!(window, vec!["near", "mid"]);

        // Re-adding a member moves it rather than duplicating it.
        store.zset_add("z", "near", 250.0).await.unwrap();
        let all = store.zset_range_by_score("z", f64::MIN, f64::MAX).await.unwrap();
        assert_eq!(all, vec!["mid", "near", "far"]);

        store.zset_remove("z", "mid").await.unwrap();
        let all = store.zset_range_by_score("z", f64::MIN, f64::MAX).await.unwrap();
        assert_eq!(all, vec!["near", "far"]);
    }

    #[tokio::test]
    async fn equal_scores_order_by_member() {
        let store = InMemoryStore::new();
        store.zset_add("z", "b", 10.0).await.unwrap();
        store.zset_add("z", "a", 10.0).await.unwrap();
        let all = store.zset_range_by_score("z", 0.0, 20.0).await.unwrap();
        assert_eq!(all, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn expired_keys_vanish() {
        let store = InMemoryStore::new();
        store.list_push_back("l", "a").await.unwrap();
        store.expire("l", Duration::from_millis(5)).await.unwrap();

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(store.list_range("l", 0, -1).await.unwrap().is_empty());

        // The slot is reusable with a different shape afterwards.
        store.hash_set("l", "f", "v").await.unwrap();
        assert_eq!(store.hash_get_all("l").await.unwrap()["f"], "v");
    }

    #[tokio::test]
    async fn expire_on_missing_key_is_noop() {
        let store = InMemoryStore::new();
        store.expire("ghost", Duration::from_secs(1)).await.unwrap();
    }

    #[tokio::test]
    async fn shape_conflicts_error() {
        let store = InMemoryStore::new();
        store.hash_set("k", "f", "v").await.unwrap();

        let err = store.list_push_back("k", "x").await.unwrap_err();
        assert!(matches!(err, StoreError::WrongShape(_)));

        let err = store.zset_add("k", "m", 1.0).await.unwrap_err();
        assert!(matches!(err, StoreError::WrongShape(_)));
    }

    #[tokio::test]
    async fn ping_succeeds() {
        let store = InMemoryStore::new();
        store.ping().await.unwrap();
    }
}
