// In-process key-value store.
//
// Used as the substitution fake in tests and for ephemeral sessions. Counts
// writes per key and can inject write latency or failures so save
// coordination can be observed.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use crate::error::StoreError;
use crate::store::KeyValueStore;

#[derive(Default)]
struct Inner {
    entries: Mutex<BTreeMap<String, Vec<u8>>>,
    writes: Mutex<HashMap<String, usize>>,
    total_writes: AtomicUsize,
    write_delay_ms: AtomicUsize,
    fail_writes: AtomicBool,
}

/// Cheaply cloneable handle; clones share the same entries.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleep this long inside every `set` before the value lands.
    pub fn set_write_delay(&self, delay: Duration) {
        let ms = usize::try_from(delay.as_millis()).unwrap_or(usize::MAX);
        self.inner.write_delay_ms.store(ms, Ordering::SeqCst);
    }

    /// Make every subsequent `set` fail with a backend error.
    pub fn set_fail_writes(&self, fail: bool) {
        self.inner.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of `set` calls that reached the store, successful or not.
    pub fn write_count(&self) -> usize {
        self.inner.total_writes.load(Ordering::SeqCst)
    }

    /// Number of `set` calls for one key.
    pub fn writes_to(&self, key: &str) -> usize {
        lock(&self.inner.writes).get(key).copied().unwrap_or(0)
    }

    /// Seed a value without counting it as a write.
    pub fn insert_raw(&self, key: impl Into<String>, value: impl Into<Vec<u8>>) {
        lock(&self.inner.entries).insert(key.into(), value.into());
    }

    pub fn raw(&self, key: &str) -> Option<Vec<u8>> {
        lock(&self.inner.entries).get(key).cloned()
    }

    pub fn len(&self) -> usize {
        lock(&self.inner.entries).len()
    }
}

impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(lock(&self.inner.entries).get(key).cloned())
    }

    async fn set(&self, key: &str, value: Vec<u8>) -> Result<(), StoreError> {
        self.inner.total_writes.fetch_add(1, Ordering::SeqCst);
        *lock(&self.inner.writes).entry(key.to_string()).or_insert(0) += 1;

        let delay_ms = self.inner.write_delay_ms.load(Ordering::SeqCst);
        if delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(delay_ms as u64)).await;
        }

        if self.inner.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Backend {
                key: key.to_string(),
                message: "injected write failure".to_string(),
            });
        }

        lock(&self.inner.entries).insert(key.to_string(), value);
        Ok(())
    }

    async fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        Ok(lock(&self.inner.entries)
            .keys()
            .filter(|key| key.starts_with(prefix))
            .cloned()
            .collect())
    }
}

// A poisoned map is still structurally valid; keep serving it.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn set_then_get_returns_value() {
        let store = MemoryStore::new();
        store.set("doc_1", b"hello".to_vec()).await.unwrap();
        assert_eq!(store.get("doc_1").await.unwrap(), Some(b"hello".to_vec()));
        assert_eq!(store.get("doc_2").await.unwrap(), None);
        assert_eq!(store.write_count(), 1);
        assert_eq!(store.writes_to("doc_1"), 1);
    }

    #[tokio::test]
    async fn clones_share_entries() {
        let store = MemoryStore::new();
        let clone = store.clone();
        clone.set("chat_1", b"[]".to_vec()).await.unwrap();
        assert_eq!(store.raw("chat_1"), Some(b"[]".to_vec()));
    }

    #[tokio::test]
    async fn injected_failure_keeps_previous_value() {
        let store = MemoryStore::new();
        store.insert_raw("doc_1", "old");
        store.set_fail_writes(true);

        let err = store.set("doc_1", b"new".to_vec()).await.unwrap_err();
        assert!(matches!(err, StoreError::Backend { ref key, .. } if key == "doc_1"));
        assert_eq!(store.raw("doc_1"), Some(b"old".to_vec()));
        assert_eq!(store.write_count(), 1);
    }

    #[tokio::test]
    async fn insert_raw_is_not_counted() {
        let store = MemoryStore::new();
        store.insert_raw("doc_1", "seed");
        assert_eq!(store.write_count(), 0);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn keys_with_prefix_filters_and_sorts() {
        let store = MemoryStore::new();
        store.insert_raw("doc_b", "");
        store.insert_raw("chat_a", "");
        store.insert_raw("doc_a", "");

        let keys = store.keys_with_prefix("doc_").await.unwrap();
        assert_eq!(keys, vec!["doc_a".to_string(), "doc_b".to_string()]);
    }
}
