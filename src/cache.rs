use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::{Duration, Instant};

use lru::LruCache;
use serde::{de::DeserializeOwned, Serialize};
use tokio::sync::RwLock;
use tracing::debug;

struct Entry {
    data: Vec<u8>,
    expires_at: Instant,
}

impl Entry {
    fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

/// In-memory key-value cache with per-entry TTL and LRU eviction.
///
/// Values are stored as serialized JSON so callers stay decoupled from each
/// other's types. Expired entries are dropped lazily on read; the LRU bound
/// keeps the total footprint fixed without a background sweeper.
pub struct TtlCache {
    store: Arc<RwLock<LruCache<String, Entry>>>,
}

impl TtlCache {
    pub fn new(max_entries: usize) -> Self {
        let capacity = NonZeroUsize::new(max_entries)
            .unwrap_or(NonZeroUsize::new(1000).expect("nonzero literal"));
        Self {
            store: Arc::new(RwLock::new(LruCache::new(capacity))),
        }
    }

    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let mut store = self.store.write().await;
        match store.get(key) {
            Some(entry) if entry.is_expired() => {
                store.pop(key);
                None
            }
            Some(entry) => serde_json::from_slice(&entry.data).ok(),
            None => None,
        }
    }

    pub async fn set<T: Serialize>(&self, key: &str, value: &T, ttl: Duration) {
        let Ok(data) = serde_json::to_vec(value) else {
            return;
        };
        let mut store = self.store.write().await;
        store.put(
            key.to_string(),
            Entry {
                data,
                expires_at: Instant::now() + ttl,
            },
        );
        debug!(%key, ttl_secs = ttl.as_secs(), "cache set");
    }

    pub async fn del(&self, key: &str) {
        let mut store = self.store.write().await;
        if store.pop(key).is_some() {
            debug!(%key, "cache invalidated");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn set_then_get_roundtrips() {
        let cache = TtlCache::new(10);
        cache.set("k", &vec![1u32, 2, 3], Duration::from_secs(60)).await;
        let got: Option<Vec<u32>> = cache.get("k").await;
        assert_eq!(got, Some(vec![1, 2, 3]));
    }

    #[tokio::test]
    async fn expired_entries_are_dropped_on_read() {
        let cache = TtlCache::new(10);
        cache.set("k", &"v".to_string(), Duration::from_millis(20)).await;
        tokio::time::sleep(Duration::from_millis(50)).await;
        let got: Option<String> = cache.get("k").await;
        assert_eq!(got, None);
    }

    #[tokio::test]
    async fn del_removes_entry() {
        let cache = TtlCache::new(10);
        cache.set("k", &1u8, Duration::from_secs(60)).await;
        cache.del("k").await;
        let got: Option<u8> = cache.get("k").await;
        assert_eq!(got, None);
    }

    #[tokio::test]
    async fn lru_bound_evicts_oldest() {
        let cache = TtlCache::new(2);
        cache.set("a", &1u8, Duration::from_secs(60)).await;
        cache.set("b", &2u8, Duration::from_secs(60)).await;
        cache.set("c", &3u8, Duration::from_secs(60)).await;
        let a: Option<u8> = cache.get("a").await;
        let c: Option<u8> = cache.get("c").await;
        assert_eq!(a, None);
        assert_eq!(c, Some(3));
    }
}
