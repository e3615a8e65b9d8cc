// FICHIER : src-server/src/json_db/storage/cache.rs

//! Cache LRU (Least Recently Used) thread-safe des documents lus.

use lru::LruCache;
use std::hash::Hash;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Debug, Default)]
struct CacheCounters {
    hits: AtomicU64,
    misses: AtomicU64,
}

/// Statistiques cumulées depuis la création du cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub len: usize,
}

#[derive(Debug, Clone)]
pub struct Cache<K: Hash + Eq, V> {
    // LruCache mute sa liste interne à chaque `get` (promotion MRU)
    store: Arc<Mutex<LruCache<K, V>>>,
    counters: Arc<CacheCounters>,
}

impl<K, V> Cache<K, V>
where
    K: Hash + Eq + Clone,
    V: Clone,
{
    pub fn new(capacity: usize) -> Self {
        let cap = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            store: Arc::new(Mutex::new(LruCache::new(cap))),
            counters: Arc::new(CacheCounters::default()),
        }
    }

    pub fn get(&self, key: &K) -> Option<V> {
        let found = self
            .store
            .lock()
            .ok()
            .and_then(|mut guard| guard.get(key).cloned());

        let counter = if found.is_some() {
            &self.counters.hits
        } else {
            &self.counters.misses
        };
        counter.fetch_add(1, Ordering::Relaxed);
        found
    }

    pub fn put(&self, key: K, value: V) {
        if let Ok(mut guard) = self.store.lock() {
            // L'insertion gère l'éviction si la capacité est dépassée
            guard.put(key, value);
        }
    }

    pub fn remove(&self, key: &K) {
        if let Ok(mut guard) = self.store.lock() {
            guard.pop(key);
        }
    }

    pub fn len(&self) -> usize {
        self.store.lock().map(|g| g.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.counters.hits.load(Ordering::Relaxed),
            misses: self.counters.misses.load(Ordering::Relaxed),
            len: self.len(),
        }
    }
}
