//! Concurrent LRU response cache.
//!
//! # Data Flow
//! ```text
//! forwarder (cache miss path):
//!     staging buffer → insert(raw request, blob)
//!         → evict least-recent entries until the budget fits
//!         → entry owned by the cache
//!
//! forwarder (lookup path):
//!     find(raw request) → Arc'd blob, entry promoted to most-recent
//! ```
//!
//! # Design Decisions
//! - One mutex guards the map, the recency list, and the byte counter;
//!   every operation takes it for its full duration and never across I/O
//! - Keys and blobs are `Arc<[u8]>`: `find` pins the blob by refcount
//!   instead of copying it inside the lock
//! - Inserting an existing key replaces the old entry (last writer wins)

mod lru;

pub mod entry;

pub use entry::{CacheEntry, ENTRY_OVERHEAD};

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use lru::LruList;

use crate::observability::metrics;

/// Shared map from raw request bytes to cached response blobs, bounded
/// by a total byte budget with least-recently-used eviction.
pub struct ResponseCache {
    state: Mutex<CacheState>,
    max_cache_bytes: usize,
    max_entry_bytes: usize,
}

/// Map and recency list are one value so they can never disagree about
/// membership while the lock is held.
struct CacheState {
    slots: HashMap<Arc<[u8]>, usize>,
    recency: LruList<CacheEntry>,
    total_bytes: usize,
}

impl ResponseCache {
    pub fn new(max_cache_bytes: usize, max_entry_bytes: usize) -> Self {
        Self {
            state: Mutex::new(CacheState {
                slots: HashMap::new(),
                recency: LruList::new(),
                total_bytes: 0,
            }),
            max_cache_bytes,
            max_entry_bytes,
        }
    }

    /// Look up the cached response for `key`, promoting the entry to
    /// most-recent. The returned blob is pinned by refcount and stays
    /// valid after the lock is released.
    pub fn find(&self, key: &[u8]) -> Option<Arc<[u8]>> {
        let mut state = self.state.lock().expect("cache lock poisoned");
        let Some(slot) = state.slots.get(key).copied() else {
            metrics::record_cache_miss();
            return None;
        };
        state.recency.promote(slot);
        let entry = state.recency.get_mut(slot);
        entry.last_access = Instant::now();
        let blob = entry.blob.clone();
        metrics::record_cache_hit();
        Some(blob)
    }

    /// Insert a response under `key`, evicting least-recent entries
    /// until the budget fits. Returns `false` when the blob is not
    /// cacheable (empty, over the per-entry cap, or larger than the
    /// whole budget).
    pub fn insert(&self, key: &[u8], blob: Vec<u8>) -> bool {
        if blob.is_empty() || blob.len() > self.max_entry_bytes {
            return false;
        }
        let key: Arc<[u8]> = Arc::from(key);
        let blob: Arc<[u8]> = Arc::from(blob);
        let cost = blob.len() + key.len() + ENTRY_OVERHEAD;
        if cost > self.max_cache_bytes {
            return false;
        }

        let mut state = self.state.lock().expect("cache lock poisoned");

        if let Some(slot) = state.slots.remove(&key) {
            let old = state.recency.remove(slot);
            state.total_bytes -= old.cost();
        }

        while state.total_bytes + cost > self.max_cache_bytes {
            let evicted = match state.recency.pop_back() {
                Some(entry) => entry,
                None => break,
            };
            state.slots.remove(&evicted.key);
            state.total_bytes -= evicted.cost();
            metrics::record_cache_eviction();
            tracing::debug!(
                bytes = evicted.len(),
                idle_secs = evicted.last_access.elapsed().as_secs(),
                "Evicted least-recent entry"
            );
        }

        let slot = state.recency.push_front(CacheEntry::new(key.clone(), blob));
        state.slots.insert(key, slot);
        state.total_bytes += cost;
        metrics::record_cache_insert();
        metrics::record_cache_usage(state.total_bytes, state.slots.len());
        true
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.state.lock().expect("cache lock poisoned").slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Accounted bytes currently held, bookkeeping included.
    pub fn total_bytes(&self) -> usize {
        self.state.lock().expect("cache lock poisoned").total_bytes
    }

    /// Per-entry blob cap, used by the forwarder to stop tee-ing
    /// responses the cache would reject anyway.
    pub fn max_entry_bytes(&self) -> usize {
        self.max_entry_bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_cache() -> ResponseCache {
        // room for a handful of 100-byte blobs
        ResponseCache::new(1024, 512)
    }

    #[test]
    fn test_find_on_empty_cache() {
        let cache = small_cache();
        assert_eq!(cache.find(b"GET http://a/ HTTP/1.0\r\n\r\n"), None);
    }

    #[test]
    fn test_insert_then_find() {
        let cache = small_cache();
        assert!(cache.insert(b"k1", b"hello".to_vec()));
        let blob = cache.find(b"k1").expect("inserted entry");
        assert_eq!(&blob[..], b"hello");
        // finds are non-destructive
        let again = cache.find(b"k1").expect("still present");
        assert_eq!(&again[..], b"hello");
    }

    #[test]
    fn test_rejects_empty_and_oversized_blobs() {
        let cache = small_cache();
        assert!(!cache.insert(b"k1", Vec::new()));
        assert!(!cache.insert(b"k2", vec![0u8; 513]));
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn test_duplicate_key_replaces() {
        let cache = small_cache();
        assert!(cache.insert(b"k1", b"old".to_vec()));
        assert!(cache.insert(b"k1", b"new".to_vec()));
        assert_eq!(cache.len(), 1);
        assert_eq!(&cache.find(b"k1").unwrap()[..], b"new");
    }

    #[test]
    fn test_total_bytes_accounting() {
        let cache = small_cache();
        cache.insert(b"k1", vec![0u8; 100]);
        assert_eq!(cache.total_bytes(), 100 + 2 + ENTRY_OVERHEAD);
        cache.insert(b"k1", vec![0u8; 50]);
        assert_eq!(cache.total_bytes(), 50 + 2 + ENTRY_OVERHEAD);
    }

    #[test]
    fn test_eviction_respects_budget() {
        let cache = ResponseCache::new(3 * (100 + 2 + ENTRY_OVERHEAD), 512);
        for key in [b"k1", b"k2", b"k3"] {
            assert!(cache.insert(key, vec![0u8; 100]));
        }
        assert_eq!(cache.len(), 3);
        // a fourth entry pushes out the least-recent one
        assert!(cache.insert(b"k4", vec![0u8; 100]));
        assert_eq!(cache.len(), 3);
        assert!(cache.total_bytes() <= 3 * (100 + 2 + ENTRY_OVERHEAD));
        assert_eq!(cache.find(b"k1"), None);
        assert!(cache.find(b"k2").is_some());
    }

    #[test]
    fn test_find_protects_from_eviction() {
        let cache = ResponseCache::new(3 * (100 + 2 + ENTRY_OVERHEAD), 512);
        cache.insert(b"k1", vec![1u8; 100]);
        cache.insert(b"k2", vec![2u8; 100]);
        cache.insert(b"k3", vec![3u8; 100]);
        // touch k1 so k2 becomes the eviction candidate
        assert!(cache.find(b"k1").is_some());
        cache.insert(b"k4", vec![4u8; 100]);
        assert!(cache.find(b"k1").is_some());
        assert_eq!(cache.find(b"k2"), None);
    }

    #[test]
    fn test_concurrent_inserts_hold_invariants() {
        use std::sync::Arc;
        use std::thread;

        let budget = 64 * 1024;
        let cache = Arc::new(ResponseCache::new(budget, 4096));
        let mut handles = Vec::new();
        for t in 0..8 {
            let cache = Arc::clone(&cache);
            handles.push(thread::spawn(move || {
                for i in 0..200 {
                    let key = format!("GET http://h{t}/{i} HTTP/1.0\r\n\r\n");
                    cache.insert(key.as_bytes(), vec![t as u8; 512]);
                    cache.find(key.as_bytes());
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }
        assert!(cache.total_bytes() <= budget);
    }
}
