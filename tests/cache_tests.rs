//! Response cache invariants at production sizes.

use forward_proxy::cache::{ResponseCache, ENTRY_OVERHEAD};

const MAX_CACHE_SIZE: usize = 200 * 1024 * 1024;
const MAX_ELEMENT_SIZE: usize = 10 * 1024 * 1024;
const MIB: usize = 1024 * 1024;

fn production_cache() -> ResponseCache {
    ResponseCache::new(MAX_CACHE_SIZE, MAX_ELEMENT_SIZE)
}

fn key(i: usize) -> Vec<u8> {
    format!("GET http://origin/{i} HTTP/1.0\r\nHost: origin\r\n\r\n").into_bytes()
}

#[test]
fn test_fill_to_budget_evicts_oldest_first() {
    let cache = production_cache();

    // 39 × 5 MiB ≈ 195 MiB, just under the budget
    for i in 0..39 {
        assert!(cache.insert(&key(i), vec![i as u8; 5 * MIB]));
    }
    assert_eq!(cache.len(), 39);
    assert!(cache.total_bytes() <= MAX_CACHE_SIZE);

    // one more pushes the first insert out
    assert!(cache.insert(&key(39), vec![39; 6 * MIB]));
    assert!(cache.total_bytes() <= MAX_CACHE_SIZE);
    assert_eq!(cache.find(&key(0)), None);
    assert!(cache.find(&key(1)).is_some());
    assert!(cache.find(&key(39)).is_some());
}

#[test]
fn test_element_size_cap() {
    let cache = production_cache();
    assert!(!cache.insert(b"too-big", vec![0u8; MAX_ELEMENT_SIZE + 1]));
    assert_eq!(cache.len(), 0);
    assert!(cache.insert(b"at-cap", vec![0u8; MAX_ELEMENT_SIZE]));
    assert_eq!(cache.len(), 1);
}

#[test]
fn test_hit_then_hit_is_non_destructive() {
    let cache = production_cache();
    assert!(cache.is_empty());
    let blob = b"HTTP/1.1 200 OK\r\n\r\nbody".to_vec();
    assert!(cache.insert(&key(1), blob.clone()));
    assert!(!cache.is_empty());
    assert_eq!(&cache.find(&key(1)).unwrap()[..], &blob[..]);
    assert_eq!(&cache.find(&key(1)).unwrap()[..], &blob[..]);
    assert_eq!(cache.len(), 1);
}

#[test]
fn test_lru_invariant_recent_access_survives() {
    // room for exactly three entries
    let entry_cost = 100 + key(0).len() + ENTRY_OVERHEAD;
    let cache = ResponseCache::new(3 * entry_cost, 1024);
    for i in 0..3 {
        assert!(cache.insert(&key(i), vec![i as u8; 100]));
    }

    // A = key(0) accessed more recently than B = key(1)
    assert!(cache.find(&key(0)).is_some());

    // the next insert evicts exactly one of them: B
    assert!(cache.insert(&key(3), vec![3; 100]));
    assert!(cache.find(&key(0)).is_some());
    assert_eq!(cache.find(&key(1)), None);
}

#[test]
fn test_single_entry_per_key() {
    let cache = production_cache();
    for round in 0..10 {
        assert!(cache.insert(&key(7), vec![round; 1024]));
        assert_eq!(cache.len(), 1);
    }
    assert_eq!(&cache.find(&key(7)).unwrap()[..], &[9u8; 1024][..]);
}

#[test]
fn test_accounting_matches_cost_formula() {
    let cache = production_cache();
    let k = key(1);
    cache.insert(&k, vec![0u8; 4096]);
    assert_eq!(cache.total_bytes(), 4096 + k.len() + ENTRY_OVERHEAD);
}
