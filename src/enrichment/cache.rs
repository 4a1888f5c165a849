//! Short-TTL memoization of upstream fetches.
//!
//! Keys are built from the API name, method, and sorted request
//! parameters so logically identical requests share an entry. Entries
//! carry their TTL and are evicted lazily on lookup.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

/// Deterministic cache key: `api:method:k=v&k=v` with params sorted.
pub fn cache_key(api: &str, method: &str, params: &[(&str, String)]) -> String {
    let mut pairs: Vec<String> = params.iter().map(|(k, v)| format!("{k}={v}")).collect();
    pairs.sort();
    format!("{api}:{method}:{}", pairs.join("&"))
}

#[derive(Debug, Clone)]
struct CacheEntry<T> {
    data: T,
    stored_at: Instant,
    ttl: Duration,
}

impl<T> CacheEntry<T> {
    fn is_expired(&self) -> bool {
        self.stored_at.elapsed() > self.ttl
    }
}

/// Thread-safe in-memory cache with a fixed TTL per entry.
#[derive(Debug)]
pub struct ResponseCache<T> {
    entries: Mutex<HashMap<String, CacheEntry<T>>>,
    ttl: Duration,
}

impl<T: Clone> ResponseCache<T> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    /// Look up a key, evicting it first if it has expired.
    pub fn get(&self, key: &str) -> Option<T> {
        let mut entries = self.entries.lock();
        match entries.get(key) {
            Some(entry) if entry.is_expired() => {
                entries.remove(key);
                None
            }
            Some(entry) => Some(entry.data.clone()),
            None => None,
        }
    }

    /// Store a value under a key with the cache-wide TTL.
    pub fn put(&self, key: impl Into<String>, data: T) {
        let mut entries = self.entries.lock();
        entries.insert(
            key.into(),
            CacheEntry {
                data,
                stored_at: Instant::now(),
                ttl: self.ttl,
            },
        );
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Drop every entry; returns how many were removed.
    pub fn clear(&self) -> usize {
        let mut entries = self.entries.lock();
        let count = entries.len();
        entries.clear();
        tracing::info!(entries_cleared = count, "cache cleared");
        count
    }

    /// Drop only expired entries; returns how many were removed.
    pub fn cleanup_expired(&self) -> usize {
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired());
        let removed = before - entries.len();
        if removed > 0 {
            tracing::info!(entries_removed = removed, "expired cache entries cleaned up");
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_cache_key_sorts_params() {
        let key = cache_key(
            "openlibrary",
            "fetch_book",
            &[("format", "json".to_string()), ("isbn", "9780134685991".to_string())],
        );
        assert_eq!(key, "openlibrary:fetch_book:format=json&isbn=9780134685991");

        let reversed = cache_key(
            "openlibrary",
            "fetch_book",
            &[("isbn", "9780134685991".to_string()), ("format", "json".to_string())],
        );
        assert_eq!(key, reversed);
    }

    #[test]
    fn test_cache_key_no_params() {
        assert_eq!(cache_key("openlibrary", "health", &[]), "openlibrary:health:");
    }

    #[test]
    fn test_put_then_get() {
        let cache = ResponseCache::new(Duration::from_secs(60));
        cache.put("k", 42);
        assert_eq!(cache.get("k"), Some(42));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_get_missing_key() {
        let cache: ResponseCache<i32> = ResponseCache::new(Duration::from_secs(60));
        assert_eq!(cache.get("nope"), None);
    }

    #[test]
    fn test_expired_entry_is_evicted_on_get() {
        let cache = ResponseCache::new(Duration::from_millis(10));
        cache.put("k", 42);
        thread::sleep(Duration::from_millis(30));

        assert_eq!(cache.get("k"), None);
        // The lookup itself removed the stale entry.
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn test_put_overwrites_existing_entry() {
        let cache = ResponseCache::new(Duration::from_secs(60));
        cache.put("k", 1);
        cache.put("k", 2);
        assert_eq!(cache.get("k"), Some(2));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_clear_returns_count() {
        let cache = ResponseCache::new(Duration::from_secs(60));
        cache.put("a", 1);
        cache.put("b", 2);
        assert_eq!(cache.clear(), 2);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_cleanup_expired_removes_only_stale() {
        let cache = ResponseCache::new(Duration::from_millis(20));
        cache.put("old1", 1);
        cache.put("old2", 2);
        thread::sleep(Duration::from_millis(40));
        cache.put("fresh", 3);

        assert_eq!(cache.cleanup_expired(), 2);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("fresh"), Some(3));
    }
}
