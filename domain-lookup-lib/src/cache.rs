//! Short-lived in-memory cache of resolution results.
//!
//! Entries are keyed by the normalized query, the query type and the
//! requested source, and are served only while younger than the TTL.
//! Expired entries read as absent and are dropped on the next write.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::types::{QueryType, RequestedSource, ResolveResult};

/// Cache key for one resolution.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub query: String,
    pub query_type: QueryType,
    pub source: RequestedSource,
}

impl CacheKey {
    pub fn new<Q: Into<String>>(query: Q, query_type: QueryType, source: RequestedSource) -> Self {
        Self {
            query: query.into(),
            query_type,
            source,
        }
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    value: ResolveResult,
    inserted_at: Instant,
}

/// Thread-safe TTL cache for [`ResolveResult`]s.
#[derive(Debug)]
pub struct ResultCache {
    entries: RwLock<HashMap<CacheKey, CacheEntry>>,
    ttl: Duration,
}

impl ResultCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Unexpired entry for `key`, if any.
    pub fn get(&self, key: &CacheKey) -> Option<ResolveResult> {
        self.get_at(key, Instant::now())
    }

    /// Same as [`get`](Self::get) with the clock supplied by the caller.
    pub fn get_at(&self, key: &CacheKey, now: Instant) -> Option<ResolveResult> {
        let entries = self.read_entries();
        let entry = entries.get(key)?;
        let age = now.saturating_duration_since(entry.inserted_at);

        if age < self.ttl {
            debug!(query = %key.query, source = %key.source, "Result cache hit");
            Some(entry.value.clone())
        } else {
            debug!(query = %key.query, age_secs = age.as_secs(), "Result cache entry expired");
            None
        }
    }

    /// Store a result, replacing any previous entry for the key.
    pub fn insert(&self, key: CacheKey, value: ResolveResult) {
        let now = Instant::now();
        let mut entries = self.write_entries();
        let ttl = self.ttl;
        entries.retain(|_, e| now.saturating_duration_since(e.inserted_at) < ttl);
        entries.insert(
            key,
            CacheEntry {
                value,
                inserted_at: now,
            },
        );
    }

    /// Number of stored entries, expired ones included until the next write.
    pub fn len(&self) -> usize {
        self.read_entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read_entries(&self) -> RwLockReadGuard<'_, HashMap<CacheKey, CacheEntry>> {
        match self.entries.read() {
            Ok(guard) => guard,
            Err(poisoned) => {
                warn!("Result cache read lock poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }

    fn write_entries(&self) -> RwLockWriteGuard<'_, HashMap<CacheKey, CacheEntry>> {
        match self.entries.write() {
            Ok(guard) => guard,
            Err(poisoned) => {
                warn!("Result cache write lock poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DataSource, NormalizedRecord};

    fn result(raw: &str) -> ResolveResult {
        let record = NormalizedRecord::empty(raw.to_string(), DataSource::Whois);
        ResolveResult::from_record(record, None, None)
    }

    fn key(query: &str, source: RequestedSource) -> CacheKey {
        CacheKey::new(query, QueryType::Domain, source)
    }

    #[test]
    fn test_insert_and_get() {
        let cache = ResultCache::new(Duration::from_secs(60));
        cache.insert(key("example.com", RequestedSource::Auto), result("a"));

        let hit = cache.get(&key("example.com", RequestedSource::Auto)).unwrap();
        assert_eq!(hit.raw, "a");
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_source_is_part_of_key() {
        let cache = ResultCache::new(Duration::from_secs(60));
        cache.insert(key("example.com", RequestedSource::Auto), result("a"));

        assert!(cache.get(&key("example.com", RequestedSource::Whois)).is_none());
        assert!(cache.get(&key("example.org", RequestedSource::Auto)).is_none());
    }

    #[test]
    fn test_expired_entry_reads_as_absent() {
        let cache = ResultCache::new(Duration::from_secs(300));
        let k = key("example.com", RequestedSource::Auto);
        cache.insert(k.clone(), result("a"));

        let later = Instant::now() + Duration::from_secs(301);
        assert!(cache.get_at(&k, later).is_none());
        assert!(cache.get_at(&k, Instant::now()).is_some());
    }

    #[test]
    fn test_zero_ttl_never_serves() {
        let cache = ResultCache::new(Duration::ZERO);
        let k = key("example.com", RequestedSource::Auto);
        cache.insert(k.clone(), result("a"));
        assert!(cache.get(&k).is_none());
    }

    #[test]
    fn test_insert_overwrites_and_purges() {
        let cache = ResultCache::new(Duration::from_secs(60));
        let k = key("example.com", RequestedSource::Auto);
        cache.insert(k.clone(), result("old"));
        cache.insert(k.clone(), result("new"));

        assert_eq!(cache.get(&k).unwrap().raw, "new");
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_poisoned_lock_is_recovered() {
        let cache = std::sync::Arc::new(ResultCache::new(Duration::from_secs(60)));
        cache.insert(key("example.com", RequestedSource::Auto), result("a"));

        let poisoner = std::sync::Arc::clone(&cache);
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.entries.write().unwrap();
            panic!("poison the cache lock");
        })
        .join();
        assert!(cache.entries.is_poisoned());

        assert_eq!(cache.len(), 1);
        assert!(!cache.is_empty());
        cache.insert(key("example.org", RequestedSource::Auto), result("b"));
        assert_eq!(cache.len(), 2);
        assert_eq!(
            cache.get(&key("example.com", RequestedSource::Auto)).unwrap().raw,
            "a"
        );
    }
}
