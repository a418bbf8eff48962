//! Short-lived in-process result cache.
//!
//! Entries expire `ttl` after they were stored. Expired entries are dropped
//! when read and swept whenever a new entry is inserted.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use super::SearchHit;

struct Entry {
    stored_at: Instant,
    hits: Arc<Vec<SearchHit>>,
}

/// TTL cache of search results keyed by normalized query and filters.
pub struct SearchCache {
    ttl: Duration,
    entries: Mutex<HashMap<String, Entry>>,
}

impl SearchCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Fresh results for `key`, if any.
    pub fn get(&self, key: &str) -> Option<Arc<Vec<SearchHit>>> {
        self.get_at(key, Instant::now())
    }

    fn get_at(&self, key: &str, now: Instant) -> Option<Arc<Vec<SearchHit>>> {
        let mut entries = self.entries.lock();
        match entries.get(key) {
            Some(entry) if now.duration_since(entry.stored_at) < self.ttl => Some(entry.hits.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    pub fn insert(&self, key: String, hits: Arc<Vec<SearchHit>>) {
        self.insert_at(key, hits, Instant::now());
    }

    fn insert_at(&self, key: String, hits: Arc<Vec<SearchHit>>, now: Instant) {
        let mut entries = self.entries.lock();
        entries.retain(|_, e| now.duration_since(e.stored_at) < self.ttl);
        entries.insert(key, Entry { stored_at: now, hits });
    }

    /// Drop every entry.
    pub fn invalidate(&self) {
        self.entries.lock().clear();
    }

    /// Number of stored entries, fresh or not yet swept.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }
}

impl std::fmt::Debug for SearchCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchCache")
            .field("ttl", &self.ttl)
            .field("entries", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hits(title: &str) -> Arc<Vec<SearchHit>> {
        Arc::new(vec![SearchHit {
            id: 1,
            title: title.to_string(),
            artist_name: "Band".to_string(),
            album_title: None,
            duration_sec: None,
            genres: vec![],
            album_art: None,
            popularity: None,
            score: None,
        }])
    }

    #[test]
    fn test_fresh_entry_is_returned() {
        let cache = SearchCache::new(Duration::from_secs(60));
        cache.insert("q".to_string(), hits("One"));

        let found = cache.get("q").unwrap();
        assert_eq!(found[0].title, "One");
        assert!(cache.get("other").is_none());
    }

    #[test]
    fn test_expired_entry_is_dropped_on_read() {
        let cache = SearchCache::new(Duration::from_secs(60));
        let start = Instant::now();
        cache.insert_at("q".to_string(), hits("One"), start);

        assert!(cache.get_at("q", start + Duration::from_secs(59)).is_some());
        assert!(cache.get_at("q", start + Duration::from_secs(60)).is_none());
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn test_insert_sweeps_expired_entries() {
        let cache = SearchCache::new(Duration::from_secs(60));
        let start = Instant::now();
        cache.insert_at("old".to_string(), hits("Old"), start);
        cache.insert_at("new".to_string(), hits("New"), start + Duration::from_secs(90));

        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_invalidate_clears_everything() {
        let cache = SearchCache::new(Duration::from_secs(60));
        cache.insert("a".to_string(), hits("A"));
        cache.insert("b".to_string(), hits("B"));

        cache.invalidate();
        assert_eq!(cache.len(), 0);
    }
}
