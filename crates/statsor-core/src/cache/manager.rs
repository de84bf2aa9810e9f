use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Duration, Utc};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

/// Default time-to-live for cached query results.
pub const DEFAULT_TTL_MINUTES: i64 = 5;

#[derive(Debug, Clone)]
pub struct CachedData<T> {
    pub data: T,
    pub cached_at: DateTime<Utc>,
}

impl<T> CachedData<T> {
    pub fn new(data: T) -> Self {
        Self {
            data,
            cached_at: Utc::now(),
        }
    }

    pub fn age(&self) -> Duration {
        Utc::now() - self.cached_at
    }

    pub fn is_fresh(&self, ttl: Duration) -> bool {
        self.age() < ttl
    }
}

/// In-process query cache keyed by `"<entityKind>_all"` or
/// `"<entityKind>_team:<scopeId>"`.
///
/// Entries expire `ttl` after they were stored and are evicted when a read
/// finds them expired. There is no size bound; writers clear the whole cache.
///
/// Every `clear` bumps a generation counter. A reader that captured the
/// generation before querying the store uses [`QueryCache::set_if_current`],
/// so rows loaded before a concurrent write never land after it.
pub struct QueryCache {
    entries: Mutex<HashMap<String, CachedData<Value>>>,
    generation: AtomicU64,
    ttl: Duration,
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new(Duration::minutes(DEFAULT_TTL_MINUTES))
    }
}

impl QueryCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            generation: AtomicU64::new(0),
            ttl,
        }
    }

    /// Build a cache key for an entity kind and optional scope id.
    ///
    /// Scope ids are prefixed so a team literally named `all` cannot share
    /// the unscoped key.
    pub fn key(kind: &str, scope: Option<&str>) -> String {
        match scope {
            Some(id) => format!("{}_team:{}", kind, id),
            None => format!("{}_all", kind),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, CachedData<Value>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Return the cached value for `key` if it is still fresh.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let mut entries = self.entries();
        let cached = entries.get(key)?;

        if !cached.is_fresh(self.ttl) {
            debug!(key, "Cache entry expired");
            entries.remove(key);
            return None;
        }

        match serde_json::from_value(cached.data.clone()) {
            Ok(value) => {
                debug!(key, "Cache hit");
                Some(value)
            }
            Err(e) => {
                warn!(key, error = %e, "Dropping unreadable cache entry");
                entries.remove(key);
                None
            }
        }
    }

    /// Store `value` under `key`, replacing any previous entry.
    pub fn set<T: Serialize>(&self, key: &str, value: &T) {
        match serde_json::to_value(value) {
            Ok(data) => {
                self.entries().insert(key.to_string(), CachedData::new(data));
            }
            Err(e) => warn!(key, error = %e, "Failed to cache value"),
        }
    }

    /// Number of times the cache has been cleared.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Store `value` only if no `clear` happened since `generation` was read.
    ///
    /// Returns whether the value was stored.
    pub fn set_if_current<T: Serialize>(&self, key: &str, value: &T, generation: u64) -> bool {
        let data = match serde_json::to_value(value) {
            Ok(data) => data,
            Err(e) => {
                warn!(key, error = %e, "Failed to cache value");
                return false;
            }
        };

        // Checked under the entries lock; `clear` bumps the counter under it too.
        let mut entries = self.entries();
        if self.generation.load(Ordering::SeqCst) != generation {
            debug!(key, "Skipping cache store, cleared while loading");
            return false;
        }
        entries.insert(key.to_string(), CachedData::new(data));
        true
    }

    pub fn clear(&self) {
        let mut entries = self.entries();
        self.generation.fetch_add(1, Ordering::SeqCst);
        if !entries.is_empty() {
            debug!(entries = entries.len(), "Clearing query cache");
        }
        entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    #[cfg(test)]
    fn backdate(&self, key: &str, by: Duration) {
        if let Some(entry) = self.entries().get_mut(key) {
            entry.cached_at = entry.cached_at - by;
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cached_data_is_fresh() {
        let fresh = CachedData::new(vec![1]);
        assert!(fresh.is_fresh(Duration::minutes(5)));

        let mut old = CachedData::new(vec![1]);
        old.cached_at = Utc::now() - Duration::minutes(6);
        assert!(!old.is_fresh(Duration::minutes(5)));
    }

    #[test]
    fn test_key_format() {
        assert_eq!(QueryCache::key("players", None), "players_all");
        assert_eq!(
            QueryCache::key("players", Some("team-1")),
            "players_team:team-1"
        );
    }

    #[test]
    fn test_scope_named_all_has_its_own_key() {
        assert_ne!(
            QueryCache::key("players", Some("all")),
            QueryCache::key("players", None)
        );
    }

    #[test]
    fn test_set_after_clear_with_old_generation_is_skipped() {
        let cache = QueryCache::default();
        let before = cache.generation();

        cache.clear();
        assert!(!cache.set_if_current("players_all", &vec![1], before));
        assert!(cache.is_empty());

        assert!(cache.set_if_current("players_all", &vec![2], cache.generation()));
        assert_eq!(cache.get::<Vec<i32>>("players_all"), Some(vec![2]));
    }

    #[test]
    fn test_get_set_round_trip() {
        let cache = QueryCache::default();
        assert_eq!(cache.get::<Vec<String>>("teams_all"), None);

        cache.set("teams_all", &vec!["Rovers".to_string()]);
        assert_eq!(
            cache.get::<Vec<String>>("teams_all"),
            Some(vec!["Rovers".to_string()])
        );

        cache.set("teams_all", &vec!["United".to_string()]);
        assert_eq!(
            cache.get::<Vec<String>>("teams_all"),
            Some(vec!["United".to_string()])
        );
    }

    #[test]
    fn test_expired_entry_is_evicted_on_read() {
        let cache = QueryCache::new(Duration::minutes(5));
        cache.set("players_all", &vec![1, 2, 3]);
        cache.backdate("players_all", Duration::minutes(5));

        assert_eq!(cache.get::<Vec<i32>>("players_all"), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_zero_ttl_never_hits() {
        let cache = QueryCache::new(Duration::zero());
        cache.set("players_all", &vec![1]);
        assert_eq!(cache.get::<Vec<i32>>("players_all"), None);
    }

    #[test]
    fn test_clear_drops_everything() {
        let cache = QueryCache::default();
        cache.set("players_all", &vec![1]);
        cache.set("matches_team-1", &vec![2]);
        assert_eq!(cache.len(), 2);

        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.get::<Vec<i32>>("players_all"), None);
    }

    #[test]
    fn test_type_mismatch_is_a_miss() {
        let cache = QueryCache::default();
        cache.set("players_all", &"not a list");
        assert_eq!(cache.get::<Vec<i32>>("players_all"), None);
        assert!(cache.is_empty());
    }
}
