//! Timestamped cache values.
//!
//! Readers take a clone of the current value under a short read lock; a
//! refresh runs its query with no lock held and then swaps the value in.
//! Two callers that both see an expired entry will both refresh, which is
//! harmless since a refresh only ever replaces the value wholesale.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use chrono::{DateTime, Utc};

/// A value stamped with the time it was fetched.
#[derive(Debug, Clone)]
pub struct Cached<T> {
    pub value: T,
    pub refreshed_at: DateTime<Utc>,
}

impl<T> Cached<T> {
    pub fn new(value: T, refreshed_at: DateTime<Utc>) -> Self {
        Self { value, refreshed_at }
    }

    /// Younger than `ttl` at `now`. A stamp in the future counts as fresh.
    pub fn is_fresh(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        match now.signed_duration_since(self.refreshed_at).to_std() {
            Ok(age) => age < ttl,
            Err(_) => true,
        }
    }
}

/// A single shared cache value.
#[derive(Debug)]
pub struct CacheSlot<T> {
    inner: RwLock<Option<Cached<T>>>,
}

impl<T: Clone> CacheSlot<T> {
    pub fn new() -> Self {
        Self { inner: RwLock::new(None) }
    }

    /// The cached value if it is still within `ttl`.
    pub fn fresh(&self, now: DateTime<Utc>, ttl: Duration) -> Option<T> {
        let guard = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        guard
            .as_ref()
            .filter(|c| c.is_fresh(now, ttl))
            .map(|c| c.value.clone())
    }

    /// The cached value regardless of age.
    pub fn latest(&self) -> Option<T> {
        let guard = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        guard.as_ref().map(|c| c.value.clone())
    }

    pub fn store(&self, value: T, now: DateTime<Utc>) {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        *guard = Some(Cached::new(value, now));
    }
}

impl<T: Clone> Default for CacheSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// One cache value per key.
#[derive(Debug)]
pub struct KeyedCache<K, V> {
    inner: RwLock<HashMap<K, Cached<V>>>,
}

impl<K: Eq + Hash, V: Clone> KeyedCache<K, V> {
    pub fn new() -> Self {
        Self { inner: RwLock::new(HashMap::new()) }
    }

    pub fn fresh(&self, key: &K, now: DateTime<Utc>, ttl: Duration) -> Option<V> {
        let guard = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        guard
            .get(key)
            .filter(|c| c.is_fresh(now, ttl))
            .map(|c| c.value.clone())
    }

    pub fn store(&self, key: K, value: V, now: DateTime<Utc>) {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        guard.insert(key, Cached::new(value, now));
    }
}

impl<K: Eq + Hash, V: Clone> Default for KeyedCache<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn freshness_is_strictly_below_ttl() {
        let c = Cached::new(1, at(0));
        let ttl = Duration::from_secs(60);
        assert!(c.is_fresh(at(59), ttl));
        assert!(!c.is_fresh(at(60), ttl));
        assert!(c.is_fresh(at(-5), ttl));
    }

    #[test]
    fn slot_keeps_latest_after_expiry() {
        let slot = CacheSlot::new();
        assert!(slot.latest().is_none());
        slot.store("v1", at(0));
        assert_eq!(slot.fresh(at(10), Duration::from_secs(60)), Some("v1"));
        assert_eq!(slot.fresh(at(120), Duration::from_secs(60)), None);
        assert_eq!(slot.latest(), Some("v1"));
    }

    #[test]
    fn keyed_cache_isolates_keys() {
        let cache = KeyedCache::new();
        cache.store("reg-f", "2025-01", at(0));
        assert_eq!(cache.fresh(&"reg-f", at(1), Duration::from_secs(60)), Some("2025-01"));
        assert_eq!(cache.fresh(&"reg-g", at(1), Duration::from_secs(60)), None);
    }
}
