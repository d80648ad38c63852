//! In-memory setting cache
//!
//! Maps keys, as the caller wrote them including any routing prefix, to
//! the last value saved or read by this manager. Each entry keeps both
//! the encoded text and the decoded value, so a read for a different type
//! than the one cached can be served without touching the store.
//!
//! Eviction is explicit: [`CacheCapacity::Unbounded`] never evicts,
//! [`CacheCapacity::Bounded`] drops the oldest inserted key once full.
//! The lock is held for the map access only.

use std::any::Any;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use parking_lot::Mutex;

/// Decoded value shared between the cache and callers
pub type CachedValue = Arc<dyn Any + Send + Sync>;

/// Eviction policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CacheCapacity {
    /// Entries live as long as the cache
    #[default]
    Unbounded,
    /// At most this many entries, oldest inserted evicted first
    Bounded(usize),
}

/// One cached setting
#[derive(Clone)]
pub struct CachedSetting {
    encoded: String,
    value: Option<CachedValue>,
}

impl CachedSetting {
    pub fn new(encoded: String, value: Option<CachedValue>) -> Self {
        Self { encoded, value }
    }

    /// Encoded form as persisted
    pub fn encoded(&self) -> &str {
        &self.encoded
    }

    /// Whether this entry records a nil value
    pub fn is_blank(&self) -> bool {
        self.encoded.trim().is_empty()
    }

    /// The decoded value, if it was cached as `T`
    pub fn value_as<T: Clone + 'static>(&self) -> Option<T> {
        self.value
            .as_ref()
            .and_then(|value| value.downcast_ref::<T>())
            .cloned()
    }
}

#[derive(Default)]
struct CacheInner {
    entries: HashMap<String, CachedSetting>,
    order: VecDeque<String>,
}

/// Thread-safe setting cache owned by one manager
pub struct SettingCache {
    capacity: CacheCapacity,
    inner: Mutex<CacheInner>,
}

impl Default for SettingCache {
    fn default() -> Self {
        Self::new(CacheCapacity::default())
    }
}

impl SettingCache {
    pub fn new(capacity: CacheCapacity) -> Self {
        Self {
            capacity,
            inner: Mutex::new(CacheInner::default()),
        }
    }

    pub fn capacity(&self) -> CacheCapacity {
        self.capacity
    }

    /// Look up a key
    pub fn get(&self, key: &str) -> Option<CachedSetting> {
        self.inner.lock().entries.get(key).cloned()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.inner.lock().entries.contains_key(key)
    }

    /// Insert or overwrite an entry
    pub fn insert(&self, key: &str, setting: CachedSetting) {
        let mut inner = self.inner.lock();
        if let Some(existing) = inner.entries.get_mut(key) {
            *existing = setting;
            return;
        }
        self.insert_new(&mut inner, key, setting);
    }

    /// Insert only if the key is not cached yet
    ///
    /// Returns `true` if the entry was inserted.
    pub fn insert_if_absent(&self, key: &str, setting: CachedSetting) -> bool {
        let mut inner = self.inner.lock();
        if inner.entries.contains_key(key) {
            return false;
        }
        self.insert_new(&mut inner, key, setting)
    }

    fn insert_new(&self, inner: &mut CacheInner, key: &str, setting: CachedSetting) -> bool {
        if let CacheCapacity::Bounded(max) = self.capacity {
            if max == 0 {
                return false;
            }
            while inner.entries.len() >= max {
                match inner.order.pop_front() {
                    Some(oldest) => {
                        inner.entries.remove(&oldest);
                    }
                    None => break,
                }
            }
        }
        inner.entries.insert(key.to_string(), setting);
        inner.order.push_back(key.to_string());
        true
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every entry
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.entries.clear();
        inner.order.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setting(encoded: &str, value: u32) -> CachedSetting {
        CachedSetting::new(encoded.to_string(), Some(Arc::new(value)))
    }

    #[test]
    fn test_insert_and_get() {
        let cache = SettingCache::default();
        assert!(cache.is_empty());

        cache.insert("@luVolume", setting("7", 7));

        let hit = cache.get("@luVolume").unwrap();
        assert_eq!(hit.encoded(), "7");
        assert_eq!(hit.value_as::<u32>(), Some(7));
        assert!(cache.get("Volume").is_none());
    }

    #[test]
    fn test_value_as_other_type() {
        let cache = SettingCache::default();
        cache.insert("count", setting("3", 3));

        let hit = cache.get("count").unwrap();
        assert_eq!(hit.value_as::<u64>(), None);
        assert_eq!(hit.encoded(), "3");
    }

    #[test]
    fn test_insert_overwrites() {
        let cache = SettingCache::default();
        cache.insert("count", setting("1", 1));
        cache.insert("count", setting("2", 2));

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("count").unwrap().value_as::<u32>(), Some(2));
    }

    #[test]
    fn test_insert_if_absent_keeps_first() {
        let cache = SettingCache::default();
        assert!(cache.insert_if_absent("count", setting("1", 1)));
        assert!(!cache.insert_if_absent("count", setting("2", 2)));

        assert_eq!(cache.get("count").unwrap().value_as::<u32>(), Some(1));
    }

    #[test]
    fn test_blank_entry() {
        let entry = CachedSetting::new(String::new(), None);
        assert!(entry.is_blank());
        assert_eq!(entry.value_as::<String>(), None);
    }

    #[test]
    fn test_bounded_evicts_oldest() {
        let cache = SettingCache::new(CacheCapacity::Bounded(2));
        cache.insert("a", setting("1", 1));
        cache.insert("b", setting("2", 2));
        // Overwrite does not change insertion order
        cache.insert("a", setting("10", 10));
        cache.insert("c", setting("3", 3));

        assert_eq!(cache.len(), 2);
        assert!(!cache.contains("a"));
        assert!(cache.contains("b"));
        assert!(cache.contains("c"));
    }

    #[test]
    fn test_bounded_zero_caches_nothing() {
        let cache = SettingCache::new(CacheCapacity::Bounded(0));
        cache.insert("a", setting("1", 1));
        assert!(!cache.insert_if_absent("b", setting("2", 2)));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_clear() {
        let cache = SettingCache::default();
        cache.insert("a", setting("1", 1));
        cache.insert("b", setting("2", 2));
        cache.clear();

        assert!(cache.is_empty());
        assert_eq!(cache.capacity(), CacheCapacity::Unbounded);
    }
}
