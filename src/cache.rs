use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Process-lifetime memo table.
///
/// Entries never expire; the lock is never held across an `.await`.
pub struct MemoCache<K, V> {
    store: Mutex<HashMap<K, V>>,
}

impl<K, V> Default for MemoCache<K, V> {
    fn default() -> Self {
        Self {
            store: Mutex::new(HashMap::new()),
        }
    }
}

impl<K, V> MemoCache<K, V>
where
    K: Eq + Hash + Debug,
    V: Clone,
{
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<K, V>> {
        // A panic while holding the lock cannot leave a half-written entry
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns a clone of the memoized value, if any.
    #[tracing::instrument(name = "query_cache", level = "debug", skip(self))]
    pub fn get(&self, key: &K) -> Option<V> {
        let hit = self.lock().get(key).cloned();
        if hit.is_some() {
            tracing::debug!("Key found");
        } else {
            tracing::debug!("Key not found");
        }
        hit
    }

    #[tracing::instrument(name = "put_cache", level = "debug", skip(self, value))]
    pub fn put(&self, key: K, value: V) {
        self.lock().insert(key, value);
    }

    /// Manually removes a key from the cache.
    pub fn remove(&self, key: &K) -> Option<V> {
        self.lock().remove(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_get_remove() {
        let cache: MemoCache<String, Vec<u32>> = MemoCache::new();
        assert!(cache.get(&"a".to_string()).is_none());

        cache.put("a".to_string(), vec![1, 2]);
        assert_eq!(cache.get(&"a".to_string()), Some(vec![1, 2]));
        assert_eq!(cache.len(), 1);

        assert_eq!(cache.remove(&"a".to_string()), Some(vec![1, 2]));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_put_overwrites() {
        let cache: MemoCache<u8, &str> = MemoCache::new();
        cache.put(1, "old");
        cache.put(1, "new");
        assert_eq!(cache.get(&1), Some("new"));
        cache.clear();
        assert!(cache.get(&1).is_none());
    }
}
