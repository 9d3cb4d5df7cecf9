//! Provides a single-flight memoizing cache for async lookups.
//!
//! The first `get` for a key installs a shared cell under the map lock
//! before anything awaits; every later caller joins that cell. The loader
//! therefore runs at most once per key, and whatever it returns, failures
//! included, is what every caller sees for the life of the cache.
//!
//! # Examples
//! ```
//! use glimpse_items::cache::MemoCache;
//!
//! # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
//! let cache: MemoCache<&str, usize> = MemoCache::new();
//! assert_eq!(cache.get("one", || async { 1 }).await, 1);
//! assert_eq!(cache.get("one", || async { 2 }).await, 1);
//! # });
//! ```

use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::OnceCell;

/// Maps each key to one shared, lazily computed value.
pub struct MemoCache<K, V> {
    entries: Mutex<HashMap<K, Arc<OnceCell<V>>>>,
}

impl<K, V> Default for MemoCache<K, V> {
    fn default() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }
}

impl<K, V> MemoCache<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the value for `key`, running `loader` only if no caller has
    /// done so before.
    pub async fn get<F, Fut>(&self, key: K, loader: F) -> V
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = V>,
    {
        let cell = {
            let mut entries = self.entries.lock();
            Arc::clone(entries.entry(key).or_default())
        };
        cell.get_or_init(loader).await.clone()
    }

    /// Number of keys that have been requested.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}
