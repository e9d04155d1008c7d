// Copyright 2026 fedcache Project Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::{fmt::Debug, future::Future, num::NonZeroUsize, sync::Arc};

use fedcache_common::{code::Value, error::Result, metrics::Metrics};
use hashbrown::HashMap;
use lru::LruCache;
use parking_lot::Mutex;

/// Loads running for one key.
#[derive(Debug, Default)]
struct Pending {
    loads: usize,
    /// Bumped by every write of the key while loads run.
    writes: u64,
}

struct State<T> {
    lru: LruCache<String, Vec<T>>,
    pending: HashMap<String, Pending>,
}

impl<T> State<T> {
    fn written(&mut self, key: &str) {
        if let Some(pending) = self.pending.get_mut(key) {
            pending.writes += 1;
        }
    }
}

/// Ends a load of one key, whether it returned, failed or was dropped.
struct PendingGuard<'a, T> {
    inner: &'a Inner<T>,
    key: &'a str,
}

impl<T> Drop for PendingGuard<'_, T> {
    fn drop(&mut self) {
        let mut state = self.inner.state.lock();
        if let Some(pending) = state.pending.get_mut(self.key) {
            pending.loads -= 1;
            if pending.loads == 0 {
                state.pending.remove(self.key);
            }
        }
    }
}

struct Inner<T> {
    name: String,
    state: Mutex<State<T>>,
    metrics: Metrics,
}

/// A bounded LRU cache of ordered lists, typically the IDs of the rows related to one entity.
///
/// Lists are cloned on every read and write, a caller never holds the cached list itself.
pub struct SliceCache<T>
where
    T: Value,
{
    inner: Arc<Inner<T>>,
}

impl<T> Clone for SliceCache<T>
where
    T: Value,
{
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T> Debug for SliceCache<T>
where
    T: Value,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SliceCache")
            .field("name", &self.inner.name)
            .field("len", &self.len())
            .field("cap", &self.cap())
            .finish()
    }
}

impl<T> SliceCache<T>
where
    T: Value,
{
    /// Create a slice cache holding at most `capacity` lists. A zero capacity holds one list.
    pub fn new(name: impl Into<String>, capacity: usize) -> Self {
        let name = name.into();
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        let metrics = Metrics::new(&name);
        Self {
            inner: Arc::new(Inner {
                name,
                state: Mutex::new(State {
                    lru: LruCache::new(capacity),
                    pending: HashMap::new(),
                }),
                metrics,
            }),
        }
    }

    /// Get the cache name.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Get a copy of the list under `key`.
    pub fn get(&self, key: &str) -> Option<Vec<T>> {
        let res = self.inner.state.lock().lru.get(key).cloned();
        match res {
            Some(_) => self.inner.metrics.memory_hit.increment(1),
            None => self.inner.metrics.memory_miss.increment(1),
        }
        res
    }

    /// Get the list under `key`, calling `loader` on a miss.
    ///
    /// Loader errors are returned and never cached. The loaded list is not stored if the key is written while the
    /// loader runs.
    pub async fn load<F, FU>(&self, key: &str, loader: F) -> Result<Vec<T>>
    where
        F: FnOnce() -> FU,
        FU: Future<Output = Result<Vec<T>>>,
    {
        let writes = {
            let mut state = self.inner.state.lock();
            if let Some(list) = state.lru.get(key) {
                let list = list.clone();
                drop(state);
                self.inner.metrics.memory_hit.increment(1);
                return Ok(list);
            }
            let pending = state.pending.entry_ref(key).or_default();
            pending.loads += 1;
            pending.writes
        };
        let guard = PendingGuard {
            inner: &self.inner,
            key,
        };
        self.inner.metrics.memory_miss.increment(1);
        self.inner.metrics.memory_load.increment(1);

        let list = loader()
            .await
            .inspect_err(|_| self.inner.metrics.memory_load_error.increment(1))?;

        let mut state = self.inner.state.lock();
        if state.pending.get(key).is_some_and(|pending| pending.writes == writes) {
            state.lru.put(key.to_string(), list.clone());
            self.inner.metrics.memory_insert.increment(1);
            self.inner.metrics.memory_usage.set(state.lru.len() as f64);
        } else {
            tracing::trace!(cache = %self.inner.name, key, "[slice]: key written during load, result not stored");
        }
        drop(state);
        drop(guard);

        Ok(list)
    }

    /// Store a copy of `list` under `key`.
    pub fn put(&self, key: impl Into<String>, list: &[T]) {
        let key = key.into();
        let mut state = self.inner.state.lock();
        state.written(&key);
        // `push` also returns the replaced list of the same key, that is not an eviction.
        if let Some((old, _)) = state.lru.push(key.clone(), list.to_vec()) {
            if old != key {
                self.inner.metrics.memory_evict.increment(1);
            }
        }
        self.inner.metrics.memory_insert.increment(1);
        self.inner.metrics.memory_usage.set(state.lru.len() as f64);
    }

    /// Remove the lists under `keys`.
    pub fn invalidate<S>(&self, keys: impl IntoIterator<Item = S>)
    where
        S: AsRef<str>,
    {
        let mut removed = 0;
        {
            let mut state = self.inner.state.lock();
            for key in keys {
                let key = key.as_ref();
                if state.lru.pop(key).is_some() {
                    removed += 1;
                }
                state.written(key);
            }
            self.inner.metrics.memory_usage.set(state.lru.len() as f64);
        }
        self.inner.metrics.memory_invalidate.increment(removed);
    }

    /// Evict least recently used lists until at most `percent` of the capacity is used.
    pub fn trim(&self, percent: f64) {
        let mut garbages = vec![];
        {
            let mut state = self.inner.state.lock();
            let target = (state.lru.cap().get() as f64 * percent.clamp(0.0, 1.0)) as usize;
            while state.lru.len() > target {
                match state.lru.pop_lru() {
                    Some(entry) => garbages.push(entry),
                    None => break,
                }
            }
            self.inner.metrics.memory_usage.set(state.lru.len() as f64);
        }
        self.inner.metrics.memory_evict.increment(garbages.len() as u64);
    }

    /// Remove all lists.
    pub fn clear(&self) {
        let mut state = self.inner.state.lock();
        state.lru.clear();
        for pending in state.pending.values_mut() {
            pending.writes += 1;
        }
        self.inner.metrics.memory_usage.set(0.0);
    }

    /// Resident list count.
    pub fn len(&self) -> usize {
        self.inner.state.lock().lru.len()
    }

    /// Whether the cache holds no list.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum resident list count.
    pub fn cap(&self) -> usize {
        self.inner.state.lock().lru.cap().get()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use fedcache_common::error::{Error, ErrorKind};

    use super::*;

    fn ids(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|id| id.to_string()).collect()
    }

    #[test_log::test]
    fn test_clone_on_read() {
        let cache = SliceCache::<String>::new("follow_ids", 8);
        cache.put(">01ID", &ids(&["02ID", "03ID"]));

        let mut got = cache.get(">01ID").unwrap();
        got.push("04ID".to_string());
        got[0].clear();

        assert_eq!(cache.get(">01ID").unwrap(), ids(&["02ID", "03ID"]));
    }

    #[test_log::test]
    fn test_lru_bound() {
        let cache = SliceCache::<String>::new("follow_ids", 2);
        cache.put("a", &ids(&["1"]));
        cache.put("b", &ids(&["2"]));
        assert!(cache.get("a").is_some());
        cache.put("c", &ids(&["3"]));

        assert_eq!(cache.len(), 2);
        assert!(cache.get("a").is_some());
        assert!(cache.get("b").is_none());
        assert!(cache.get("c").is_some());
    }

    #[test_log::test]
    fn test_zero_capacity() {
        let cache = SliceCache::<String>::new("follow_ids", 0);
        assert_eq!(cache.cap(), 1);
        cache.put("a", &ids(&["1"]));
        assert_eq!(cache.len(), 1);
    }

    #[test_log::test]
    fn test_invalidate_trim_clear() {
        let cache = SliceCache::<String>::new("follow_ids", 10);
        for i in 0..10 {
            cache.put(format!("k{i}"), &ids(&["1"]));
        }

        cache.invalidate(["k0", "k1", "missing"]);
        assert_eq!(cache.len(), 8);
        assert!(cache.get("k0").is_none());

        cache.trim(0.5);
        assert_eq!(cache.len(), 5);
        assert!(cache.get("k9").is_some());

        cache.clear();
        assert!(cache.is_empty());
    }

    #[test_log::test(tokio::test)]
    async fn test_load() {
        let cache = SliceCache::<String>::new("follow_ids", 8);
        let calls = AtomicUsize::new(0);

        for _ in 0..2 {
            let got = cache
                .load(">01ID", || async {
                    calls.fetch_add(1, Ordering::Relaxed);
                    Ok(ids(&["02ID"]))
                })
                .await
                .unwrap();
            assert_eq!(got, ids(&["02ID"]));
        }
        assert_eq!(calls.load(Ordering::Relaxed), 1);

        let err = cache
            .load("<01ID", || async { Err(Error::new(ErrorKind::External, "boom")) })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::External);
        assert!(cache.get("<01ID").is_none());
    }

    #[test_log::test(tokio::test)]
    async fn test_load_overtaken_by_invalidation() {
        let cache = SliceCache::<String>::new("follow_ids", 8);

        let got = cache
            .load(">01ID", || async {
                // A follow is created while the list is read from storage.
                cache.invalidate([">01ID"]);
                Ok(ids(&["02ID"]))
            })
            .await
            .unwrap();

        assert_eq!(got, ids(&["02ID"]));
        assert!(cache.get(">01ID").is_none());
    }

    #[test_log::test(tokio::test)]
    async fn test_load_survives_other_keys_written() {
        let cache = SliceCache::<String>::new("follow_ids", 8);

        cache
            .load(">01ID", || async {
                cache.invalidate(["<01ID"]);
                cache.put(">02ID", &ids(&["03ID"]));
                Ok(ids(&["02ID"]))
            })
            .await
            .unwrap();
        assert_eq!(cache.get(">01ID").unwrap(), ids(&["02ID"]));

        cache
            .load("<01ID", || async {
                cache.clear();
                Ok(ids(&["02ID"]))
            })
            .await
            .unwrap();
        assert!(cache.get("<01ID").is_none());
        assert!(cache.inner.state.lock().pending.is_empty());
    }

    #[test_log::test(tokio::test)]
    async fn test_failed_load_releases_key() {
        let cache = SliceCache::<String>::new("follow_ids", 8);
        cache
            .load(">01ID", || async { Err(Error::new(ErrorKind::External, "boom")) })
            .await
            .unwrap_err();
        assert!(cache.inner.state.lock().pending.is_empty());
    }
}
