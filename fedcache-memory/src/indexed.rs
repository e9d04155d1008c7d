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

use std::{
    collections::VecDeque,
    fmt::Debug,
    future::Future,
    sync::{Arc, OnceLock, Weak},
    time::{Duration, Instant},
};

use fedcache_common::{
    code::Value,
    error::{Error, Result},
    metrics::Metrics,
    strict_assert,
};
use hashbrown::HashMap;
use parking_lot::Mutex;
use tokio::{task::JoinHandle, time::MissedTickBehavior};

use crate::{
    eviction::Lru,
    index::Index,
    inflight::{Enqueue, InflightMap, Notifier},
    key::{IntoKey, Key, KeyPart},
    policy::ErrorPolicy,
    record::{Data, Record, NEVER},
};

/// Copies a value before it is stored or handed out, stripping whatever must not be shared.
pub type CopyFn<T> = Arc<dyn Fn(&T) -> T + Send + Sync + 'static>;

/// Called once for every value removed by an explicit invalidation.
pub type InvalidateHook<T> = Arc<dyn Fn(&T) + Send + Sync + 'static>;

type Records<T> = Vec<Arc<Record<T>>>;

/// Writes logged while loads run, beyond which older loads are assumed stale.
const WRITE_LOG_CAPACITY: usize = 4096;

/// A write and the (index, key) pairs it touched.
struct Write {
    generation: u64,
    keys: Box<[(usize, Key)]>,
}

fn keys_of<T>(record: &Record<T>) -> impl Iterator<Item = (usize, Key)> + '_ {
    record
        .keys()
        .iter()
        .enumerate()
        .filter_map(|(i, key)| key.clone().map(|key| (i, key)))
}

struct State<T> {
    /// One map per declared index. Unique indices hold at most one record per key.
    maps: Box<[HashMap<Key, Records<T>>]>,
    lru: Lru<T>,
    capacity: usize,
    ttl: Option<Duration>,
    inflights: InflightMap<T>,
    /// Bumped by every write.
    generation: u64,
    /// Running loads, single-flight and batch.
    loads: usize,
    /// Writes since the oldest running load started, so a finished load can tell whether one of its keys was written
    /// meanwhile. Empty while no load runs.
    writes: VecDeque<Write>,
    /// Writes up to this generation are no longer in the log.
    floor: u64,
    metrics: Arc<Metrics>,
}

impl<T> State<T> {
    fn expires_at(&self, now: u64) -> u64 {
        match self.ttl {
            Some(ttl) => now.saturating_add(ttl.as_nanos() as u64),
            None => NEVER,
        }
    }

    /// Find the live records of `key`, refreshing their recency. Expired records found on the way are removed.
    fn lookup(&mut self, index: usize, key: &Key, now: u64) -> Records<T> {
        let Some(records) = self.maps[index].get(key) else {
            return vec![];
        };
        let records = records.clone();
        let expires_at = self.expires_at(now);

        let mut alive = Vec::with_capacity(records.len());
        for record in records {
            if record.is_expired(now) {
                self.remove(&record);
                self.metrics.memory_expire.increment(1);
                continue;
            }
            record.set_expires_at(expires_at);
            self.lru.touch(&record);
            alive.push(record);
        }
        alive
    }

    /// Insert the record under all of its keys.
    ///
    /// Owners of the record's unique keys are displaced first. Records dropped on the way are pushed to `garbages`,
    /// so they are released outside the lock.
    fn emplace(&mut self, indices: &[Index<T>], record: Arc<Record<T>>, now: u64, garbages: &mut Records<T>) {
        for (i, key) in record.keys().iter().enumerate() {
            let Some(key) = key else { continue };
            if indices[i].is_multiple() {
                continue;
            }
            if let Some(owners) = self.maps[i].get(key).cloned() {
                for owner in owners {
                    self.remove(&owner);
                    garbages.push(owner);
                }
            }
        }

        record.set_expires_at(self.expires_at(now));
        for (i, key) in record.keys().iter().enumerate() {
            if let Some(key) = key {
                self.maps[i].entry(key.clone()).or_default().push(record.clone());
            }
        }
        self.lru.push(record);
        self.metrics.memory_insert.increment(1);

        self.evict(self.capacity, garbages);
    }

    fn evict(&mut self, target: usize, garbages: &mut Records<T>) {
        while self.lru.len() > target {
            let Some(record) = self.lru.pop() else { break };
            self.unindex(&record);
            self.metrics.memory_evict.increment(1);
            garbages.push(record);
        }
        self.metrics.memory_usage.set(self.lru.len() as f64);
    }

    fn sweep(&mut self, now: u64, garbages: &mut Records<T>) {
        while self.lru.peek().is_some_and(|record| record.is_expired(now)) {
            let Some(record) = self.lru.pop() else { break };
            self.unindex(&record);
            self.metrics.memory_expire.increment(1);
            garbages.push(record);
        }
        self.metrics.memory_usage.set(self.lru.len() as f64);
    }

    fn remove(&mut self, record: &Arc<Record<T>>) {
        self.unindex(record);
        self.lru.remove(record);
        strict_assert!(!record.is_linked());
    }

    fn unindex(&mut self, record: &Arc<Record<T>>) {
        for (i, key) in record.keys().iter().enumerate() {
            let Some(key) = key else { continue };
            let emptied = match self.maps[i].get_mut(key) {
                Some(records) => {
                    records.retain(|r| !Arc::ptr_eq(r, record));
                    records.is_empty()
                }
                None => false,
            };
            if emptied {
                self.maps[i].remove(key);
            }
        }
    }

    fn clear(&mut self, garbages: &mut Records<T>) {
        while let Some(record) = self.lru.pop() {
            garbages.push(record);
        }
        for map in self.maps.iter_mut() {
            map.clear();
        }
        // Every running load is stale.
        self.generation += 1;
        self.floor = self.generation;
        self.writes.clear();
        self.metrics.memory_usage.set(0.0);
    }

    /// Record a write touching `keys`.
    fn written(&mut self, keys: Vec<(usize, Key)>) {
        self.generation += 1;
        if self.loads == 0 {
            self.floor = self.generation;
            return;
        }
        self.writes.push_back(Write {
            generation: self.generation,
            keys: keys.into_boxed_slice(),
        });
        if self.writes.len() > WRITE_LOG_CAPACITY {
            if let Some(write) = self.writes.pop_front() {
                self.floor = write.generation;
            }
        }
    }

    fn begin_load(&mut self) -> u64 {
        self.loads += 1;
        self.generation
    }

    fn finish_load(&mut self) {
        strict_assert!(self.loads > 0);
        self.loads -= 1;
        if self.loads == 0 {
            self.floor = self.generation;
            self.writes.clear();
        }
    }

    /// Whether a write since `generation` touched any of `keys`.
    fn is_stale(&self, generation: u64, keys: &[(usize, Key)]) -> bool {
        if self.generation == generation {
            return false;
        }
        if self.floor > generation {
            return true;
        }
        self.writes
            .iter()
            .filter(|write| write.generation > generation)
            .any(|write| write.keys.iter().any(|key| keys.contains(key)))
    }
}

struct Inner<T>
where
    T: Value,
{
    name: String,
    indices: Box<[Index<T>]>,
    copy: CopyFn<T>,
    policy: ErrorPolicy,
    hook: OnceLock<InvalidateHook<T>>,

    state: Mutex<State<T>>,
    epoch: Instant,

    sweeper: Mutex<Option<JoinHandle<()>>>,

    metrics: Arc<Metrics>,
}

impl<T> Inner<T>
where
    T: Value,
{
    fn now(&self) -> u64 {
        self.epoch.elapsed().as_nanos() as u64
    }

    fn index(&self, name: &str) -> usize {
        self.indices
            .iter()
            .position(|index| index.name() == name)
            .unwrap_or_else(|| panic!("missing index {name} for cache {}", self.name))
    }

    fn unique_index(&self, name: &str) -> usize {
        let i = self.index(name);
        assert!(
            !self.indices[i].is_multiple(),
            "index {name} of cache {} is not unique",
            self.name
        );
        i
    }

    fn value_record(&self, value: T) -> Arc<Record<T>> {
        let keys: Box<[Option<Key>]> = self.indices.iter().map(|index| index.key_of(&value)).collect();
        if keys[0].is_none() {
            panic!(
                "value {value:?} has no key for primary index {} of cache {}",
                self.indices[0].name(),
                self.name
            );
        }
        Arc::new(Record::new(Data::Value(value), keys, NEVER))
    }

    fn error_record(&self, index: usize, key: Key, err: Error) -> Arc<Record<T>> {
        let mut keys = vec![None; self.indices.len()].into_boxed_slice();
        keys[index] = Some(key);
        Arc::new(Record::new(Data::Error(err), keys, NEVER))
    }

    fn read(&self, record: &Record<T>) -> Result<T> {
        match record.data() {
            Data::Value(v) => Ok((self.copy)(v)),
            Data::Error(e) => Err(e.clone()),
        }
    }

    /// Store copies of `values`.
    ///
    /// With `generation`, the values come from a load that started at that generation, and a value is dropped if a
    /// write touched one of its keys since. Without it, this is a write itself.
    fn insert<'a>(&self, values: impl IntoIterator<Item = &'a T>, generation: Option<u64>)
    where
        T: 'a,
    {
        let records: Records<T> = values
            .into_iter()
            .map(|value| self.value_record((self.copy)(value)))
            .collect();

        let now = self.now();
        let mut garbages = vec![];

        let mut state = self.state.lock();
        match generation {
            Some(generation) => {
                for record in records {
                    let keys: Vec<_> = keys_of(&record).collect();
                    if state.is_stale(generation, &keys) {
                        tracing::trace!(cache = %self.name, "[indexed]: value written during load, not stored");
                        continue;
                    }
                    state.emplace(&self.indices, record, now, &mut garbages);
                }
            }
            None => {
                let mut keys = vec![];
                for record in records {
                    keys.extend(keys_of(&record));
                    state.emplace(&self.indices, record, now, &mut garbages);
                }
                keys.extend(garbages.iter().flat_map(|record| keys_of(record)));
                state.written(keys);
            }
        }
        drop(state);

        // Drop the displaced and evicted records outside the lock.
        drop(garbages);
    }

    /// Settle a finished single-flight load: store the result if allowed, and return the waiters to notify.
    fn settle(&self, index: usize, key: &Key, generation: u64, res: &Result<T>) -> Vec<Notifier<T>> {
        let record = match res {
            Ok(v) => Some(self.value_record((self.copy)(v))),
            Err(e) => {
                self.metrics.memory_load_error.increment(1);
                (!self.policy.ignores(e)).then(|| self.error_record(index, key.clone(), e.clone()))
            }
        };

        let now = self.now();
        let mut garbages = vec![];

        let mut state = self.state.lock();
        let notifiers = state.inflights.take(index, key);
        if let Some(record) = record {
            let mut keys: Vec<_> = keys_of(&record).collect();
            keys.push((index, key.clone()));
            if state.is_stale(generation, &keys) {
                tracing::trace!(cache = %self.name, %key, "[indexed]: key written during load, result not stored");
            } else {
                state.emplace(&self.indices, record, now, &mut garbages);
            }
        }
        state.finish_load();
        drop(state);

        drop(garbages);
        notifiers
    }

    fn sweep(&self) -> usize {
        let now = self.now();
        let mut garbages = vec![];
        self.state.lock().sweep(now, &mut garbages);
        garbages.len()
    }
}

/// Releases the inflight slot of a leader that is dropped before its loader finishes.
struct InflightGuard<'a, T>
where
    T: Value,
{
    inner: &'a Inner<T>,
    index: usize,
    key: &'a Key,
    armed: bool,
}

impl<T> Drop for InflightGuard<'_, T>
where
    T: Value,
{
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let notifiers = {
            let mut state = self.inner.state.lock();
            state.finish_load();
            state.inflights.take(self.index, self.key)
        };
        tracing::trace!(
            cache = %self.inner.name,
            key = %self.key,
            waiters = notifiers.len(),
            "[indexed]: load cancelled, release waiters"
        );
    }
}

/// Ends a batch load, whether it returned, failed or was dropped.
struct BatchGuard<'a, T>
where
    T: Value,
{
    inner: &'a Inner<T>,
}

impl<T> Drop for BatchGuard<'_, T>
where
    T: Value,
{
    fn drop(&mut self) {
        self.inner.state.lock().finish_load();
    }
}

/// Builder for [`IndexedCache`].
pub struct IndexedCacheBuilder<T>
where
    T: Value,
{
    name: String,
    capacity: usize,
    policy: ErrorPolicy,
    indices: Vec<Index<T>>,
    copy: Option<CopyFn<T>>,
    ttl: Option<Duration>,
}

impl<T> IndexedCacheBuilder<T>
where
    T: Value,
{
    /// Create a builder for a cache holding at most `capacity` entries.
    ///
    /// The error policy has no default: each cache decides explicitly which loader errors it remembers.
    pub fn new(name: impl Into<String>, capacity: usize, policy: ErrorPolicy) -> Self {
        Self {
            name: name.into(),
            capacity,
            policy,
            indices: vec![],
            copy: None,
            ttl: None,
        }
    }

    /// Declare an index. The first declared index is the primary index: every stored value must have a key in it.
    pub fn with_index(mut self, index: Index<T>) -> Self {
        self.indices.push(index);
        self
    }

    /// Set the copy function. The default copy is [`Clone::clone`].
    pub fn with_copy(mut self, copy: impl Fn(&T) -> T + Send + Sync + 'static) -> Self {
        self.copy = Some(Arc::new(copy));
        self
    }

    /// Set the TTL of entries. `None` keeps entries until they are evicted or invalidated.
    pub fn with_ttl(mut self, ttl: Option<Duration>) -> Self {
        self.ttl = ttl;
        self
    }

    /// Build the cache.
    ///
    /// # Panics
    ///
    /// Panics if no index is declared, if two indices share a name, or if the capacity is zero.
    pub fn build(self) -> IndexedCache<T> {
        assert!(!self.indices.is_empty(), "cache {} declares no index", self.name);
        assert!(self.capacity > 0, "cache {} has zero capacity", self.name);
        for (i, index) in self.indices.iter().enumerate() {
            assert!(
                self.indices[..i].iter().all(|other| other.name() != index.name()),
                "duplicated index {} for cache {}",
                index.name(),
                self.name
            );
        }

        let metrics = Arc::new(Metrics::new(&self.name));
        let state = State {
            maps: self.indices.iter().map(|_| HashMap::new()).collect(),
            lru: Lru::default(),
            capacity: self.capacity,
            ttl: self.ttl,
            inflights: InflightMap::default(),
            generation: 0,
            loads: 0,
            writes: VecDeque::new(),
            floor: 0,
            metrics: metrics.clone(),
        };

        let inner = Inner {
            name: self.name,
            indices: self.indices.into_boxed_slice(),
            copy: self.copy.unwrap_or_else(|| Arc::new(T::clone)),
            policy: self.policy,
            hook: OnceLock::new(),
            state: Mutex::new(state),
            epoch: Instant::now(),
            sweeper: Mutex::new(None),
            metrics,
        };

        IndexedCache { inner: Arc::new(inner) }
    }
}

/// A bounded cache of values addressable by several declared indices.
///
/// Every resident value is reachable from all of its index keys at once. Removing it through any one key, by
/// invalidation, eviction or expiry, removes it from all of them under the same lock.
///
/// Values are copied on the way in and on the way out, so callers can never mutate what the cache holds.
pub struct IndexedCache<T>
where
    T: Value,
{
    inner: Arc<Inner<T>>,
}

impl<T> Clone for IndexedCache<T>
where
    T: Value,
{
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T> Debug for IndexedCache<T>
where
    T: Value,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexedCache")
            .field("name", &self.inner.name)
            .field("indices", &self.inner.indices)
            .field("policy", &self.inner.policy)
            .field("len", &self.len())
            .field("cap", &self.cap())
            .finish()
    }
}

impl<T> IndexedCache<T>
where
    T: Value,
{
    /// Create a builder, see [`IndexedCacheBuilder::new`].
    pub fn builder(name: impl Into<String>, capacity: usize, policy: ErrorPolicy) -> IndexedCacheBuilder<T> {
        IndexedCacheBuilder::new(name, capacity, policy)
    }

    /// Get the cache name.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Register the invalidation hook.
    ///
    /// # Panics
    ///
    /// Panics if a hook is already registered.
    pub fn set_invalidate_hook(&self, hook: impl Fn(&T) + Send + Sync + 'static) {
        if self.inner.hook.set(Arc::new(hook)).is_err() {
            panic!("invalidate hook of cache {} is already set", self.inner.name);
        }
    }

    /// Get a copy of the value stored under `key` in the unique index `index`.
    ///
    /// Remembered loader errors are not returned here, they read as a miss.
    pub fn get_one(&self, index: &str, key: impl IntoKey) -> Option<T> {
        let index = self.inner.unique_index(index);
        let key = key.into_key();
        let now = self.inner.now();

        let record = {
            let mut state = self.inner.state.lock();
            state.lookup(index, &key, now).pop()
        };

        match record.as_deref().and_then(Record::value) {
            Some(v) => {
                self.inner.metrics.memory_hit.increment(1);
                Some((self.inner.copy)(v))
            }
            None => {
                self.inner.metrics.memory_miss.increment(1);
                None
            }
        }
    }

    /// Get copies of all values stored under any of `keys` in `index`.
    ///
    /// For a unique index the result follows the order of `keys`. Keys without a value are skipped.
    pub fn get<K>(&self, index: &str, keys: impl IntoIterator<Item = K>) -> Vec<T>
    where
        K: IntoKey,
    {
        let index = self.inner.index(index);
        let keys: Vec<Key> = keys.into_iter().map(IntoKey::into_key).collect();
        let now = self.inner.now();

        let records: Records<T> = {
            let mut state = self.inner.state.lock();
            keys.iter().flat_map(|key| state.lookup(index, key, now)).collect()
        };

        records
            .iter()
            .filter_map(|record| record.value())
            .map(|v| (self.inner.copy)(v))
            .collect()
    }

    /// Get the value under `key` in the unique index `index`, calling `loader` on a miss.
    ///
    /// Concurrent calls for the same key share one loader call: the first caller runs it in its own task, the others
    /// wait for its result. If the first caller is dropped before its loader finishes, nothing is stored and one of
    /// the waiters takes over.
    ///
    /// A loader error is returned to every caller, and stored unless the cache's [`ErrorPolicy`] ignores it.
    #[cfg_attr(feature = "tracing", fastrace::trace(name = "fedcache::memory::indexed::load_one"))]
    pub async fn load_one<F, FU>(&self, index: &str, key: impl IntoKey, loader: F) -> Result<T>
    where
        F: FnOnce() -> FU,
        FU: Future<Output = Result<T>>,
    {
        let index = self.inner.unique_index(index);
        let key = key.into_key();

        let generation = loop {
            let waiter = {
                let now = self.inner.now();
                let mut state = self.inner.state.lock();
                if let Some(record) = state.lookup(index, &key, now).pop() {
                    drop(state);
                    self.inner.metrics.memory_hit.increment(1);
                    return self.inner.read(&record);
                }
                match state.inflights.enqueue(index, &key) {
                    Enqueue::Leader => break state.begin_load(),
                    Enqueue::Waiter(waiter) => waiter,
                }
            };
            match waiter.await {
                Ok(res) => return res,
                Err(_) => {
                    tracing::trace!(cache = %self.inner.name, %key, "[indexed]: leader dropped, retry");
                }
            }
        };

        self.inner.metrics.memory_miss.increment(1);
        self.inner.metrics.memory_load.increment(1);

        let mut guard = InflightGuard {
            inner: &self.inner,
            index,
            key: &key,
            armed: true,
        };
        let res = loader().await;
        guard.armed = false;
        drop(guard);

        let notifiers = self.inner.settle(index, &key, generation, &res);
        for notifier in notifiers {
            let res = match &res {
                Ok(v) => Ok((self.inner.copy)(v)),
                Err(e) => Err(e.clone()),
            };
            let _ = notifier.send(res);
        }

        res
    }

    /// Get the values under `keys` in `index`, calling `loader` once with all missed keys.
    ///
    /// Loader results are stored and merged with the hits in the order of `keys`. Remembered loader errors are
    /// dropped from the result. A loader error is returned as is and never stored.
    #[cfg_attr(feature = "tracing", fastrace::trace(name = "fedcache::memory::indexed::load"))]
    pub async fn load<K, F, FU>(&self, index: &str, keys: impl IntoIterator<Item = K>, loader: F) -> Result<Vec<T>>
    where
        K: IntoKey,
        F: FnOnce(Vec<Key>) -> FU,
        FU: Future<Output = Result<Vec<T>>>,
    {
        let index = self.inner.index(index);
        let keys: Vec<Key> = keys.into_iter().map(IntoKey::into_key).collect();
        let now = self.inner.now();

        let mut hits = vec![];
        let mut missing = vec![];
        let generation = {
            let mut state = self.inner.state.lock();
            for (pos, key) in keys.iter().enumerate() {
                let records = state.lookup(index, key, now);
                if records.is_empty() {
                    missing.push(key.clone());
                } else {
                    hits.extend(records.into_iter().map(|record| (pos, record)));
                }
            }
            (!missing.is_empty()).then(|| state.begin_load())
        };
        self.inner.metrics.memory_hit.increment(hits.len() as u64);
        self.inner.metrics.memory_miss.increment(missing.len() as u64);

        let mut values: Vec<(usize, T)> = hits
            .iter()
            .filter_map(|(pos, record)| record.value().map(|v| (*pos, (self.inner.copy)(v))))
            .collect();
        drop(hits);

        if let Some(generation) = generation {
            let guard = BatchGuard { inner: &self.inner };
            self.inner.metrics.memory_load.increment(1);
            let loaded = loader(missing)
                .await
                .inspect_err(|_| self.inner.metrics.memory_load_error.increment(1))?;

            self.inner.insert(loaded.iter(), Some(generation));
            drop(guard);

            let mut positions = HashMap::with_capacity(keys.len());
            for (pos, key) in keys.into_iter().enumerate() {
                positions.entry(key).or_insert(pos);
            }
            for value in loaded {
                let pos = self.inner.indices[index]
                    .key_of(&value)
                    .and_then(|key| positions.get(&key).copied())
                    .unwrap_or(usize::MAX);
                values.push((pos, value));
            }
        }

        values.sort_by_key(|(pos, _)| *pos);
        Ok(values.into_iter().map(|(_, v)| v).collect())
    }

    /// [`IndexedCache::load`] over a single-field string index, with plain IDs for keys.
    pub async fn load_ids<S, F, FU>(&self, index: &str, ids: &[S], loader: F) -> Result<Vec<T>>
    where
        S: AsRef<str>,
        F: FnOnce(Vec<String>) -> FU,
        FU: Future<Output = Result<Vec<T>>>,
    {
        self.load(index, ids.iter().map(|id| id.as_ref()), |missing| {
            loader(missing.iter().filter_map(|key| id_part(key, 0)).collect())
        })
        .await
    }

    /// [`IndexedCache::load`] over a two-field string index whose first field is fixed to `part1`.
    pub async fn load_ids_2part<S, F, FU>(&self, index: &str, part1: &str, ids: &[S], loader: F) -> Result<Vec<T>>
    where
        S: AsRef<str>,
        F: FnOnce(Vec<String>) -> FU,
        FU: Future<Output = Result<Vec<T>>>,
    {
        self.load(index, ids.iter().map(|id| (part1, id.as_ref())), |missing| {
            loader(missing.iter().filter_map(|key| id_part(key, 1)).collect())
        })
        .await
    }

    /// Store a copy of a value known to be fresh, e.g. just read from durable storage for another purpose.
    ///
    /// The value displaces any value owning one of its unique keys. No hook is called.
    pub fn put(&self, value: &T) {
        self.inner.insert([value], None);
    }

    /// Store copies of several values known to be fresh, see [`IndexedCache::put`].
    pub fn put_many<'a>(&self, values: impl IntoIterator<Item = &'a T>)
    where
        T: 'a,
    {
        self.inner.insert(values, None);
    }

    /// Persist `value` with `store`, then cache it.
    ///
    /// On success the value is stored and the invalidate hook is called once for it, so state derived from the
    /// previous version of the value is dropped. On failure nothing is cached and the error is returned.
    pub async fn store<F, FU>(&self, value: &T, store: F) -> Result<()>
    where
        F: FnOnce() -> FU,
        FU: Future<Output = Result<()>>,
    {
        store().await?;
        self.put(value);
        if let Some(hook) = self.inner.hook.get() {
            hook(value);
        }
        Ok(())
    }

    /// Remove every value reachable from any of `keys` in `index`, from all of its indices.
    ///
    /// The invalidate hook is called once for every removed value, after the cache lock is released. Keys with no
    /// resident value trigger no hook.
    #[cfg_attr(feature = "tracing", fastrace::trace(name = "fedcache::memory::indexed::invalidate"))]
    pub fn invalidate<K>(&self, index: &str, keys: impl IntoIterator<Item = K>)
    where
        K: IntoKey,
    {
        let index = self.inner.index(index);
        let keys: Vec<Key> = keys.into_iter().map(IntoKey::into_key).collect();

        let mut removed = vec![];
        {
            let mut state = self.inner.state.lock();
            for key in keys.iter() {
                let Some(records) = state.maps[index].get(key).cloned() else {
                    continue;
                };
                for record in records {
                    state.remove(&record);
                    removed.push(record);
                }
            }
            // Keys without a resident value are still written, a load of them may be running.
            let mut written: Vec<_> = keys.into_iter().map(|key| (index, key)).collect();
            written.extend(removed.iter().flat_map(|record| keys_of(record)));
            state.written(written);
            state.metrics.memory_usage.set(state.lru.len() as f64);
        }
        self.inner.metrics.memory_invalidate.increment(removed.len() as u64);

        if let Some(hook) = self.inner.hook.get() {
            for value in removed.iter().filter_map(|record| record.value()) {
                hook(value);
            }
        }
    }

    /// Invalidate by a list of IDs over a single-field index.
    pub fn invalidate_ids<S>(&self, index: &str, ids: impl IntoIterator<Item = S>)
    where
        S: AsRef<str>,
    {
        let keys: Vec<Key> = ids.into_iter().map(|id| id.as_ref().into_key()).collect();
        self.invalidate(index, keys);
    }

    /// Change the TTL of entries stored or touched from now on.
    pub fn set_ttl(&self, ttl: Option<Duration>) {
        self.inner.state.lock().ttl = ttl;
    }

    /// Evict least recently used entries until at most `percent` of the capacity is used.
    pub fn trim(&self, percent: f64) {
        let mut garbages = vec![];
        {
            let mut state = self.inner.state.lock();
            let target = (state.capacity as f64 * percent.clamp(0.0, 1.0)) as usize;
            state.evict(target, &mut garbages);
        }
        drop(garbages);
    }

    /// Remove all entries. No hook is called.
    pub fn clear(&self) {
        let mut garbages = vec![];
        self.inner.state.lock().clear(&mut garbages);
        drop(garbages);
    }

    /// Remove expired entries now. Returns how many were removed.
    #[cfg_attr(feature = "tracing", fastrace::trace(name = "fedcache::memory::indexed::sweep"))]
    pub fn sweep(&self) -> usize {
        self.inner.sweep()
    }

    /// Resident entry count, remembered errors included.
    pub fn len(&self) -> usize {
        self.inner.state.lock().lru.len()
    }

    /// Whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum resident entry count.
    pub fn cap(&self) -> usize {
        self.inner.state.lock().capacity
    }

    /// Start the background TTL sweeper, sweeping every `interval`.
    ///
    /// Returns `true` if a sweeper is running after the call, including when one was already running. Returns
    /// `false` if the interval is zero or if called outside a tokio runtime.
    pub fn start(&self, interval: Duration) -> bool {
        let mut sweeper = self.inner.sweeper.lock();
        if sweeper.as_ref().is_some_and(|handle| !handle.is_finished()) {
            return true;
        }
        if interval.is_zero() {
            return false;
        }
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::warn!(cache = %self.inner.name, "[indexed]: no tokio runtime to run the sweeper");
            return false;
        };

        let inner = Arc::downgrade(&self.inner);
        *sweeper = Some(runtime.spawn(sweep_every(inner, interval)));
        tracing::debug!(cache = %self.inner.name, ?interval, "[indexed]: sweeper started");
        true
    }

    /// Stop the background TTL sweeper. Stopping a cache without a sweeper succeeds too.
    pub fn stop(&self) -> bool {
        if let Some(handle) = self.inner.sweeper.lock().take() {
            handle.abort();
            tracing::debug!(cache = %self.inner.name, "[indexed]: sweeper stopped");
        }
        true
    }

    /// Create a handle that does not keep the cache alive.
    pub fn downgrade(&self) -> WeakIndexedCache<T> {
        WeakIndexedCache {
            inner: Arc::downgrade(&self.inner),
        }
    }
}

async fn sweep_every<T>(inner: Weak<Inner<T>>, interval: Duration)
where
    T: Value,
{
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately.
    ticker.tick().await;
    loop {
        ticker.tick().await;
        let Some(inner) = inner.upgrade() else { break };
        let swept = inner.sweep();
        if swept > 0 {
            tracing::trace!(cache = %inner.name, swept, "[indexed]: swept expired entries");
        }
    }
}

fn id_part(key: &Key, i: usize) -> Option<String> {
    key.part(i).and_then(KeyPart::as_str).map(str::to_string)
}

/// A handle to an [`IndexedCache`] that does not keep it alive.
///
/// Used by invalidation hooks, which are owned by caches and may refer back to them.
pub struct WeakIndexedCache<T>
where
    T: Value,
{
    inner: Weak<Inner<T>>,
}

impl<T> Clone for WeakIndexedCache<T>
where
    T: Value,
{
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T> Debug for WeakIndexedCache<T>
where
    T: Value,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeakIndexedCache").finish()
    }
}

impl<T> WeakIndexedCache<T>
where
    T: Value,
{
    /// Get the cache back, if it is still alive.
    pub fn upgrade(&self) -> Option<IndexedCache<T>> {
        self.inner.upgrade().map(|inner| IndexedCache { inner })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use fedcache_common::error::ErrorKind;
    use futures_util::future::join_all;
    use rand::{rngs::SmallRng, Rng, SeedableRng};

    use super::*;
    use crate::test_utils::{account, account_cache, Account};

    fn is_send_sync_static<T: Send + Sync + 'static>() {}

    #[test]
    fn test_send_sync_static() {
        is_send_sync_static::<IndexedCache<Account>>();
        is_send_sync_static::<WeakIndexedCache<Account>>();
    }

    #[test_log::test]
    fn test_multi_index_coherence() {
        let cache = account_cache(16, ErrorPolicy::IgnoreAll);
        cache.put(&account("01ID", "alice", ""));

        for (index, key) in [
            ("id", "01ID".into_key()),
            ("uri", "https://ex/u/alice".into_key()),
            ("url", "https://ex/@alice".into_key()),
            ("username,domain", ("alice", "").into_key()),
        ] {
            let got = cache.get_one(index, key).unwrap();
            assert_eq!(got.id, "01ID");
            assert_eq!(got.username, "alice");
        }
    }

    #[test_log::test]
    fn test_invalidation_completeness() {
        let cache = account_cache(16, ErrorPolicy::IgnoreAll);
        cache.put(&account("01ID", "alice", "ex.org"));
        cache.put(&account("02ID", "bob", "ex.org"));

        cache.invalidate("uri", ["https://ex/u/alice"]);

        assert!(cache.get_one("id", "01ID").is_none());
        assert!(cache.get_one("url", "https://ex/@alice").is_none());
        assert!(cache.get_one("username,domain", ("alice", "ex.org")).is_none());
        assert_eq!(cache.get("domain", ["ex.org"]).len(), 1);
        assert_eq!(cache.get_one("id", "02ID").unwrap().username, "bob");
        assert_eq!(cache.len(), 1);
    }

    #[test_log::test]
    fn test_copy_isolation() {
        let cache = account_cache(16, ErrorPolicy::IgnoreAll);
        let mut alice = account("01ID", "alice", "");
        alice.avatar = Some(Arc::new("01MEDIA".to_string()));
        cache.put(&alice);

        let mut got = cache.get_one("id", "01ID").unwrap();
        // The copy function strips the populated avatar.
        assert!(got.avatar.is_none());
        assert_eq!(got.avatar_id, "01MEDIA");

        got.username = "mallory".to_string();
        got.avatar_id.clear();

        let again = cache.get_one("id", "01ID").unwrap();
        assert_eq!(again.username, "alice");
        assert_eq!(again.avatar_id, "01MEDIA");
    }

    #[test_log::test]
    fn test_unique_key_displaces_owner() {
        let cache = account_cache(16, ErrorPolicy::IgnoreAll);
        cache.put(&account("01ID", "alice", ""));

        // Same username and domain, new ID: the account was deleted and recreated.
        cache.put(&account("02ID", "alice", ""));

        assert!(cache.get_one("id", "01ID").is_none());
        assert_eq!(cache.get_one("username,domain", ("alice", "")).unwrap().id, "02ID");
        assert_eq!(cache.len(), 1);
    }

    #[test_log::test]
    fn test_zero_keys_not_indexed() {
        let cache = account_cache(16, ErrorPolicy::IgnoreAll);
        let mut alice = account("01ID", "alice", "");
        alice.url.clear();
        cache.put(&alice);

        assert!(cache.get_one("url", "").is_none());
        assert!(cache.get_one("id", "01ID").is_some());
        // The domain index does not allow zero keys, local accounts are not in it.
        assert!(cache.get("domain", [""]).is_empty());
    }

    #[test_log::test]
    #[should_panic(expected = "missing index nickname for cache account")]
    fn test_unknown_index() {
        let cache = account_cache(16, ErrorPolicy::IgnoreAll);
        cache.invalidate("nickname", ["alice"]);
    }

    #[test_log::test]
    #[should_panic(expected = "index domain of cache account is not unique")]
    fn test_get_one_on_multiple_index() {
        let cache = account_cache(16, ErrorPolicy::IgnoreAll);
        cache.get_one("domain", "ex.org");
    }

    #[test_log::test]
    #[should_panic(expected = "has no key for primary index id")]
    fn test_put_without_primary_key() {
        let cache = account_cache(16, ErrorPolicy::IgnoreAll);
        cache.put(&account("", "alice", ""));
    }

    #[test_log::test]
    fn test_capacity_bound() {
        let cache = account_cache(4, ErrorPolicy::IgnoreAll);
        for i in 0..10 {
            cache.put(&account(&format!("{i:02}"), &format!("user{i}"), ""));
            assert!(cache.len() <= 4);
        }
        for i in 0..6 {
            assert!(cache.get_one("id", format!("{i:02}")).is_none());
        }
        for i in 6..10 {
            assert!(cache.get_one("id", format!("{i:02}")).is_some());
        }
    }

    #[test_log::test]
    fn test_lru_keeps_recently_used() {
        let cache = account_cache(2, ErrorPolicy::IgnoreAll);
        cache.put(&account("01", "a", ""));
        cache.put(&account("02", "b", ""));
        assert!(cache.get_one("id", "01").is_some());
        cache.put(&account("03", "c", ""));

        assert!(cache.get_one("id", "01").is_some());
        assert!(cache.get_one("id", "02").is_none());
        assert!(cache.get_one("id", "03").is_some());
    }

    #[test_log::test]
    fn test_invalidate_hook() {
        let cache = account_cache(16, ErrorPolicy::IgnoreAll);
        let invalidated = Arc::new(Mutex::new(vec![]));
        let sink = invalidated.clone();
        cache.set_invalidate_hook(move |a: &Account| sink.lock().push(a.id.clone()));

        cache.put(&account("01ID", "alice", "ex.org"));
        cache.put(&account("02ID", "bob", "ex.org"));
        cache.put(&account("03ID", "carol", ""));

        cache.invalidate("domain", ["ex.org"]);
        let mut ids = invalidated.lock().clone();
        ids.sort();
        assert_eq!(ids, vec!["01ID".to_string(), "02ID".to_string()]);

        // Not resident: no hook.
        cache.invalidate("id", ["01ID", "99ID"]);
        assert_eq!(invalidated.lock().len(), 2);

        cache.invalidate_ids("id", ["03ID"]);
        assert_eq!(invalidated.lock().len(), 3);
    }

    #[test_log::test]
    #[should_panic(expected = "invalidate hook of cache account is already set")]
    fn test_invalidate_hook_set_twice() {
        let cache = account_cache(16, ErrorPolicy::IgnoreAll);
        cache.set_invalidate_hook(|_| {});
        cache.set_invalidate_hook(|_| {});
    }

    #[test_log::test]
    fn test_trim_and_clear() {
        let cache = account_cache(10, ErrorPolicy::IgnoreAll);
        for i in 0..10 {
            cache.put(&account(&format!("{i:02}"), &format!("user{i}"), ""));
        }
        cache.trim(0.5);
        assert_eq!(cache.len(), 5);
        assert!(cache.get_one("id", "09").is_some());
        assert!(cache.get_one("id", "00").is_none());

        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.cap(), 10);
        assert!(cache.get_one("id", "09").is_none());
    }

    #[test_log::test]
    fn test_ttl_expiry() {
        let cache = account_cache(16, ErrorPolicy::IgnoreAll);
        cache.set_ttl(Some(Duration::from_millis(30)));
        cache.put(&account("01ID", "alice", ""));
        cache.put(&account("02ID", "bob", ""));
        assert_eq!(cache.sweep(), 0);

        std::thread::sleep(Duration::from_millis(60));

        // Expired entries read as misses even before a sweep.
        assert!(cache.get_one("id", "01ID").is_none());
        assert_eq!(cache.sweep(), 1);
        assert!(cache.is_empty());
    }

    #[test_log::test]
    fn test_touch_refreshes_ttl() {
        let cache = account_cache(16, ErrorPolicy::IgnoreAll);
        cache.set_ttl(Some(Duration::from_millis(200)));
        cache.put(&account("01ID", "alice", ""));
        cache.put(&account("02ID", "bob", ""));

        std::thread::sleep(Duration::from_millis(120));
        assert!(cache.get_one("id", "01ID").is_some());
        std::thread::sleep(Duration::from_millis(120));

        assert_eq!(cache.sweep(), 1);
        assert!(cache.get_one("id", "01ID").is_some());
        assert!(cache.get_one("id", "02ID").is_none());
    }

    #[test_log::test(tokio::test)]
    async fn test_load_one() {
        let cache = account_cache(16, ErrorPolicy::IgnoreAll);
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            let got = cache
                .load_one("uri", "https://ex/u/alice", || async {
                    calls.fetch_add(1, Ordering::Relaxed);
                    Ok(account("01ID", "alice", ""))
                })
                .await
                .unwrap();
            assert_eq!(got.id, "01ID");
        }
        assert_eq!(calls.load(Ordering::Relaxed), 1);
        // Loaded values are reachable from every index.
        assert!(cache.get_one("id", "01ID").is_some());
    }

    #[test_log::test(tokio::test(flavor = "multi_thread", worker_threads = 4))]
    async fn test_single_flight() {
        const CALLERS: usize = 32;

        let cache = account_cache(16, ErrorPolicy::IgnoreAll);
        let calls = Arc::new(AtomicUsize::new(0));

        let handles = (0..CALLERS).map(|_| {
            let cache = cache.clone();
            let calls = calls.clone();
            tokio::spawn(async move {
                cache
                    .load_one("id", "01ID", || async move {
                        calls.fetch_add(1, Ordering::Relaxed);
                        tokio::time::sleep(Duration::from_millis(200)).await;
                        Ok(account("01ID", "alice", ""))
                    })
                    .await
            })
        });
        let results = join_all(handles).await;

        assert_eq!(calls.load(Ordering::Relaxed), 1);
        for res in results {
            assert_eq!(res.unwrap().unwrap().username, "alice");
        }
    }

    #[test_log::test(tokio::test(flavor = "multi_thread", worker_threads = 4))]
    async fn test_single_flight_error() {
        const CALLERS: usize = 16;

        let cache = account_cache(16, ErrorPolicy::IgnoreAll);
        let calls = Arc::new(AtomicUsize::new(0));

        let handles = (0..CALLERS).map(|_| {
            let cache = cache.clone();
            let calls = calls.clone();
            tokio::spawn(async move {
                cache
                    .load_one("id", "01ID", || async move {
                        calls.fetch_add(1, Ordering::Relaxed);
                        tokio::time::sleep(Duration::from_millis(200)).await;
                        Err(Error::new(ErrorKind::External, "connection reset"))
                    })
                    .await
            })
        });
        let results = join_all(handles).await;

        assert_eq!(calls.load(Ordering::Relaxed), 1);
        for res in results {
            assert_eq!(res.unwrap().unwrap_err().kind(), ErrorKind::External);
        }
        // Ignored by policy, not remembered.
        assert!(cache.is_empty());
    }

    #[test_log::test(tokio::test)]
    async fn test_negative_caching() {
        let remembered = account_cache(16, ErrorPolicy::IgnoreTransient);
        let forgotten = account_cache(16, ErrorPolicy::IgnoreAll);

        for (cache, expected_calls) in [(remembered, 1), (forgotten, 2)] {
            let calls = AtomicUsize::new(0);
            for _ in 0..2 {
                let err = cache
                    .load_one("id", "404ID", || async {
                        calls.fetch_add(1, Ordering::Relaxed);
                        Err(Error::not_found())
                    })
                    .await
                    .unwrap_err();
                assert!(err.is_not_found());
            }
            assert_eq!(calls.load(Ordering::Relaxed), expected_calls, "cache: {cache:?}");
            // Remembered errors are not values.
            assert!(cache.get_one("id", "404ID").is_none());
        }
    }

    #[test_log::test(tokio::test)]
    async fn test_negative_result_invalidated() {
        let cache = account_cache(16, ErrorPolicy::IgnoreTransient);
        let err = cache
            .load_one("id", "01ID", || async { Err(Error::not_found()) })
            .await
            .unwrap_err();
        assert!(err.is_not_found());

        // The account gets created, its creator invalidates the key.
        cache.invalidate("id", ["01ID"]);
        let got = cache
            .load_one("id", "01ID", || async { Ok(account("01ID", "alice", "")) })
            .await
            .unwrap();
        assert_eq!(got.username, "alice");
    }

    #[test_log::test(tokio::test)]
    async fn test_cancelled_load_releases_slot() {
        let cache = account_cache(16, ErrorPolicy::IgnoreAll);

        let res = tokio::time::timeout(
            Duration::from_millis(20),
            cache.load_one("id", "01ID", || async {
                tokio::time::sleep(Duration::from_secs(10)).await;
                Ok(account("01ID", "alice", ""))
            }),
        )
        .await;
        assert!(res.is_err());
        assert!(cache.is_empty());

        let got = cache
            .load_one("id", "01ID", || async { Ok(account("01ID", "bob", "")) })
            .await
            .unwrap();
        assert_eq!(got.username, "bob");
    }

    #[test_log::test(tokio::test(flavor = "multi_thread", worker_threads = 2))]
    async fn test_waiter_takes_over_cancelled_leader() {
        let cache = account_cache(16, ErrorPolicy::IgnoreAll);
        let calls = Arc::new(AtomicUsize::new(0));

        let leader = {
            let cache = cache.clone();
            let calls = calls.clone();
            tokio::spawn(async move {
                cache
                    .load_one("id", "01ID", || async move {
                        calls.fetch_add(1, Ordering::Relaxed);
                        tokio::time::sleep(Duration::from_secs(10)).await;
                        Ok(account("01ID", "leader", ""))
                    })
                    .await
            })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;

        let waiter = {
            let cache = cache.clone();
            let calls = calls.clone();
            tokio::spawn(async move {
                cache
                    .load_one("id", "01ID", || async move {
                        calls.fetch_add(1, Ordering::Relaxed);
                        Ok(account("01ID", "waiter", ""))
                    })
                    .await
            })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;
        // The waiter is queued behind the leader and has not loaded.
        assert_eq!(calls.load(Ordering::Relaxed), 1);

        leader.abort();
        assert!(leader.await.unwrap_err().is_cancelled());

        let got = waiter.await.unwrap().unwrap();
        assert_eq!(got.username, "waiter");
        assert_eq!(calls.load(Ordering::Relaxed), 2);
        assert_eq!(cache.get_one("id", "01ID").unwrap().username, "waiter");
    }

    #[test_log::test(tokio::test(flavor = "multi_thread", worker_threads = 2))]
    async fn test_load_overtaken_by_invalidation_not_stored() {
        let cache = account_cache(16, ErrorPolicy::IgnoreAll);

        let loading = {
            let cache = cache.clone();
            tokio::spawn(async move {
                cache
                    .load_one("id", "01ID", || async {
                        tokio::time::sleep(Duration::from_millis(100)).await;
                        Ok(account("01ID", "stale", ""))
                    })
                    .await
            })
        };
        tokio::time::sleep(Duration::from_millis(30)).await;
        cache.invalidate("id", ["01ID"]);

        // The caller still gets its answer...
        assert_eq!(loading.await.unwrap().unwrap().username, "stale");
        // ... but the possibly stale value is not kept.
        assert!(cache.get_one("id", "01ID").is_none());
    }

    #[test_log::test(tokio::test)]
    async fn test_load_survives_unrelated_writes() {
        let cache = account_cache(16, ErrorPolicy::IgnoreAll);

        let got = cache
            .load_one("id", "01ID", || async {
                cache.put(&account("02ID", "bob", "ex.org"));
                cache.invalidate("id", ["03ID"]);
                Ok(account("01ID", "alice", "ex.org"))
            })
            .await
            .unwrap();
        assert_eq!(got.username, "alice");
        assert_eq!(cache.get_one("id", "01ID").unwrap().username, "alice");
        assert_eq!(cache.len(), 2);
    }

    #[test_log::test(tokio::test)]
    async fn test_load_overtaken_through_other_index_not_stored() {
        let cache = account_cache(16, ErrorPolicy::IgnoreAll);

        // Nothing is resident, the invalidation by URI still concerns the account being loaded by ID.
        cache
            .load_one("id", "01ID", || async {
                cache.invalidate("uri", ["https://ex/u/alice"]);
                Ok(account("01ID", "alice", ""))
            })
            .await
            .unwrap();
        assert!(cache.is_empty());

        // So does a clear.
        cache
            .load_one("id", "01ID", || async {
                cache.clear();
                Ok(account("01ID", "alice", ""))
            })
            .await
            .unwrap();
        assert!(cache.is_empty());
    }

    #[test_log::test(tokio::test)]
    async fn test_batch_load_drops_only_overtaken_values() {
        let cache = account_cache(16, ErrorPolicy::IgnoreAll);

        let got = cache
            .load_ids("id", &["01ID", "02ID"], |_| async {
                cache.invalidate("id", ["02ID"]);
                Ok(vec![account("01ID", "alice", ""), account("02ID", "bob", "")])
            })
            .await
            .unwrap();
        assert_eq!(got.len(), 2);
        assert!(cache.get_one("id", "01ID").is_some());
        assert!(cache.get_one("id", "02ID").is_none());

        // The load is over, later writes are not logged against it.
        cache.put(&account("03ID", "carol", ""));
        let state = cache.inner.state.lock();
        assert_eq!(state.loads, 0);
        assert!(state.writes.is_empty());
    }

    #[test_log::test(tokio::test)]
    async fn test_batch_load() {
        let cache = account_cache(16, ErrorPolicy::IgnoreTransient);
        cache.put(&account("02ID", "bob", ""));

        let requested = Arc::new(Mutex::new(vec![]));
        let ids = ["03ID", "02ID", "01ID"];
        let got = cache
            .load_ids("id", &ids, |missing| {
                let requested = requested.clone();
                async move {
                    *requested.lock() = missing.clone();
                    // Storage returns rows in its own order.
                    Ok(vec![account("01ID", "alice", ""), account("03ID", "carol", "")])
                }
            })
            .await
            .unwrap();

        assert_eq!(*requested.lock(), vec!["03ID".to_string(), "01ID".to_string()]);
        let ids: Vec<_> = got.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["03ID", "02ID", "01ID"]);

        // Everything is cached now, the loader is not called.
        let got = cache
            .load_ids("id", &["01ID", "03ID"], |_| async { panic!("unexpected load") })
            .await
            .unwrap();
        assert_eq!(got.len(), 2);
    }

    #[test_log::test(tokio::test)]
    async fn test_batch_load_error_not_cached() {
        let cache = account_cache(16, ErrorPolicy::IgnoreTransient);
        let err = cache
            .load_ids("id", &["01ID"], |_| async { Err(Error::new(ErrorKind::External, "boom")) })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::External);
        assert!(cache.is_empty());
    }

    #[test_log::test(tokio::test)]
    async fn test_batch_load_2part() {
        let cache = account_cache(16, ErrorPolicy::IgnoreTransient);
        cache.put(&account("01ID", "alice", "ex.org"));

        let got = cache
            .load_ids_2part("domain,username", "ex.org", &["alice", "bob"], |missing| async move {
                assert_eq!(missing, vec!["bob".to_string()]);
                Ok(vec![account("02ID", "bob", "ex.org")])
            })
            .await
            .unwrap();
        let names: Vec<_> = got.iter().map(|a| a.username.as_str()).collect();
        assert_eq!(names, vec!["alice", "bob"]);
    }

    #[test_log::test(tokio::test)]
    async fn test_store() {
        let cache = account_cache(16, ErrorPolicy::IgnoreAll);
        let hooks = Arc::new(AtomicUsize::new(0));
        let counter = hooks.clone();
        cache.set_invalidate_hook(move |_| {
            counter.fetch_add(1, Ordering::Relaxed);
        });

        let alice = account("01ID", "alice", "");
        cache.store(&alice, || async { Ok(()) }).await.unwrap();
        assert!(cache.get_one("id", "01ID").is_some());
        assert_eq!(hooks.load(Ordering::Relaxed), 1);

        let bob = account("02ID", "bob", "");
        let err = cache
            .store(&bob, || async { Err(Error::already_exists()) })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AlreadyExists);
        assert!(cache.get_one("id", "02ID").is_none());
        assert_eq!(hooks.load(Ordering::Relaxed), 1);
    }

    #[test_log::test(tokio::test)]
    async fn test_sweeper_lifecycle() {
        let cache = account_cache(16, ErrorPolicy::IgnoreAll);
        cache.set_ttl(Some(Duration::from_millis(10)));
        cache.put(&account("01ID", "alice", ""));

        assert!(cache.start(Duration::from_millis(10)));
        // Already running.
        assert!(cache.start(Duration::from_millis(10)));

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(cache.is_empty());

        assert!(cache.stop());
        assert!(cache.stop());
    }

    #[test_log::test]
    fn test_start_without_runtime() {
        let cache = account_cache(16, ErrorPolicy::IgnoreAll);
        assert!(!cache.start(Duration::from_secs(1)));
        assert!(cache.stop());
    }

    #[test_log::test]
    fn test_weak_handle() {
        let cache = account_cache(16, ErrorPolicy::IgnoreAll);
        let weak = cache.downgrade();
        assert!(weak.upgrade().is_some());
        drop(cache);
        assert!(weak.upgrade().is_none());
    }

    #[test_log::test]
    fn test_fuzzy() {
        const CAPACITY: usize = 64;
        const THREADS: usize = 8;
        const OPS: usize = 10_000;

        let cache = account_cache(CAPACITY, ErrorPolicy::IgnoreAll);

        let handles = (0..THREADS)
            .map(|t| {
                let cache = cache.clone();
                std::thread::spawn(move || {
                    let mut rng = SmallRng::seed_from_u64(t as u64);
                    for _ in 0..OPS {
                        let i = rng.random_range(0..CAPACITY * 4);
                        let id = format!("{i:04}");
                        match rng.random_range(0..4) {
                            0 => cache.put(&account(&id, &format!("user{i}"), "ex.org")),
                            1 => cache.invalidate("id", [id.as_str()]),
                            _ => {
                                if let Some(a) = cache.get_one("username,domain", (format!("user{i}"), "ex.org")) {
                                    assert_eq!(a.id, id);
                                }
                            }
                        }
                        assert!(cache.len() <= CAPACITY);
                    }
                })
            })
            .collect::<Vec<_>>();

        for handle in handles {
            handle.join().unwrap();
        }
        assert!(cache.len() <= CAPACITY);
        assert_eq!(cache.get("domain", ["ex.org"]).len(), cache.len());
    }
}
