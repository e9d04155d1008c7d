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

use std::fmt::Debug;

use metrics::{counter, gauge, Counter, Gauge};

/// Metric handles of one in-memory cache instance.
///
/// Handles are registered once at construction and labelled with the cache name, so the hot path only bumps
/// atomics owned by the installed recorder (or nothing, if no recorder is installed).
#[derive(Clone)]
pub struct Metrics {
    /// Lookups answered from the cache.
    pub memory_hit: Counter,
    /// Lookups not answered from the cache.
    pub memory_miss: Counter,
    /// Values (or negative results) stored.
    pub memory_insert: Counter,
    /// Entries dropped to honor the capacity bound.
    pub memory_evict: Counter,
    /// Entries dropped because their TTL elapsed.
    pub memory_expire: Counter,
    /// Entries dropped by explicit invalidation.
    pub memory_invalidate: Counter,
    /// Loader invocations.
    pub memory_load: Counter,
    /// Loader invocations that returned an error.
    pub memory_load_error: Counter,

    /// Resident entry count.
    pub memory_usage: Gauge,
}

impl Debug for Metrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Metrics").finish()
    }
}

impl Metrics {
    /// Register the metric handles for the cache named `name`.
    pub fn new(name: &str) -> Self {
        let memory_hit = counter!("fedcache_memory_op_total", "name" => name.to_string(), "op" => "hit");
        let memory_miss = counter!("fedcache_memory_op_total", "name" => name.to_string(), "op" => "miss");
        let memory_insert = counter!("fedcache_memory_op_total", "name" => name.to_string(), "op" => "insert");
        let memory_evict = counter!("fedcache_memory_op_total", "name" => name.to_string(), "op" => "evict");
        let memory_expire = counter!("fedcache_memory_op_total", "name" => name.to_string(), "op" => "expire");
        let memory_invalidate =
            counter!("fedcache_memory_op_total", "name" => name.to_string(), "op" => "invalidate");
        let memory_load = counter!("fedcache_memory_op_total", "name" => name.to_string(), "op" => "load");
        let memory_load_error =
            counter!("fedcache_memory_op_total", "name" => name.to_string(), "op" => "load_error");

        let memory_usage = gauge!("fedcache_memory_usage", "name" => name.to_string());

        Self {
            memory_hit,
            memory_miss,
            memory_insert,
            memory_evict,
            memory_expire,
            memory_invalidate,
            memory_load,
            memory_load_error,
            memory_usage,
        }
    }
}
