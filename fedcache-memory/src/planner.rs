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

use std::{mem::size_of, sync::Arc};

use crate::{
    key::{Key, KeyPart},
    record::Record,
};

/// Length of an ID string (a ULID).
pub const ID_LEN: usize = 26;

/// Estimated count of IDs in one cached ID list.
pub const ID_SLICE_LEN: usize = 250;

/// Worst case count of index keys one result is reachable from.
const LOOKUPS: usize = 10;

/// Fixed cost of one hash map bucket.
const BUCKET_OVERHEAD: f64 = 10.79;

/// Memory of an ID string.
const fn id_size() -> usize {
    size_of::<String>() + ID_LEN
}

/// Memory of one index key, estimated as a two-part key of IDs.
const fn result_key_size() -> usize {
    size_of::<Key>() + 2 * (size_of::<KeyPart>() + ID_LEN)
}

/// Memory a cache spends per entry besides its key and value.
const fn entry_overhead() -> usize {
    size_of::<Record<()>>() + size_of::<Arc<()>>() + 2 * size_of::<usize>()
}

/// Computes cache capacities from a global memory target and per-cache ratios.
///
/// Each cache gets the share `ratio / sum(ratios)` of the target, divided by its estimated per-entry footprint. A
/// negative ratio is a literal entry count instead.
///
/// The estimate is approximate, it only bounds memory growth.
#[derive(Debug, Clone)]
pub struct CapacityPlanner {
    memory_target: usize,
    total_ratio: f64,
}

impl CapacityPlanner {
    /// Create a planner for `memory_target` bytes shared by caches with the given ratios.
    ///
    /// Negative ratios take no share of the target.
    pub fn new(memory_target: usize, ratios: impl IntoIterator<Item = f64>) -> Self {
        let total_ratio = ratios.into_iter().filter(|ratio| *ratio > 0.0).sum();
        Self {
            memory_target,
            total_ratio,
        }
    }

    /// Get the sum of all positive ratios.
    pub fn total_ratio(&self) -> f64 {
        self.total_ratio
    }

    /// Capacity of a cache with entries of `key_size` + `value_size` bytes. Never less than one.
    pub fn cache_max(&self, key_size: usize, value_size: usize, ratio: f64) -> usize {
        if ratio < 0.0 {
            return (-ratio as usize).max(1);
        }
        if self.total_ratio <= 0.0 {
            return 1;
        }

        let memory = self.memory_target as f64 * (ratio / self.total_ratio);
        let entry = key_size as f64 + value_size as f64 + BUCKET_OVERHEAD + entry_overhead() as f64;
        ((memory / entry) as usize).max(1)
    }

    /// Capacity of an indexed cache of values of `value_size` bytes.
    pub fn result_cache_max(&self, value_size: usize, ratio: f64) -> usize {
        // Each index map holds a key and a pointer to the shared record.
        let key_size = LOOKUPS * result_key_size();
        let value_size = value_size + LOOKUPS * size_of::<Arc<()>>();
        self.cache_max(key_size, value_size, ratio)
    }

    /// Capacity of a slice cache of ID lists.
    pub fn slice_cache_max(&self, ratio: f64) -> usize {
        let value_size = size_of::<Vec<String>>() + ID_SLICE_LEN * id_size();
        self.cache_max(id_size(), value_size, ratio)
    }
}
