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

//! In-memory cache engines of fedcache.
//!
//! - [`IndexedCache`]: values addressable by several declared indices, copy on read, LRU bounded, TTL swept, with
//!   single-flight loads and an invalidation hook.
//! - [`SliceCache`]: LRU bounded ordered lists, typically ID lists.
//! - [`DomainCache`]: lazily loaded domain suffix set with lock free matching.
//! - [`DecisionCache`]: memoized boolean decisions that never remember unresolvable results.
//! - [`CapacityPlanner`]: entry count bounds from a global memory target.

mod decision;
mod domain;
mod eviction;
mod index;
mod indexed;
mod inflight;
mod key;
mod planner;
mod policy;
mod record;
mod slice;

mod prelude;
pub use prelude::*;

#[cfg(test)]
mod test_utils;
