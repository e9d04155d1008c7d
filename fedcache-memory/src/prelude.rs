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

pub use fedcache_common::{
    code::Value,
    error::{Error, ErrorKind, Result},
};

pub use crate::{
    decision::{CachedDecision, DecisionCache, DecisionType, Verdict, NO_REQUESTER},
    domain::DomainCache,
    index::Index,
    indexed::{CopyFn, IndexedCache, IndexedCacheBuilder, InvalidateHook, WeakIndexedCache},
    key::{IntoKey, Key, KeyPart},
    planner::{CapacityPlanner, ID_LEN, ID_SLICE_LEN},
    policy::ErrorPolicy,
    slice::SliceCache,
};
