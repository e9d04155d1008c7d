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

use std::sync::Arc;

use arc_swap::ArcSwapOption;

/// An optional cached count.
#[derive(Debug, Default)]
pub struct Count {
    value: ArcSwapOption<u64>,
}

impl Count {
    /// Get the count, if known.
    pub fn get(&self) -> Option<u64> {
        self.value.load().as_deref().copied()
    }

    /// Set the count.
    pub fn set(&self, count: u64) {
        self.value.store(Some(Arc::new(count)));
    }

    /// Forget the count, so the next reader counts again.
    pub fn reset(&self) {
        self.value.store(None);
    }
}

/// Counts shown on the instance page, expensive to compute from storage.
#[derive(Debug, Default)]
pub struct LocalCounts {
    /// Known remote domains.
    pub domains: Count,
    /// Statuses authored by local accounts.
    pub statuses: Count,
    /// Local users.
    pub users: Count,
}
