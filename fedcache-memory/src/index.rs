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

use crate::key::Key;

/// A named lookup path into an [`IndexedCache`](crate::IndexedCache).
///
/// The key of an index is computed by a plain function over the cached value, e.g.
///
/// ```rust
/// # use fedcache_memory::{Index, IntoKey};
/// struct Follow {
///     account_id: String,
///     target_account_id: String,
/// }
///
/// let index = Index::unique("account_id,target_account_id", |f: &Follow| {
///     (f.account_id.as_str(), f.target_account_id.as_str()).into_key()
/// });
/// ```
///
/// The name is only used to address the index in lookups and invalidations. By convention it lists the fields the
/// key is built from.
pub struct Index<T> {
    name: &'static str,
    key: fn(&T) -> Key,
    multiple: bool,
    allow_zero: bool,
}

impl<T> Debug for Index<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Index")
            .field("name", &self.name)
            .field("multiple", &self.multiple)
            .field("allow_zero", &self.allow_zero)
            .finish()
    }
}

impl<T> Index<T> {
    /// Declare an index whose key identifies at most one value.
    ///
    /// Storing a value under a key that another value owns displaces the prior owner from the cache.
    pub fn unique(name: &'static str, key: fn(&T) -> Key) -> Self {
        Self {
            name,
            key,
            multiple: false,
            allow_zero: false,
        }
    }

    /// Declare an index whose key may map to many values.
    pub fn multiple(name: &'static str, key: fn(&T) -> Key) -> Self {
        Self {
            name,
            key,
            multiple: true,
            allow_zero: false,
        }
    }

    /// Index keys that contain zero-valued fields too.
    ///
    /// By default a value is not indexed under a key that has any empty or zero field.
    pub fn allow_zero(mut self) -> Self {
        self.allow_zero = true;
        self
    }

    /// Get the index name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Whether one key may map to many values.
    pub fn is_multiple(&self) -> bool {
        self.multiple
    }

    /// Compute the key of `value`, or `None` if the value must not be indexed under this index.
    pub fn key_of(&self, value: &T) -> Option<Key> {
        let key = (self.key)(value);
        if !self.allow_zero && key.has_zero() {
            return None;
        }
        Some(key)
    }
}
