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
    fmt::Debug,
    sync::atomic::{AtomicU64, Ordering},
};

use fedcache_common::error::Error;
use intrusive_collections::LinkedListAtomicLink;

use crate::key::Key;

/// Expiry of a record that never expires.
pub const NEVER: u64 = u64::MAX;

/// What a record holds: a cached value, or a cached loader failure.
pub enum Data<T> {
    Value(T),
    Error(Error),
}

/// [`Record`] holds one resident entry of an indexed cache.
///
/// A record is shared by every index map it is reachable from and by the LRU list. Its data and keys never change
/// after creation. Replacing a value always means creating a new record.
pub struct Record<T> {
    pub(crate) link: LinkedListAtomicLink,
    data: Data<T>,
    /// Key per declared index, `None` where the record is not indexed.
    keys: Box<[Option<Key>]>,
    /// Nanoseconds since the cache epoch.
    expires_at: AtomicU64,
}

impl<T> Debug for Record<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Record")
            .field("keys", &self.keys)
            .field("is_error", &matches!(self.data, Data::Error(_)))
            .field("expires_at", &self.expires_at.load(Ordering::Relaxed))
            .finish()
    }
}

impl<T> Record<T> {
    /// Create a record.
    pub fn new(data: Data<T>, keys: Box<[Option<Key>]>, expires_at: u64) -> Self {
        Self {
            link: LinkedListAtomicLink::new(),
            data,
            keys,
            expires_at: AtomicU64::new(expires_at),
        }
    }

    /// Get the record data.
    pub fn data(&self) -> &Data<T> {
        &self.data
    }

    /// Get the value, if the record holds one.
    pub fn value(&self) -> Option<&T> {
        match &self.data {
            Data::Value(v) => Some(v),
            Data::Error(_) => None,
        }
    }

    /// Get the keys of the record, one slot per declared index.
    pub fn keys(&self) -> &[Option<Key>] {
        &self.keys
    }

    /// Whether the record is in the LRU list.
    pub fn is_linked(&self) -> bool {
        self.link.is_linked()
    }

    /// Whether the record is expired at `now`.
    pub fn is_expired(&self, now: u64) -> bool {
        self.expires_at.load(Ordering::Relaxed) <= now
    }

    /// Set the expiry.
    pub fn set_expires_at(&self, expires_at: u64) {
        self.expires_at.store(expires_at, Ordering::Relaxed);
    }
}
