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

use fedcache_common::error::Result;
use hashbrown::hash_map::{Entry as HashMapEntry, HashMap};
use tokio::sync::oneshot;

use crate::key::Key;

pub type Notifier<T> = oneshot::Sender<Result<T>>;
pub type Waiter<T> = oneshot::Receiver<Result<T>>;

pub enum Enqueue<T> {
    /// No load is in flight for the key. The caller must run the loader and notify the waiters.
    Leader,
    /// Another caller is loading the key. Wait for its result.
    Waiter(Waiter<T>),
}

/// Loads in flight, per (index, key).
///
/// A slot exists while its leader is running the loader. When the leader finishes it takes the slot and notifies
/// every waiter. When the leader is dropped before finishing, the slot is taken without notification: the waiters
/// observe a closed channel and retry.
pub struct InflightMap<T> {
    inflights: HashMap<(usize, Key), Vec<Notifier<T>>>,
}

impl<T> Default for InflightMap<T> {
    fn default() -> Self {
        Self {
            inflights: HashMap::new(),
        }
    }
}

impl<T> InflightMap<T> {
    pub fn enqueue(&mut self, index: usize, key: &Key) -> Enqueue<T> {
        match self.inflights.entry((index, key.clone())) {
            HashMapEntry::Vacant(v) => {
                v.insert(vec![]);
                Enqueue::Leader
            }
            HashMapEntry::Occupied(mut o) => {
                let (tx, rx) = oneshot::channel();
                o.get_mut().push(tx);
                Enqueue::Waiter(rx)
            }
        }
    }

    pub fn take(&mut self, index: usize, key: &Key) -> Vec<Notifier<T>> {
        self.inflights.remove(&(index, key.clone())).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.inflights.len()
    }
}
