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

use fedcache_common::strict_assert;
use intrusive_collections::{intrusive_adapter, LinkedList, LinkedListAtomicLink};

use crate::record::Record;

intrusive_adapter! { Adapter<T> = Arc<Record<T>>: Record<T> { link => LinkedListAtomicLink } }

/// Recency list of the resident records of one cache.
///
/// The front is the most recently used record. With a fixed TTL, touching a record also refreshes its expiry, so the
/// list is ordered by expiry too and the TTL sweep only has to look at the back.
pub struct Lru<T> {
    list: LinkedList<Adapter<T>>,
    len: usize,
}

impl<T> Default for Lru<T> {
    fn default() -> Self {
        Self {
            list: LinkedList::new(Adapter::new()),
            len: 0,
        }
    }
}

impl<T> Lru<T> {
    pub fn push(&mut self, record: Arc<Record<T>>) {
        strict_assert!(!record.is_linked());
        self.list.push_front(record);
        self.len += 1;
    }

    /// Pop the least recently used record.
    pub fn pop(&mut self) -> Option<Arc<Record<T>>> {
        let record = self.list.pop_back()?;
        self.len -= 1;
        Some(record)
    }

    /// Peek the least recently used record.
    pub fn peek(&self) -> Option<&Record<T>> {
        self.list.back().get()
    }

    pub fn remove(&mut self, record: &Arc<Record<T>>) {
        if !record.is_linked() {
            return;
        }
        unsafe { self.list.remove_from_ptr(Arc::as_ptr(record)) };
        self.len -= 1;
    }

    /// Move the record to the front.
    pub fn touch(&mut self, record: &Arc<Record<T>>) {
        strict_assert!(record.is_linked());
        let record = unsafe { self.list.remove_from_ptr(Arc::as_ptr(record)) };
        self.list.push_front(record);
    }

    pub fn len(&self) -> usize {
        self.len
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        key::IntoKey,
        record::{Data, NEVER},
    };

    fn record(id: &str) -> Arc<Record<String>> {
        Arc::new(Record::new(
            Data::Value(id.to_string()),
            vec![Some(id.into_key())].into_boxed_slice(),
            NEVER,
        ))
    }

    fn value(record: &Record<String>) -> &str {
        record.value().unwrap()
    }

    #[test]
    fn test_lru_order() {
        let mut lru = Lru::default();
        let rs = ["a", "b", "c"].map(record);
        for r in rs.iter() {
            lru.push(r.clone());
        }
        assert_eq!(lru.len(), 3);
        assert_eq!(value(lru.peek().unwrap()), "a");

        lru.touch(&rs[0]);
        assert_eq!(value(lru.peek().unwrap()), "b");

        lru.remove(&rs[1]);
        assert!(!rs[1].is_linked());
        assert_eq!(lru.len(), 2);

        // Removing an unlinked record is a no-op.
        lru.remove(&rs[1]);
        assert_eq!(lru.len(), 2);

        assert_eq!(value(&lru.pop().unwrap()), "c");
        assert_eq!(value(&lru.pop().unwrap()), "a");
        assert!(lru.pop().is_none());
        assert_eq!(lru.len(), 0);
    }
}
