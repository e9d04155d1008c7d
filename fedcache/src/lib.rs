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

//! The cache layer of a federated social server.
//!
//! [`Caches`](prelude::Caches) holds one cache per storage entity, ID list caches, a decision cache and domain
//! permission caches. Invalidating an entity through its cache cascades to every cache holding state derived from it.
//!
//! ```
//! use fedcache::prelude::*;
//!
//! let caches = Caches::new(&CacheConfig::default()).unwrap();
//! caches.db.account.put(&Account {
//!     id: "01ID".to_string(),
//!     uri: "https://ex/u/a".to_string(),
//!     ..Default::default()
//! });
//! assert!(caches.db.account.get_one("uri", "https://ex/u/a").is_some());
//!
//! caches.db.account.invalidate_ids("id", ["01ID"]);
//! assert!(caches.db.account.get_one("uri", "https://ex/u/a").is_none());
//! ```

mod caches;
pub mod config;
mod counts;
mod db;
mod invalidate;
pub mod models;
pub mod sizes;

/// Re-exports of everything needed to use the caches.
pub mod prelude;
