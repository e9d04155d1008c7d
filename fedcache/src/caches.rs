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

use std::{mem::size_of, time::Duration};

use fedcache_common::retry::try_until;
use fedcache_memory::{
    CachedDecision, CapacityPlanner, DecisionCache, DomainCache, IndexedCache, Value, ID_LEN,
};

use crate::{
    config::{CacheConfig, ConfigError},
    db::DbCaches,
    invalidate,
};

const START_TRIES: usize = 5;

const INDEXED_CACHES: usize = 35;

/// An indexed cache of any value type.
trait AnyIndexed {
    fn name(&self) -> &str;
    fn start(&self, interval: Duration) -> bool;
    fn stop(&self) -> bool;
    fn trim(&self, percent: f64);
}

impl<T> AnyIndexed for IndexedCache<T>
where
    T: Value,
{
    fn name(&self) -> &str {
        IndexedCache::name(self)
    }

    fn start(&self, interval: Duration) -> bool {
        IndexedCache::start(self, interval)
    }

    fn stop(&self) -> bool {
        IndexedCache::stop(self)
    }

    fn trim(&self, percent: f64) {
        IndexedCache::trim(self, percent)
    }
}

/// All caches of a server process.
///
/// Built once at startup and shared by reference. Entity caches are wired together so that invalidating an entity
/// drops every cached state derived from it.
#[derive(Debug)]
pub struct Caches {
    /// Caches of storage rows and ID lists.
    pub db: DbCaches,
    /// Visibility, mute and filter decisions.
    pub visibility: DecisionCache,
    /// Blocked domains.
    pub domain_block: DomainCache,
    /// Explicitly allowed domains.
    pub domain_allow: DomainCache,

    sweep_interval: Duration,
}

impl Caches {
    /// Build every cache with a capacity planned from `config`, and install the invalidation hooks.
    pub fn new(config: &CacheConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let planner = CapacityPlanner::new(config.memory_target, config.ratios.iter().map(|(_, ratio)| ratio));
        tracing::info!(
            memory_target = config.memory_target,
            total_ratio = planner.total_ratio(),
            ttl = ?config.ttl,
            "[caches]: init"
        );

        let db = DbCaches::new(config, &planner);

        let decision_size = size_of::<CachedDecision>() + 3 * ID_LEN;
        let capacity = planner.result_cache_max(decision_size, config.ratios.visibility);
        tracing::info!(cache = "visibility", capacity, "[caches]: init");
        let visibility = DecisionCache::new("visibility", capacity, config.ttl);

        invalidate::register(&db, &visibility);

        Ok(Self {
            db,
            visibility,
            domain_block: DomainCache::new("domain_block"),
            domain_allow: DomainCache::new("domain_allow"),
            sweep_interval: config.sweep_interval,
        })
    }

    fn indexed(&self) -> [&dyn AnyIndexed; INDEXED_CACHES] {
        let db = &self.db;
        [
            &db.account,
            &db.account_note,
            &db.account_settings,
            &db.account_stats,
            &db.block,
            &db.conversation,
            &db.emoji,
            &db.emoji_category,
            &db.filter,
            &db.filter_keyword,
            &db.filter_status,
            &db.follow,
            &db.follow_request,
            &db.instance,
            &db.interaction_request,
            &db.list,
            &db.marker,
            &db.media,
            &db.mention,
            &db.moves,
            &db.notification,
            &db.poll,
            &db.poll_vote,
            &db.report,
            &db.sin_bin_status,
            &db.status,
            &db.status_bookmark,
            &db.status_edit,
            &db.status_fave,
            &db.tag,
            &db.thread_mute,
            &db.tombstone,
            &db.user,
            &db.user_mute,
            self.visibility.indexed(),
        ]
    }

    /// Start the TTL sweepers. Must be called within a tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics if a sweeper cannot be started after a few tries.
    pub fn start(&self) {
        for cache in self.indexed() {
            try_until(&format!("starting {} cache", cache.name()), START_TRIES, || {
                cache.start(self.sweep_interval)
            });
        }
        tracing::info!(interval = ?self.sweep_interval, "[caches]: started");
    }

    /// Stop the TTL sweepers.
    ///
    /// # Panics
    ///
    /// Panics if a sweeper cannot be stopped after a few tries.
    pub fn stop(&self) {
        for cache in self.indexed() {
            try_until(&format!("stopping {} cache", cache.name()), START_TRIES, || cache.stop());
        }
        tracing::info!("[caches]: stopped");
    }

    /// Evict least recently used entries of every cache down to `percent` of its capacity.
    pub fn trim(&self, percent: f64) {
        let db = &self.db;
        for cache in [
            &db.block_ids,
            &db.boost_of_ids,
            &db.conversation_last_status_ids,
            &db.filter_ids,
            &db.follow_ids,
            &db.follow_request_ids,
            &db.following_tag_ids,
            &db.in_reply_to_ids,
            &db.list_ids,
            &db.listed_ids,
            &db.poll_vote_ids,
            &db.status_bookmark_ids,
            &db.status_fave_ids,
            &db.user_mute_ids,
        ] {
            cache.trim(percent);
        }
        for cache in self.indexed() {
            cache.trim(percent);
        }
    }
}
