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

//! Cross-cache invalidation.
//!
//! When an entity leaves its cache, everything derived from it must leave too: ID lists that contain it, decisions
//! made about it, and models whose cached form depends on it. Each entity cache gets a hook that runs these
//! cascades. Hooks run after the source cache has released its lock, and a cascade that reaches back to an entity
//! already removed finds nothing and stops there.

use std::sync::Arc;

use fedcache_memory::{DecisionCache, DecisionType, IndexedCache, SliceCache, Value, WeakIndexedCache};

use crate::{counts::LocalCounts, db::DbCaches, models::*};

/// Holds the targets of every cascade.
///
/// Entity caches are held weakly: they own the hooks that own the invalidator.
#[derive(Debug)]
pub(crate) struct Invalidator {
    account: WeakIndexedCache<Account>,
    account_stats: WeakIndexedCache<AccountStats>,
    emoji: WeakIndexedCache<Emoji>,
    filter: WeakIndexedCache<Filter>,
    filter_keyword: WeakIndexedCache<FilterKeyword>,
    filter_status: WeakIndexedCache<FilterStatus>,
    follow: WeakIndexedCache<Follow>,
    follow_request: WeakIndexedCache<FollowRequest>,
    media: WeakIndexedCache<MediaAttachment>,
    moves: WeakIndexedCache<Move>,
    poll: WeakIndexedCache<Poll>,
    poll_vote: WeakIndexedCache<PollVote>,
    status: WeakIndexedCache<Status>,

    block_ids: SliceCache<String>,
    boost_of_ids: SliceCache<String>,
    conversation_last_status_ids: SliceCache<String>,
    filter_ids: SliceCache<String>,
    follow_ids: SliceCache<String>,
    follow_request_ids: SliceCache<String>,
    in_reply_to_ids: SliceCache<String>,
    list_ids: SliceCache<String>,
    listed_ids: SliceCache<String>,
    poll_vote_ids: SliceCache<String>,
    status_bookmark_ids: SliceCache<String>,
    status_fave_ids: SliceCache<String>,
    user_mute_ids: SliceCache<String>,

    visibility: DecisionCache,
    local_counts: Arc<LocalCounts>,
}

fn invalidate_ids<T, S>(cache: &WeakIndexedCache<T>, index: &str, ids: impl IntoIterator<Item = S>)
where
    T: Value,
    S: AsRef<str>,
{
    if let Some(cache) = cache.upgrade() {
        cache.invalidate_ids(index, ids);
    }
}

fn non_empty(id: &str) -> Option<&str> {
    (!id.is_empty()).then_some(id)
}

impl Invalidator {
    fn new(db: &DbCaches, visibility: &DecisionCache) -> Self {
        Self {
            account: db.account.downgrade(),
            account_stats: db.account_stats.downgrade(),
            emoji: db.emoji.downgrade(),
            filter: db.filter.downgrade(),
            filter_keyword: db.filter_keyword.downgrade(),
            filter_status: db.filter_status.downgrade(),
            follow: db.follow.downgrade(),
            follow_request: db.follow_request.downgrade(),
            media: db.media.downgrade(),
            moves: db.moves.downgrade(),
            poll: db.poll.downgrade(),
            poll_vote: db.poll_vote.downgrade(),
            status: db.status.downgrade(),
            block_ids: db.block_ids.clone(),
            boost_of_ids: db.boost_of_ids.clone(),
            conversation_last_status_ids: db.conversation_last_status_ids.clone(),
            filter_ids: db.filter_ids.clone(),
            follow_ids: db.follow_ids.clone(),
            follow_request_ids: db.follow_request_ids.clone(),
            in_reply_to_ids: db.in_reply_to_ids.clone(),
            list_ids: db.list_ids.clone(),
            listed_ids: db.listed_ids.clone(),
            poll_vote_ids: db.poll_vote_ids.clone(),
            status_bookmark_ids: db.status_bookmark_ids.clone(),
            status_fave_ids: db.status_fave_ids.clone(),
            user_mute_ids: db.user_mute_ids.clone(),
            visibility: visibility.clone(),
            local_counts: db.local_counts.clone(),
        }
    }

    pub fn on_account(&self, account: &Account) {
        tracing::trace!(id = account.id, "[invalidate]: account");

        self.visibility.invalidate_subjects([&account.id]);
        if account.is_local() {
            invalidate_ids(&self.account_stats, "account_id", [&account.id]);
            self.visibility.invalidate_requesters([&account.id]);
        }

        let id = &account.id;
        self.follow_ids
            .invalidate([format!(">{id}"), format!("l>{id}"), format!("<{id}"), format!("l<{id}")]);
        self.follow_request_ids.invalidate([format!(">{id}"), format!("<{id}")]);
        self.block_ids.invalidate([id]);

        if let Some(uri) = non_empty(&account.uri) {
            invalidate_ids(&self.moves, "origin_uri", [uri]);
            invalidate_ids(&self.moves, "target_uri", [uri]);
        }
    }

    pub fn on_block(&self, block: &Block) {
        self.visibility
            .invalidate_subjects([&block.account_id, &block.target_account_id]);
        // Only decisions made for local accounts are cached.
        if block.account.as_ref().is_none_or(|a| a.is_local()) {
            self.visibility.invalidate_requesters([&block.account_id]);
        }
        if block.target_account.as_ref().is_none_or(|a| a.is_local()) {
            self.visibility.invalidate_requesters([&block.target_account_id]);
        }
        self.block_ids.invalidate([&block.account_id]);
    }

    pub fn on_conversation(&self, conversation: &Conversation) {
        self.conversation_last_status_ids
            .invalidate([&conversation.account_id]);
    }

    pub fn on_emoji_category(&self, category: &EmojiCategory) {
        invalidate_ids(&self.emoji, "category_id", [&category.id]);
    }

    pub fn on_filter(&self, filter: &Filter) {
        self.filter_ids.invalidate([&filter.account_id]);
        invalidate_ids(&self.filter_keyword, "id", &filter.keyword_ids);
        invalidate_ids(&self.filter_status, "id", &filter.status_ids);
        self.visibility
            .invalidate_requester_kinds(&filter.account_id, &DecisionType::FILTERS);
    }

    pub fn on_filter_keyword(&self, keyword: &FilterKeyword) {
        invalidate_ids(&self.filter, "id", [&keyword.filter_id]);
    }

    pub fn on_filter_status(&self, status: &FilterStatus) {
        invalidate_ids(&self.filter, "id", [&status.filter_id]);
    }

    pub fn on_follow(&self, follow: &Follow) {
        invalidate_ids(&self.follow_request, "id", [&follow.id]);

        self.visibility
            .invalidate_subjects([&follow.account_id, &follow.target_account_id]);
        if follow.account.as_ref().is_none_or(|a| a.is_local()) {
            self.visibility.invalidate_requesters([&follow.account_id]);
        }
        if follow.target_account.as_ref().is_none_or(|a| a.is_local()) {
            self.visibility.invalidate_requesters([&follow.target_account_id]);
        }

        let (a, t) = (&follow.account_id, &follow.target_account_id);
        self.follow_ids.invalidate([
            format!(">{a}"),
            format!("l>{a}"),
            format!("<{a}"),
            format!("l<{a}"),
            format!(">{t}"),
            format!("l>{t}"),
            format!("<{t}"),
            format!("l<{t}"),
        ]);
        self.list_ids
            .invalidate([format!("a{a}"), format!("a{t}"), format!("f{}", follow.id)]);
    }

    pub fn on_follow_request(&self, request: &FollowRequest) {
        invalidate_ids(&self.follow, "id", [&request.id]);

        let (a, t) = (&request.account_id, &request.target_account_id);
        self.follow_request_ids
            .invalidate([format!(">{a}"), format!("<{a}"), format!(">{t}"), format!("<{t}")]);
    }

    pub fn on_instance(&self, instance: &Instance) {
        tracing::trace!(domain = instance.domain, "[invalidate]: instance");
        self.local_counts.domains.reset();
    }

    pub fn on_list(&self, list: &List) {
        self.list_ids.invalidate([format!("a{}", list.account_id)]);
        self.listed_ids
            .invalidate([format!("a{}", list.id), format!("f{}", list.id)]);
    }

    pub fn on_media(&self, media: &MediaAttachment) {
        if media.avatar || media.header {
            if let Some(account_id) = non_empty(&media.account_id) {
                invalidate_ids(&self.account, "id", [account_id]);
            }
        }
        if let Some(status_id) = non_empty(&media.status_id) {
            invalidate_ids(&self.status, "id", [status_id]);
        }
    }

    pub fn on_poll(&self, poll: &Poll) {
        invalidate_ids(&self.poll_vote, "poll_id", [&poll.id]);
        self.poll_vote_ids.invalidate([&poll.id]);
    }

    pub fn on_poll_vote(&self, vote: &PollVote) {
        invalidate_ids(&self.poll, "id", [&vote.poll_id]);
        self.poll_vote_ids.invalidate([&vote.poll_id]);
    }

    pub fn on_status(&self, status: &Status) {
        tracing::trace!(id = status.id, "[invalidate]: status");

        invalidate_ids(&self.account_stats, "account_id", [&status.account_id]);

        self.visibility.invalidate_subjects([&status.id]);
        if let Some(thread_id) = non_empty(&status.thread_id) {
            self.visibility.invalidate_threads([thread_id]);
        }

        invalidate_ids(&self.media, "id", &status.attachment_ids);

        if let Some(boost_of_id) = non_empty(&status.boost_of_id) {
            self.boost_of_ids.invalidate([boost_of_id]);
        }
        if let Some(in_reply_to_id) = non_empty(&status.in_reply_to_id) {
            self.in_reply_to_ids.invalidate([in_reply_to_id]);
        }
        if let Some(poll_id) = non_empty(&status.poll_id) {
            invalidate_ids(&self.poll, "id", [poll_id]);
        }

        if status.local {
            self.local_counts.statuses.reset();
        }
    }

    pub fn on_status_bookmark(&self, bookmark: &StatusBookmark) {
        self.status_bookmark_ids.invalidate([&bookmark.status_id]);
    }

    pub fn on_status_edit(&self, edit: &StatusEdit) {
        invalidate_ids(&self.status, "id", [&edit.status_id]);
    }

    pub fn on_status_fave(&self, fave: &StatusFave) {
        self.status_fave_ids.invalidate([&fave.status_id]);
    }

    pub fn on_thread_mute(&self, mute: &ThreadMute) {
        self.visibility
            .invalidate_requester_thread(&mute.account_id, &mute.thread_id);
    }

    pub fn on_user(&self, user: &User) {
        self.visibility.invalidate_subjects([&user.account_id]);
        self.visibility.invalidate_requesters([&user.account_id]);
        self.local_counts.users.reset();
    }

    pub fn on_user_mute(&self, mute: &UserMute) {
        self.user_mute_ids.invalidate([&mute.account_id]);
        self.visibility
            .invalidate_requester_kinds(&mute.account_id, &DecisionType::MUTES);
    }
}

fn hook<T>(cache: &IndexedCache<T>, invalidator: &Arc<Invalidator>, f: fn(&Invalidator, &T))
where
    T: Value,
{
    let invalidator = invalidator.clone();
    cache.set_invalidate_hook(move |value| f(&invalidator, value));
}

/// Install the cascade hooks on the entity caches of `db`.
///
/// # Panics
///
/// Panics if a hook is already installed.
pub(crate) fn register(db: &DbCaches, visibility: &DecisionCache) {
    let invalidator = Arc::new(Invalidator::new(db, visibility));

    hook(&db.account, &invalidator, Invalidator::on_account);
    hook(&db.block, &invalidator, Invalidator::on_block);
    hook(&db.conversation, &invalidator, Invalidator::on_conversation);
    hook(&db.emoji_category, &invalidator, Invalidator::on_emoji_category);
    hook(&db.filter, &invalidator, Invalidator::on_filter);
    hook(&db.filter_keyword, &invalidator, Invalidator::on_filter_keyword);
    hook(&db.filter_status, &invalidator, Invalidator::on_filter_status);
    hook(&db.follow, &invalidator, Invalidator::on_follow);
    hook(&db.follow_request, &invalidator, Invalidator::on_follow_request);
    hook(&db.instance, &invalidator, Invalidator::on_instance);
    hook(&db.list, &invalidator, Invalidator::on_list);
    hook(&db.media, &invalidator, Invalidator::on_media);
    hook(&db.poll, &invalidator, Invalidator::on_poll);
    hook(&db.poll_vote, &invalidator, Invalidator::on_poll_vote);
    hook(&db.status, &invalidator, Invalidator::on_status);
    hook(&db.status_bookmark, &invalidator, Invalidator::on_status_bookmark);
    hook(&db.status_edit, &invalidator, Invalidator::on_status_edit);
    hook(&db.status_fave, &invalidator, Invalidator::on_status_fave);
    hook(&db.thread_mute, &invalidator, Invalidator::on_thread_mute);
    hook(&db.user, &invalidator, Invalidator::on_user);
    hook(&db.user_mute, &invalidator, Invalidator::on_user_mute);
}
