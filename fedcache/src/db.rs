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

use std::{sync::Arc, time::Duration};

use fedcache_memory::{CapacityPlanner, ErrorPolicy, Index, IndexedCache, IndexedCacheBuilder, IntoKey, SliceCache};

use crate::{config::CacheConfig, counts::LocalCounts, models::*, sizes::Example};

/// Caches of storage rows and of ID lists derived from them.
///
/// Every entity cache keeps only permanent loader errors, e.g. a row that does not exist. Entity caches are keyed
/// the way storage queries them, see the index names. ID list caches are keyed by a prefix and an ID:
///
/// - follow IDs: `>id` follows of `id`, `<id` followers of `id`, `l>` and `l<` for local accounts only.
/// - follow request IDs: `>id` requests made by `id`, `<id` requests made to `id`.
/// - following tag IDs: `>id` tags followed by account `id`, `<id` accounts following tag `id`.
/// - list IDs: `a` + account ID for lists owned by the account, `f` + follow ID for lists containing the follow.
/// - listed IDs: `a` + list ID for the accounts in the list, `f` + list ID for the follows in the list.
/// - all others: the ID of the owning account or status.
#[derive(Debug)]
pub struct DbCaches {
    /// Accounts.
    pub account: IndexedCache<Account>,
    /// Private notes about accounts.
    pub account_note: IndexedCache<AccountNote>,
    /// Settings of local accounts.
    pub account_settings: IndexedCache<AccountSettings>,
    /// Stats of local accounts.
    pub account_stats: IndexedCache<AccountStats>,
    /// Blocks.
    pub block: IndexedCache<Block>,
    /// Blocked account IDs, by blocker.
    pub block_ids: SliceCache<String>,
    /// Boost IDs, by boosted status.
    pub boost_of_ids: SliceCache<String>,
    /// Conversations.
    pub conversation: IndexedCache<Conversation>,
    /// Last status IDs of conversations, by owning account.
    pub conversation_last_status_ids: SliceCache<String>,
    /// Emojis.
    pub emoji: IndexedCache<Emoji>,
    /// Emoji categories.
    pub emoji_category: IndexedCache<EmojiCategory>,
    /// Filters.
    pub filter: IndexedCache<Filter>,
    /// Filter IDs, by owner.
    pub filter_ids: SliceCache<String>,
    /// Filter keywords.
    pub filter_keyword: IndexedCache<FilterKeyword>,
    /// Filter statuses.
    pub filter_status: IndexedCache<FilterStatus>,
    /// Follows.
    pub follow: IndexedCache<Follow>,
    /// Follow IDs, by prefixed account ID.
    pub follow_ids: SliceCache<String>,
    /// Follow requests.
    pub follow_request: IndexedCache<FollowRequest>,
    /// Follow request IDs, by prefixed account ID.
    pub follow_request_ids: SliceCache<String>,
    /// Followed tag IDs or following account IDs, by prefixed account or tag ID.
    pub following_tag_ids: SliceCache<String>,
    /// Reply IDs, by parent status.
    pub in_reply_to_ids: SliceCache<String>,
    /// Instances.
    pub instance: IndexedCache<Instance>,
    /// Interactions pending or past approval.
    pub interaction_request: IndexedCache<InteractionRequest>,
    /// Lists.
    pub list: IndexedCache<List>,
    /// List IDs, by prefixed account or follow ID.
    pub list_ids: SliceCache<String>,
    /// Listed entry IDs, by prefixed list ID.
    pub listed_ids: SliceCache<String>,
    /// Timeline markers.
    pub marker: IndexedCache<Marker>,
    /// Media attachments.
    pub media: IndexedCache<MediaAttachment>,
    /// Mentions.
    pub mention: IndexedCache<Mention>,
    /// Account moves.
    pub moves: IndexedCache<Move>,
    /// Notifications.
    pub notification: IndexedCache<Notification>,
    /// Polls.
    pub poll: IndexedCache<Poll>,
    /// Poll votes.
    pub poll_vote: IndexedCache<PollVote>,
    /// Poll vote IDs, by poll.
    pub poll_vote_ids: SliceCache<String>,
    /// Reports.
    pub report: IndexedCache<Report>,
    /// Statuses of suspended accounts kept for moderation.
    pub sin_bin_status: IndexedCache<SinBinStatus>,
    /// Statuses.
    pub status: IndexedCache<Status>,
    /// Status bookmarks.
    pub status_bookmark: IndexedCache<StatusBookmark>,
    /// Bookmark IDs, by status.
    pub status_bookmark_ids: SliceCache<String>,
    /// Previous revisions of statuses.
    pub status_edit: IndexedCache<StatusEdit>,
    /// Status faves.
    pub status_fave: IndexedCache<StatusFave>,
    /// Fave IDs, by status.
    pub status_fave_ids: SliceCache<String>,
    /// Hashtags.
    pub tag: IndexedCache<Tag>,
    /// Thread mutes.
    pub thread_mute: IndexedCache<ThreadMute>,
    /// Tombstones.
    pub tombstone: IndexedCache<Tombstone>,
    /// Users.
    pub user: IndexedCache<User>,
    /// User mutes.
    pub user_mute: IndexedCache<UserMute>,
    /// Muted account IDs, by muting account.
    pub user_mute_ids: SliceCache<String>,
    /// Instance-wide counts.
    pub local_counts: Arc<LocalCounts>,
}

struct Planner<'a> {
    planner: &'a CapacityPlanner,
    ttl: Option<Duration>,
}

impl Planner<'_> {
    fn result<T>(&self, name: &'static str, ratio: f64) -> IndexedCacheBuilder<T>
    where
        T: Example + fedcache_memory::Value,
    {
        let capacity = self.planner.result_cache_max(T::model_size(), ratio);
        tracing::info!(cache = name, capacity, "[caches]: init");
        IndexedCache::builder(name, capacity, ErrorPolicy::IgnoreTransient).with_ttl(self.ttl)
    }

    fn slice(&self, name: &'static str, ratio: f64) -> SliceCache<String> {
        let capacity = self.planner.slice_cache_max(ratio);
        tracing::info!(cache = name, capacity, "[caches]: init");
        SliceCache::new(name, capacity)
    }
}

fn id(id: &str) -> fedcache_memory::Key {
    id.into_key()
}

impl DbCaches {
    /// Build all caches with capacities planned from `config`.
    pub fn new(config: &CacheConfig, planner: &CapacityPlanner) -> Self {
        let ratios = &config.ratios;
        let p = Planner {
            planner,
            ttl: config.ttl,
        };

        let account = p
            .result("account", ratios.account)
            .with_index(Index::unique("id", |a: &Account| id(&a.id)))
            .with_index(Index::unique("uri", |a: &Account| id(&a.uri)))
            .with_index(Index::unique("url", |a: &Account| id(&a.url)))
            .with_index(
                Index::unique("username,domain", |a: &Account| {
                    (a.username.as_str(), a.domain.as_str()).into_key()
                })
                .allow_zero(),
            )
            .with_index(Index::unique("public_key_uri", |a: &Account| id(&a.public_key_uri)))
            .with_index(Index::unique("inbox_uri", |a: &Account| id(&a.inbox_uri)))
            .with_index(Index::unique("outbox_uri", |a: &Account| id(&a.outbox_uri)))
            .with_index(Index::unique("followers_uri", |a: &Account| id(&a.followers_uri)))
            .with_index(Index::unique("following_uri", |a: &Account| id(&a.following_uri)))
            .with_copy(|a: &Account| Account {
                avatar_media_attachment: None,
                header_media_attachment: None,
                emojis: vec![],
                also_known_as: vec![],
                moved_to: None,
                moves: None,
                stats: None,
                ..a.clone()
            })
            .build();

        let account_note = p
            .result("account_note", ratios.account_note)
            .with_index(Index::unique("id", |n: &AccountNote| id(&n.id)))
            .with_index(Index::unique("account_id,target_account_id", |n: &AccountNote| {
                (n.account_id.as_str(), n.target_account_id.as_str()).into_key()
            }))
            .with_copy(|n: &AccountNote| AccountNote {
                account: None,
                target_account: None,
                ..n.clone()
            })
            .build();

        let account_settings = p
            .result("account_settings", ratios.account_settings)
            .with_index(Index::unique("account_id", |s: &AccountSettings| id(&s.account_id)))
            .build();

        let account_stats = p
            .result("account_stats", ratios.account_stats)
            .with_index(Index::unique("account_id", |s: &AccountStats| id(&s.account_id)))
            .build();

        let block = p
            .result("block", ratios.block)
            .with_index(Index::unique("id", |b: &Block| id(&b.id)))
            .with_index(Index::unique("uri", |b: &Block| id(&b.uri)))
            .with_index(Index::unique("account_id,target_account_id", |b: &Block| {
                (b.account_id.as_str(), b.target_account_id.as_str()).into_key()
            }))
            .with_index(Index::multiple("account_id", |b: &Block| id(&b.account_id)))
            .with_index(Index::multiple("target_account_id", |b: &Block| id(&b.target_account_id)))
            .with_copy(|b: &Block| Block {
                account: None,
                target_account: None,
                ..b.clone()
            })
            .build();

        let conversation = p
            .result("conversation", ratios.conversation)
            .with_index(Index::unique("id", |c: &Conversation| id(&c.id)))
            .with_index(Index::unique("thread_id,account_id,other_accounts_key", |c: &Conversation| {
                (c.thread_id.as_str(), c.account_id.as_str(), c.other_accounts_key.as_str()).into_key()
            }))
            .with_index(Index::unique("account_id,last_status_id", |c: &Conversation| {
                (c.account_id.as_str(), c.last_status_id.as_str()).into_key()
            }))
            .with_index(Index::multiple("account_id", |c: &Conversation| id(&c.account_id)))
            .with_copy(|c: &Conversation| Conversation {
                account: None,
                other_accounts: vec![],
                last_status: None,
                ..c.clone()
            })
            .build();

        let emoji = p
            .result("emoji", ratios.emoji)
            .with_index(Index::unique("id", |e: &Emoji| id(&e.id)))
            .with_index(Index::unique("uri", |e: &Emoji| id(&e.uri)))
            .with_index(
                Index::unique("shortcode,domain", |e: &Emoji| {
                    (e.shortcode.as_str(), e.domain.as_str()).into_key()
                })
                .allow_zero(),
            )
            .with_index(Index::unique("image_static_url", |e: &Emoji| id(&e.image_static_url)))
            .with_index(Index::multiple("category_id", |e: &Emoji| id(&e.category_id)))
            .with_copy(|e: &Emoji| Emoji {
                category: None,
                ..e.clone()
            })
            .build();

        let emoji_category = p
            .result("emoji_category", ratios.emoji_category)
            .with_index(Index::unique("id", |c: &EmojiCategory| id(&c.id)))
            .with_index(Index::unique("name", |c: &EmojiCategory| id(&c.name)))
            .build();

        let filter = p
            .result("filter", ratios.filter)
            .with_index(Index::unique("id", |f: &Filter| id(&f.id)))
            .with_index(Index::multiple("account_id", |f: &Filter| id(&f.account_id)))
            .with_copy(|f: &Filter| Filter {
                keywords: vec![],
                statuses: vec![],
                ..f.clone()
            })
            .build();

        let filter_keyword = p
            .result("filter_keyword", ratios.filter_keyword)
            .with_index(Index::unique("id", |k: &FilterKeyword| id(&k.id)))
            .with_index(Index::multiple("account_id", |k: &FilterKeyword| id(&k.account_id)))
            .with_index(Index::multiple("filter_id", |k: &FilterKeyword| id(&k.filter_id)))
            .with_copy(|k: &FilterKeyword| FilterKeyword {
                filter: None,
                ..k.clone()
            })
            .build();

        let filter_status = p
            .result("filter_status", ratios.filter_status)
            .with_index(Index::unique("id", |s: &FilterStatus| id(&s.id)))
            .with_index(Index::multiple("account_id", |s: &FilterStatus| id(&s.account_id)))
            .with_index(Index::multiple("filter_id", |s: &FilterStatus| id(&s.filter_id)))
            .with_copy(|s: &FilterStatus| FilterStatus {
                filter: None,
                ..s.clone()
            })
            .build();

        let follow = p
            .result("follow", ratios.follow)
            .with_index(Index::unique("id", |f: &Follow| id(&f.id)))
            .with_index(Index::unique("uri", |f: &Follow| id(&f.uri)))
            .with_index(Index::unique("account_id,target_account_id", |f: &Follow| {
                (f.account_id.as_str(), f.target_account_id.as_str()).into_key()
            }))
            .with_index(Index::multiple("account_id", |f: &Follow| id(&f.account_id)))
            .with_index(Index::multiple("target_account_id", |f: &Follow| id(&f.target_account_id)))
            .with_copy(|f: &Follow| Follow {
                account: None,
                target_account: None,
                ..f.clone()
            })
            .build();

        let follow_request = p
            .result("follow_request", ratios.follow_request)
            .with_index(Index::unique("id", |f: &FollowRequest| id(&f.id)))
            .with_index(Index::unique("uri", |f: &FollowRequest| id(&f.uri)))
            .with_index(Index::unique("account_id,target_account_id", |f: &FollowRequest| {
                (f.account_id.as_str(), f.target_account_id.as_str()).into_key()
            }))
            .with_index(Index::multiple("account_id", |f: &FollowRequest| id(&f.account_id)))
            .with_index(Index::multiple("target_account_id", |f: &FollowRequest| {
                id(&f.target_account_id)
            }))
            .with_copy(|f: &FollowRequest| FollowRequest {
                account: None,
                target_account: None,
                ..f.clone()
            })
            .build();

        let instance = p
            .result("instance", ratios.instance)
            .with_index(Index::unique("id", |i: &Instance| id(&i.id)))
            .with_index(Index::unique("domain", |i: &Instance| id(&i.domain)))
            .with_copy(|i: &Instance| Instance {
                contact_account: None,
                ..i.clone()
            })
            .build();

        let interaction_request = p
            .result("interaction_request", ratios.interaction_request)
            .with_index(Index::unique("id", |r: &InteractionRequest| id(&r.id)))
            .with_index(Index::unique("interaction_uri", |r: &InteractionRequest| {
                id(&r.interaction_uri)
            }))
            .with_index(Index::unique("uri", |r: &InteractionRequest| id(&r.uri)))
            .with_copy(|r: &InteractionRequest| InteractionRequest {
                status: None,
                target_account: None,
                interacting_account: None,
                like: None,
                reply: None,
                announce: None,
                ..r.clone()
            })
            .build();

        let list = p
            .result("list", ratios.list)
            .with_index(Index::unique("id", |l: &List| id(&l.id)))
            .with_copy(|l: &List| List {
                account: None,
                ..l.clone()
            })
            .build();

        let marker = p
            .result("marker", ratios.marker)
            .with_index(Index::unique("account_id,name", |m: &Marker| {
                (m.account_id.as_str(), m.name as u8).into_key()
            }))
            .build();

        let media = p
            .result("media", ratios.media)
            .with_index(Index::unique("id", |m: &MediaAttachment| id(&m.id)))
            .build();

        let mention = p
            .result("mention", ratios.mention)
            .with_index(Index::unique("id", |m: &Mention| id(&m.id)))
            .with_copy(|m: &Mention| Mention {
                origin_account: None,
                target_account: None,
                ..m.clone()
            })
            .build();

        let moves = p
            .result("move", ratios.moves)
            .with_index(Index::unique("id", |m: &Move| id(&m.id)))
            .with_index(Index::unique("uri", |m: &Move| id(&m.uri)))
            .with_index(Index::unique("origin_uri,target_uri", |m: &Move| {
                (m.origin_uri.as_str(), m.target_uri.as_str()).into_key()
            }))
            .with_index(Index::multiple("origin_uri", |m: &Move| id(&m.origin_uri)))
            .with_index(Index::multiple("target_uri", |m: &Move| id(&m.target_uri)))
            .with_copy(|m: &Move| Move {
                origin: None,
                target: None,
                ..m.clone()
            })
            .build();

        let notification = p
            .result("notification", ratios.notification)
            .with_index(Index::unique("id", |n: &Notification| id(&n.id)))
            .with_index(
                Index::unique(
                    "notification_type,target_account_id,origin_account_id,status_id",
                    |n: &Notification| {
                        (
                            n.notification_type as u8,
                            n.target_account_id.as_str(),
                            n.origin_account_id.as_str(),
                            n.status_id.as_str(),
                        )
                            .into_key()
                    },
                )
                .allow_zero(),
            )
            .with_copy(|n: &Notification| Notification {
                target_account: None,
                origin_account: None,
                status: None,
                ..n.clone()
            })
            .build();

        let poll = p
            .result("poll", ratios.poll)
            .with_index(Index::unique("id", |p: &Poll| id(&p.id)))
            .with_index(Index::unique("status_id", |p: &Poll| id(&p.status_id)))
            .with_copy(|p: &Poll| Poll {
                status: None,
                ..p.clone()
            })
            .build();

        let poll_vote = p
            .result("poll_vote", ratios.poll_vote)
            .with_index(Index::unique("id", |v: &PollVote| id(&v.id)))
            .with_index(Index::multiple("poll_id", |v: &PollVote| id(&v.poll_id)))
            .with_index(Index::unique("poll_id,account_id", |v: &PollVote| {
                (v.poll_id.as_str(), v.account_id.as_str()).into_key()
            }))
            .with_copy(|v: &PollVote| PollVote {
                account: None,
                poll: None,
                ..v.clone()
            })
            .build();

        let report = p
            .result("report", ratios.report)
            .with_index(Index::unique("id", |r: &Report| id(&r.id)))
            .with_copy(|r: &Report| Report {
                account: None,
                target_account: None,
                statuses: vec![],
                action_taken_by_account: None,
                ..r.clone()
            })
            .build();

        let sin_bin_status = p
            .result("sin_bin_status", ratios.sin_bin_status)
            .with_index(Index::unique("id", |s: &SinBinStatus| id(&s.id)))
            .with_index(Index::unique("uri", |s: &SinBinStatus| id(&s.uri)))
            .build();

        let status = p
            .result("status", ratios.status)
            .with_index(Index::unique("id", |s: &Status| id(&s.id)))
            .with_index(Index::unique("uri", |s: &Status| id(&s.uri)))
            .with_index(Index::unique("url", |s: &Status| id(&s.url)))
            .with_index(Index::unique("poll_id", |s: &Status| id(&s.poll_id)))
            .with_index(Index::unique("boost_of_id,account_id", |s: &Status| {
                (s.boost_of_id.as_str(), s.account_id.as_str()).into_key()
            }))
            .with_index(Index::multiple("thread_id", |s: &Status| id(&s.thread_id)))
            .with_copy(|s: &Status| Status {
                account: None,
                in_reply_to: None,
                in_reply_to_account: None,
                boost_of: None,
                boost_of_account: None,
                poll: None,
                attachments: vec![],
                mentions: vec![],
                emojis: vec![],
                ..s.clone()
            })
            .build();

        let status_bookmark = p
            .result("status_bookmark", ratios.status_bookmark)
            .with_index(Index::unique("id", |b: &StatusBookmark| id(&b.id)))
            .with_index(Index::unique("account_id,status_id", |b: &StatusBookmark| {
                (b.account_id.as_str(), b.status_id.as_str()).into_key()
            }))
            .with_index(Index::multiple("account_id", |b: &StatusBookmark| id(&b.account_id)))
            .with_index(Index::multiple("target_account_id", |b: &StatusBookmark| {
                id(&b.target_account_id)
            }))
            .with_index(Index::multiple("status_id", |b: &StatusBookmark| id(&b.status_id)))
            .with_copy(|b: &StatusBookmark| StatusBookmark {
                account: None,
                target_account: None,
                status: None,
                ..b.clone()
            })
            .build();

        let status_edit = p
            .result("status_edit", ratios.status_edit)
            .with_index(Index::unique("id", |e: &StatusEdit| id(&e.id)))
            .with_index(Index::multiple("status_id", |e: &StatusEdit| id(&e.status_id)))
            .with_copy(|e: &StatusEdit| StatusEdit {
                attachments: vec![],
                ..e.clone()
            })
            .build();

        let status_fave = p
            .result("status_fave", ratios.status_fave)
            .with_index(Index::unique("id", |f: &StatusFave| id(&f.id)))
            .with_index(Index::unique("uri", |f: &StatusFave| id(&f.uri)))
            .with_index(Index::unique("account_id,status_id", |f: &StatusFave| {
                (f.account_id.as_str(), f.status_id.as_str()).into_key()
            }))
            .with_index(Index::multiple("status_id", |f: &StatusFave| id(&f.status_id)))
            .with_copy(|f: &StatusFave| StatusFave {
                account: None,
                target_account: None,
                status: None,
                ..f.clone()
            })
            .build();

        let tag = p
            .result("tag", ratios.tag)
            .with_index(Index::unique("id", |t: &Tag| id(&t.id)))
            .with_index(Index::unique("name", |t: &Tag| id(&t.name)))
            .build();

        let thread_mute = p
            .result("thread_mute", ratios.thread_mute)
            .with_index(Index::unique("id", |m: &ThreadMute| id(&m.id)))
            .with_index(Index::multiple("thread_id", |m: &ThreadMute| id(&m.thread_id)))
            .with_index(Index::multiple("account_id", |m: &ThreadMute| id(&m.account_id)))
            .with_index(Index::unique("thread_id,account_id", |m: &ThreadMute| {
                (m.thread_id.as_str(), m.account_id.as_str()).into_key()
            }))
            .build();

        let tombstone = p
            .result("tombstone", ratios.tombstone)
            .with_index(Index::unique("id", |t: &Tombstone| id(&t.id)))
            .with_index(Index::unique("uri", |t: &Tombstone| id(&t.uri)))
            .build();

        let user = p
            .result("user", ratios.user)
            .with_index(Index::unique("id", |u: &User| id(&u.id)))
            .with_index(Index::unique("account_id", |u: &User| id(&u.account_id)))
            .with_index(Index::unique("email", |u: &User| id(&u.email)))
            .with_index(Index::unique("confirmation_token", |u: &User| id(&u.confirmation_token)))
            .with_index(Index::unique("external_id", |u: &User| id(&u.external_id)))
            .with_copy(|u: &User| User {
                account: None,
                ..u.clone()
            })
            .build();

        let user_mute = p
            .result("user_mute", ratios.user_mute)
            .with_index(Index::unique("id", |m: &UserMute| id(&m.id)))
            .with_index(Index::unique("account_id,target_account_id", |m: &UserMute| {
                (m.account_id.as_str(), m.target_account_id.as_str()).into_key()
            }))
            .with_index(Index::multiple("account_id", |m: &UserMute| id(&m.account_id)))
            .with_index(Index::multiple("target_account_id", |m: &UserMute| id(&m.target_account_id)))
            .with_copy(|m: &UserMute| UserMute {
                account: None,
                target_account: None,
                ..m.clone()
            })
            .build();

        Self {
            account,
            account_note,
            account_settings,
            account_stats,
            block,
            block_ids: p.slice("block_ids", ratios.block_ids),
            boost_of_ids: p.slice("boost_of_ids", ratios.boost_of_ids),
            conversation,
            conversation_last_status_ids: p.slice("conversation_last_status_ids", ratios.conversation_last_status_ids),
            emoji,
            emoji_category,
            filter,
            filter_ids: p.slice("filter_ids", ratios.filter_ids),
            filter_keyword,
            filter_status,
            follow,
            follow_ids: p.slice("follow_ids", ratios.follow_ids),
            follow_request,
            follow_request_ids: p.slice("follow_request_ids", ratios.follow_request_ids),
            following_tag_ids: p.slice("following_tag_ids", ratios.following_tag_ids),
            in_reply_to_ids: p.slice("in_reply_to_ids", ratios.in_reply_to_ids),
            instance,
            interaction_request,
            list,
            list_ids: p.slice("list_ids", ratios.list_ids),
            listed_ids: p.slice("listed_ids", ratios.listed_ids),
            marker,
            media,
            mention,
            moves,
            notification,
            poll,
            poll_vote,
            poll_vote_ids: p.slice("poll_vote_ids", ratios.poll_vote_ids),
            report,
            sin_bin_status,
            status,
            status_bookmark,
            status_bookmark_ids: p.slice("status_bookmark_ids", ratios.status_bookmark_ids),
            status_edit,
            status_fave,
            status_fave_ids: p.slice("status_fave_ids", ratios.status_fave_ids),
            tag,
            thread_mute,
            tombstone,
            user,
            user_mute,
            user_mute_ids: p.slice("user_mute_ids", ratios.user_mute_ids),
            local_counts: Arc::new(LocalCounts::default()),
        }
    }
}
