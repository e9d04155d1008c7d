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

//! Entity models held by the caches.
//!
//! Models mirror the rows of durable storage. Fields holding an `Arc` of another model are populated by the storage
//! layer after a read and are stripped before a model enters a cache: each model is cached once, in its own cache.
//!
//! Timestamps are unix seconds, zero when unset.

#![expect(missing_docs, reason = "fields mirror storage columns")]

use std::sync::Arc;

use deepsize::DeepSizeOf;

/// A local or remote account.
#[derive(Debug, Clone, Default, PartialEq, DeepSizeOf)]
pub struct Account {
    pub id: String,
    pub created_at: i64,
    pub updated_at: i64,
    pub username: String,
    /// Empty for local accounts.
    pub domain: String,
    pub display_name: String,
    pub note: String,
    pub uri: String,
    pub url: String,
    pub public_key_uri: String,
    pub inbox_uri: String,
    pub outbox_uri: String,
    pub followers_uri: String,
    pub following_uri: String,
    pub avatar_media_attachment_id: String,
    pub header_media_attachment_id: String,
    pub emoji_ids: Vec<String>,
    pub also_known_as_uris: Vec<String>,
    pub moved_to_uri: String,
    pub move_id: String,
    pub locked: bool,
    pub discoverable: bool,
    pub suspended_at: i64,

    pub avatar_media_attachment: Option<Arc<MediaAttachment>>,
    pub header_media_attachment: Option<Arc<MediaAttachment>>,
    pub emojis: Vec<Arc<Emoji>>,
    pub also_known_as: Vec<Arc<Account>>,
    pub moved_to: Option<Arc<Account>>,
    pub moves: Option<Arc<Move>>,
    pub stats: Option<Arc<AccountStats>>,
}

impl Account {
    /// Whether the account lives on this instance.
    pub fn is_local(&self) -> bool {
        self.domain.is_empty()
    }
}

/// A private note of `account_id` about `target_account_id`.
#[derive(Debug, Clone, Default, PartialEq, DeepSizeOf)]
pub struct AccountNote {
    pub id: String,
    pub created_at: i64,
    pub updated_at: i64,
    pub account_id: String,
    pub target_account_id: String,
    pub comment: String,

    pub account: Option<Arc<Account>>,
    pub target_account: Option<Arc<Account>>,
}

/// Preferences of a local account.
#[derive(Debug, Clone, Default, PartialEq, DeepSizeOf)]
pub struct AccountSettings {
    pub account_id: String,
    pub created_at: i64,
    pub updated_at: i64,
    pub privacy: Visibility,
    pub sensitive: bool,
    pub language: String,
    pub status_content_type: String,
    pub custom_css: String,
    pub enable_rss: bool,
    pub hide_collections: bool,
}

/// Denormalized counters of a local account.
#[derive(Debug, Clone, Default, PartialEq, DeepSizeOf)]
pub struct AccountStats {
    pub account_id: String,
    pub followers_count: i64,
    pub following_count: i64,
    pub follow_requests_count: i64,
    pub statuses_count: i64,
    pub statuses_pinned_count: i64,
    pub last_status_at: i64,
}

/// `account_id` blocks `target_account_id`.
#[derive(Debug, Clone, Default, PartialEq, DeepSizeOf)]
pub struct Block {
    pub id: String,
    pub created_at: i64,
    pub uri: String,
    pub account_id: String,
    pub target_account_id: String,

    pub account: Option<Arc<Account>>,
    pub target_account: Option<Arc<Account>>,
}

/// A direct message thread as seen by `account_id`.
#[derive(Debug, Clone, Default, PartialEq, DeepSizeOf)]
pub struct Conversation {
    pub id: String,
    pub created_at: i64,
    pub updated_at: i64,
    pub account_id: String,
    pub other_account_ids: Vec<String>,
    /// The sorted `other_account_ids`, joined by commas.
    pub other_accounts_key: String,
    pub thread_id: String,
    pub last_status_id: String,
    pub read: bool,

    pub account: Option<Arc<Account>>,
    pub other_accounts: Vec<Arc<Account>>,
    pub last_status: Option<Arc<Status>>,
}

/// A custom emoji, local or remote.
#[derive(Debug, Clone, Default, PartialEq, DeepSizeOf)]
pub struct Emoji {
    pub id: String,
    pub shortcode: String,
    /// Empty for local emojis.
    pub domain: String,
    pub uri: String,
    pub image_remote_url: String,
    pub image_static_remote_url: String,
    pub image_url: String,
    pub image_static_url: String,
    pub image_content_type: String,
    pub image_file_size: i64,
    pub disabled: bool,
    pub visible_in_picker: bool,
    pub category_id: String,

    pub category: Option<Arc<EmojiCategory>>,
}

/// A named group of emojis.
#[derive(Debug, Clone, Default, PartialEq, DeepSizeOf)]
pub struct EmojiCategory {
    pub id: String,
    pub created_at: i64,
    pub name: String,
}

/// What a filter does with matching statuses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, DeepSizeOf)]
pub enum FilterAction {
    #[default]
    Warn,
    Hide,
}

/// A user-defined status filter.
#[derive(Debug, Clone, Default, PartialEq, DeepSizeOf)]
pub struct Filter {
    pub id: String,
    pub expires_at: i64,
    pub account_id: String,
    pub title: String,
    pub action: FilterAction,
    pub keyword_ids: Vec<String>,
    pub status_ids: Vec<String>,
    pub context_home: bool,
    pub context_notifications: bool,
    pub context_public: bool,
    pub context_thread: bool,
    pub context_account: bool,

    pub keywords: Vec<Arc<FilterKeyword>>,
    pub statuses: Vec<Arc<FilterStatus>>,
}

/// A keyword of a [`Filter`].
#[derive(Debug, Clone, Default, PartialEq, DeepSizeOf)]
pub struct FilterKeyword {
    pub id: String,
    pub account_id: String,
    pub filter_id: String,
    pub keyword: String,
    pub whole_word: bool,

    pub filter: Option<Arc<Filter>>,
}

/// A status explicitly matched by a [`Filter`].
#[derive(Debug, Clone, Default, PartialEq, DeepSizeOf)]
pub struct FilterStatus {
    pub id: String,
    pub account_id: String,
    pub filter_id: String,
    pub status_id: String,

    pub filter: Option<Arc<Filter>>,
}

/// `account_id` follows `target_account_id`.
#[derive(Debug, Clone, Default, PartialEq, DeepSizeOf)]
pub struct Follow {
    pub id: String,
    pub created_at: i64,
    pub uri: String,
    pub account_id: String,
    pub target_account_id: String,
    pub show_reblogs: bool,
    pub notify: bool,

    pub account: Option<Arc<Account>>,
    pub target_account: Option<Arc<Account>>,
}

/// `account_id` asked to follow `target_account_id`. Accepting turns it into a [`Follow`] with the same ID.
#[derive(Debug, Clone, Default, PartialEq, DeepSizeOf)]
pub struct FollowRequest {
    pub id: String,
    pub created_at: i64,
    pub uri: String,
    pub account_id: String,
    pub target_account_id: String,
    pub show_reblogs: bool,
    pub notify: bool,

    pub account: Option<Arc<Account>>,
    pub target_account: Option<Arc<Account>>,
}

/// A known instance.
#[derive(Debug, Clone, Default, PartialEq, DeepSizeOf)]
pub struct Instance {
    pub id: String,
    pub domain: String,
    pub title: String,
    pub uri: String,
    pub short_description: String,
    pub contact_email: String,
    pub contact_account_id: String,
    pub version: String,
    pub suspended_at: i64,

    pub contact_account: Option<Arc<Account>>,
}

/// Kind of interaction awaiting approval.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, DeepSizeOf)]
pub enum InteractionType {
    #[default]
    Like,
    Reply,
    Announce,
}

/// A like, reply or boost of `status_id` by `interacting_account_id`, pending approval by `target_account_id`.
#[derive(Debug, Clone, Default, PartialEq, DeepSizeOf)]
pub struct InteractionRequest {
    pub id: String,
    pub created_at: i64,
    pub status_id: String,
    pub target_account_id: String,
    pub interacting_account_id: String,
    /// URI of the interaction itself, e.g. of the reply.
    pub interaction_uri: String,
    pub interaction_type: InteractionType,
    /// URI of the accept or reject, empty while pending.
    pub uri: String,
    pub accepted_at: i64,
    pub rejected_at: i64,

    pub status: Option<Arc<Status>>,
    pub target_account: Option<Arc<Account>>,
    pub interacting_account: Option<Arc<Account>>,
    pub like: Option<Arc<StatusFave>>,
    pub reply: Option<Arc<Status>>,
    pub announce: Option<Arc<Status>>,
}

/// A list of followed accounts, owned by `account_id`.
#[derive(Debug, Clone, Default, PartialEq, DeepSizeOf)]
pub struct List {
    pub id: String,
    pub title: String,
    pub account_id: String,
    pub replies_policy: String,
    pub exclusive: bool,

    pub account: Option<Arc<Account>>,
}

/// Timeline a [`Marker`] belongs to. Zero is reserved for unknown timelines.
#[repr(u8)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, DeepSizeOf)]
pub enum MarkerName {
    #[default]
    Unknown = 0,
    Home = 1,
    Notifications = 2,
}

/// Last read position of an account in a timeline.
#[derive(Debug, Clone, Default, PartialEq, DeepSizeOf)]
pub struct Marker {
    pub account_id: String,
    pub name: MarkerName,
    pub updated_at: i64,
    pub version: i64,
    pub last_read_id: String,
}

/// Media attached to a status or used as an account avatar or header.
#[derive(Debug, Clone, Default, PartialEq, DeepSizeOf)]
pub struct MediaAttachment {
    pub id: String,
    pub status_id: String,
    pub account_id: String,
    pub url: String,
    pub remote_url: String,
    pub thumbnail_url: String,
    pub content_type: String,
    pub file_size: i64,
    pub description: String,
    pub blurhash: String,
    pub avatar: bool,
    pub header: bool,
    pub cached: bool,
}

/// `origin_account_id` mentions `target_account_id` in `status_id`.
#[derive(Debug, Clone, Default, PartialEq, DeepSizeOf)]
pub struct Mention {
    pub id: String,
    pub status_id: String,
    pub origin_account_id: String,
    pub origin_account_uri: String,
    pub target_account_id: String,
    pub name_string: String,
    pub target_account_uri: String,
    pub silent: bool,

    pub origin_account: Option<Arc<Account>>,
    pub target_account: Option<Arc<Account>>,
}

/// An account move from `origin_uri` to `target_uri`.
#[derive(Debug, Clone, Default, PartialEq, DeepSizeOf)]
pub struct Move {
    pub id: String,
    pub uri: String,
    pub origin_uri: String,
    pub target_uri: String,
    pub attempted_at: i64,
    pub succeeded_at: i64,

    pub origin: Option<Arc<Account>>,
    pub target: Option<Arc<Account>>,
}

/// Kind of a [`Notification`]. Zero is reserved for unknown kinds.
#[repr(u8)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, DeepSizeOf)]
pub enum NotificationType {
    #[default]
    Unknown = 0,
    Follow = 1,
    FollowRequest = 2,
    Mention = 3,
    Reblog = 4,
    Favourite = 5,
    Poll = 6,
    Status = 7,
    SignUp = 8,
    PendingFave = 9,
    PendingReply = 10,
    PendingReblog = 11,
}

/// A notification of `target_account_id` about an action of `origin_account_id`.
#[derive(Debug, Clone, Default, PartialEq, DeepSizeOf)]
pub struct Notification {
    pub id: String,
    pub created_at: i64,
    pub notification_type: NotificationType,
    pub target_account_id: String,
    pub origin_account_id: String,
    pub status_id: String,
    pub read: bool,

    pub target_account: Option<Arc<Account>>,
    pub origin_account: Option<Arc<Account>>,
    pub status: Option<Arc<Status>>,
}

/// The poll of a status.
#[derive(Debug, Clone, Default, PartialEq, DeepSizeOf)]
pub struct Poll {
    pub id: String,
    pub status_id: String,
    pub multiple: bool,
    pub hide_counts: bool,
    pub options: Vec<String>,
    pub votes: Vec<i64>,
    pub voters: i64,
    pub expires_at: i64,
    pub closed_at: i64,

    pub status: Option<Arc<Status>>,
}

/// The choices of one account in a [`Poll`].
#[derive(Debug, Clone, Default, PartialEq, DeepSizeOf)]
pub struct PollVote {
    pub id: String,
    pub choices: Vec<i64>,
    pub account_id: String,
    pub poll_id: String,

    pub account: Option<Arc<Account>>,
    pub poll: Option<Arc<Poll>>,
}

/// Audience of a status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, DeepSizeOf)]
pub enum Visibility {
    #[default]
    Public,
    Unlocked,
    FollowersOnly,
    MutualsOnly,
    Direct,
}

/// A report of `account_id` about `target_account_id`, optionally citing statuses.
#[derive(Debug, Clone, Default, PartialEq, DeepSizeOf)]
pub struct Report {
    pub id: String,
    pub created_at: i64,
    pub updated_at: i64,
    pub uri: String,
    pub account_id: String,
    pub target_account_id: String,
    pub comment: String,
    pub status_ids: Vec<String>,
    pub rule_ids: Vec<String>,
    pub forwarded: bool,
    pub action_taken: String,
    pub action_taken_at: i64,
    pub action_taken_by_account_id: String,

    pub account: Option<Arc<Account>>,
    pub target_account: Option<Arc<Account>>,
    pub statuses: Vec<Arc<Status>>,
    pub action_taken_by_account: Option<Arc<Account>>,
}

/// A copy of a deleted status of a suspended remote account, kept for moderation.
#[derive(Debug, Clone, Default, PartialEq, DeepSizeOf)]
pub struct SinBinStatus {
    pub id: String,
    pub created_at: i64,
    pub updated_at: i64,
    pub uri: String,
    pub url: String,
    pub domain: String,
    pub account_uri: String,
    pub in_reply_to_uri: String,
    pub content: String,
    pub attachment_links: Vec<String>,
    pub mention_target_uris: Vec<String>,
    pub emoji_links: Vec<String>,
    pub poll_options: Vec<String>,
    pub content_warning: String,
    pub visibility: Visibility,
    pub sensitive: bool,
    pub language: String,
}

/// A status, local or remote, original or boost.
#[derive(Debug, Clone, Default, PartialEq, DeepSizeOf)]
pub struct Status {
    pub id: String,
    pub created_at: i64,
    pub edited_at: i64,
    pub uri: String,
    pub url: String,
    pub content: String,
    pub content_warning: String,
    pub language: String,
    pub attachment_ids: Vec<String>,
    pub tag_ids: Vec<String>,
    pub mention_ids: Vec<String>,
    pub emoji_ids: Vec<String>,
    pub local: bool,
    pub account_id: String,
    pub account_uri: String,
    pub in_reply_to_id: String,
    pub in_reply_to_uri: String,
    pub in_reply_to_account_id: String,
    pub boost_of_id: String,
    pub boost_of_account_id: String,
    pub thread_id: String,
    pub poll_id: String,
    pub visibility: Visibility,
    pub sensitive: bool,
    pub federated: bool,
    pub pending_approval: bool,
    pub created_with_application_id: String,

    pub account: Option<Arc<Account>>,
    pub in_reply_to: Option<Arc<Status>>,
    pub in_reply_to_account: Option<Arc<Account>>,
    pub boost_of: Option<Arc<Status>>,
    pub boost_of_account: Option<Arc<Account>>,
    pub poll: Option<Arc<Poll>>,
    pub attachments: Vec<Arc<MediaAttachment>>,
    pub mentions: Vec<Arc<Mention>>,
    pub emojis: Vec<Arc<Emoji>>,
}

/// `account_id` bookmarked `status_id`, authored by `target_account_id`.
#[derive(Debug, Clone, Default, PartialEq, DeepSizeOf)]
pub struct StatusBookmark {
    pub id: String,
    pub created_at: i64,
    pub account_id: String,
    pub target_account_id: String,
    pub status_id: String,

    pub account: Option<Arc<Account>>,
    pub target_account: Option<Arc<Account>>,
    pub status: Option<Arc<Status>>,
}

/// A previous revision of an edited status.
#[derive(Debug, Clone, Default, PartialEq, DeepSizeOf)]
pub struct StatusEdit {
    pub id: String,
    pub created_at: i64,
    pub status_id: String,
    pub content: String,
    pub content_warning: String,
    pub text: String,
    pub language: String,
    pub sensitive: bool,
    pub attachment_ids: Vec<String>,
    pub attachment_descriptions: Vec<String>,
    pub poll_options: Vec<String>,
    pub poll_votes: Vec<i64>,

    pub attachments: Vec<Arc<MediaAttachment>>,
}

/// `account_id` faved `status_id`, authored by `target_account_id`.
#[derive(Debug, Clone, Default, PartialEq, DeepSizeOf)]
pub struct StatusFave {
    pub id: String,
    pub created_at: i64,
    pub uri: String,
    pub account_id: String,
    pub target_account_id: String,
    pub status_id: String,
    pub pending_approval: bool,

    pub account: Option<Arc<Account>>,
    pub target_account: Option<Arc<Account>>,
    pub status: Option<Arc<Status>>,
}

/// A hashtag.
#[derive(Debug, Clone, Default, PartialEq, DeepSizeOf)]
pub struct Tag {
    pub id: String,
    pub created_at: i64,
    pub updated_at: i64,
    /// Lowercase name, without the `#`.
    pub name: String,
    pub useable: bool,
    pub listable: bool,
}

/// `account_id` muted the thread `thread_id`.
#[derive(Debug, Clone, Default, PartialEq, DeepSizeOf)]
pub struct ThreadMute {
    pub id: String,
    pub created_at: i64,
    pub thread_id: String,
    pub account_id: String,
}

/// Marks a deleted remote object by URI.
#[derive(Debug, Clone, Default, PartialEq, DeepSizeOf)]
pub struct Tombstone {
    pub id: String,
    pub domain: String,
    pub uri: String,
}

/// The sign-in side of a local account.
#[derive(Debug, Clone, Default, PartialEq, DeepSizeOf)]
pub struct User {
    pub id: String,
    pub created_at: i64,
    pub account_id: String,
    pub email: String,
    pub unconfirmed_email: String,
    pub confirmation_token: String,
    pub external_id: String,
    pub locale: String,
    pub admin: bool,
    pub moderator: bool,
    pub approved: bool,
    pub disabled: bool,

    pub account: Option<Arc<Account>>,
}

/// `account_id` muted `target_account_id`.
#[derive(Debug, Clone, Default, PartialEq, DeepSizeOf)]
pub struct UserMute {
    pub id: String,
    pub created_at: i64,
    pub expires_at: i64,
    pub notifications: bool,
    pub account_id: String,
    pub target_account_id: String,

    pub account: Option<Arc<Account>>,
    pub target_account: Option<Arc<Account>>,
}
