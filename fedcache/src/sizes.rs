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

//! Representative model instances, measured to plan cache capacities.

use deepsize::DeepSizeOf;

use crate::models::*;

/// Highest possible ID, as long as any real one.
pub const EXAMPLE_ID: &str = "ZZZZZZZZZZZZZZZZZZZZZZZZZZ";

/// A plausible remote URI.
pub const EXAMPLE_URI: &str = "https://social.example/users/ThisIsAnExampleUsernameOfUsualLength";

/// A plausible status text with a few emojis and hashtags.
pub const EXAMPLE_TEXT: &str = "\
the cat knocked the plant off the shelf again :shocked:

then sat in the pot like nothing happened :cat_sit:

i am not cleaning this up today, the cat can do it :broom:

#CatsOfTheFediverse #HouseplantProblems #WhyIsItAlwaysThePothos";

/// A plausible short text, e.g. a title or a content warning.
pub const EXAMPLE_TEXT_SMALL: &str = "Small problem, the cat found the houseplants";

/// A plausible username.
pub const EXAMPLE_USERNAME: &str = "@ExampleUsername1969";

/// Example time: mid August 2023.
pub const EXAMPLE_TIME: i64 = 1_692_010_328;

/// A model with a representative instance.
///
/// Example instances fill every stored field with values of realistic length and leave populated references empty,
/// the way a cached copy looks.
pub trait Example: DeepSizeOf + Sized {
    /// Build the example instance.
    fn example() -> Self;

    /// In-memory size of the example instance, heap included.
    fn model_size() -> usize {
        Self::example().deep_size_of()
    }
}

fn id() -> String {
    EXAMPLE_ID.to_string()
}

fn uri() -> String {
    EXAMPLE_URI.to_string()
}

fn ids(n: usize) -> Vec<String> {
    vec![id(); n]
}

impl Example for Account {
    fn example() -> Self {
        Account {
            id: id(),
            created_at: EXAMPLE_TIME,
            updated_at: EXAMPLE_TIME,
            username: EXAMPLE_USERNAME.to_string(),
            domain: "social.example".to_string(),
            display_name: EXAMPLE_TEXT_SMALL.to_string(),
            note: EXAMPLE_TEXT.to_string(),
            uri: uri(),
            url: uri(),
            public_key_uri: uri(),
            inbox_uri: uri(),
            outbox_uri: uri(),
            followers_uri: uri(),
            following_uri: uri(),
            avatar_media_attachment_id: id(),
            header_media_attachment_id: id(),
            emoji_ids: ids(4),
            also_known_as_uris: vec![uri()],
            moved_to_uri: String::new(),
            move_id: String::new(),
            locked: true,
            discoverable: true,
            ..Default::default()
        }
    }
}

impl Example for AccountNote {
    fn example() -> Self {
        AccountNote {
            id: id(),
            created_at: EXAMPLE_TIME,
            updated_at: EXAMPLE_TIME,
            account_id: id(),
            target_account_id: id(),
            comment: EXAMPLE_TEXT_SMALL.to_string(),
            ..Default::default()
        }
    }
}

impl Example for AccountSettings {
    fn example() -> Self {
        AccountSettings {
            account_id: id(),
            created_at: EXAMPLE_TIME,
            updated_at: EXAMPLE_TIME,
            privacy: Visibility::FollowersOnly,
            sensitive: true,
            language: "fr".to_string(),
            status_content_type: "text/plain".to_string(),
            custom_css: EXAMPLE_TEXT.to_string(),
            enable_rss: true,
            hide_collections: false,
        }
    }
}

impl Example for AccountStats {
    fn example() -> Self {
        AccountStats {
            account_id: id(),
            followers_count: 100,
            following_count: 100,
            follow_requests_count: 10,
            statuses_count: 1000,
            statuses_pinned_count: 3,
            last_status_at: EXAMPLE_TIME,
        }
    }
}

impl Example for Block {
    fn example() -> Self {
        Block {
            id: id(),
            created_at: EXAMPLE_TIME,
            uri: uri(),
            account_id: id(),
            target_account_id: id(),
            ..Default::default()
        }
    }
}

impl Example for Conversation {
    fn example() -> Self {
        Conversation {
            id: id(),
            created_at: EXAMPLE_TIME,
            updated_at: EXAMPLE_TIME,
            account_id: id(),
            other_account_ids: ids(3),
            other_accounts_key: ids(3).join(","),
            thread_id: id(),
            last_status_id: id(),
            read: true,
            ..Default::default()
        }
    }
}

impl Example for Emoji {
    fn example() -> Self {
        Emoji {
            id: id(),
            shortcode: "cat_sit".to_string(),
            domain: "social.example".to_string(),
            uri: uri(),
            image_remote_url: uri(),
            image_static_remote_url: uri(),
            image_url: uri(),
            image_static_url: uri(),
            image_content_type: "image/png".to_string(),
            image_file_size: 1024,
            disabled: false,
            visible_in_picker: true,
            category_id: id(),
            category: None,
        }
    }
}

impl Example for EmojiCategory {
    fn example() -> Self {
        EmojiCategory {
            id: id(),
            created_at: EXAMPLE_TIME,
            name: "cats".to_string(),
        }
    }
}

impl Example for Filter {
    fn example() -> Self {
        Filter {
            id: id(),
            expires_at: EXAMPLE_TIME,
            account_id: id(),
            title: EXAMPLE_TEXT_SMALL.to_string(),
            action: FilterAction::Hide,
            keyword_ids: ids(3),
            status_ids: ids(3),
            context_home: true,
            context_public: true,
            ..Default::default()
        }
    }
}

impl Example for FilterKeyword {
    fn example() -> Self {
        FilterKeyword {
            id: id(),
            account_id: id(),
            filter_id: id(),
            keyword: "houseplant".to_string(),
            whole_word: true,
            filter: None,
        }
    }
}

impl Example for FilterStatus {
    fn example() -> Self {
        FilterStatus {
            id: id(),
            account_id: id(),
            filter_id: id(),
            status_id: id(),
            filter: None,
        }
    }
}

impl Example for Follow {
    fn example() -> Self {
        Follow {
            id: id(),
            created_at: EXAMPLE_TIME,
            uri: uri(),
            account_id: id(),
            target_account_id: id(),
            show_reblogs: true,
            notify: false,
            ..Default::default()
        }
    }
}

impl Example for FollowRequest {
    fn example() -> Self {
        FollowRequest {
            id: id(),
            created_at: EXAMPLE_TIME,
            uri: uri(),
            account_id: id(),
            target_account_id: id(),
            show_reblogs: true,
            notify: false,
            ..Default::default()
        }
    }
}

impl Example for Instance {
    fn example() -> Self {
        Instance {
            id: id(),
            domain: "social.example".to_string(),
            title: EXAMPLE_TEXT_SMALL.to_string(),
            uri: uri(),
            short_description: EXAMPLE_TEXT.to_string(),
            contact_email: "admin@social.example".to_string(),
            contact_account_id: id(),
            version: "0.17.0".to_string(),
            ..Default::default()
        }
    }
}

impl Example for InteractionRequest {
    fn example() -> Self {
        InteractionRequest {
            id: id(),
            created_at: EXAMPLE_TIME,
            status_id: id(),
            target_account_id: id(),
            interacting_account_id: id(),
            interaction_uri: uri(),
            interaction_type: InteractionType::Announce,
            uri: uri(),
            accepted_at: EXAMPLE_TIME,
            ..Default::default()
        }
    }
}

impl Example for List {
    fn example() -> Self {
        List {
            id: id(),
            title: EXAMPLE_TEXT_SMALL.to_string(),
            account_id: id(),
            replies_policy: "followed".to_string(),
            ..Default::default()
        }
    }
}

impl Example for Marker {
    fn example() -> Self {
        Marker {
            account_id: id(),
            name: MarkerName::Home,
            updated_at: EXAMPLE_TIME,
            version: 0,
            last_read_id: id(),
        }
    }
}

impl Example for MediaAttachment {
    fn example() -> Self {
        MediaAttachment {
            id: id(),
            status_id: id(),
            account_id: id(),
            url: uri(),
            remote_url: uri(),
            thumbnail_url: uri(),
            content_type: "image/jpeg".to_string(),
            file_size: 1 << 20,
            description: EXAMPLE_TEXT.to_string(),
            blurhash: "LKO2?U%2Tw=w]~RBVZRi};RPxuwH".to_string(),
            cached: true,
            ..Default::default()
        }
    }
}

impl Example for Mention {
    fn example() -> Self {
        Mention {
            id: id(),
            status_id: id(),
            origin_account_id: id(),
            origin_account_uri: uri(),
            target_account_id: id(),
            name_string: EXAMPLE_USERNAME.to_string(),
            target_account_uri: uri(),
            ..Default::default()
        }
    }
}

impl Example for Move {
    fn example() -> Self {
        Move {
            id: id(),
            uri: uri(),
            origin_uri: uri(),
            target_uri: uri(),
            attempted_at: EXAMPLE_TIME,
            succeeded_at: EXAMPLE_TIME,
            ..Default::default()
        }
    }
}

impl Example for Notification {
    fn example() -> Self {
        Notification {
            id: id(),
            created_at: EXAMPLE_TIME,
            notification_type: NotificationType::Reblog,
            target_account_id: id(),
            origin_account_id: id(),
            status_id: id(),
            ..Default::default()
        }
    }
}

impl Example for Poll {
    fn example() -> Self {
        Poll {
            id: id(),
            status_id: id(),
            multiple: true,
            options: vec![EXAMPLE_TEXT_SMALL.to_string(); 4],
            votes: vec![100; 4],
            voters: 200,
            expires_at: EXAMPLE_TIME,
            ..Default::default()
        }
    }
}

impl Example for PollVote {
    fn example() -> Self {
        PollVote {
            id: id(),
            choices: vec![0, 2],
            account_id: id(),
            poll_id: id(),
            ..Default::default()
        }
    }
}

impl Example for Report {
    fn example() -> Self {
        Report {
            id: id(),
            created_at: EXAMPLE_TIME,
            updated_at: EXAMPLE_TIME,
            uri: uri(),
            account_id: id(),
            target_account_id: id(),
            comment: EXAMPLE_TEXT.to_string(),
            status_ids: ids(3),
            forwarded: true,
            action_taken: EXAMPLE_TEXT.to_string(),
            action_taken_at: EXAMPLE_TIME,
            action_taken_by_account_id: id(),
            ..Default::default()
        }
    }
}

impl Example for SinBinStatus {
    fn example() -> Self {
        SinBinStatus {
            id: id(),
            created_at: EXAMPLE_TIME,
            updated_at: EXAMPLE_TIME,
            uri: uri(),
            url: uri(),
            domain: uri(),
            account_uri: uri(),
            in_reply_to_uri: uri(),
            content: EXAMPLE_TEXT.to_string(),
            attachment_links: vec![uri(), uri()],
            mention_target_uris: vec![uri()],
            emoji_links: vec![uri()],
            poll_options: vec![EXAMPLE_TEXT_SMALL.to_string(); 4],
            content_warning: EXAMPLE_TEXT_SMALL.to_string(),
            visibility: Visibility::Public,
            sensitive: false,
            language: "en".to_string(),
        }
    }
}

impl Example for Status {
    fn example() -> Self {
        Status {
            id: id(),
            created_at: EXAMPLE_TIME,
            uri: uri(),
            url: uri(),
            content: EXAMPLE_TEXT.to_string(),
            content_warning: EXAMPLE_TEXT_SMALL.to_string(),
            language: "en".to_string(),
            attachment_ids: ids(2),
            tag_ids: ids(3),
            mention_ids: ids(1),
            emoji_ids: ids(3),
            account_id: id(),
            account_uri: uri(),
            in_reply_to_id: id(),
            in_reply_to_uri: uri(),
            in_reply_to_account_id: id(),
            thread_id: id(),
            federated: true,
            created_with_application_id: id(),
            ..Default::default()
        }
    }
}

impl Example for StatusBookmark {
    fn example() -> Self {
        StatusBookmark {
            id: id(),
            created_at: EXAMPLE_TIME,
            account_id: id(),
            target_account_id: id(),
            status_id: id(),
            ..Default::default()
        }
    }
}

impl Example for StatusEdit {
    fn example() -> Self {
        StatusEdit {
            id: id(),
            created_at: EXAMPLE_TIME,
            status_id: id(),
            content: EXAMPLE_TEXT.to_string(),
            content_warning: EXAMPLE_TEXT_SMALL.to_string(),
            text: EXAMPLE_TEXT.to_string(),
            language: "en".to_string(),
            attachment_ids: ids(2),
            attachment_descriptions: vec![EXAMPLE_TEXT_SMALL.to_string(); 2],
            ..Default::default()
        }
    }
}

impl Example for StatusFave {
    fn example() -> Self {
        StatusFave {
            id: id(),
            created_at: EXAMPLE_TIME,
            uri: uri(),
            account_id: id(),
            target_account_id: id(),
            status_id: id(),
            ..Default::default()
        }
    }
}

impl Example for Tag {
    fn example() -> Self {
        Tag {
            id: id(),
            created_at: EXAMPLE_TIME,
            updated_at: EXAMPLE_TIME,
            name: EXAMPLE_USERNAME.to_string(),
            useable: true,
            listable: true,
        }
    }
}

impl Example for ThreadMute {
    fn example() -> Self {
        ThreadMute {
            id: id(),
            created_at: EXAMPLE_TIME,
            thread_id: id(),
            account_id: id(),
        }
    }
}

impl Example for Tombstone {
    fn example() -> Self {
        Tombstone {
            id: id(),
            domain: "social.example".to_string(),
            uri: uri(),
        }
    }
}

impl Example for User {
    fn example() -> Self {
        User {
            id: id(),
            created_at: EXAMPLE_TIME,
            account_id: id(),
            email: "someone@social.example".to_string(),
            confirmation_token: EXAMPLE_TEXT_SMALL.to_string(),
            external_id: id(),
            locale: "en".to_string(),
            approved: true,
            ..Default::default()
        }
    }
}

impl Example for UserMute {
    fn example() -> Self {
        UserMute {
            id: id(),
            created_at: EXAMPLE_TIME,
            expires_at: EXAMPLE_TIME,
            notifications: true,
            account_id: id(),
            target_account_id: id(),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::mem::size_of;

    use super::*;

    #[test]
    fn test_sizes_include_heap() {
        assert!(Account::model_size() > size_of::<Account>() + EXAMPLE_TEXT.len());
        assert!(Status::model_size() > size_of::<Status>() + EXAMPLE_TEXT.len());
        assert!(Status::model_size() > ThreadMute::model_size());
    }

    #[test]
    fn test_examples_strip_references() {
        let account = Account::example();
        assert!(account.avatar_media_attachment.is_none());
        assert!(account.stats.is_none());
        assert!(Status::example().account.is_none());
    }
}
