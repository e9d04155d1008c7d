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

use std::time::Duration;

use fedcache_common::error::{Error, ErrorKind};
use serde::{Deserialize, Serialize};

/// Invalid cache configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The memory target is zero.
    #[error("cache memory target must be positive")]
    ZeroMemoryTarget,
    /// A ratio is NaN or infinite.
    #[error("cache ratio {name} must be finite, got {value}")]
    NonFiniteRatio {
        /// Cache name.
        name: &'static str,
        /// Offending ratio.
        value: f64,
    },
    /// The sweep interval is zero.
    #[error("cache sweep interval must be positive")]
    ZeroSweepInterval,
    /// The document does not parse.
    #[error("invalid cache config: {0}")]
    Parse(#[from] serde_json::Error),
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Error::new(ErrorKind::Config, "invalid cache config").with_source(e)
    }
}

macro_rules! ratios {
    ($($(#[$attr:meta])* $name:ident: $default:expr,)*) => {
        /// Memory weight of each cache.
        ///
        /// A cache gets the share `ratio / sum(positive ratios)` of the memory target. A negative ratio sets the
        /// capacity of its cache to `-ratio` entries instead.
        #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
        #[serde(default)]
        pub struct CacheRatios {
            $(
                $(#[$attr])*
                pub $name: f64,
            )*
        }

        impl Default for CacheRatios {
            fn default() -> Self {
                Self {
                    $($name: $default,)*
                }
            }
        }

        impl CacheRatios {
            /// Iterate over `(cache name, ratio)` pairs.
            pub fn iter(&self) -> impl Iterator<Item = (&'static str, f64)> {
                [$((stringify!($name), self.$name),)*].into_iter()
            }
        }
    };
}

ratios! {
    /// Account cache.
    account: 5.0,
    /// Account note cache.
    account_note: 1.0,
    /// Account settings cache.
    account_settings: 0.1,
    /// Account stats cache.
    account_stats: 1.0,
    /// Block cache.
    block: 2.0,
    /// Blocked account IDs per account.
    block_ids: 3.0,
    /// Boost IDs per status.
    boost_of_ids: 3.0,
    /// Conversation cache.
    conversation: 1.0,
    /// Last status IDs of conversations, by account.
    conversation_last_status_ids: 2.0,
    /// Emoji cache.
    emoji: 3.0,
    /// Emoji category cache.
    emoji_category: 0.1,
    /// Filter cache.
    filter: 0.5,
    /// Filter IDs per account.
    filter_ids: 0.5,
    /// Filter keyword cache.
    filter_keyword: 0.5,
    /// Filter status cache.
    filter_status: 0.5,
    /// Follow cache.
    follow: 2.0,
    /// Follow IDs per account and direction.
    follow_ids: 4.0,
    /// Follow request cache.
    follow_request: 2.0,
    /// Follow request IDs per account and direction.
    follow_request_ids: 2.0,
    /// Followed tag IDs per account, following account IDs per tag.
    following_tag_ids: 2.0,
    /// Reply IDs per status.
    in_reply_to_ids: 3.0,
    /// Instance cache.
    instance: 1.0,
    /// Interaction request cache.
    interaction_request: 1.0,
    /// List cache.
    list: 1.0,
    /// List IDs per account or follow.
    list_ids: 2.0,
    /// Listed entry IDs per list.
    listed_ids: 2.0,
    /// Timeline marker cache.
    marker: 0.5,
    /// Media cache.
    media: 4.0,
    /// Mention cache.
    mention: 2.0,
    /// Move cache.
    moves: 0.1,
    /// Notification cache.
    notification: 2.0,
    /// Poll cache.
    poll: 1.0,
    /// Poll vote cache.
    poll_vote: 2.0,
    /// Poll vote IDs per poll.
    poll_vote_ids: 2.0,
    /// Report cache.
    report: 1.0,
    /// Sin bin status cache.
    sin_bin_status: 0.5,
    /// Status cache.
    status: 5.0,
    /// Status bookmark cache.
    status_bookmark: 0.5,
    /// Bookmark IDs per status.
    status_bookmark_ids: 2.0,
    /// Status edit cache.
    status_edit: 2.0,
    /// Status fave cache.
    status_fave: 2.0,
    /// Fave IDs per status.
    status_fave_ids: 3.0,
    /// Tag cache.
    tag: 2.0,
    /// Thread mute cache.
    thread_mute: 0.2,
    /// Tombstone cache.
    tombstone: 2.0,
    /// User cache.
    user: 0.25,
    /// User mute cache.
    user_mute: 2.0,
    /// Muted account IDs per account.
    user_mute_ids: 3.0,
    /// Visibility, mute and filter decisions.
    visibility: 2.0,
}

/// Configuration of all caches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Memory the caches aim to stay under, in bytes.
    pub memory_target: usize,
    /// Memory weight of each cache.
    pub ratios: CacheRatios,
    /// TTL of entity entries and decisions. `None` keeps entries until evicted or invalidated.
    #[serde(with = "humantime_option")]
    pub ttl: Option<Duration>,
    /// Interval of the TTL sweepers.
    #[serde(with = "humantime_duration")]
    pub sweep_interval: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            memory_target: 100 * 1024 * 1024,
            ratios: CacheRatios::default(),
            ttl: Some(Duration::from_secs(5 * 60)),
            sweep_interval: Duration::from_secs(60),
        }
    }
}

impl CacheConfig {
    /// Parse and validate a JSON document. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.memory_target == 0 {
            return Err(ConfigError::ZeroMemoryTarget);
        }
        if let Some((name, value)) = self.ratios.iter().find(|(_, ratio)| !ratio.is_finite()) {
            return Err(ConfigError::NonFiniteRatio { name, value });
        }
        if self.sweep_interval.is_zero() {
            return Err(ConfigError::ZeroSweepInterval);
        }
        Ok(())
    }
}

mod humantime_duration {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&humantime::format_duration(*duration))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let s = String::deserialize(deserializer)?;
        humantime::parse_duration(&s).map_err(serde::de::Error::custom)
    }
}

mod humantime_option {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error> {
        match duration {
            Some(duration) => serializer.collect_str(&humantime::format_duration(*duration)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Duration>, D::Error> {
        Option::<String>::deserialize(deserializer)?
            .map(|s| humantime::parse_duration(&s).map_err(serde::de::Error::custom))
            .transpose()
    }
}
