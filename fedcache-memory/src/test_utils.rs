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

//! Utilities for testing.

use std::sync::Arc;

use crate::{ErrorPolicy, Index, IndexedCache, IntoKey};

/// A small account-like value with several lookup paths and a populated reference.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Account {
    pub id: String,
    pub uri: String,
    pub url: String,
    pub username: String,
    pub domain: String,
    pub avatar_id: String,
    /// Populated reference, never cached.
    pub avatar: Option<Arc<String>>,
}

/// Create an account whose URI and URL derive from the username.
pub fn account(id: &str, username: &str, domain: &str) -> Account {
    Account {
        id: id.to_string(),
        uri: format!("https://ex/u/{username}"),
        url: format!("https://ex/@{username}"),
        username: username.to_string(),
        domain: domain.to_string(),
        avatar_id: "01MEDIA".to_string(),
        avatar: None,
    }
}

/// Create a cache named `account` over [`Account`], stripping the avatar on copy.
pub fn account_cache(capacity: usize, policy: ErrorPolicy) -> IndexedCache<Account> {
    IndexedCache::builder("account", capacity, policy)
        .with_index(Index::unique("id", |a: &Account| a.id.as_str().into_key()))
        .with_index(Index::unique("uri", |a: &Account| a.uri.as_str().into_key()))
        .with_index(Index::unique("url", |a: &Account| a.url.as_str().into_key()))
        .with_index(
            Index::unique("username,domain", |a: &Account| {
                (a.username.as_str(), a.domain.as_str()).into_key()
            })
            .allow_zero(),
        )
        .with_index(Index::unique("domain,username", |a: &Account| {
            (a.domain.as_str(), a.username.as_str()).into_key()
        }))
        .with_index(Index::multiple("domain", |a: &Account| a.domain.as_str().into_key()))
        .with_copy(|a| Account {
            avatar: None,
            ..a.clone()
        })
        .build()
}
