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

use std::{
    borrow::Cow,
    fmt::Debug,
    future::Future,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use arc_swap::ArcSwapOption;
use fedcache_common::error::Result;
use parking_lot::Mutex;

/// One domain label. A node without children terminates a listed domain.
#[derive(Debug, Default)]
struct Node {
    label: Box<str>,
    children: Vec<Node>,
}

impl Node {
    fn new(label: &str) -> Self {
        Self {
            label: label.into(),
            children: vec![],
        }
    }

    fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    fn find(&self, label: &str) -> Option<&Node> {
        self.children
            .binary_search_by(|child| (*child.label).cmp(label))
            .ok()
            .map(|i| &self.children[i])
    }
}

/// Domains compare case-insensitively and a fully qualified trailing dot is dropped.
fn normalize(domain: &str) -> Cow<'_, str> {
    let domain = domain.strip_suffix('.').unwrap_or(domain);
    if domain.bytes().any(|b| b.is_ascii_uppercase()) {
        Cow::Owned(domain.to_ascii_lowercase())
    } else {
        Cow::Borrowed(domain)
    }
}

/// Immutable suffix trie over domain labels, read right to left.
///
/// `example.org` is stored as `org -> example`. Listing a domain covers all of its subdomains.
#[derive(Debug, Default)]
struct Trie {
    root: Node,
}

impl Trie {
    fn insert(&mut self, domain: &str) {
        let domain = normalize(domain);
        if domain.is_empty() {
            return;
        }
        let mut labels = domain.rsplit('.').peekable();
        let mut node = &mut self.root;

        while let Some(label) = labels.next() {
            let i = match node.children.binary_search_by(|child| (*child.label).cmp(label)) {
                Ok(i) => {
                    // A parent domain is already listed and covers this one.
                    if node.children[i].is_leaf() {
                        return;
                    }
                    i
                }
                Err(i) => {
                    node.children.insert(i, Node::new(label));
                    i
                }
            };
            node = &mut node.children[i];
            if labels.peek().is_none() {
                // The listed domain covers all entries below it.
                node.children.clear();
            }
        }
    }

    fn matches(&self, domain: &str) -> bool {
        let domain = normalize(domain);
        let mut node = &self.root;
        if node.is_leaf() {
            return false;
        }
        for label in domain.rsplit('.') {
            match node.find(label) {
                Some(child) if child.is_leaf() => return true,
                Some(child) => node = child,
                None => return false,
            }
        }
        false
    }
}

/// A lazily hydrated set of domains, matched by suffix.
///
/// Matching is lock free. The whole set is loaded once on first use and published by an atomic swap, clearing it
/// makes the next match load it again.
pub struct DomainCache {
    name: String,
    trie: ArcSwapOption<Trie>,
    /// Bumped by every clear. A hydration only publishes if no clear happened while it loaded.
    generation: AtomicU64,
    publish: Mutex<()>,
}

impl Debug for DomainCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DomainCache")
            .field("name", &self.name)
            .field("hydrated", &self.is_hydrated())
            .finish()
    }
}

impl DomainCache {
    /// Create an empty, unhydrated domain cache.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            trie: ArcSwapOption::empty(),
            generation: AtomicU64::new(0),
            publish: Mutex::new(()),
        }
    }

    /// Whether `domain` or one of its parent domains is listed.
    ///
    /// If the cache is not hydrated, `load` is called for the full list of domains first. A load error is returned
    /// and leaves the cache unhydrated. An empty domain never matches. Letter case and a trailing dot are ignored,
    /// both in `domain` and in the loaded list.
    pub async fn matches<F, FU>(&self, domain: &str, load: F) -> Result<bool>
    where
        F: FnOnce() -> FU,
        FU: Future<Output = Result<Vec<String>>>,
    {
        if normalize(domain).is_empty() {
            return Ok(false);
        }

        if let Some(trie) = self.trie.load().as_ref() {
            return Ok(trie.matches(domain));
        }

        let generation = self.generation.load(Ordering::Acquire);
        let domains = load().await?;

        let mut trie = Trie::default();
        for domain in domains.iter() {
            trie.insert(domain);
        }
        let trie = Arc::new(trie);
        let matched = trie.matches(domain);

        let guard = self.publish.lock();
        if self.generation.load(Ordering::Acquire) == generation {
            self.trie.store(Some(trie));
            tracing::debug!(cache = %self.name, domains = domains.len(), "[domain]: hydrated");
        }
        drop(guard);

        Ok(matched)
    }

    /// Drop the loaded domains. The next match loads them again.
    pub fn clear(&self) {
        let _guard = self.publish.lock();
        self.generation.fetch_add(1, Ordering::AcqRel);
        self.trie.store(None);
    }

    /// Whether the domains are loaded.
    pub fn is_hydrated(&self) -> bool {
        self.trie.load().is_some()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use fedcache_common::error::{Error, ErrorKind};

    use super::*;

    fn trie(domains: &[&str]) -> Trie {
        let mut trie = Trie::default();
        for domain in domains {
            trie.insert(domain);
        }
        trie
    }

    #[test]
    fn test_trie_suffix_match() {
        let trie = trie(&["example.org", "bad.social"]);

        assert!(trie.matches("example.org"));
        assert!(trie.matches("sub.example.org"));
        assert!(trie.matches("deep.sub.example.org"));
        assert!(trie.matches("bad.social"));

        assert!(!trie.matches("org"));
        assert!(!trie.matches("example.com"));
        assert!(!trie.matches("notexample.org"));
        assert!(!trie.matches("good.social"));
    }

    #[test]
    fn test_trie_parent_prunes_children() {
        let trie = trie(&["a.example.org", "b.example.org", "example.org"]);
        assert!(trie.matches("c.example.org"));
        assert!(trie.matches("example.org"));

        let org = trie.root.find("org").unwrap();
        let example = org.find("example").unwrap();
        assert!(example.is_leaf());
    }

    #[test]
    fn test_trie_child_under_parent_ignored() {
        let trie = trie(&["example.org", "a.example.org"]);
        assert!(trie.matches("b.example.org"));
        assert!(trie.root.find("org").unwrap().find("example").unwrap().is_leaf());
    }

    #[test]
    fn test_trie_normalizes_domains() {
        let trie = trie(&["Bad.Social.", "", "."]);

        assert!(trie.matches("bad.social"));
        assert!(trie.matches("BAD.social"));
        assert!(trie.matches("bad.social."));
        assert!(trie.matches("Sub.Bad.Social."));
        assert!(!trie.matches("good.social"));
        assert!(!trie.matches("."));
        assert_eq!(trie.root.children.len(), 1);
    }

    #[test]
    fn test_empty_trie() {
        let trie = Trie::default();
        assert!(!trie.matches("example.org"));
    }

    #[test_log::test(tokio::test)]
    async fn test_lazy_hydration() {
        let cache = DomainCache::new("domain_block");
        let loads = AtomicUsize::new(0);
        let load = || async {
            loads.fetch_add(1, Ordering::Relaxed);
            Ok(vec!["example.org".to_string()])
        };

        assert!(!cache.is_hydrated());
        assert!(!cache.matches("", load).await.unwrap());
        assert_eq!(loads.load(Ordering::Relaxed), 0);

        assert!(cache.matches("sub.example.org", load).await.unwrap());
        assert!(!cache.matches("example.com", load).await.unwrap());
        assert_eq!(loads.load(Ordering::Relaxed), 1);
        assert!(cache.is_hydrated());

        cache.clear();
        assert!(!cache.is_hydrated());
        assert!(cache.matches("example.org", load).await.unwrap());
        assert_eq!(loads.load(Ordering::Relaxed), 2);
    }

    #[test_log::test(tokio::test)]
    async fn test_load_error_leaves_unhydrated() {
        let cache = DomainCache::new("domain_block");
        let err = cache
            .matches("example.org", || async { Err(Error::new(ErrorKind::External, "boom")) })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::External);
        assert!(!cache.is_hydrated());
    }

    #[test_log::test(tokio::test)]
    async fn test_hydration_racing_clear_not_published() {
        let cache = DomainCache::new("domain_block");
        let matched = cache
            .matches("example.org", || async {
                // A block is created while the list is read from storage.
                cache.clear();
                Ok(vec!["example.org".to_string()])
            })
            .await
            .unwrap();

        assert!(matched);
        assert!(!cache.is_hydrated());
    }
}
