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
    future::Future,
    time::{Duration, Instant},
};

use fedcache_common::error::Result;

use crate::{
    index::Index,
    indexed::IndexedCache,
    key::IntoKey,
    policy::ErrorPolicy,
};

/// Requester ID of decisions made for anonymous requests.
///
/// Never a valid account ID, so anonymous and authenticated verdicts are never conflated.
pub const NO_REQUESTER: &str = "~anonymous";

const BY_DECISION: &str = "kind,requester_id,subject_id";
const BY_SUBJECT: &str = "subject_id";
const BY_REQUESTER: &str = "requester_id";
const BY_REQUESTER_KIND: &str = "requester_id,kind";
const BY_THREAD: &str = "thread_id";
const BY_REQUESTER_THREAD: &str = "requester_id,thread_id";

/// The kind of a cached decision. Part of every decision key, so one cache can hold all kinds.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DecisionType {
    /// Whether the requester can see a status.
    StatusVisible = b's',
    /// Whether the requester can see an account.
    AccountVisible = b'a',
    /// Whether a status goes into the requester's home timeline.
    HomeTimelineable = b'h',
    /// Whether a status goes into the public timeline.
    PublicTimelineable = b'p',
    /// Whether the requester can boost a status.
    Boostable = b'b',
    /// Whether a status is muted for the requester.
    StatusMuted = b'm',
    /// Whether notifications of a status are muted for the requester.
    StatusMutedNotifications = b'n',
    /// Whether a status is filtered for the requester.
    StatusFiltered = b'f',
}

impl DecisionType {
    /// Decision kinds that depend on the requester's mutes.
    pub const MUTES: [DecisionType; 2] = [DecisionType::StatusMuted, DecisionType::StatusMutedNotifications];

    /// Decision kinds that depend on the requester's filters.
    pub const FILTERS: [DecisionType; 1] = [DecisionType::StatusFiltered];
}

/// A memoized verdict of type `kind` for (`requester_id`, `subject_id`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedDecision {
    /// Decision kind.
    pub kind: DecisionType,
    /// Account the decision was made for, [`NO_REQUESTER`] for anonymous requests.
    pub requester_id: String,
    /// Status or account the decision is about.
    pub subject_id: String,
    /// Thread of the subject status, empty if not applicable.
    pub thread_id: String,
    /// The verdict.
    pub value: bool,
    /// The verdict no longer holds after this instant.
    pub expires_at: Option<Instant>,
}

impl CachedDecision {
    /// Whether the verdict no longer holds at `now`.
    pub fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|expires_at| expires_at <= now)
    }
}

/// Output of a decision function.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Verdict {
    /// The verdict.
    pub value: bool,
    /// Thread the subject belongs to, so thread mutes can invalidate the decision.
    pub thread_id: Option<String>,
    /// The verdict no longer holds after this instant, e.g. a mute with an end date.
    pub expires_at: Option<Instant>,
}

impl From<bool> for Verdict {
    fn from(value: bool) -> Self {
        Self {
            value,
            ..Default::default()
        }
    }
}

/// Cache-aside store of expensive boolean decisions, keyed by (kind, requester, subject).
///
/// Only verdicts are cached, a failed decision is made again by the next call. Decision keys are the only keys a
/// remembered error could be found under, so no invalidation would ever reach it.
///
/// A decision function may fail with an [`ErrorKind::Unresolvable`](fedcache_common::error::ErrorKind) error when it
/// cannot decide yet, e.g. while a remote object is still being fetched. Such a result reads as `false`.
#[derive(Debug, Clone)]
pub struct DecisionCache {
    cache: IndexedCache<CachedDecision>,
}

impl DecisionCache {
    /// Create a decision cache.
    pub fn new(name: impl Into<String>, capacity: usize, ttl: Option<Duration>) -> Self {
        let cache = IndexedCache::builder(name, capacity, ErrorPolicy::IgnoreAll)
            .with_index(Index::unique(BY_DECISION, |d: &CachedDecision| {
                (d.kind as u8, d.requester_id.as_str(), d.subject_id.as_str()).into_key()
            }))
            .with_index(Index::multiple(BY_SUBJECT, |d: &CachedDecision| {
                d.subject_id.as_str().into_key()
            }))
            .with_index(Index::multiple(BY_REQUESTER, |d: &CachedDecision| {
                d.requester_id.as_str().into_key()
            }))
            .with_index(Index::multiple(BY_REQUESTER_KIND, |d: &CachedDecision| {
                (d.requester_id.as_str(), d.kind as u8).into_key()
            }))
            .with_index(Index::multiple(BY_THREAD, |d: &CachedDecision| d.thread_id.as_str().into_key()))
            .with_index(Index::multiple(BY_REQUESTER_THREAD, |d: &CachedDecision| {
                (d.requester_id.as_str(), d.thread_id.as_str()).into_key()
            }))
            .with_ttl(ttl)
            .build();
        Self { cache }
    }

    /// Get the cached decision, if present and not expired.
    pub fn get(&self, kind: DecisionType, requester_id: Option<&str>, subject_id: &str) -> Option<CachedDecision> {
        let requester_id = requester_id.unwrap_or(NO_REQUESTER);
        self.cache
            .get_one(BY_DECISION, (kind as u8, requester_id, subject_id))
            .filter(|d| !d.is_expired(Instant::now()))
    }

    /// Get the decision, calling `decide` on a miss.
    ///
    /// Concurrent calls for the same decision share one `decide` call. An expired decision is dropped and decided
    /// again.
    pub async fn load_one<F, FU>(
        &self,
        kind: DecisionType,
        requester_id: Option<&str>,
        subject_id: &str,
        decide: F,
    ) -> Result<CachedDecision>
    where
        F: FnOnce() -> FU,
        FU: Future<Output = Result<Verdict>>,
    {
        let requester_id = requester_id.unwrap_or(NO_REQUESTER);
        let key = (kind as u8, requester_id, subject_id).into_key();

        if self
            .cache
            .get_one(BY_DECISION, &key)
            .is_some_and(|d| d.is_expired(Instant::now()))
        {
            self.cache.invalidate(BY_DECISION, [&key]);
        }

        let res = self
            .cache
            .load_one(BY_DECISION, &key, || async {
                let verdict = decide().await?;
                Ok(CachedDecision {
                    kind,
                    requester_id: requester_id.to_string(),
                    subject_id: subject_id.to_string(),
                    thread_id: verdict.thread_id.unwrap_or_default(),
                    value: verdict.value,
                    expires_at: verdict.expires_at,
                })
            })
            .await;

        match res {
            Err(e) if e.is_unresolvable() => {
                tracing::trace!(?kind, requester_id, subject_id, reason = e.message(), "[decision]: unresolvable");
                Ok(CachedDecision {
                    kind,
                    requester_id: requester_id.to_string(),
                    subject_id: subject_id.to_string(),
                    thread_id: String::new(),
                    value: false,
                    expires_at: None,
                })
            }
            res => res,
        }
    }

    /// Store a decision made elsewhere.
    pub fn put(&self, decision: &CachedDecision) {
        self.cache.put(decision);
    }

    /// Drop all decisions about the given statuses or accounts.
    pub fn invalidate_subjects<S>(&self, subject_ids: impl IntoIterator<Item = S>)
    where
        S: AsRef<str>,
    {
        self.cache.invalidate_ids(BY_SUBJECT, subject_ids);
    }

    /// Drop all decisions made for the given accounts.
    pub fn invalidate_requesters<S>(&self, requester_ids: impl IntoIterator<Item = S>)
    where
        S: AsRef<str>,
    {
        self.cache.invalidate_ids(BY_REQUESTER, requester_ids);
    }

    /// Drop the decisions of the given kinds made for `requester_id`.
    pub fn invalidate_requester_kinds(&self, requester_id: &str, kinds: &[DecisionType]) {
        self.cache
            .invalidate(BY_REQUESTER_KIND, kinds.iter().map(|kind| (requester_id, *kind as u8)));
    }

    /// Drop all decisions about statuses of the given threads.
    pub fn invalidate_threads<S>(&self, thread_ids: impl IntoIterator<Item = S>)
    where
        S: AsRef<str>,
    {
        self.cache.invalidate_ids(BY_THREAD, thread_ids);
    }

    /// Drop the decisions made for `requester_id` about statuses of `thread_id`.
    pub fn invalidate_requester_thread(&self, requester_id: &str, thread_id: &str) {
        self.cache.invalidate(BY_REQUESTER_THREAD, [(requester_id, thread_id)]);
    }

    /// Drop all decisions.
    pub fn clear(&self) {
        self.cache.clear();
    }

    /// Resident decision count.
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    /// Whether no decision is cached.
    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    /// Maximum resident decision count.
    pub fn cap(&self) -> usize {
        self.cache.cap()
    }

    /// Get the underlying indexed cache.
    pub fn indexed(&self) -> &IndexedCache<CachedDecision> {
        &self.cache
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use fedcache_common::error::{Error, ErrorKind};

    use super::*;

    fn decisions() -> DecisionCache {
        DecisionCache::new("visibility", 64, None)
    }

    #[test_log::test(tokio::test)]
    async fn test_memoized() {
        let cache = decisions();
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            let d = cache
                .load_one(DecisionType::StatusVisible, Some("01ACCT"), "01STATUS", || async {
                    calls.fetch_add(1, Ordering::Relaxed);
                    Ok(true.into())
                })
                .await
                .unwrap();
            assert!(d.value);
        }
        assert_eq!(calls.load(Ordering::Relaxed), 1);
    }

    #[test_log::test(tokio::test)]
    async fn test_kind_and_requester_in_key() {
        let cache = decisions();
        cache
            .load_one(DecisionType::StatusVisible, None, "01STATUS", || async { Ok(true.into()) })
            .await
            .unwrap();

        assert!(cache.get(DecisionType::StatusVisible, None, "01STATUS").unwrap().value);
        assert!(cache.get(DecisionType::Boostable, None, "01STATUS").is_none());
        assert!(cache.get(DecisionType::StatusVisible, Some("01ACCT"), "01STATUS").is_none());
    }

    #[test_log::test(tokio::test)]
    async fn test_unresolvable_never_cached() {
        let cache = decisions();
        let calls = AtomicUsize::new(0);

        for _ in 0..2 {
            let d = cache
                .load_one(DecisionType::StatusVisible, Some("01ACCT"), "01STATUS", || async {
                    calls.fetch_add(1, Ordering::Relaxed);
                    Err(Error::unresolvable("parent status not dereferenced yet"))
                })
                .await
                .unwrap();
            assert!(!d.value);
        }
        assert_eq!(calls.load(Ordering::Relaxed), 2);
        assert!(cache.is_empty());
    }

    #[test_log::test(tokio::test)]
    async fn test_errors_propagate() {
        let cache = decisions();
        let err = cache
            .load_one(DecisionType::StatusVisible, Some("01ACCT"), "01STATUS", || async {
                Err(Error::new(ErrorKind::External, "db down"))
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::External);
        assert!(cache.is_empty());
    }

    #[test_log::test(tokio::test)]
    async fn test_errors_never_cached() {
        let cache = decisions();
        let calls = AtomicUsize::new(0);

        for _ in 0..2 {
            let err = cache
                .load_one(DecisionType::StatusVisible, Some("01ACCT"), "01STATUS", || async {
                    calls.fetch_add(1, Ordering::Relaxed);
                    Err(Error::not_found())
                })
                .await
                .unwrap_err();
            assert!(err.is_not_found());
        }
        assert_eq!(calls.load(Ordering::Relaxed), 2);
        assert!(cache.is_empty());
    }

    #[test_log::test(tokio::test)]
    async fn test_mute_during_decision_not_stored() {
        let cache = decisions();

        let d = cache
            .load_one(DecisionType::StatusMuted, Some("01A"), "01S", || async {
                // The requester mutes the author while the verdict is computed from storage.
                cache.invalidate_requester_kinds("01A", &DecisionType::MUTES);
                Ok(false.into())
            })
            .await
            .unwrap();
        assert!(!d.value);
        assert!(cache.get(DecisionType::StatusMuted, Some("01A"), "01S").is_none());

        // A mute of another requester does not drop the verdict.
        cache
            .load_one(DecisionType::StatusMuted, Some("01A"), "01S", || async {
                cache.invalidate_requester_kinds("02A", &DecisionType::MUTES);
                Ok(false.into())
            })
            .await
            .unwrap();
        assert!(cache.get(DecisionType::StatusMuted, Some("01A"), "01S").is_some());
    }

    #[test_log::test(tokio::test)]
    async fn test_expired_decision_decided_again() {
        let cache = decisions();
        let calls = AtomicUsize::new(0);
        let decide = || async {
            calls.fetch_add(1, Ordering::Relaxed);
            Ok(Verdict {
                value: true,
                thread_id: None,
                expires_at: Some(Instant::now() + Duration::from_millis(20)),
            })
        };

        cache
            .load_one(DecisionType::StatusMuted, Some("01ACCT"), "01STATUS", decide)
            .await
            .unwrap();
        cache
            .load_one(DecisionType::StatusMuted, Some("01ACCT"), "01STATUS", decide)
            .await
            .unwrap();
        assert_eq!(calls.load(Ordering::Relaxed), 1);

        tokio::time::sleep(Duration::from_millis(40)).await;
        assert!(cache.get(DecisionType::StatusMuted, Some("01ACCT"), "01STATUS").is_none());
        cache
            .load_one(DecisionType::StatusMuted, Some("01ACCT"), "01STATUS", decide)
            .await
            .unwrap();
        assert_eq!(calls.load(Ordering::Relaxed), 2);
    }

    #[test_log::test(tokio::test)]
    async fn test_invalidation_paths() {
        let cache = decisions();
        let verdict = |thread: &str| Verdict {
            value: true,
            thread_id: Some(thread.to_string()),
            expires_at: None,
        };

        for (kind, requester, subject, thread) in [
            (DecisionType::StatusVisible, "01A", "01S", "01T"),
            (DecisionType::StatusMuted, "01A", "02S", "02T"),
            (DecisionType::StatusFiltered, "01A", "03S", "03T"),
            (DecisionType::StatusVisible, "02A", "01S", "01T"),
            (DecisionType::AccountVisible, "02A", "01A", ""),
        ] {
            let v = verdict(thread);
            cache
                .load_one(kind, Some(requester), subject, || async move { Ok(v) })
                .await
                .unwrap();
        }
        assert_eq!(cache.len(), 5);

        cache.invalidate_requester_kinds("01A", &DecisionType::MUTES);
        assert!(cache.get(DecisionType::StatusMuted, Some("01A"), "02S").is_none());
        assert!(cache.get(DecisionType::StatusFiltered, Some("01A"), "03S").is_some());
        assert_eq!(cache.len(), 4);

        cache.invalidate_requester_thread("02A", "01T");
        assert!(cache.get(DecisionType::StatusVisible, Some("02A"), "01S").is_none());
        assert!(cache.get(DecisionType::StatusVisible, Some("01A"), "01S").is_some());

        cache.invalidate_threads(["03T"]);
        assert!(cache.get(DecisionType::StatusFiltered, Some("01A"), "03S").is_none());

        cache.invalidate_subjects(["01A"]);
        assert!(cache.get(DecisionType::AccountVisible, Some("02A"), "01A").is_none());

        cache.invalidate_requesters(["01A"]);
        assert!(cache.is_empty());
    }
}
