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

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use fedcache::prelude::*;
use futures_util::future::join_all;

fn account() -> Account {
    Account {
        id: "01ID".to_string(),
        username: "a".to_string(),
        uri: "https://ex/u/a".to_string(),
        url: "https://ex/@a".to_string(),
        ..Default::default()
    }
}

#[test_log::test]
fn test_account_scenario() {
    let caches = Caches::new(&CacheConfig::default()).unwrap();
    let follows = vec!["01F1".to_string(), "01F2".to_string()];

    caches.db.account.put(&account());
    caches.db.follow_ids.put(">01ID", &follows);

    assert_eq!(caches.db.account.get_one("id", "01ID"), Some(account()));
    assert_eq!(caches.db.account.get_one("uri", "https://ex/u/a"), Some(account()));
    assert_eq!(caches.db.account.get_one("url", "https://ex/@a"), Some(account()));
    assert_eq!(caches.db.follow_ids.get(">01ID"), Some(follows.clone()));

    caches.db.account.invalidate_ids("id", ["01ID"]);

    assert!(caches.db.account.get_one("id", "01ID").is_none());
    assert!(caches.db.account.get_one("uri", "https://ex/u/a").is_none());
    assert!(caches.db.account.get_one("url", "https://ex/@a").is_none());
    assert!(caches.db.follow_ids.get(">01ID").is_none());

    // The account is gone, so invalidating it again cascades nowhere.
    caches.db.follow_ids.put(">01ID", &follows);
    caches.db.account.invalidate_ids("id", ["01ID"]);
    assert_eq!(caches.db.follow_ids.get(">01ID"), Some(follows));
}

#[test_log::test(tokio::test(flavor = "multi_thread", worker_threads = 4))]
async fn test_concurrent_loads_share_one_storage_read() {
    let caches = Arc::new(Caches::new(&CacheConfig::default()).unwrap());
    let reads = Arc::new(AtomicUsize::new(0));

    let tasks = (0..16).map(|_| {
        let caches = caches.clone();
        let reads = reads.clone();
        tokio::spawn(async move {
            caches
                .db
                .account
                .load_one("uri", "https://ex/u/a", || async move {
                    reads.fetch_add(1, Ordering::Relaxed);
                    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
                    Ok(account())
                })
                .await
        })
    });
    for res in join_all(tasks).await {
        assert_eq!(res.unwrap().unwrap(), account());
    }
    assert_eq!(reads.load(Ordering::Relaxed), 1);
    assert_eq!(caches.db.account.get_one("url", "https://ex/@a"), Some(account()));
}

#[test_log::test(tokio::test)]
async fn test_missing_row_is_remembered_until_stored() {
    let caches = Caches::new(&CacheConfig::default()).unwrap();
    let reads = AtomicUsize::new(0);

    for _ in 0..2 {
        let res = caches
            .db
            .status
            .load_one("uri", "https://ex/s/1", || async {
                reads.fetch_add(1, Ordering::Relaxed);
                Err(Error::not_found())
            })
            .await;
        assert!(res.unwrap_err().is_not_found());
    }
    assert_eq!(reads.load(Ordering::Relaxed), 1);

    let status = Status {
        id: "01S".to_string(),
        uri: "https://ex/s/1".to_string(),
        account_id: "01ID".to_string(),
        ..Default::default()
    };
    caches.db.status.store(&status, || async { Ok(()) }).await.unwrap();

    let loaded = caches
        .db
        .status
        .load_one("uri", "https://ex/s/1", || async { Err(Error::not_found()) })
        .await
        .unwrap();
    assert_eq!(loaded, status);
}

#[test_log::test(tokio::test)]
async fn test_store_cascades() {
    let caches = Caches::new(&CacheConfig::default()).unwrap();

    caches.db.follow_ids.put("<01B", &["01OLD".to_string()]);
    let follow = Follow {
        id: "01F".to_string(),
        account_id: "01A".to_string(),
        target_account_id: "01B".to_string(),
        ..Default::default()
    };
    caches.db.follow.store(&follow, || async { Ok(()) }).await.unwrap();

    assert!(caches.db.follow_ids.get("<01B").is_none());
    assert_eq!(
        caches.db.follow.get_one("account_id,target_account_id", ("01A", "01B")),
        Some(follow)
    );
}

#[test_log::test(tokio::test)]
async fn test_batch_load_by_ids() {
    let caches = Caches::new(&CacheConfig::default()).unwrap();
    caches.db.status.put(&Status {
        id: "01S1".to_string(),
        ..Default::default()
    });

    let statuses = caches
        .db
        .status
        .load_ids("id", &["01S1", "01S2", "01S3"], |missing| async move {
            assert_eq!(missing, vec!["01S2".to_string(), "01S3".to_string()]);
            Ok(missing
                .into_iter()
                .map(|id| Status {
                    id,
                    ..Default::default()
                })
                .collect())
        })
        .await
        .unwrap();

    let ids: Vec<_> = statuses.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, ["01S1", "01S2", "01S3"]);
    assert_eq!(caches.db.status.len(), 3);
}

#[test_log::test(tokio::test)]
async fn test_visibility_decisions() {
    let caches = Caches::new(&CacheConfig::default()).unwrap();
    let decides = AtomicUsize::new(0);

    // Unresolvable verdicts are never remembered.
    for _ in 0..2 {
        let decision = caches
            .visibility
            .load_one(DecisionType::StatusVisible, Some("01A"), "01S", || async {
                decides.fetch_add(1, Ordering::Relaxed);
                Err(Error::unresolvable("parent status still being fetched"))
            })
            .await
            .unwrap();
        assert!(!decision.value);
    }
    assert_eq!(decides.load(Ordering::Relaxed), 2);

    let decision = caches
        .visibility
        .load_one(DecisionType::StatusVisible, None, "01S", || async {
            Ok(Verdict::from(true))
        })
        .await
        .unwrap();
    assert!(decision.value);
    assert_eq!(decision.requester_id, NO_REQUESTER);
    assert!(caches.visibility.get(DecisionType::StatusVisible, None, "01S").is_some());
    assert!(caches.visibility.get(DecisionType::StatusVisible, Some("01A"), "01S").is_none());

    // Invalidating the status drops every decision about it.
    caches.db.status.put(&Status {
        id: "01S".to_string(),
        ..Default::default()
    });
    caches.db.status.invalidate_ids("id", ["01S"]);
    assert!(caches.visibility.is_empty());
}

#[test_log::test(tokio::test)]
async fn test_failed_decisions_are_decided_again() {
    let caches = Caches::new(&CacheConfig::default()).unwrap();
    let decides = AtomicUsize::new(0);

    for _ in 0..2 {
        let err = caches
            .visibility
            .load_one(DecisionType::StatusVisible, Some("01A"), "01S", || async {
                decides.fetch_add(1, Ordering::Relaxed);
                Err(Error::not_found())
            })
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }
    assert_eq!(decides.load(Ordering::Relaxed), 2);
    assert!(caches.visibility.is_empty());

    // Once the status is there, the decision is made and then dropped with the status.
    caches
        .visibility
        .load_one(DecisionType::StatusVisible, Some("01A"), "01S", || async {
            Ok(Verdict::from(true))
        })
        .await
        .unwrap();
    caches.db.status.put(&Status {
        id: "01S".to_string(),
        ..Default::default()
    });
    caches.db.status.invalidate_ids("id", ["01S"]);
    assert!(caches.visibility.is_empty());
}

#[test_log::test(tokio::test)]
async fn test_domain_blocks() {
    let caches = Caches::new(&CacheConfig::default()).unwrap();
    let blocks = || async { Ok(vec!["google.com".to_string(), "pleroma.bad.host".to_string()]) };

    for (domain, blocked) in [
        ("mail.google.com", true),
        ("google.com", true),
        ("dev.pleroma.bad.host", true),
        ("google.ie", false),
        ("mastodon.bad.host", false),
        ("Mail.Google.COM", true),
        ("google.com.", true),
    ] {
        assert_eq!(caches.domain_block.matches(domain, blocks).await.unwrap(), blocked, "{domain}");
    }
    assert!(!caches.domain_allow.is_hydrated());

    caches.domain_block.clear();
    let err = caches
        .domain_block
        .matches("google.com", || async { Err(Error::new(ErrorKind::External, "database is gone")) })
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::External);
}

#[test_log::test]
fn test_capacity_bound() {
    let mut config = CacheConfig::default();
    config.ratios.tombstone = -8.0;
    let caches = Caches::new(&config).unwrap();

    for i in 0..100 {
        caches.db.tombstone.put(&Tombstone {
            id: format!("01T{i:03}"),
            uri: format!("https://ex/t/{i}"),
            ..Default::default()
        });
    }
    assert_eq!(caches.db.tombstone.len(), 8);
    assert!(caches.db.tombstone.get_one("id", "01T099").is_some());
    assert!(caches.db.tombstone.get_one("id", "01T000").is_none());
}
