mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use serde_json::json;

use repowatch::{cache::RepositoryCache, pipeline::RefreshCycle};

use common::FakeClient;

const NAMES: [&str; 3] = ["a", "b", "c"];
const HOUR: Duration = Duration::from_secs(3600);

/// Serve the three repositories with `full_name` tagged by `version`.
fn publish(client: &FakeClient, version: u64) {
    for name in NAMES {
        common::seed_repository(client, name, &format!("v{version}"), json!({"Go": 100}));
    }
}

async fn cache_with(client: &Arc<FakeClient>, refresh: Duration) -> Arc<RepositoryCache> {
    let cycle = RefreshCycle::new(&common::config(), client.clone());
    RepositoryCache::with_cycle(cycle, refresh).await
}

#[tokio::test]
async fn start_builds_initial_snapshot() {
    let client = Arc::new(FakeClient::new());
    common::seed_feed(&client, &NAMES);
    publish(&client, 1);

    let cache = RepositoryCache::start(&common::config(), client.clone()).await;
    let snapshot = cache.list();

    assert_eq!(snapshot.generation, 1);
    assert_eq!(snapshot.len(), 3);
    cache.shutdown();
}

#[tokio::test]
async fn refresh_commits_new_generation() {
    let client = Arc::new(FakeClient::new());
    common::seed_feed(&client, &NAMES);
    publish(&client, 1);
    let cache = cache_with(&client, HOUR).await;
    let first = cache.list();

    publish(&client, 2);
    assert!(cache.refresh_now().await);

    let snapshot = cache.list();
    assert_eq!(snapshot.generation, 2);
    assert!(snapshot.refreshed_at >= first.refreshed_at);
    assert!(snapshot.records.iter().all(|r| r["full_name"] == json!("v2")));
}

#[tokio::test]
async fn empty_refresh_keeps_previous_snapshot() {
    let client = Arc::new(FakeClient::new());
    common::seed_feed(&client, &NAMES);
    publish(&client, 1);
    let cache = cache_with(&client, HOUR).await;
    let before = cache.list();

    client.clear();
    assert!(!cache.refresh_now().await);

    let after = cache.list();
    assert!(Arc::ptr_eq(&before, &after));
    assert_eq!(after.len(), 3);
}

#[tokio::test]
async fn empty_initial_cycle_is_committed_then_replaced() {
    let client = Arc::new(FakeClient::new());
    let cache = cache_with(&client, HOUR).await;

    let first = cache.list();
    assert_eq!(first.generation, 1);
    assert!(first.is_empty());

    common::seed_feed(&client, &NAMES);
    publish(&client, 2);
    assert!(cache.refresh_now().await);
    assert_eq!(cache.list().len(), 3);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn readers_only_observe_committed_snapshots() {
    let client = Arc::new(FakeClient::with_delay(Duration::from_millis(2)));
    common::seed_feed(&client, &NAMES);
    publish(&client, 1);
    let cache = cache_with(&client, HOUR).await;
    let done = Arc::new(AtomicBool::new(false));

    let readers: Vec<_> = (0..2)
        .map(|_| {
            let cache = Arc::clone(&cache);
            let done = Arc::clone(&done);
            tokio::spawn(async move {
                let mut last_generation = 0;
                let mut reads = 0usize;
                while !done.load(Ordering::SeqCst) {
                    let snapshot = cache.list();
                    assert!(snapshot.generation >= last_generation);
                    last_generation = snapshot.generation;

                    let tag = json!(format!("v{}", snapshot.generation));
                    assert_eq!(snapshot.len(), NAMES.len());
                    assert!(snapshot.records.iter().all(|r| r["full_name"] == tag));

                    reads += 1;
                    tokio::time::sleep(Duration::from_millis(1)).await;
                }
                reads
            })
        })
        .collect();

    for version in 2..=5 {
        publish(&client, version);
        assert!(cache.refresh_now().await);
    }
    done.store(true, Ordering::SeqCst);

    for reader in readers {
        assert!(reader.await.unwrap() > 0);
    }
    assert_eq!(cache.list().generation, 5);
}

#[tokio::test]
async fn background_loop_refreshes_on_interval() {
    let client = Arc::new(FakeClient::new());
    common::seed_feed(&client, &NAMES);
    publish(&client, 1);
    let cache = cache_with(&client, Duration::from_millis(50)).await;

    let refreshed = tokio::time::timeout(Duration::from_secs(5), async {
        while cache.list().generation < 3 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await;

    assert!(refreshed.is_ok(), "cache was not refreshed in time");
    cache.shutdown();
}

#[tokio::test]
async fn shutdown_stops_background_loop() {
    let client = Arc::new(FakeClient::new());
    common::seed_feed(&client, &NAMES);
    publish(&client, 1);
    let cache = cache_with(&client, Duration::from_millis(20)).await;

    cache.shutdown();
    tokio::time::sleep(Duration::from_millis(50)).await;
    let generation = cache.list().generation;
    tokio::time::sleep(Duration::from_millis(150)).await;

    assert_eq!(cache.list().generation, generation);
}
