// src/cache.rs

//! Self-refreshing repository cache.
//!
//! The cache always holds one committed [`Snapshot`]. Readers load it without
//! locking; a background loop recomputes a candidate on a fixed interval and
//! swaps it in atomically. Empty candidates are discarded, so once built the
//! cache never regresses to an empty state.
//!
//! Cycles never overlap: the loop runs them one after another and missed
//! ticks are skipped rather than queued.

use std::sync::{Arc, Weak};
use std::time::Duration;

use arc_swap::ArcSwap;
use tokio::sync::{Mutex, watch};
use tokio::time::{self, MissedTickBehavior};

use crate::models::{Config, Record, Snapshot};
use crate::pipeline::RefreshCycle;
use crate::utils::http::JsonClient;

/// `tokio::time::interval` rejects a zero period.
const MIN_REFRESH: Duration = Duration::from_millis(1);

/// Repository snapshot holder with a background refresh loop.
pub struct RepositoryCache {
    current: ArcSwap<Snapshot>,
    cycle: RefreshCycle,
    /// Serializes refresh cycles and commits.
    refreshing: Mutex<()>,
    shutdown: watch::Sender<bool>,
}

impl RepositoryCache {
    /// Build the first snapshot, then start refreshing every `cache.refresh_secs`.
    pub async fn start(config: &Config, client: Arc<dyn JsonClient>) -> Arc<Self> {
        let cycle = RefreshCycle::new(config, client);
        Self::with_cycle(cycle, config.cache.refresh_interval()).await
    }

    /// Same as [`RepositoryCache::start`] with an explicit cycle and interval.
    pub async fn with_cycle(cycle: RefreshCycle, refresh: Duration) -> Arc<Self> {
        let records = cycle.run().await;
        if records.is_empty() {
            log::warn!("Initial refresh produced no repositories");
        }
        log::info!("Cache ready with {} repositories", records.len());

        let (shutdown, shutdown_rx) = watch::channel(false);
        let cache = Arc::new(Self {
            current: ArcSwap::from_pointee(Snapshot::new(1, records)),
            cycle,
            refreshing: Mutex::new(()),
            shutdown,
        });

        tokio::spawn(refresh_loop(Arc::downgrade(&cache), refresh, shutdown_rx));
        cache
    }

    /// The latest committed snapshot.
    pub fn list(&self) -> Arc<Snapshot> {
        self.current.load_full()
    }

    /// Run one cycle now and commit it unless it came back empty.
    ///
    /// Returns whether a new snapshot was committed.
    pub async fn refresh_now(&self) -> bool {
        let _refreshing = self.refreshing.lock().await;
        let records = self.cycle.run().await;
        self.commit(records)
    }

    /// Stop the background loop. Readers keep the last snapshot.
    pub fn shutdown(&self) {
        // Only fails when the loop has already exited.
        let _ = self.shutdown.send(true);
    }

    fn commit(&self, records: Vec<Record>) -> bool {
        if records.is_empty() {
            log::warn!("Refresh produced no repositories, keeping the previous snapshot");
            return false;
        }

        let snapshot = Snapshot::new(self.current.load().generation + 1, records);
        log::info!(
            "Committed snapshot {} with {} repositories at {}",
            snapshot.generation,
            snapshot.len(),
            snapshot.refreshed_at.to_rfc3339()
        );
        self.current.store(Arc::new(snapshot));
        true
    }
}

async fn refresh_loop(
    cache: Weak<RepositoryCache>,
    refresh: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut tick = time::interval(refresh.max(MIN_REFRESH));
    tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
    // The first tick fires immediately; the initial snapshot is already built.
    tick.tick().await;

    loop {
        tokio::select! {
            _ = tick.tick() => {
                let Some(cache) = cache.upgrade() else { break };
                cache.refresh_now().await;
            }
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
        }
    }

    log::info!("Refresh loop stopped");
}
