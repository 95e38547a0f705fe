// src/pipeline/refresh.rs

//! One discovery and fetch cycle.

use std::sync::Arc;
use std::time::Instant;

use crate::models::{Config, Record};
use crate::pipeline::launch::{Sink, Task, launch_limited, task};
use crate::services::{EventDiscovery, RepositoryFetcher};
use crate::utils::http::JsonClient;

/// Discovery followed by a bounded fan-out of repository fetches.
pub struct RefreshCycle {
    discovery: EventDiscovery,
    fetcher: Arc<RepositoryFetcher>,
    max_concurrent: usize,
}

impl RefreshCycle {
    pub fn new(config: &Config, client: Arc<dyn JsonClient>) -> Self {
        let discovery = EventDiscovery::new(Arc::clone(&client), &config.feed, &config.discovery);
        let fetcher = RepositoryFetcher::new(client, Arc::new(config.projection.clone()));

        Self {
            discovery,
            fetcher: Arc::new(fetcher),
            max_concurrent: config.cache.max_concurrent,
        }
    }

    /// Run one cycle and return every repository that normalized cleanly.
    pub async fn run(&self) -> Vec<Record> {
        let started = Instant::now();
        let urls = self.discovery.discover().await;
        let discovered = urls.len();

        let tasks: Vec<Task<Record>> = urls
            .into_iter()
            .map(|url| {
                let fetcher = Arc::clone(&self.fetcher);
                task(move |sink: Sink<Record>| async move {
                    if let Some(record) = fetcher.fetch(&url).await {
                        sink.emit(record).await;
                    }
                })
            })
            .collect();

        let records = launch_limited(tasks, self.max_concurrent).await;
        log::info!(
            "Refresh cycle: {} of {} repositories normalized in {:.1}s",
            records.len(),
            discovered,
            started.elapsed().as_secs_f64()
        );
        records
    }
}
