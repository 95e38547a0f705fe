// src/services/discovery.rs

//! Repository discovery from the public event feed.

use std::collections::HashSet;
use std::sync::Arc;

use serde_json::Value;

use crate::error::{AppError, Result};
use crate::models::{DiscoveryConfig, FeedConfig};
use crate::utils::http::JsonClient;
use crate::utils::page_url;

/// Walks the event feed page by page, collecting repository URLs.
pub struct EventDiscovery {
    client: Arc<dyn JsonClient>,
    event_url: String,
    page_size: usize,
    target: usize,
    max_pages: usize,
}

impl EventDiscovery {
    pub fn new(
        client: Arc<dyn JsonClient>,
        feed: &FeedConfig,
        discovery: &DiscoveryConfig,
    ) -> Self {
        Self {
            client,
            event_url: feed.event_url.clone(),
            page_size: feed.page_size,
            target: discovery.target,
            max_pages: discovery.max_pages,
        }
    }

    /// Collect up to `target` distinct repository URLs.
    ///
    /// Stops early on an empty page and never requests more than `max_pages`
    /// pages. Failing pages are skipped.
    pub async fn discover(&self) -> HashSet<String> {
        let mut urls = HashSet::with_capacity(self.target);

        for page in 1..=self.max_pages {
            if urls.len() >= self.target {
                break;
            }

            match self.fetch_page(page).await {
                Ok(events) if events.is_empty() => {
                    log::debug!("Event page {} is empty, feed exhausted", page);
                    break;
                }
                Ok(events) => {
                    let added = self.collect(&events, &mut urls);
                    log::debug!(
                        "Event page {}: {} events, {} new repositories",
                        page,
                        events.len(),
                        added
                    );
                }
                Err(error) => {
                    log::warn!("Failed to read event page {}: {}", page, error);
                }
            }
        }

        if urls.len() < self.target {
            log::info!(
                "Discovery stopped with {} of {} repositories",
                urls.len(),
                self.target
            );
        }
        urls
    }

    async fn fetch_page(&self, page: usize) -> Result<Vec<Value>> {
        let url = page_url(&self.event_url, self.page_size, page)?;
        match self.client.get_json(&url).await? {
            Value::Array(events) => Ok(events),
            _ => Err(AppError::response(url, "expected an array of events")),
        }
    }

    /// Insert the repository URL of each event, stopping at the target.
    fn collect(&self, events: &[Value], urls: &mut HashSet<String>) -> usize {
        let mut added = 0;
        for url in events.iter().filter_map(repo_url) {
            if urls.len() >= self.target {
                break;
            }
            if urls.insert(url.to_string()) {
                added += 1;
            }
        }
        added
    }
}

/// The non-empty `repo.url` of an event, if any.
fn repo_url(event: &Value) -> Option<&str> {
    event
        .get("repo")?
        .get("url")?
        .as_str()
        .filter(|url| !url.is_empty())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_repo_url() {
        let event = json!({"id": "1", "repo": {"id": 7, "url": "https://api.github.com/repos/a/b"}});
        assert_eq!(repo_url(&event), Some("https://api.github.com/repos/a/b"));
    }

    #[test]
    fn test_repo_url_missing_or_empty() {
        assert_eq!(repo_url(&json!({"id": "1"})), None);
        assert_eq!(repo_url(&json!({"repo": {"url": ""}})), None);
        assert_eq!(repo_url(&json!({"repo": {"url": 12}})), None);
        assert_eq!(repo_url(&json!({"repo": "a/b"})), None);
    }
}
