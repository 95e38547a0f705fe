#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};

use repowatch::{
    error::{AppError, Result},
    models::{Config, Record},
    utils::http::JsonClient,
};

pub const EVENTS_URL: &str = "http://feed.test/events";
pub const PAGE_SIZE: usize = 1;

/// In-memory stand-in for the GitHub API.
#[derive(Default)]
pub struct FakeClient {
    responses: Mutex<HashMap<String, Value>>,
    calls: Mutex<Vec<String>>,
    delay: Option<Duration>,
}

impl FakeClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn respond(&self, url: impl Into<String>, body: Value) {
        self.responses.lock().unwrap().insert(url.into(), body);
    }

    pub fn clear(&self) {
        self.responses.lock().unwrap().clear();
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn page_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|url| url.starts_with(EVENTS_URL))
            .count()
    }
}

#[async_trait]
impl JsonClient for FakeClient {
    async fn get_json(&self, url: &str) -> Result<Value> {
        self.calls.lock().unwrap().push(url.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let body = self.responses.lock().unwrap().get(url).cloned();
        body.ok_or_else(|| AppError::response(url, "404 Not Found"))
    }
}

pub fn config() -> Config {
    let mut config = Config::default();
    config.feed.event_url = EVENTS_URL.to_string();
    config.feed.page_size = PAGE_SIZE;
    config.feed.access_token = "test-token".to_string();
    config.cache.max_concurrent = 4;
    config
}

pub fn page_url(page: usize) -> String {
    format!("{EVENTS_URL}?per_page={PAGE_SIZE}&page={page}")
}

pub fn repo_url(name: &str) -> String {
    format!("http://api.test/repos/owner/{name}")
}

pub fn languages_url(name: &str) -> String {
    format!("{}/languages", repo_url(name))
}

pub fn event(repo_url: &str) -> Value {
    json!({ "type": "WatchEvent", "repo": { "name": "owner/x", "url": repo_url } })
}

/// One event per page, then an empty page.
pub fn seed_feed(client: &FakeClient, names: &[&str]) {
    for (i, name) in names.iter().enumerate() {
        client.respond(page_url(i + 1), json!([event(&repo_url(name))]));
    }
    client.respond(page_url(names.len() + 1), json!([]));
}

pub fn seed_repository(client: &FakeClient, name: &str, full_name: &str, languages: Value) {
    client.respond(
        repo_url(name),
        json!({
            "id": 42,
            "name": name,
            "full_name": full_name,
            "owner": { "login": "owner", "id": 7 },
            "languages_url": languages_url(name),
            "stargazers_count": 3
        }),
    );
    client.respond(languages_url(name), languages);
}

pub fn record(value: Value) -> Record {
    match value {
        Value::Object(record) => record,
        other => panic!("not an object: {other}"),
    }
}
