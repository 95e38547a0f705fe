// src/models/config.rs

//! Application configuration structures.

use std::fs;
use std::io;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::{Projection, ProjectionTable};

/// Largest page size the event feed accepts.
pub const MAX_PAGE_SIZE: usize = 100;

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Upstream feed and HTTP client settings
    #[serde(default)]
    pub feed: FeedConfig,

    /// Repository discovery bounds
    #[serde(default)]
    pub discovery: DiscoveryConfig,

    /// Refresh and fan-out settings
    #[serde(default)]
    pub cache: CacheConfig,

    /// Listening socket
    #[serde(default)]
    pub server: ServerConfig,

    /// Field projection applied to every fetched repository
    #[serde(default = "defaults::projection")]
    pub projection: ProjectionTable,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration, or the defaults when the file does not exist.
    ///
    /// A file that exists but cannot be read or parsed is an error.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        match Self::load(&path) {
            Err(AppError::Io(e)) if e.kind() == io::ErrorKind::NotFound => {
                log::warn!("Config file {:?} not found. Using defaults.", path.as_ref());
                Ok(Self::default())
            }
            result => result,
        }
    }

    /// Apply the process environment on top of the loaded values.
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup.
    ///
    /// Recognized keys: `GITHUB_ACCESS_TOKEN`, `GITHUB_EVENT_API_URL`,
    /// `GITHUB_EVENT_API_PAGE_SIZE`, `REFRESH` (seconds), `MAX_CALL`, `PORT`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(token) = lookup("GITHUB_ACCESS_TOKEN") {
            self.feed.access_token = token;
        }
        if let Some(event_url) = lookup("GITHUB_EVENT_API_URL") {
            self.feed.event_url = event_url;
        }
        if let Some(value) = lookup("GITHUB_EVENT_API_PAGE_SIZE") {
            self.feed.page_size = parse_override("GITHUB_EVENT_API_PAGE_SIZE", &value)?;
        }
        if let Some(value) = lookup("REFRESH") {
            self.cache.refresh_secs = parse_override("REFRESH", &value)?;
        }
        if let Some(value) = lookup("MAX_CALL") {
            self.cache.max_concurrent = parse_override("MAX_CALL", &value)?;
        }
        if let Some(value) = lookup("PORT") {
            self.server.port = parse_override("PORT", &value)?;
        }
        Ok(())
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.feed.access_token.trim().is_empty() {
            return Err(AppError::validation(
                "feed.access_token is empty (set GITHUB_ACCESS_TOKEN)",
            ));
        }
        url::Url::parse(&self.feed.event_url)?;
        if self.feed.page_size == 0 || self.feed.page_size > MAX_PAGE_SIZE {
            return Err(AppError::validation(format!(
                "feed.page_size must be between 1 and {MAX_PAGE_SIZE}"
            )));
        }
        if self.feed.user_agent.trim().is_empty() {
            return Err(AppError::validation("feed.user_agent is empty"));
        }
        if self.feed.timeout_secs == 0 {
            return Err(AppError::validation("feed.timeout_secs must be > 0"));
        }
        if self.discovery.target == 0 {
            return Err(AppError::validation("discovery.target must be > 0"));
        }
        if self.discovery.max_pages == 0 {
            return Err(AppError::validation("discovery.max_pages must be > 0"));
        }
        if self.cache.refresh_secs == 0 {
            return Err(AppError::validation("cache.refresh_secs must be > 0"));
        }
        if self.cache.max_concurrent == 0 {
            return Err(AppError::validation("cache.max_concurrent must be > 0"));
        }
        if self.server.port == 0 {
            return Err(AppError::validation("server.port must be > 0"));
        }
        if self.projection.is_empty() {
            return Err(AppError::validation("No projection rules defined"));
        }
        for (field, rule) in &self.projection {
            match rule {
                Projection::Flatten { key } if key.is_empty() => {
                    return Err(AppError::validation(format!(
                        "projection.{field}: flatten key is empty"
                    )));
                }
                Projection::Fetch { target } if target.is_empty() => {
                    return Err(AppError::validation(format!(
                        "projection.{field}: fetch target is empty"
                    )));
                }
                _ => {}
            }
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            feed: FeedConfig::default(),
            discovery: DiscoveryConfig::default(),
            cache: CacheConfig::default(),
            server: ServerConfig::default(),
            projection: defaults::projection(),
        }
    }
}

fn parse_override<T>(key: &str, value: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| AppError::config(format!("{key}={value:?} is invalid: {e}")))
}

/// Upstream feed and HTTP client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    /// Event feed endpoint, without pagination parameters
    #[serde(default = "defaults::event_url")]
    pub event_url: String,

    /// Events requested per page
    #[serde(default = "defaults::page_size")]
    pub page_size: usize,

    /// Bearer token sent with every request
    #[serde(default)]
    pub access_token: String,

    /// Value of the `X-GitHub-Api-Version` header
    #[serde(default = "defaults::api_version")]
    pub api_version: String,

    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            event_url: defaults::event_url(),
            page_size: defaults::page_size(),
            access_token: String::new(),
            api_version: defaults::api_version(),
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
        }
    }
}

/// Repository discovery bounds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    /// Number of distinct repositories to collect per cycle
    #[serde(default = "defaults::target")]
    pub target: usize,

    /// Upper bound on page requests per cycle
    #[serde(default = "defaults::max_pages")]
    pub max_pages: usize,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            target: defaults::target(),
            max_pages: defaults::max_pages(),
        }
    }
}

/// Refresh and fan-out settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Seconds between two refresh cycles
    #[serde(default = "defaults::refresh")]
    pub refresh_secs: u64,

    /// Maximum repositories fetched concurrently
    #[serde(default = "defaults::max_concurrent")]
    pub max_concurrent: usize,
}

impl CacheConfig {
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_secs)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            refresh_secs: defaults::refresh(),
            max_concurrent: defaults::max_concurrent(),
        }
    }
}

/// Listening socket.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "defaults::port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: defaults::port(),
        }
    }
}

mod defaults {
    use crate::models::{Projection, ProjectionTable};

    // Feed defaults
    pub fn event_url() -> String {
        "https://api.github.com/events".into()
    }
    pub fn page_size() -> usize {
        100
    }
    pub fn api_version() -> String {
        "2022-11-28".into()
    }
    pub fn user_agent() -> String {
        "repowatch/0.1".into()
    }
    pub fn timeout() -> u64 {
        30
    }

    // Discovery defaults
    pub fn target() -> usize {
        100
    }
    pub fn max_pages() -> usize {
        10
    }

    // Cache defaults
    pub fn refresh() -> u64 {
        300
    }
    // GitHub accepts 100 concurrent requests; keep some headroom
    pub fn max_concurrent() -> usize {
        90
    }

    // Server defaults
    pub fn port() -> u16 {
        5000
    }

    // Projection defaults
    pub fn projection() -> ProjectionTable {
        ProjectionTable::from([
            ("full_name".to_string(), Projection::Keep),
            ("name".to_string(), Projection::Keep),
            (
                "owner".to_string(),
                Projection::Flatten {
                    key: "login".into(),
                },
            ),
            (
                "languages_url".to_string(),
                Projection::Fetch {
                    target: "languages".into(),
                },
            ),
        ])
    }
}
