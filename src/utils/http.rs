// src/utils/http.rs

//! HTTP client utilities.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderName, HeaderValue};
use serde_json::Value;

use crate::error::{AppError, Result};
use crate::models::FeedConfig;

const GITHUB_JSON: &str = "application/vnd.github+json";
const API_VERSION_HEADER: &str = "x-github-api-version";

/// Source of JSON documents addressed by URL.
#[async_trait]
pub trait JsonClient: Send + Sync {
    /// GET `url` and parse the body as JSON.
    async fn get_json(&self, url: &str) -> Result<Value>;
}

/// GitHub REST client carrying the credential and API headers on every request.
#[derive(Clone)]
pub struct ApiClient {
    client: reqwest::Client,
}

impl ApiClient {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl JsonClient for ApiClient {
    async fn get_json(&self, url: &str) -> Result<Value> {
        log::debug!("GET {url}");
        let bytes = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

/// Create a configured asynchronous HTTP client.
pub fn create_api_client(config: &FeedConfig) -> Result<ApiClient> {
    let client = reqwest::Client::builder()
        .user_agent(&config.user_agent)
        .timeout(Duration::from_secs(config.timeout_secs))
        .default_headers(default_headers(config)?)
        .build()?;
    Ok(ApiClient::new(client))
}

fn default_headers(config: &FeedConfig) -> Result<HeaderMap> {
    let mut authorization = HeaderValue::from_str(&format!("Bearer {}", config.access_token))
        .map_err(|e| AppError::config(format!("access token is not a valid header: {e}")))?;
    authorization.set_sensitive(true);

    let api_version = HeaderValue::from_str(&config.api_version)
        .map_err(|e| AppError::config(format!("api version is not a valid header: {e}")))?;

    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static(GITHUB_JSON));
    headers.insert(AUTHORIZATION, authorization);
    headers.insert(HeaderName::from_static(API_VERSION_HEADER), api_version);
    Ok(headers)
}
