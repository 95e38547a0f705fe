// src/utils/mod.rs

//! Utility functions and helpers.

pub mod http;

use url::Url;

/// Build the URL of one event feed page.
pub fn page_url(event_url: &str, page_size: usize, page: usize) -> crate::error::Result<String> {
    let mut url = Url::parse(event_url)?;
    url.query_pairs_mut()
        .append_pair("per_page", &page_size.to_string())
        .append_pair("page", &page.to_string());
    Ok(url.into())
}
