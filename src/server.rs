// src/server.rs

//! HTTP layer: liveness probe and repository listing.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Serialize;
use serde_json::json;

use crate::cache::RepositoryCache;
use crate::error::Result;
use crate::filter::Predicate;
use crate::models::Record;

const MULTIPLE_FILTERS: &str = "only first filter is used";
const UNPARSABLE_FILTER: &str = "can not parse filter";

pub fn router(cache: Arc<RepositoryCache>) -> Router {
    Router::new()
        .route("/ping", get(ping))
        .route("/repos", get(list_repositories))
        .with_state(cache)
}

/// Bind `0.0.0.0:port` and serve until the listener fails.
pub async fn serve(cache: Arc<RepositoryCache>, port: u16) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    log::info!("Listening on port {}", port);
    axum::serve(listener, router(cache)).await?;
    Ok(())
}

async fn ping() -> impl IntoResponse {
    Json(json!({ "status": "pong" }))
}

#[derive(Serialize)]
struct Listing<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    filter: Option<&'a str>,
    repositories: Vec<&'a Record>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    filter_errors: Vec<&'static str>,
}

async fn list_repositories(
    State(cache): State<Arc<RepositoryCache>>,
    Query(params): Query<Vec<(String, String)>>,
) -> Response {
    let snapshot = cache.list();
    let filters: Vec<&str> = params
        .iter()
        .filter(|(key, _)| key == "filter")
        .map(|(_, value)| value.as_str())
        .collect();

    let mut listing = Listing {
        filter: filters.first().copied(),
        repositories: snapshot.records.iter().collect(),
        filter_errors: Vec::new(),
    };

    if filters.len() > 1 {
        listing.filter_errors.push(MULTIPLE_FILTERS);
    }
    if let Some(source) = listing.filter {
        match Predicate::parse(source) {
            Ok(predicate) => listing.repositories.retain(|record| predicate.matches(record)),
            Err(error) => {
                log::warn!("{}: {}", UNPARSABLE_FILTER, error);
                listing.filter_errors.push(UNPARSABLE_FILTER);
            }
        }
    }

    match serde_json::to_string_pretty(&listing) {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/json")],
            body,
        )
            .into_response(),
        Err(error) => {
            log::error!("Fail to encode JSON: {}", error);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
