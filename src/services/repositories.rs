// src/services/repositories.rs

//! Repository fetching and normalization.

use std::sync::Arc;

use serde_json::Value;

use crate::error::{AppError, Result};
use crate::models::{Projection, ProjectionTable, Record};
use crate::utils::http::JsonClient;

/// Fetches raw repositories and reduces them through the projection table.
pub struct RepositoryFetcher {
    client: Arc<dyn JsonClient>,
    projection: Arc<ProjectionTable>,
}

impl RepositoryFetcher {
    pub fn new(client: Arc<dyn JsonClient>, projection: Arc<ProjectionTable>) -> Self {
        Self { client, projection }
    }

    /// Fetch and normalize one repository.
    ///
    /// Any failure is logged and yields `None`.
    pub async fn fetch(&self, url: &str) -> Option<Record> {
        let raw = match self.client.get_json(url).await {
            Ok(Value::Object(raw)) => raw,
            Ok(_) => {
                log::warn!("Repository {} is not a JSON object", url);
                return None;
            }
            Err(error) => {
                log::warn!("Failed to fetch repository {}: {}", url, error);
                return None;
            }
        };

        match self.normalize(raw).await {
            Ok(record) => Some(record),
            Err(error) => {
                log::warn!("Dropping repository {}: {}", url, error);
                None
            }
        }
    }

    /// Apply the projection table to a raw repository.
    ///
    /// A flatten rule on a non-object value or a failing secondary fetch
    /// aborts the whole record.
    pub async fn normalize(&self, raw: Record) -> Result<Record> {
        let mut record = Record::new();

        for (field, value) in raw {
            let Some(rule) = self.projection.get(&field) else {
                continue;
            };

            match rule {
                Projection::Keep => {
                    record.insert(field, value);
                }
                Projection::Flatten { key } => {
                    let Value::Object(mut nested) = value else {
                        return Err(AppError::projection(field, "expected an object"));
                    };
                    if let Some(inner) = nested.remove(key) {
                        record.insert(field, inner);
                    }
                }
                Projection::Fetch { target } => {
                    let url = value
                        .as_str()
                        .filter(|url| !url.is_empty())
                        .ok_or_else(|| AppError::projection(&field, "expected a non-empty URL"))?;
                    let fetched = self
                        .client
                        .get_json(url)
                        .await
                        .map_err(|e| AppError::projection(&field, e))?;
                    record.insert(target.clone(), fetched);
                }
            }
        }

        Ok(record)
    }
}
