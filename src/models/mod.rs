// src/models/mod.rs

//! Domain models for repowatch.

mod config;
mod projection;
mod snapshot;

// Re-export all public types
pub use config::{
    CacheConfig, Config, DiscoveryConfig, FeedConfig, MAX_PAGE_SIZE, ServerConfig,
};
pub use projection::{Projection, ProjectionTable};
pub use snapshot::{Record, Snapshot};
