// src/services/mod.rs

//! Service layer for repowatch.
//!
//! This module contains the business logic for:
//! - Repository discovery from the event feed (`EventDiscovery`)
//! - Repository fetching and projection (`RepositoryFetcher`)

mod discovery;
mod repositories;

pub use discovery::EventDiscovery;
pub use repositories::RepositoryFetcher;
