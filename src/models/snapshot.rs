// src/models/snapshot.rs

//! Normalized records and the snapshots that group them.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

/// One normalized repository: exactly the fields produced by the projection.
pub type Record = Map<String, Value>;

/// A complete, immutable result of one discovery and fetch cycle.
#[derive(Debug, Clone)]
pub struct Snapshot {
    /// Commit counter, 1 for the initial cycle
    pub generation: u64,

    /// When the cycle that produced this snapshot finished
    pub refreshed_at: DateTime<Utc>,

    pub records: Vec<Record>,
}

impl Snapshot {
    pub fn new(generation: u64, records: Vec<Record>) -> Self {
        Self {
            generation,
            refreshed_at: Utc::now(),
            records,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
