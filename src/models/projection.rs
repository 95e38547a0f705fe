// src/models/projection.rs

//! Declarative field projection rules.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Field name → rule, applied to every raw repository.
pub type ProjectionTable = BTreeMap<String, Projection>;

/// What to do with one top-level field of a raw repository.
///
/// Fields without a rule are dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Projection {
    /// Copy the value unchanged.
    Keep,

    /// Replace an object value by its `key` member, under the same field name.
    Flatten { key: String },

    /// Treat the value as a URL, fetch it, and store the parsed body under `target`.
    Fetch { target: String },
}
