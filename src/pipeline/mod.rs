// src/pipeline/mod.rs

//! Pipeline stages for building repository snapshots.
//!
//! - `launch`: bounded fan-out of independent tasks
//! - `refresh`: discovery followed by fetch and normalize

pub mod launch;
pub mod refresh;

pub use launch::{Sink, Task, launch_limited, task};
pub use refresh::RefreshCycle;
