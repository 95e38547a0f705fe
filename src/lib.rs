// src/lib.rs

//! repowatch library
//!
//! Discovers recently active GitHub repositories from the public event feed
//! and serves them from a self-refreshing cache.

pub mod cache;
pub mod error;
pub mod filter;
pub mod models;
pub mod pipeline;
pub mod server;
pub mod services;
pub mod utils;
