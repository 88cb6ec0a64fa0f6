//! Cache module
//!
//! Persists fetched items and pagination offsets between runs.
//!
//! # Overview
//!
//! - `CacheStore` - Storage backend trait
//! - `MemoryCacheStore` - Process-local store
//! - `DuckDbCacheStore` - DuckDB file (or in-memory) store
//! - `HttpCacheStore` - Client for the cache HTTP server
//! - `CacheBridge` - Best-effort access used by the table adapters

mod bridge;
mod database;
mod remote;
mod store;

pub use bridge::{merge_cached, CacheBridge, DEFAULT_WRITE_CONCURRENCY};
pub use database::DuckDbCacheStore;
pub use remote::HttpCacheStore;
pub use store::{CacheStore, MemoryCacheStore};
