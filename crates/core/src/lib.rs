//! Core types and shared functionality for swcache.
//!
//! This crate provides:
//! - Request/response snapshots shared by the fetcher and the cache
//! - Generation-partitioned cache store with SQLite backend
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;
pub mod http;

pub use cache::{CacheDb, CachedRequest, Generation};
pub use config::{AppConfig, ConfigError};
pub use error::Error;
pub use http::{Request, RequestMode, Response};
