//! SQLite-backed cache store partitioned into named generations.
//!
//! This module provides the persistent request/response store using SQLite
//! with async access via tokio-rusqlite. It supports:
//!
//! - Request identity keys using SHA-256 over method and URL
//! - Automatic schema migrations
//! - WAL mode for concurrent access
//! - Whole-generation deletion (entries cascade)

pub mod connection;
pub mod generations;
pub mod hash;
pub mod migrations;

pub use crate::Error;

pub use connection::CacheDb;
pub use generations::{CachedRequest, Generation};
