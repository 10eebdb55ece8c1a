//! Cache-related MCP tools.
//!
//! Read-only views over the generation store.

pub mod keys;
pub mod lookup;

pub use keys::{CacheKeysParams, keys_impl};
pub use lookup::{CacheMatchParams, match_impl};
