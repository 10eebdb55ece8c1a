//! MCP tool implementations.
//!
//! This module contains all tools exposed by the swcache server. Each tool
//! is a thin adapter from JSON parameters onto one worker entry point.

pub mod cache;
pub mod lifecycle;
pub mod sw_fetch;
pub mod sw_message;

#[cfg(test)]
pub(crate) mod testing;

pub use cache::{CacheKeysParams, CacheMatchParams};
pub use lifecycle::{SwActivateParams, SwInstallParams, SwStatusParams};
pub use sw_fetch::SwFetchParams;
pub use sw_message::SwMessageParams;

use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use serde::Serialize;
use swcache_core::Error;

/// Render a tool output as pretty JSON text content.
pub(crate) fn json_result<T: Serialize>(output: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(output)
        .map_err(|e| Error::InvalidInput(format!("Failed to serialize output: {e}")))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}
