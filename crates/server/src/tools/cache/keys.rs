//! cache_keys tool implementation.
//!
//! Lists stored generations, or the requests held by one of them.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use swcache_core::{CacheDb, CachedRequest, Error};

use super::super::json_result;

/// Parameters for the cache_keys tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct CacheKeysParams {
    /// Generation to list requests for. Omit to list generations only.
    #[serde(default)]
    pub generation: Option<String>,
}

/// Output from the cache_keys tool.
#[derive(Debug, Clone, Serialize)]
pub struct CacheKeysOutput {
    pub generations: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requests: Option<Vec<CachedRequest>>,
}

/// Implementation of the cache_keys tool.
pub async fn keys_impl(cache: &CacheDb, params: CacheKeysParams) -> Result<CallToolResult, McpError> {
    let generations = cache.keys().await?;

    let requests = match params.generation {
        Some(name) => {
            if !generations.contains(&name) {
                return Err(Error::CacheMiss(format!("no generation named {name}")).into());
            }
            Some(cache.generation(&name).requests().await?)
        }
        None => None,
    };

    json_result(&CacheKeysOutput { generations, requests })
}
