//! cache_match tool implementation.
//!
//! Looks up a request in a generation without touching the network.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use swcache_client::resolve_asset;
use swcache_core::{CacheDb, Error, Request};
use url::Url;

use super::super::json_result;

/// Parameters for the cache_match tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheMatchParams {
    /// URL to look up. Relative paths resolve against the scope.
    pub url: String,

    /// Generation to search (default: the configured version).
    #[serde(default)]
    pub generation: Option<String>,
}

/// Output from the cache_match tool.
#[derive(Debug, Clone, Serialize)]
pub struct CacheMatchOutput {
    pub generation: String,
    pub url: String,
    pub status: u16,
    pub content_type: Option<String>,
    pub headers: Vec<(String, String)>,
    pub bytes: usize,
    pub body: String,
}

/// Implementation of the cache_match tool.
pub async fn match_impl(
    cache: &CacheDb, scope: &Url, version: &str, params: CacheMatchParams,
) -> Result<CallToolResult, McpError> {
    let url = resolve_asset(scope, &params.url).map_err(|e| Error::InvalidUrl(format!("{}: {e}", params.url)))?;
    let generation = params.generation.unwrap_or_else(|| version.to_string());

    let response = cache
        .generation(&generation)
        .match_request(&Request::get(url.clone()))
        .await?
        .ok_or_else(|| Error::CacheMiss(format!("{url} in {generation}")))?;

    let output = CacheMatchOutput {
        generation,
        url: response.url.to_string(),
        status: response.status,
        content_type: response.content_type().map(str::to_string),
        headers: response.headers.clone(),
        bytes: response.body.len(),
        body: String::from_utf8_lossy(&response.body).into_owned(),
    };
    json_result(&output)
}
