//! sw_message tool implementation.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use swcache_client::{ClientControl, Fetcher, Worker};

use super::json_result;

/// Parameters for the sw_message tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwMessageParams {
    /// Message posted by a page, e.g. `{"type": "SKIP_WAITING"}`.
    pub data: Value,
}

/// Implementation of the sw_message tool.
pub async fn message_impl<F: Fetcher, C: ClientControl>(
    worker: &Worker<F, C>, params: SwMessageParams,
) -> Result<CallToolResult, McpError> {
    let outcome = worker.handle_message(&params.data).await?;
    json_result(&outcome)
}
