//! MCP server handler implementation.
//!
//! This module defines the main server handler that
//! routes tool calls to the worker entry points.
use std::sync::Arc;

use crate::host::HostWorker;
use crate::tools::{
    CacheKeysParams, CacheMatchParams, SwActivateParams, SwFetchParams, SwInstallParams, SwMessageParams,
    SwStatusParams, cache, lifecycle, sw_fetch, sw_message,
};

use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{
        tool::{ToolCallContext, ToolRouter},
        wrapper::Parameters,
    },
    model::{
        CallToolRequestParam, CallToolResult, Implementation, ListToolsResult, PaginatedRequestParam, ProtocolVersion,
        ServerCapabilities, ServerInfo,
    },
    service::{RequestContext, RoleServer},
    tool, tool_router,
};

/// The main MCP server handler for swcache.
#[derive(Clone)]
pub struct SwCacheServer {
    worker: Arc<HostWorker>,
    tool_router: ToolRouter<Self>,
}

/// Tool router implementation using the #[tool_router] macro.
///
/// This macro generates the routing logic that maps tool names to handler methods.
#[tool_router]
impl SwCacheServer {
    /// Create a new server handler around a booted worker.
    pub fn new(worker: Arc<HostWorker>) -> Self {
        Self { worker, tool_router: Self::tool_router() }
    }

    /// Fetch every manifest asset into the current generation.
    ///
    /// All-or-nothing: a single failed asset fails the install and leaves no
    /// generation behind.
    #[tool(
        description = "Install the worker: fetch every manifest asset into the versioned cache, then request to skip waiting. Activates immediately when allowed unless auto_activate is false."
    )]
    async fn sw_install(&self, params: Parameters<SwInstallParams>) -> Result<CallToolResult, McpError> {
        lifecycle::install_impl(&*self.worker, params.0).await
    }

    #[tool(
        description = "Activate an installed worker: delete every cache generation except the current version, then claim open clients."
    )]
    async fn sw_activate(&self, params: Parameters<SwActivateParams>) -> Result<CallToolResult, McpError> {
        lifecycle::activate_impl(&*self.worker, params.0).await
    }

    #[tool(description = "Report worker state, client counts, stored generations and the bypass filter.")]
    async fn sw_status(&self, params: Parameters<SwStatusParams>) -> Result<CallToolResult, McpError> {
        lifecycle::status_impl(&*self.worker, params.0).await
    }

    /// Route one request through the worker.
    ///
    /// Documents are network-first, everything else cache-first.
    #[tool(
        description = "Send a request through the worker. Navigations and HTML requests are network-first with cache fallback; other requests are cache-first. Bypassed URLs and requests before activation pass through to the network."
    )]
    async fn sw_fetch(&self, params: Parameters<SwFetchParams>) -> Result<CallToolResult, McpError> {
        sw_fetch::fetch_impl(&*self.worker, params.0).await
    }

    #[tool(
        description = "Post a message to the worker. {\"type\": \"SKIP_WAITING\"} activates an installed worker now; anything else is ignored."
    )]
    async fn sw_message(&self, params: Parameters<SwMessageParams>) -> Result<CallToolResult, McpError> {
        sw_message::message_impl(&*self.worker, params.0).await
    }

    #[tool(description = "List cache generations, or the requests stored in one generation.")]
    async fn cache_keys(&self, params: Parameters<CacheKeysParams>) -> Result<CallToolResult, McpError> {
        cache::keys_impl(self.worker.db(), params.0).await
    }

    #[tool(description = "Look up a cached response by URL without touching the network.")]
    async fn cache_match(&self, params: Parameters<CacheMatchParams>) -> Result<CallToolResult, McpError> {
        let config = self.worker.config();
        cache::match_impl(self.worker.db(), &config.scope, &config.version, params.0).await
    }
}

impl ServerHandler for SwCacheServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "swcache".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            instructions: Some(
                "Versioned asset cache. Call sw_install once per version, then route requests with sw_fetch.".into(),
            ),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self, _request: Option<PaginatedRequestParam>, _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, rmcp::model::ErrorData> {
        Ok(ListToolsResult { meta: None, tools: self.tool_router.list_all(), next_cursor: None })
    }

    async fn call_tool(
        &self, request: CallToolRequestParam, context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, rmcp::model::ErrorData> {
        self.tool_router
            .call(ToolCallContext::new(self, request, context))
            .await
    }
}
