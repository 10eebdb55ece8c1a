//! sw_fetch tool implementation.
//!
//! Runs one request through the worker the way a page fetch would be
//! intercepted. Passthrough requests are fetched directly, as the browser
//! would when no worker controls the page.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use swcache_client::{ClientControl, FetchOutcome, Fetcher, ResponseSource, Strategy, Worker, canonicalize, resolve_asset};
use swcache_core::{Error, Request, RequestMode, Response};
use url::Url;

use super::json_result;

/// Input parameters for the sw_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwFetchParams {
    /// URL to request. Paths starting with `.` or `/` resolve against the scope.
    pub url: String,

    /// HTTP method (default: GET).
    #[serde(default)]
    pub method: Option<String>,

    /// Request mode: "navigate", "same-origin", "no-cors" or "cors" (default).
    #[serde(default)]
    pub mode: Option<RequestMode>,

    /// Accept header sent with the request.
    #[serde(default)]
    pub accept: Option<String>,

    /// Maximum number of body characters to return (default: 4000).
    #[serde(default = "default_max_chars")]
    pub max_chars: usize,
}

fn default_max_chars() -> usize {
    4000
}

/// Output structure for the sw_fetch tool.
#[derive(Debug, Clone, Serialize)]
pub struct SwFetchOutput {
    /// "passthrough", "served" or "unavailable".
    pub outcome: &'static str,
    pub url: String,
    pub strategy: Option<Strategy>,
    pub source: Option<ResponseSource>,
    pub status: Option<u16>,
    pub content_type: Option<String>,
    /// Full body length in bytes.
    pub bytes: usize,
    pub body: Option<String>,
    pub body_truncated: bool,
}

impl SwFetchOutput {
    fn new(outcome: &'static str, url: &Url) -> Self {
        Self {
            outcome,
            url: url.to_string(),
            strategy: None,
            source: None,
            status: None,
            content_type: None,
            bytes: 0,
            body: None,
            body_truncated: false,
        }
    }

    fn with_response(mut self, response: &Response, max_chars: usize) -> Self {
        let text = String::from_utf8_lossy(&response.body);
        let truncated = text.chars().count() > max_chars;
        let body = if truncated { text.chars().take(max_chars).collect() } else { text.into_owned() };

        self.status = Some(response.status);
        self.content_type = response.content_type().map(str::to_string);
        self.bytes = response.body.len();
        self.body = Some(body);
        self.body_truncated = truncated;
        self
    }
}

/// Resolve the tool's URL argument into an absolute request URL.
fn request_url(scope: &Url, input: &str) -> Result<Url, Error> {
    let trimmed = input.trim();
    let resolved = if trimmed.starts_with('.') || trimmed.starts_with('/') {
        resolve_asset(scope, trimmed)
    } else {
        canonicalize(trimmed)
    };
    resolved.map_err(|e| Error::InvalidUrl(format!("{input}: {e}")))
}

/// Implementation of the sw_fetch tool.
pub async fn fetch_impl<F: Fetcher, C: ClientControl>(
    worker: &Worker<F, C>, params: SwFetchParams,
) -> Result<CallToolResult, McpError> {
    let url = request_url(&worker.config().scope, &params.url)?;
    let method = params.method.as_deref().unwrap_or("GET");
    let mut request = Request::new(url, method, params.mode.unwrap_or_default());
    if let Some(accept) = params.accept.as_deref() {
        request = request.with_header("Accept", accept);
    }

    let output = match worker.handle_fetch(request.clone()).await? {
        FetchOutcome::Passthrough => {
            let response = worker.fetcher().fetch(&request).await?;
            SwFetchOutput::new("passthrough", &request.url).with_response(&response, params.max_chars)
        }
        FetchOutcome::Served { strategy, source, response } => {
            let mut output = SwFetchOutput::new("served", &request.url).with_response(&response, params.max_chars);
            output.strategy = Some(strategy);
            output.source = Some(source);
            output
        }
        FetchOutcome::Unavailable { strategy } => {
            let mut output = SwFetchOutput::new("unavailable", &request.url);
            output.strategy = Some(strategy);
            output
        }
    };

    tracing::debug!(url = %output.url, outcome = output.outcome, status = ?output.status, "sw_fetch");
    json_result(&output)
}

#[cfg(test)]
mod tests {
    use super::super::testing::{StubFetcher, output, serving, url, worker};
    use super::*;

    fn params(url: &str) -> SwFetchParams {
        SwFetchParams { url: url.to_string(), method: None, mode: None, accept: None, max_chars: 4000 }
    }

    #[test]
    fn test_request_url_resolution() {
        let scope = url("./");
        assert_eq!(request_url(&scope, "./app.js").unwrap(), url("./app.js"));
        assert_eq!(request_url(&scope, "/index.html").unwrap(), url("./index.html"));
        assert_eq!(request_url(&scope, "cdn.example/lib.js#x").unwrap().as_str(), "https://cdn.example/lib.js");
        assert!(request_url(&scope, "ftp://cdn.example/lib.js").is_err());
        assert!(request_url(&scope, "  ").is_err());
    }

    #[tokio::test]
    async fn test_fetch_before_activation_passes_through() {
        let worker = worker("v2", StubFetcher::with_manifest(), 1).await;

        let json = output(&fetch_impl(&worker, params("./app.js")).await.unwrap());

        assert_eq!(json["outcome"], "passthrough");
        assert_eq!(json["status"], 200);
        assert_eq!(json["body"], "boot()");
        assert!(json["strategy"].is_null());
    }

    #[tokio::test]
    async fn test_previous_generation_served_after_failed_install() {
        let worker = worker("v2", StubFetcher::default(), 1).await;
        worker
            .db()
            .generation("v1")
            .put(&Request::get(url("./app.js")), &Response::new(url("./app.js"), 200, "boot_v1()"))
            .await
            .unwrap();
        assert!(worker.install().await.is_err());

        let json = output(&fetch_impl(&worker, params("./app.js")).await.unwrap());

        assert_eq!(json["outcome"], "served");
        assert_eq!(json["source"], "cache");
        assert_eq!(json["body"], "boot_v1()");
    }

    #[tokio::test]
    async fn test_asset_served_from_cache_when_offline() {
        let worker = serving("v2").await;
        worker.fetcher().go_offline();

        let json = output(&fetch_impl(&worker, params("./app.js")).await.unwrap());

        assert_eq!(json["outcome"], "served");
        assert_eq!(json["strategy"], "cache_first");
        assert_eq!(json["source"], "cache");
        assert_eq!(json["content_type"], "application/javascript");
    }

    #[tokio::test]
    async fn test_navigation_prefers_network() {
        let worker = serving("v2").await;
        worker.fetcher().route("./index.html", 200, "text/html", "<html>fresh</html>");

        let mut p = params("./index.html");
        p.mode = Some(RequestMode::Navigate);
        let json = output(&fetch_impl(&worker, p).await.unwrap());

        assert_eq!(json["strategy"], "network_first");
        assert_eq!(json["source"], "network");
        assert_eq!(json["body"], "<html>fresh</html>");
    }

    #[tokio::test]
    async fn test_html_accept_header_routes_network_first() {
        let worker = serving("v2").await;
        worker.fetcher().go_offline();

        let mut p = params("./");
        p.accept = Some("text/html,application/xhtml+xml".into());
        let json = output(&fetch_impl(&worker, p).await.unwrap());

        assert_eq!(json["strategy"], "network_first");
        assert_eq!(json["source"], "cache");
        assert_eq!(json["body"], "<html>home</html>");
    }

    #[tokio::test]
    async fn test_offline_uncached_document_is_unavailable() {
        let worker = serving("v2").await;
        worker.fetcher().go_offline();

        let mut p = params("./about.html");
        p.mode = Some(RequestMode::Navigate);
        let json = output(&fetch_impl(&worker, p).await.unwrap());

        assert_eq!(json["outcome"], "unavailable");
        assert!(json["body"].is_null());
    }

    #[tokio::test]
    async fn test_offline_uncached_asset_is_network_error() {
        let worker = serving("v2").await;
        worker.fetcher().go_offline();

        let err = fetch_impl(&worker, params("./missing.css")).await.unwrap_err();
        assert_eq!(err.code.0, -32008);
    }

    #[tokio::test]
    async fn test_body_truncated_to_max_chars() {
        let worker = serving("v2").await;

        let mut p = params("./index.html");
        p.max_chars = 6;
        let json = output(&fetch_impl(&worker, p).await.unwrap());

        assert_eq!(json["body"], "<html>");
        assert_eq!(json["body_truncated"], true);
        assert_eq!(json["bytes"], "<html>index</html>".len());
    }

    #[tokio::test]
    async fn test_bypassed_url_never_cached() {
        let worker = serving("v2").await;
        worker.fetcher().route("https://realtime.example/feed", 200, "application/json", "{}");

        let json = output(&fetch_impl(&worker, params("https://realtime.example/feed")).await.unwrap());
        assert_eq!(json["outcome"], "passthrough");
        worker.settle().await;

        let cached = worker
            .current()
            .match_request(&Request::get(Url::parse("https://realtime.example/feed").unwrap()))
            .await
            .unwrap();
        assert!(cached.is_none());
    }
}
