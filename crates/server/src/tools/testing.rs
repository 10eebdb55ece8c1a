//! Fixtures shared by the tool tests.

use std::collections::HashMap;
use std::sync::Mutex;

use rmcp::model::CallToolResult;
use serde_json::Value;
use swcache_client::{Fetcher, Worker, WorkerConfig};
use swcache_core::{AppConfig, CacheDb, Error, Request, Response};
use url::Url;

use crate::host::HostClients;

pub const SCOPE: &str = "https://app.example/";

pub fn url(path: &str) -> Url {
    Url::parse(SCOPE).unwrap().join(path).unwrap()
}

/// Fixed routes; anything else is offline.
#[derive(Default)]
pub struct StubFetcher {
    routes: Mutex<HashMap<String, (u16, &'static str, &'static str)>>,
}

impl StubFetcher {
    /// Network that serves the default manifest.
    pub fn with_manifest() -> Self {
        let fetcher = Self::default();
        fetcher.route("./", 200, "text/html", "<html>home</html>");
        fetcher.route("./index.html", 200, "text/html", "<html>index</html>");
        fetcher.route("./app.js", 200, "application/javascript", "boot()");
        fetcher
    }

    pub fn route(&self, path: &str, status: u16, content_type: &'static str, body: &'static str) {
        self.routes.lock().unwrap().insert(url(path).to_string(), (status, content_type, body));
    }

    pub fn go_offline(&self) {
        self.routes.lock().unwrap().clear();
    }
}

#[async_trait::async_trait]
impl Fetcher for StubFetcher {
    async fn fetch(&self, request: &Request) -> Result<Response, Error> {
        let route = self.routes.lock().unwrap().get(request.url.as_str()).copied();
        match route {
            Some((status, content_type, body)) => {
                Ok(Response::new(request.url.clone(), status, body).with_header("Content-Type", content_type))
            }
            None => Err(Error::Network(format!("{}: offline", request.url))),
        }
    }
}

pub type TestWorker = Worker<StubFetcher, HostClients>;

pub async fn worker(version: &str, fetcher: StubFetcher, open_clients: usize) -> TestWorker {
    let app = AppConfig {
        version: version.to_string(),
        scope: SCOPE.to_string(),
        assets: vec!["./".into(), "./index.html".into(), "./app.js".into()],
        bypass_patterns: vec!["realtime.example".into()],
        ..Default::default()
    };
    let config = WorkerConfig::from_app_config(&app).unwrap();
    let db = CacheDb::open_in_memory().await.unwrap();
    Worker::new(config, db, fetcher, HostClients::new(open_clients))
}

/// Installed and activated worker with the manifest cached.
pub async fn serving(version: &str) -> TestWorker {
    let worker = worker(version, StubFetcher::with_manifest(), 0).await;
    worker.install().await.unwrap();
    worker.activate().await.unwrap();
    worker
}

/// Parse the JSON text of a tool result.
pub fn output(result: &CallToolResult) -> Value {
    let content_val = serde_json::to_value(&result.content[0]).unwrap();
    let text = content_val
        .get("text")
        .and_then(|v| v.as_str())
        .expect("Expected text field in content");
    serde_json::from_str(text).unwrap()
}
