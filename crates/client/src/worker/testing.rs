//! Test doubles for the worker: a scripted network and a recording host.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use swcache_core::{AppConfig, CacheDb, Error, Request, Response};
use tokio::sync::Notify;
use url::Url;

use super::{ClientControl, Worker, WorkerConfig};
use crate::fetch::Fetcher;

const SCOPE: &str = "https://shop.example/";

/// Resolve a manifest-style path against the test scope.
pub fn asset(path: &str) -> Url {
    Url::parse(SCOPE).unwrap().join(path).unwrap()
}

/// Network with per-URL scripted answers. Unscripted URLs behave as offline.
#[derive(Default)]
pub struct ScriptedFetcher {
    routes: Mutex<HashMap<String, Option<(u16, Bytes)>>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, url: &Url, status: u16, body: &'static str) {
        self.routes
            .lock()
            .unwrap()
            .insert(url.to_string(), Some((status, Bytes::from_static(body.as_bytes()))));
    }

    pub fn fail(&self, url: &Url) {
        self.routes.lock().unwrap().insert(url.to_string(), None);
    }

    pub fn calls_to(&self, url: &Url) -> usize {
        self.calls.lock().unwrap().iter().filter(|u| *u == url.as_str()).count()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl Fetcher for ScriptedFetcher {
    async fn fetch(&self, request: &Request) -> Result<Response, Error> {
        let url = request.url.to_string();
        self.calls.lock().unwrap().push(url.clone());
        let route = self.routes.lock().unwrap().get(&url).cloned();
        match route {
            Some(Some((status, body))) => {
                Ok(Response::new(request.url.clone(), status, body).with_header("Content-Type", "text/plain"))
            }
            Some(None) => Err(Error::Network(format!("{url}: connection refused"))),
            None => Err(Error::Network(format!("{url}: offline"))),
        }
    }
}

/// Host that counts control calls and can snapshot the store at claim time.
pub struct RecordingClients {
    open: usize,
    skip_waiting_calls: AtomicUsize,
    claim_calls: AtomicUsize,
    observed: Mutex<Option<CacheDb>>,
    keys_at_claim: Mutex<Option<Vec<String>>>,
    claim_gate: Mutex<Option<Arc<Notify>>>,
    refuse_claims: AtomicBool,
}

impl RecordingClients {
    pub fn new(open: usize) -> Self {
        Self {
            open,
            skip_waiting_calls: AtomicUsize::new(0),
            claim_calls: AtomicUsize::new(0),
            observed: Mutex::new(None),
            keys_at_claim: Mutex::new(None),
            claim_gate: Mutex::new(None),
            refuse_claims: AtomicBool::new(false),
        }
    }

    /// Make `claim` wait until `gate` is notified.
    pub fn hold_claims(&self, gate: Arc<Notify>) {
        *self.claim_gate.lock().unwrap() = Some(gate);
    }

    /// Make `claim` fail.
    pub fn refuse_claims(&self) {
        self.refuse_claims.store(true, Ordering::SeqCst);
    }

    /// Record the generation list whenever `claim` runs.
    pub fn observe(&self, db: CacheDb) {
        *self.observed.lock().unwrap() = Some(db);
    }

    pub fn skip_waiting_calls(&self) -> usize {
        self.skip_waiting_calls.load(Ordering::SeqCst)
    }

    pub fn claim_calls(&self) -> usize {
        self.claim_calls.load(Ordering::SeqCst)
    }

    pub fn keys_at_claim(&self) -> Option<Vec<String>> {
        self.keys_at_claim.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl ClientControl for RecordingClients {
    async fn skip_waiting(&self) -> Result<(), Error> {
        self.skip_waiting_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn claim(&self) -> Result<usize, Error> {
        self.claim_calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.claim_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        if self.refuse_claims.load(Ordering::SeqCst) {
            return Err(Error::InvalidState("host refused claim".into()));
        }
        let observed = self.observed.lock().unwrap().clone();
        if let Some(db) = observed {
            let keys = db.keys().await?;
            *self.keys_at_claim.lock().unwrap() = Some(keys);
        }
        Ok(self.open)
    }
}

/// Worker over an in-memory store with manifest `./`, `./index.html`, `./app.js`.
pub async fn test_worker(
    version: &str, fetcher: ScriptedFetcher, clients: RecordingClients,
) -> Worker<ScriptedFetcher, RecordingClients> {
    let app = AppConfig {
        version: version.to_string(),
        scope: SCOPE.to_string(),
        assets: vec!["./".into(), "./index.html".into(), "./app.js".into()],
        ..Default::default()
    };
    let config = WorkerConfig::from_app_config(&app).unwrap();
    let db = CacheDb::open_in_memory().await.unwrap();
    Worker::new(config, db, fetcher, clients)
}

/// Installed and activated worker with a stale `v1` generation removed.
pub async fn serving_worker(version: &str) -> Worker<ScriptedFetcher, RecordingClients> {
    let fetcher = ScriptedFetcher::new();
    fetcher.respond(&asset("./"), 200, "<html>root</html>");
    fetcher.respond(&asset("./index.html"), 200, "<html>index</html>");
    fetcher.respond(&asset("./app.js"), 200, "console.log('app')");

    let worker = test_worker(version, fetcher, RecordingClients::new(1)).await;
    worker
        .db()
        .generation("v1")
        .put(&Request::get(asset("./app.js")), &Response::new(asset("./app.js"), 200, "console.log('old')"))
        .await
        .unwrap();
    worker.install().await.unwrap();
    worker.activate().await.unwrap();
    worker
}
