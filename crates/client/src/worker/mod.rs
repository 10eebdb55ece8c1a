//! Cache worker policy engine.
//!
//! A [`Worker`] owns one cache generation, named by its version. The host
//! drives it through four entry points, mirroring browser service worker
//! events:
//!
//! - [`Worker::install`]: fetch the asset manifest into the generation,
//!   all-or-nothing, then ask to skip the waiting period.
//! - [`Worker::activate`]: delete every other generation, then claim open
//!   clients.
//! - [`Worker::handle_fetch`]: bypass filter, then network-first for
//!   documents and cache-first for everything else.
//! - [`Worker::handle_message`]: `{"type": "SKIP_WAITING"}` forces activation.
//!
//! Cache writes triggered by live traffic run in the background and never
//! delay the response; [`Worker::settle`] waits for them.

pub mod control;
pub mod lifecycle;
pub mod router;
pub mod state;
pub mod strategy;

#[cfg(test)]
mod testing;

pub use control::{ClientControl, Command, MessageOutcome};
pub use lifecycle::{ActivationReport, InstallReport};
pub use router::{BypassFilter, Strategy, classify};
pub use state::WorkerState;
pub use strategy::{FetchOutcome, ResponseSource};

use std::sync::atomic::{AtomicBool, Ordering};

use swcache_core::{AppConfig, CacheDb, Error, Generation, Request, Response};
use tokio::sync::{Mutex, watch};
use tokio::task::JoinSet;
use url::Url;

use crate::fetch::{Fetcher, resolve_asset};

/// Everything that identifies one worker version.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Name of the generation this worker installs and serves from.
    pub version: String,
    pub scope: Url,
    /// Resolved asset manifest, in order.
    pub assets: Vec<Url>,
    pub bypass: BypassFilter,
}

impl WorkerConfig {
    /// Resolve the manifest against the scope and build the bypass filter.
    pub fn from_app_config(config: &AppConfig) -> Result<Self, Error> {
        config.validate()?;

        let scope = Url::parse(&config.scope).map_err(|e| Error::InvalidUrl(format!("{}: {e}", config.scope)))?;
        let bypass = BypassFilter::new(config.bypass_patterns.iter().cloned());

        let mut assets = Vec::with_capacity(config.assets.len());
        for asset in &config.assets {
            let url = resolve_asset(&scope, asset).map_err(|e| Error::InvalidUrl(format!("{asset}: {e}")))?;
            if let Some(pattern) = bypass.matches(&url) {
                return Err(Error::InvalidInput(format!("manifest asset {url} is bypassed by {pattern:?}")));
            }
            if !assets.contains(&url) {
                assets.push(url);
            }
        }

        Ok(Self { version: config.version.clone(), scope, assets, bypass })
    }
}

/// The policy engine for one cache generation.
pub struct Worker<F, C> {
    config: WorkerConfig,
    db: CacheDb,
    fetcher: F,
    clients: C,
    state: watch::Sender<WorkerState>,
    skip_waiting: AtomicBool,
    /// Serializes install and activate.
    lifecycle: Mutex<()>,
    writes: Mutex<JoinSet<()>>,
}

impl<F: Fetcher, C: ClientControl> Worker<F, C> {
    pub fn new(config: WorkerConfig, db: CacheDb, fetcher: F, clients: C) -> Self {
        let (state, _) = watch::channel(WorkerState::Idle);
        Self {
            config,
            db,
            fetcher,
            clients,
            state,
            skip_waiting: AtomicBool::new(false),
            lifecycle: Mutex::new(()),
            writes: Mutex::new(JoinSet::new()),
        }
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    pub fn version(&self) -> &str {
        &self.config.version
    }

    pub fn db(&self) -> &CacheDb {
        &self.db
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    pub fn clients(&self) -> &C {
        &self.clients
    }

    pub fn state(&self) -> WorkerState {
        *self.state.borrow()
    }

    /// Watch lifecycle transitions.
    pub fn subscribe(&self) -> watch::Receiver<WorkerState> {
        self.state.subscribe()
    }

    /// Whether the waiting period has been skipped.
    pub fn is_skip_waiting(&self) -> bool {
        self.skip_waiting.load(Ordering::Acquire)
    }

    /// Handle to this worker's own generation.
    pub fn current(&self) -> Generation {
        self.db.generation(&self.config.version)
    }

    /// Wait until every background cache write has finished.
    pub async fn settle(&self) {
        let mut writes = std::mem::take(&mut *self.writes.lock().await);
        while let Some(joined) = writes.join_next().await {
            if let Err(e) = joined {
                tracing::warn!(error = %e, "background cache write panicked or was cancelled");
            }
        }
    }

    fn set_state(&self, next: WorkerState) {
        let previous = self.state.send_replace(next);
        tracing::debug!(version = %self.config.version, from = %previous, to = %next, "worker state");
    }

    /// Store a copy of a response without blocking the caller.
    async fn spawn_write(&self, generation: Generation, request: Request, response: Response) {
        let mut writes = self.writes.lock().await;
        while writes.try_join_next().is_some() {}
        writes.spawn(async move {
            match generation.put(&request, &response).await {
                Ok(()) => tracing::debug!(generation = generation.name(), url = %request.url, "cache updated"),
                Err(e) => {
                    tracing::warn!(generation = generation.name(), url = %request.url, error = %e, "cache write failed")
                }
            }
        });
    }
}
