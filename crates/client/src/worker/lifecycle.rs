//! Install and activate.
//!
//! Install populates this worker's generation from the asset manifest in a
//! single transaction, so a failed fetch leaves no trace and the previous
//! generation keeps serving. Activate deletes every other generation and
//! only then claims clients.

use std::sync::atomic::Ordering;

use futures_util::future::try_join_all;
use serde::Serialize;
use swcache_core::{Error, Request, Response};
use url::Url;

use super::{ClientControl, Worker, WorkerState};
use crate::fetch::Fetcher;

/// Result of a successful install.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstallReport {
    pub generation: String,
    /// Cached manifest URLs, in manifest order.
    pub assets: Vec<String>,
}

/// Result of a successful activation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivationReport {
    pub generation: String,
    /// Stale generations that were removed.
    pub deleted: Vec<String>,
    /// Clients now controlled by this worker.
    pub claimed: usize,
}

impl<F: Fetcher, C: ClientControl> Worker<F, C> {
    /// Populate this worker's generation with the asset manifest.
    ///
    /// Every asset must come back `200 OK`; otherwise nothing is written,
    /// the worker becomes `Redundant` and the error is returned.
    /// On success the worker is `Installed` and has asked to skip waiting.
    pub async fn install(&self) -> Result<InstallReport, Error> {
        let report = {
            let _guard = self.lifecycle.lock().await;
            let state = self.state();
            if !state.can_install() {
                return Err(Error::InvalidState(format!("cannot install {} while {state}", self.version())));
            }

            self.set_state(WorkerState::Installing);
            tracing::info!(version = %self.version(), assets = self.config.assets.len(), "installing generation");

            match self.populate().await {
                Ok(report) => {
                    self.set_state(WorkerState::Installed);
                    tracing::info!(version = %self.version(), "generation installed");
                    report
                }
                Err(e) => {
                    self.set_state(WorkerState::Redundant);
                    tracing::error!(version = %self.version(), error = %e, "install failed");
                    return Err(e);
                }
            }
        };

        self.skip_waiting().await?;
        Ok(report)
    }

    async fn populate(&self) -> Result<InstallReport, Error> {
        let fetches = self.config.assets.iter().map(|url| self.fetch_asset(url));
        let entries = try_join_all(fetches).await?;

        self.current().put_all(&entries).await?;

        Ok(InstallReport {
            generation: self.version().to_string(),
            assets: entries.iter().map(|(request, _)| request.url.to_string()).collect(),
        })
    }

    async fn fetch_asset(&self, url: &Url) -> Result<(Request, Response), Error> {
        let request = Request::get(url.clone());
        let response = self
            .fetcher
            .fetch(&request)
            .await
            .map_err(|e| Error::InstallFailed { asset: url.to_string(), reason: e.to_string() })?;

        if !response.is_cacheable() {
            return Err(Error::InstallFailed { asset: url.to_string(), reason: format!("status {}", response.status) });
        }

        tracing::debug!(url = %url, status = response.status, bytes = response.body.len(), "fetched manifest asset");
        Ok((request, response))
    }

    /// Promote this worker without waiting for old clients to go away.
    ///
    /// Sets the flag and notifies the host; activation itself happens in
    /// [`Worker::activate`] or via a `SKIP_WAITING` message.
    pub async fn skip_waiting(&self) -> Result<(), Error> {
        self.skip_waiting.store(true, Ordering::Release);
        self.clients.skip_waiting().await
    }

    /// Whether the host should activate now, given how many clients still
    /// have the previous worker open.
    pub fn should_activate(&self, open_clients: usize) -> bool {
        self.state() == WorkerState::Installed && (self.is_skip_waiting() || open_clients == 0)
    }

    /// Delete stale generations, then claim every open client.
    ///
    /// Requires `Installed`. On failure the worker returns to `Installed`
    /// so activation can be retried.
    pub async fn activate(&self) -> Result<ActivationReport, Error> {
        let _guard = self.lifecycle.lock().await;
        self.activate_locked().await
    }

    /// Activate now if [`Worker::should_activate`] holds, checked under the
    /// lifecycle lock. `None` if the worker must keep waiting or another
    /// caller already activated it.
    pub async fn activate_if_ready(&self, open_clients: usize) -> Result<Option<ActivationReport>, Error> {
        let _guard = self.lifecycle.lock().await;
        if !self.should_activate(open_clients) {
            return Ok(None);
        }
        self.activate_locked().await.map(Some)
    }

    /// Activate if currently `Installed`; `None` otherwise.
    pub(crate) async fn activate_if_installed(&self) -> Result<Option<ActivationReport>, Error> {
        let _guard = self.lifecycle.lock().await;
        if self.state() != WorkerState::Installed {
            return Ok(None);
        }
        self.activate_locked().await.map(Some)
    }

    async fn activate_locked(&self) -> Result<ActivationReport, Error> {
        let state = self.state();
        if state != WorkerState::Installed {
            return Err(Error::InvalidState(format!("cannot activate {} while {state}", self.version())));
        }

        self.set_state(WorkerState::Activating);
        tracing::info!(version = %self.version(), "activating generation");

        match self.reap_and_claim().await {
            Ok(report) => {
                self.set_state(WorkerState::Serving);
                tracing::info!(
                    version = %self.version(),
                    deleted = report.deleted.len(),
                    claimed = report.claimed,
                    "generation active"
                );
                Ok(report)
            }
            Err(e) => {
                self.set_state(WorkerState::Installed);
                tracing::error!(version = %self.version(), error = %e, "activation failed");
                Err(e)
            }
        }
    }

    async fn reap_and_claim(&self) -> Result<ActivationReport, Error> {
        let stale: Vec<String> = self
            .db
            .keys()
            .await?
            .into_iter()
            .filter(|name| name != self.version())
            .collect();

        try_join_all(stale.iter().map(|name| async move {
            self.db.delete_generation(name).await?;
            tracing::info!(generation = %name, "deleted stale generation");
            Ok::<_, Error>(())
        }))
        .await?;

        let claimed = self.clients.claim().await?;

        Ok(ActivationReport { generation: self.version().to_string(), deleted: stale, claimed })
    }
}
