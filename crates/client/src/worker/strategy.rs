//! Network-first and cache-first request handling.

use serde::Serialize;
use swcache_core::{Error, Generation, Request, Response};

use super::router::{Strategy, classify};
use super::{ClientControl, Worker, WorkerState};
use crate::fetch::Fetcher;

/// Where a served response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseSource {
    Network,
    Cache,
}

/// What the worker did with an intercepted request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Not intercepted; the host should fetch it as if no worker existed.
    /// Returned for bypassed URLs and while no generation is in service.
    Passthrough,
    Served { strategy: Strategy, source: ResponseSource, response: Response },
    /// Network failed and nothing was cached. The caller gets no response.
    Unavailable { strategy: Strategy },
}

impl FetchOutcome {
    pub fn response(&self) -> Option<&Response> {
        match self {
            FetchOutcome::Served { response, .. } => Some(response),
            _ => None,
        }
    }

    pub fn source(&self) -> Option<ResponseSource> {
        match self {
            FetchOutcome::Served { source, .. } => Some(*source),
            _ => None,
        }
    }
}

impl<F: Fetcher, C: ClientControl> Worker<F, C> {
    /// Route one intercepted request.
    ///
    /// Requests matching the bypass filter pass through untouched. Requests
    /// arriving mid-activation wait for it to finish. Until this worker
    /// serves, the generation a previous worker left in service answers
    /// instead (see [`Worker::serving_generation`]).
    pub async fn handle_fetch(&self, request: Request) -> Result<FetchOutcome, Error> {
        if let Some(pattern) = self.config.bypass.matches(&request.url) {
            tracing::trace!(url = %request.url, pattern, "bypassing request");
            return Ok(FetchOutcome::Passthrough);
        }

        let mut states = self.subscribe();
        let state = *states
            .wait_for(|state| *state != WorkerState::Activating)
            .await
            .map_err(|_| Error::InvalidState("worker state channel closed".into()))?;

        let Some(generation) = self.generation_for(state).await? else {
            return Ok(FetchOutcome::Passthrough);
        };

        match classify(&request) {
            Strategy::NetworkFirst => Ok(self.network_first(&generation, request).await),
            Strategy::CacheFirst => self.cache_first(&generation, request).await,
        }
    }

    /// Generation that answers requests right now, if any.
    ///
    /// A serving worker answers from its own generation. Before that, the
    /// newest earlier generation stays in service. A generation of this
    /// version counts only while no install of it is pending, since it
    /// can then only come from an earlier activation.
    pub async fn serving_generation(&self) -> Result<Option<Generation>, Error> {
        self.generation_for(self.state()).await
    }

    async fn generation_for(&self, state: WorkerState) -> Result<Option<Generation>, Error> {
        let own_usable = match state {
            WorkerState::Serving => return Ok(Some(self.current())),
            WorkerState::Idle | WorkerState::Redundant => true,
            WorkerState::Installing | WorkerState::Installed | WorkerState::Activating => false,
        };

        let name = self
            .db
            .keys()
            .await?
            .into_iter()
            .rfind(|name| own_usable || name != self.version());
        if let Some(name) = &name {
            tracing::trace!(
                version = %self.version(),
                state = %state,
                generation = %name,
                "routing to generation in service"
            );
        }
        Ok(name.map(|name| self.db.generation(&name)))
    }

    /// Latest from the network; cached copy only when the network fails.
    async fn network_first(&self, generation: &Generation, request: Request) -> FetchOutcome {
        let strategy = Strategy::NetworkFirst;
        tracing::debug!(url = %request.url, generation = generation.name(), "network-first");

        match self.fetcher.fetch(&request).await {
            Ok(response) => {
                self.remember(generation, &request, &response).await;
                FetchOutcome::Served { strategy, source: ResponseSource::Network, response }
            }
            Err(e) => {
                tracing::info!(url = %request.url, error = %e, "network failed, falling back to cache");
                match generation.match_request(&request).await {
                    Ok(Some(response)) => FetchOutcome::Served { strategy, source: ResponseSource::Cache, response },
                    Ok(None) => FetchOutcome::Unavailable { strategy },
                    Err(e) => {
                        tracing::warn!(url = %request.url, error = %e, "cache lookup failed");
                        FetchOutcome::Unavailable { strategy }
                    }
                }
            }
        }
    }

    /// Cache hit short-circuits; a miss goes to the network and is stored.
    async fn cache_first(&self, generation: &Generation, request: Request) -> Result<FetchOutcome, Error> {
        let strategy = Strategy::CacheFirst;

        match generation.match_request(&request).await {
            Ok(Some(response)) => {
                tracing::trace!(url = %request.url, generation = generation.name(), "cache hit");
                return Ok(FetchOutcome::Served { strategy, source: ResponseSource::Cache, response });
            }
            Ok(None) => {}
            Err(e) => tracing::warn!(url = %request.url, error = %e, "cache lookup failed, treating as miss"),
        }

        let response = self.fetcher.fetch(&request).await.inspect_err(|e| {
            tracing::error!(url = %request.url, error = %e, "fetch failed with no cached copy");
        })?;
        self.remember(generation, &request, &response).await;

        Ok(FetchOutcome::Served { strategy, source: ResponseSource::Network, response })
    }

    /// Queue a background write for complete `200` GET responses.
    async fn remember(&self, generation: &Generation, request: &Request, response: &Response) {
        if request.is_get() && response.is_cacheable() {
            self.spawn_write(generation.clone(), request.clone(), response.clone()).await;
        } else {
            tracing::trace!(url = %request.url, method = %request.method, status = response.status, "not caching");
        }
    }
}
