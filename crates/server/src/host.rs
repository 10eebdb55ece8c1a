//! Host-side client bookkeeping.
//!
//! The MCP session stands in for the pages a browser would have open. The
//! host tracks how many there are and whether the worker has claimed them.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use swcache_client::{ClientControl, FetchClient, Worker};
use swcache_core::Error;

/// Worker as run by this binary.
pub type HostWorker = Worker<FetchClient, HostClients>;

/// [`ClientControl`] for the stdio host.
#[derive(Debug)]
pub struct HostClients {
    open: AtomicUsize,
    controlled: AtomicUsize,
    skip_waiting: AtomicBool,
}

impl HostClients {
    pub fn new(open: usize) -> Self {
        Self { open: AtomicUsize::new(open), controlled: AtomicUsize::new(0), skip_waiting: AtomicBool::new(false) }
    }

    /// Clients the host currently has open.
    pub fn open_clients(&self) -> usize {
        self.open.load(Ordering::Acquire)
    }

    /// Clients claimed by the active worker.
    pub fn controlled(&self) -> usize {
        self.controlled.load(Ordering::Acquire)
    }

    pub fn skip_waiting_requested(&self) -> bool {
        self.skip_waiting.load(Ordering::Acquire)
    }
}

#[async_trait::async_trait]
impl ClientControl for HostClients {
    async fn skip_waiting(&self) -> Result<(), Error> {
        if !self.skip_waiting.swap(true, Ordering::AcqRel) {
            tracing::info!("worker asked to skip waiting");
        }
        Ok(())
    }

    async fn claim(&self) -> Result<usize, Error> {
        let open = self.open_clients();
        self.controlled.store(open, Ordering::Release);
        tracing::info!(clients = open, "worker claimed open clients");
        Ok(open)
    }
}
