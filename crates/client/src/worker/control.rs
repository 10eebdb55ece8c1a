//! Control channel: host client control and page messages.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use swcache_core::Error;

use super::{ActivationReport, Worker};
use crate::fetch::Fetcher;

/// Host-side control over the pages this worker may serve.
#[async_trait::async_trait]
pub trait ClientControl: Send + Sync {
    /// Tell the host this worker wants to activate without waiting.
    async fn skip_waiting(&self) -> Result<(), Error>;

    /// Take control of every open client. Returns how many were claimed.
    async fn claim(&self) -> Result<usize, Error>;
}

/// Commands pages may post to the worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(tag = "type")]
pub enum Command {
    #[serde(rename = "SKIP_WAITING")]
    SkipWaiting,
}

impl Command {
    /// Parse a posted message. Anything unrecognized is `None`.
    pub fn parse(data: &Value) -> Option<Self> {
        if !data.is_object() {
            return None;
        }
        Self::deserialize(data).ok()
    }
}

/// What a message did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum MessageOutcome {
    /// Waiting was skipped; `activation` is set if an installed worker was
    /// promoted by this message.
    SkipWaiting { activation: Option<ActivationReport> },
    Ignored,
}

impl<F: Fetcher, C: ClientControl> Worker<F, C> {
    /// Handle a message posted by a page.
    pub async fn handle_message(&self, data: &Value) -> Result<MessageOutcome, Error> {
        let Some(command) = Command::parse(data) else {
            tracing::debug!(%data, "ignoring unrecognized message");
            return Ok(MessageOutcome::Ignored);
        };

        match command {
            Command::SkipWaiting => {
                tracing::info!(version = %self.version(), state = %self.state(), "skip waiting requested");
                self.skip_waiting().await?;
                let activation = self.activate_if_installed().await?;
                Ok(MessageOutcome::SkipWaiting { activation })
            }
        }
    }
}
