//! Worker lifecycle states.

use std::fmt;

use serde::Serialize;

/// Where the worker is in its lifecycle.
///
/// ```text
/// Idle ──install──▶ Installing ──ok──▶ Installed ──activate──▶ Activating ──▶ Serving
///                        │                 ▲
///                        └──err──▶ Redundant ──install (retry)
/// ```
///
/// A `SKIP_WAITING` message moves an `Installed` worker straight into
/// `Activating` without waiting for open clients to go away.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerState {
    Idle,
    Installing,
    /// Populated and waiting for activation.
    Installed,
    Activating,
    /// Controls clients and routes their requests.
    Serving,
    /// Installation failed; the previous generation stays in service.
    Redundant,
}

impl WorkerState {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkerState::Idle => "idle",
            WorkerState::Installing => "installing",
            WorkerState::Installed => "installed",
            WorkerState::Activating => "activating",
            WorkerState::Serving => "serving",
            WorkerState::Redundant => "redundant",
        }
    }

    /// Whether `install` may start from this state.
    pub fn can_install(&self) -> bool {
        matches!(self, WorkerState::Idle | WorkerState::Redundant)
    }
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
