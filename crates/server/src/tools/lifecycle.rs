//! sw_install, sw_activate and sw_status tool implementations.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use swcache_client::{ActivationReport, Fetcher, InstallReport, Worker};

use super::json_result;
use crate::host::HostClients;

/// Parameters for the sw_install tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwInstallParams {
    /// Activate right away if nothing is holding the previous worker.
    #[serde(default = "default_true")]
    pub auto_activate: bool,
}

fn default_true() -> bool {
    true
}

/// Parameters for the sw_activate tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct SwActivateParams {}

/// Parameters for the sw_status tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct SwStatusParams {}

#[derive(Debug, Serialize)]
struct SwInstallOutput {
    install: InstallReport,
    activation: Option<ActivationReport>,
    state: String,
}

#[derive(Debug, Serialize)]
struct SwStatusOutput {
    version: String,
    state: String,
    scope: String,
    skip_waiting: bool,
    open_clients: usize,
    controlled_clients: usize,
    generations: Vec<String>,
    /// Generation answering requests right now.
    serving_generation: Option<String>,
    entries: usize,
    bypass_patterns: Vec<String>,
}

/// Implementation of the sw_install tool.
pub async fn install_impl<F: Fetcher>(
    worker: &Worker<F, HostClients>, params: SwInstallParams,
) -> Result<CallToolResult, McpError> {
    let install = worker.install().await?;

    let activation = if params.auto_activate {
        worker.activate_if_ready(worker.clients().open_clients()).await?
    } else {
        None
    };

    let output = SwInstallOutput { install, activation, state: worker.state().to_string() };
    json_result(&output)
}

/// Implementation of the sw_activate tool.
pub async fn activate_impl<F: Fetcher>(
    worker: &Worker<F, HostClients>, _params: SwActivateParams,
) -> Result<CallToolResult, McpError> {
    let report = worker.activate().await?;
    json_result(&report)
}

/// Implementation of the sw_status tool.
pub async fn status_impl<F: Fetcher>(
    worker: &Worker<F, HostClients>, _params: SwStatusParams,
) -> Result<CallToolResult, McpError> {
    let config = worker.config();
    let output = SwStatusOutput {
        version: config.version.clone(),
        state: worker.state().to_string(),
        scope: config.scope.to_string(),
        skip_waiting: worker.clients().skip_waiting_requested(),
        open_clients: worker.clients().open_clients(),
        controlled_clients: worker.clients().controlled(),
        generations: worker.db().keys().await?,
        serving_generation: worker.serving_generation().await?.map(|g| g.name().to_string()),
        entries: worker.current().len().await?,
        bypass_patterns: config.bypass.patterns().to_vec(),
    };
    json_result(&output)
}

#[cfg(test)]
mod tests {
    use super::super::sw_message::{SwMessageParams, message_impl};
    use super::super::testing::{StubFetcher, output, worker};
    use super::*;
    use swcache_client::WorkerState;

    #[tokio::test]
    async fn test_install_auto_activates_without_open_clients() {
        let worker = worker("v2", StubFetcher::with_manifest(), 0).await;

        let result = install_impl(&worker, SwInstallParams { auto_activate: true }).await.unwrap();
        let json = output(&result);

        assert_eq!(json["install"]["assets"].as_array().unwrap().len(), 3);
        assert_eq!(json["activation"]["generation"], "v2");
        assert_eq!(json["state"], "serving");
    }

    #[tokio::test]
    async fn test_install_with_skip_waiting_activates_despite_open_clients() {
        let worker = worker("v2", StubFetcher::with_manifest(), 2).await;

        let result = install_impl(&worker, SwInstallParams { auto_activate: true }).await.unwrap();
        let json = output(&result);

        assert_eq!(json["activation"]["claimed"], 2);
        assert_eq!(worker.clients().controlled(), 2);
        assert!(worker.clients().skip_waiting_requested());
    }

    #[tokio::test]
    async fn test_install_without_auto_activate_waits() {
        let worker = worker("v2", StubFetcher::with_manifest(), 0).await;

        let result = install_impl(&worker, SwInstallParams { auto_activate: false }).await.unwrap();
        let json = output(&result);

        assert!(json["activation"].is_null());
        assert_eq!(json["state"], "installed");

        let result = activate_impl(&worker, SwActivateParams {}).await.unwrap();
        assert_eq!(output(&result)["generation"], "v2");
        assert_eq!(worker.state(), WorkerState::Serving);
    }

    #[tokio::test]
    async fn test_install_races_skip_waiting_message() {
        let worker = worker("v2", StubFetcher::with_manifest(), 1).await;
        let message = SwMessageParams { data: serde_json::json!({ "type": "SKIP_WAITING" }) };

        let (installed, messaged) = tokio::join!(
            install_impl(&worker, SwInstallParams { auto_activate: true }),
            message_impl(&worker, message),
        );

        let json = output(&installed.unwrap());
        assert_eq!(json["state"], "serving");
        assert!(messaged.is_ok());
        assert_eq!(worker.state(), WorkerState::Serving);
        assert_eq!(worker.clients().controlled(), 1);
    }

    #[tokio::test]
    async fn test_install_failure_is_an_error() {
        let fetcher = StubFetcher::with_manifest();
        fetcher.route("./app.js", 404, "text/plain", "missing");
        let worker = worker("v2", fetcher, 0).await;

        let err = install_impl(&worker, SwInstallParams { auto_activate: true }).await.unwrap_err();
        assert_eq!(err.code.0, -32014);
        assert!(worker.db().keys().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_activate_before_install_is_invalid_state() {
        let worker = worker("v2", StubFetcher::with_manifest(), 0).await;
        let err = activate_impl(&worker, SwActivateParams {}).await.unwrap_err();
        assert_eq!(err.code.0, -32015);
    }

    #[tokio::test]
    async fn test_status_reports_generations() {
        let worker = worker("v2", StubFetcher::with_manifest(), 0).await;

        let json = output(&status_impl(&worker, SwStatusParams {}).await.unwrap());
        assert_eq!(json["state"], "idle");
        assert_eq!(json["entries"], 0);
        assert!(json["serving_generation"].is_null());

        install_impl(&worker, SwInstallParams { auto_activate: true }).await.unwrap();

        let json = output(&status_impl(&worker, SwStatusParams {}).await.unwrap());
        assert_eq!(json["version"], "v2");
        assert_eq!(json["state"], "serving");
        assert_eq!(json["generations"], serde_json::json!(["v2"]));
        assert_eq!(json["serving_generation"], "v2");
        assert_eq!(json["entries"], 3);
        assert_eq!(json["bypass_patterns"], serde_json::json!(["realtime.example"]));
    }
}
