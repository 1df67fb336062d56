//! workflow-syncd: workflow record synchronizer daemon
//!
//! Periodically folds the state of live OAM applications (and their
//! archived controller revisions) back into the workflow record store.
//!
//! ## Architecture
//! ```text
//! [Kubernetes API] -> [workflow-syncd] -> [SQLite record store]
//!   Application            |
//!   ControllerRevision     v
//!                     SyncScheduler (every sync.interval_secs)
//! ```
//!
//! ## Configuration
//! - `--config <path>` or WORKFLOW_SYNC_CONFIG: YAML config file
//! - WORKFLOW_SYNC__STORAGE__PATH: SQLite database path
//! - WORKFLOW_SYNC__SYNC__INTERVAL_SECS: sweep period (default: 5)
//! - WORKFLOW_SYNC_LOG: tracing filter (default: info)

use std::sync::Arc;
use std::time::Duration;

use backon::Retryable;
use tracing::{error, info, warn};

use workflow_sync::config::Config;
use workflow_sync::orchestrator::KubeOrchestrator;
use workflow_sync::services::{SyncScheduler, WorkflowSynchronizer};
use workflow_sync::storage::init_repositories;
use workflow_sync::store::RecordStore;
use workflow_sync::utils::bootstrap::{init_tracing, parse_config_path};
use workflow_sync::utils::retry::connection_backoff;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let config_path = parse_config_path();
    let config = Config::load(config_path.as_deref()).map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    if !config.sync.enabled {
        info!("Workflow record sync disabled, exiting");
        return Ok(());
    }

    let client = (|| async { kube::Client::try_default().await })
        .retry(connection_backoff())
        .notify(|e: &kube::Error, delay: Duration| {
            warn!(error = %e, delay = ?delay, "Failed to connect to Kubernetes, retrying");
        })
        .await?;
    info!("Connected to Kubernetes");

    let store = RecordStore::new(init_repositories(&config.storage).await?);
    let orchestrator = Arc::new(KubeOrchestrator::new(client, &config.orchestrator));
    let scheduler = SyncScheduler::new(
        WorkflowSynchronizer::new(store, orchestrator),
        &config.sync,
    );

    tokio::select! {
        _ = scheduler.run() => {}
        result = tokio::signal::ctrl_c() => {
            result?;
            info!("Shutting down workflow-syncd");
        }
    }

    Ok(())
}
