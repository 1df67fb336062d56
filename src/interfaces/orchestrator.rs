//! Orchestrator contracts: live-object access and apply.

use async_trait::async_trait;

use crate::orchestrator::{ApplicationObject, ControllerRevision};

/// Result type for orchestrator operations.
pub type Result<T> = std::result::Result<T, OrchestratorError>;

/// Errors from orchestrator operations.
#[derive(Debug, thiserror::Error)]
pub enum OrchestratorError {
    #[error("{kind} {namespace}/{name} not found")]
    NotFound {
        kind: &'static str,
        namespace: String,
        name: String,
    },

    #[error("Failed to decode {kind} {name}: {source}")]
    Decode {
        kind: &'static str,
        name: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Orchestrator API error: {0}")]
    Api(String),

    #[cfg(feature = "k8s")]
    #[error("Kubernetes API error: {0}")]
    Kube(#[from] kube::Error),
}

impl OrchestratorError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, OrchestratorError::NotFound { .. })
    }
}

/// Read/patch access to live application objects and their history.
///
/// Injected into the synchronizer and control operations; its lifecycle is
/// owned by the hosting process.
#[async_trait]
pub trait OrchestratorClient: Send + Sync {
    /// Fetch the live application object.
    async fn get_application(&self, namespace: &str, name: &str) -> Result<ApplicationObject>;

    /// Fetch a historical snapshot of an application object.
    async fn get_controller_revision(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<ControllerRevision>;

    /// Merge-patch the status sub-document of a live application object.
    ///
    /// Only fields present in `app.status` are written.
    async fn patch_application_status(&self, app: &ApplicationObject) -> Result<()>;
}

/// Idempotent upsert of a live application object.
#[async_trait]
pub trait Applicator: Send + Sync {
    async fn apply(&self, app: &ApplicationObject) -> Result<()>;
}
