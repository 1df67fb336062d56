//! Kubernetes-backed orchestrator client and applicator.
//!
//! Live application objects are custom resources, accessed untyped through
//! `DynamicObject` and converted into [`ApplicationObject`]. Historical
//! snapshots are `apps/v1` `ControllerRevision`s.

use k8s_openapi::api::apps::v1::ControllerRevision as K8sControllerRevision;
use kube::{
    api::{Api, ApiResource, DynamicObject, GroupVersionKind, Patch, PatchParams},
    Client,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;
use tracing::debug;

use async_trait::async_trait;

use super::{ApplicationObject, ControllerRevision, APPLICATION_KIND, CONTROLLER_REVISION_KIND};
use crate::config::OrchestratorConfig;
use crate::interfaces::orchestrator::{
    Applicator, OrchestratorClient, OrchestratorError, Result,
};

const HTTP_NOT_FOUND: u16 = 404;

fn map_kube_error(err: kube::Error, kind: &'static str, namespace: &str, name: &str) -> OrchestratorError {
    match err {
        kube::Error::Api(response) if response.code == HTTP_NOT_FOUND => OrchestratorError::NotFound {
            kind,
            namespace: namespace.to_string(),
            name: name.to_string(),
        },
        other => OrchestratorError::Kube(other),
    }
}

fn convert<S: Serialize, D: DeserializeOwned>(
    source: &S,
    kind: &'static str,
    name: &str,
) -> Result<D> {
    serde_json::to_value(source)
        .and_then(serde_json::from_value)
        .map_err(|source| OrchestratorError::Decode {
            kind,
            name: name.to_string(),
            source,
        })
}

fn application_resource(config: &OrchestratorConfig) -> ApiResource {
    let gvk = GroupVersionKind::gvk(&config.group, &config.version, APPLICATION_KIND);
    ApiResource::from_gvk(&gvk)
}

/// Orchestrator client over the Kubernetes API.
pub struct KubeOrchestrator {
    client: Client,
    resource: ApiResource,
}

impl KubeOrchestrator {
    pub fn new(client: Client, config: &OrchestratorConfig) -> Self {
        Self {
            client,
            resource: application_resource(config),
        }
    }

    fn applications(&self, namespace: &str) -> Api<DynamicObject> {
        Api::namespaced_with(self.client.clone(), namespace, &self.resource)
    }
}

#[async_trait]
impl OrchestratorClient for KubeOrchestrator {
    async fn get_application(&self, namespace: &str, name: &str) -> Result<ApplicationObject> {
        let object = self
            .applications(namespace)
            .get(name)
            .await
            .map_err(|e| map_kube_error(e, APPLICATION_KIND, namespace, name))?;
        convert(&object, APPLICATION_KIND, name)
    }

    async fn get_controller_revision(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<ControllerRevision> {
        let revisions: Api<K8sControllerRevision> =
            Api::namespaced(self.client.clone(), namespace);
        let revision = revisions
            .get(name)
            .await
            .map_err(|e| map_kube_error(e, CONTROLLER_REVISION_KIND, namespace, name))?;
        convert(&revision, CONTROLLER_REVISION_KIND, name)
    }

    async fn patch_application_status(&self, app: &ApplicationObject) -> Result<()> {
        let patch = json!({ "status": app.status });

        debug!(
            application = %app.name(),
            namespace = %app.namespace(),
            "Merge-patching application status"
        );

        self.applications(app.namespace())
            .patch_status(app.name(), &PatchParams::default(), &Patch::Merge(&patch))
            .await
            .map_err(|e| map_kube_error(e, APPLICATION_KIND, app.namespace(), app.name()))?;
        Ok(())
    }
}

/// Document sent by server-side apply for `app`.
///
/// Status belongs to the status subresource; a resourceVersion would turn
/// the apply into a conditional update.
fn applied_document(app: &ApplicationObject) -> ApplicationObject {
    let mut desired = app.clone();
    desired.ensure_type_meta();
    desired.metadata.resource_version = None;
    desired.status = Default::default();
    desired
}

/// Server-side apply of live application objects.
pub struct KubeApplicator {
    client: Client,
    resource: ApiResource,
    field_manager: String,
}

impl KubeApplicator {
    pub fn new(client: Client, config: &OrchestratorConfig) -> Self {
        Self {
            client,
            resource: application_resource(config),
            field_manager: config.field_manager.clone(),
        }
    }
}

#[async_trait]
impl Applicator for KubeApplicator {
    async fn apply(&self, app: &ApplicationObject) -> Result<()> {
        let desired = applied_document(app);

        let api: Api<DynamicObject> =
            Api::namespaced_with(self.client.clone(), app.namespace(), &self.resource);
        api.patch(
            app.name(),
            &PatchParams::apply(&self.field_manager).force(),
            &Patch::Apply(&desired),
        )
        .await
        .map_err(|e| map_kube_error(e, APPLICATION_KIND, app.namespace(), app.name()))?;

        debug!(
            application = %app.name(),
            namespace = %app.namespace(),
            "Application applied"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::{WorkflowStatus, APPLICATION_API_VERSION};
    use kube::core::ErrorResponse;

    #[test]
    fn test_applied_document_drops_status_and_resource_version() {
        let mut app = ApplicationObject::new("default", "shop-prod");
        app.api_version.clear();
        app.kind.clear();
        app.metadata.resource_version = Some("42".to_string());
        app.spec.components.push(json!({"name": "web"}));
        app.status.workflow = Some(WorkflowStatus {
            finished: true,
            ..Default::default()
        });

        let desired = applied_document(&app);
        assert_eq!(desired.api_version, APPLICATION_API_VERSION);
        assert_eq!(desired.kind, APPLICATION_KIND);
        assert_eq!(desired.metadata.resource_version, None);
        assert_eq!(desired.status.workflow, None);
        assert_eq!(desired.spec.components.len(), 1);

        let body = serde_json::to_value(&desired).unwrap();
        assert!(body["metadata"].get("resourceVersion").is_none());
        assert_eq!(body["status"], json!({}));
    }

    #[test]
    fn test_kube_not_found_maps_to_not_found() {
        let err = kube::Error::Api(ErrorResponse {
            status: "Failure".to_string(),
            message: "applications \"shop-prod\" not found".to_string(),
            reason: "NotFound".to_string(),
            code: HTTP_NOT_FOUND,
        });
        assert!(map_kube_error(err, APPLICATION_KIND, "default", "shop-prod").is_not_found());

        let err = kube::Error::Api(ErrorResponse {
            status: "Failure".to_string(),
            message: "forbidden".to_string(),
            reason: "Forbidden".to_string(),
            code: 403,
        });
        assert!(!map_kube_error(err, APPLICATION_KIND, "default", "shop-prod").is_not_found());
    }
}
