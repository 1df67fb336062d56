//! Live application objects as the orchestrator exposes them.
//!
//! An [`ApplicationObject`] is the orchestrator's current view of one
//! application in one environment. Its `status.workflow` sub-document is
//! the observable state of the execution it is running; its annotations
//! correlate that execution with a [`crate::model::WorkflowRecord`] and a
//! [`crate::model::ApplicationRevision`].
//!
//! Once an execution is superseded, its final object survives as a
//! [`ControllerRevision`] named by [`record_snapshot_name`].

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::interfaces::orchestrator::{OrchestratorError, Result};
use crate::model::JsonStruct;

pub mod mock;

#[cfg(feature = "k8s")]
pub mod k8s;

pub use mock::{MockApplicator, MockOrchestrator};

#[cfg(feature = "k8s")]
pub use k8s::{KubeApplicator, KubeOrchestrator};

/// API version of live application objects.
pub const APPLICATION_API_VERSION: &str = "core.oam.dev/v1beta1";
/// Kind of live application objects.
pub const APPLICATION_KIND: &str = "Application";
/// Kind of historical snapshot objects.
pub const CONTROLLER_REVISION_KIND: &str = "ControllerRevision";

/// Annotation carrying the owning application's primary key.
pub const ANNOTATION_APP_NAME: &str = "app.oam.dev/appName";
/// Annotation carrying the revision version applied by the current execution.
pub const ANNOTATION_DEPLOY_VERSION: &str = "app.oam.dev/deployVersion";
/// Annotation carrying the record name of the current execution.
pub const ANNOTATION_PUBLISH_VERSION: &str = "app.oam.dev/publishVersion";

/// Name of the live object for an application in an environment.
pub fn convert_app_name(app_name: &str, env_name: &str) -> String {
    format!("{}-{}", app_name, env_name)
}

/// Name of the historical snapshot of `live_name` for one execution.
pub fn record_snapshot_name(live_name: &str, record_name: &str) -> String {
    format!("record-{}-{}", live_name, record_name)
}

/// Object metadata subset this crate reads and writes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectMeta {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub namespace: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_version: Option<String>,
}

/// Status of one workflow step as reported by the orchestrator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepStatus {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(rename = "type", default)]
    pub step_type: String,
    #[serde(default)]
    pub phase: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub message: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub reason: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_execute_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_execute_time: Option<DateTime<Utc>>,
    #[serde(rename = "subSteps", default, skip_serializing_if = "Vec::is_empty")]
    pub sub_steps: Vec<StepStatus>,
}

/// Observable state of the execution a live object is running.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowStatus {
    #[serde(default)]
    pub finished: bool,
    #[serde(default)]
    pub terminated: bool,
    #[serde(default)]
    pub suspend: bool,
    #[serde(default)]
    pub steps: Vec<StepStatus>,
    #[serde(flatten)]
    pub extra: JsonStruct,
}

impl WorkflowStatus {
    /// Running means not suspended, not terminated and not finished.
    /// Only a non-running execution may be mutated.
    pub fn is_running(&self) -> bool {
        !self.suspend && !self.terminated && !self.finished
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApplicationSpec {
    #[serde(default)]
    pub components: Vec<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub policies: Vec<serde_json::Value>,
    #[serde(flatten)]
    pub extra: JsonStruct,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApplicationStatus {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow: Option<WorkflowStatus>,
    #[serde(flatten)]
    pub extra: JsonStruct,
}

/// A live application object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationObject {
    #[serde(default)]
    pub api_version: String,
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub spec: ApplicationSpec,
    #[serde(default)]
    pub status: ApplicationStatus,
}

impl ApplicationObject {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            api_version: APPLICATION_API_VERSION.to_string(),
            kind: APPLICATION_KIND.to_string(),
            metadata: ObjectMeta {
                name: name.into(),
                namespace: namespace.into(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    pub fn namespace(&self) -> &str {
        &self.metadata.namespace
    }

    pub fn annotation(&self, key: &str) -> Option<&str> {
        self.metadata.annotations.get(key).map(String::as_str)
    }

    /// Record name of the execution this object is currently running.
    pub fn publish_version(&self) -> Option<&str> {
        self.annotation(ANNOTATION_PUBLISH_VERSION)
    }

    /// Stamp group/version/kind, which specs decoded from storage may lack.
    pub fn ensure_type_meta(&mut self) {
        if self.api_version.is_empty() {
            self.api_version = APPLICATION_API_VERSION.to_string();
        }
        if self.kind.is_empty() {
            self.kind = APPLICATION_KIND.to_string();
        }
    }
}

/// Immutable historical snapshot holding a serialized application object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ControllerRevision {
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub data: serde_json::Value,
    #[serde(default)]
    pub revision: i64,
}

impl ControllerRevision {
    /// Wrap an application object as a snapshot payload.
    pub fn from_application(
        name: impl Into<String>,
        app: &ApplicationObject,
        revision: i64,
    ) -> Result<Self> {
        let name = name.into();
        let data = serde_json::to_value(app).map_err(|source| OrchestratorError::Decode {
            kind: CONTROLLER_REVISION_KIND,
            name: name.clone(),
            source,
        })?;
        Ok(Self {
            metadata: ObjectMeta {
                name,
                namespace: app.metadata.namespace.clone(),
                ..Default::default()
            },
            data,
            revision,
        })
    }

    /// Decode the embedded application object.
    pub fn decode_application(&self) -> Result<ApplicationObject> {
        serde_json::from_value(self.data.clone()).map_err(|source| OrchestratorError::Decode {
            kind: CONTROLLER_REVISION_KIND,
            name: self.metadata.name.clone(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_naming_functions() {
        assert_eq!(convert_app_name("shop", "prod"), "shop-prod");
        assert_eq!(
            record_snapshot_name("shop-prod", "deploy-20240101"),
            "record-shop-prod-deploy-20240101"
        );
    }

    #[test]
    fn test_running_requires_all_flags_clear() {
        let mut status = WorkflowStatus::default();
        assert!(status.is_running());
        status.suspend = true;
        assert!(!status.is_running());
        status.suspend = false;
        status.finished = true;
        assert!(!status.is_running());
        status.finished = false;
        status.terminated = true;
        assert!(!status.is_running());
    }

    #[test]
    fn test_application_object_keeps_unknown_status_fields() {
        let raw = serde_json::json!({
            "apiVersion": APPLICATION_API_VERSION,
            "kind": APPLICATION_KIND,
            "metadata": {"name": "shop-prod", "namespace": "default"},
            "spec": {"components": [{"name": "web"}], "workflow": {"steps": []}},
            "status": {
                "status": "running",
                "workflow": {"suspend": true, "mode": "StepByStep", "steps": []}
            }
        });
        let app: ApplicationObject = serde_json::from_value(raw).unwrap();
        let workflow = app.status.workflow.as_ref().unwrap();
        assert!(workflow.suspend);
        assert_eq!(workflow.extra["mode"], "StepByStep");

        let back = serde_json::to_value(&app).unwrap();
        assert_eq!(back["status"]["status"], "running");
        assert_eq!(back["spec"]["workflow"]["steps"], serde_json::json!([]));
    }

    #[test]
    fn test_controller_revision_round_trips_application() {
        let mut app = ApplicationObject::new("default", "shop-prod");
        app.metadata
            .annotations
            .insert(ANNOTATION_PUBLISH_VERSION.to_string(), "v1".to_string());
        let cr = ControllerRevision::from_application("record-shop-prod-v1", &app, 1).unwrap();
        let decoded = cr.decode_application().unwrap();
        assert_eq!(decoded.publish_version(), Some("v1"));
    }

    #[test]
    fn test_controller_revision_decode_failure() {
        let cr = ControllerRevision {
            metadata: ObjectMeta {
                name: "record-x-y".to_string(),
                ..Default::default()
            },
            data: serde_json::json!("not an object"),
            revision: 1,
        };
        assert!(matches!(
            cr.decode_application(),
            Err(OrchestratorError::Decode { .. })
        ));
    }
}
