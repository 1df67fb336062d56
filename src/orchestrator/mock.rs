//! In-memory orchestrator for testing.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{ApplicationObject, ControllerRevision, APPLICATION_KIND, CONTROLLER_REVISION_KIND};
use crate::interfaces::orchestrator::{
    Applicator, OrchestratorClient, OrchestratorError, Result,
};

/// Key type for stored objects: (namespace, name).
type ObjectKey = (String, String);

fn object_key(namespace: &str, name: &str) -> ObjectKey {
    (namespace.to_string(), name.to_string())
}

/// RFC 7386 JSON merge patch.
fn merge_patch(target: &mut serde_json::Value, patch: &serde_json::Value) {
    let serde_json::Value::Object(patch_map) = patch else {
        *target = patch.clone();
        return;
    };
    if !target.is_object() {
        *target = serde_json::Value::Object(serde_json::Map::new());
    }
    if let serde_json::Value::Object(target_map) = target {
        for (key, value) in patch_map {
            if value.is_null() {
                target_map.remove(key);
            } else {
                merge_patch(
                    target_map
                        .entry(key.clone())
                        .or_insert(serde_json::Value::Null),
                    value,
                );
            }
        }
    }
}

/// Mock orchestrator that stores live objects and snapshots in memory.
#[derive(Default)]
pub struct MockOrchestrator {
    applications: RwLock<HashMap<ObjectKey, ApplicationObject>>,
    revisions: RwLock<HashMap<ObjectKey, ControllerRevision>>,
    fail_on_get: RwLock<bool>,
    fail_on_patch: RwLock<bool>,
    status_patches: RwLock<usize>,
}

impl MockOrchestrator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store (or replace) a live application object.
    pub async fn insert_application(&self, app: ApplicationObject) {
        let key = object_key(app.namespace(), app.name());
        self.applications.write().await.insert(key, app);
    }

    /// Store a historical snapshot.
    pub async fn insert_controller_revision(&self, revision: ControllerRevision) {
        let key = object_key(&revision.metadata.namespace, &revision.metadata.name);
        self.revisions.write().await.insert(key, revision);
    }

    /// Current stored copy of a live object.
    pub async fn stored_application(&self, namespace: &str, name: &str) -> Option<ApplicationObject> {
        self.applications
            .read()
            .await
            .get(&object_key(namespace, name))
            .cloned()
    }

    pub async fn set_fail_on_get(&self, fail: bool) {
        *self.fail_on_get.write().await = fail;
    }

    pub async fn set_fail_on_patch(&self, fail: bool) {
        *self.fail_on_patch.write().await = fail;
    }

    /// Number of successful status patches.
    pub async fn status_patch_count(&self) -> usize {
        *self.status_patches.read().await
    }
}

#[async_trait]
impl OrchestratorClient for MockOrchestrator {
    async fn get_application(&self, namespace: &str, name: &str) -> Result<ApplicationObject> {
        if *self.fail_on_get.read().await {
            return Err(OrchestratorError::Api("injected get failure".to_string()));
        }
        self.stored_application(namespace, name)
            .await
            .ok_or_else(|| OrchestratorError::NotFound {
                kind: APPLICATION_KIND,
                namespace: namespace.to_string(),
                name: name.to_string(),
            })
    }

    async fn get_controller_revision(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<ControllerRevision> {
        if *self.fail_on_get.read().await {
            return Err(OrchestratorError::Api("injected get failure".to_string()));
        }
        self.revisions
            .read()
            .await
            .get(&object_key(namespace, name))
            .cloned()
            .ok_or_else(|| OrchestratorError::NotFound {
                kind: CONTROLLER_REVISION_KIND,
                namespace: namespace.to_string(),
                name: name.to_string(),
            })
    }

    async fn patch_application_status(&self, app: &ApplicationObject) -> Result<()> {
        if *self.fail_on_patch.read().await {
            return Err(OrchestratorError::Api("injected patch failure".to_string()));
        }
        let key = object_key(app.namespace(), app.name());
        let mut applications = self.applications.write().await;
        let stored = applications
            .get_mut(&key)
            .ok_or_else(|| OrchestratorError::NotFound {
                kind: APPLICATION_KIND,
                namespace: app.namespace().to_string(),
                name: app.name().to_string(),
            })?;

        let decode_err = |source: serde_json::Error| OrchestratorError::Decode {
            kind: APPLICATION_KIND,
            name: app.name().to_string(),
            source,
        };
        let mut current = serde_json::to_value(&*stored).map_err(decode_err)?;
        let patch = serde_json::json!({ "status": serde_json::to_value(&app.status).map_err(decode_err)? });
        merge_patch(&mut current, &patch);
        *stored = serde_json::from_value(current).map_err(decode_err)?;

        *self.status_patches.write().await += 1;
        Ok(())
    }
}

/// Mock applicator that upserts into a [`MockOrchestrator`].
pub struct MockApplicator {
    orchestrator: Arc<MockOrchestrator>,
    fail_on_apply: RwLock<bool>,
    applied: RwLock<Vec<ApplicationObject>>,
}

impl MockApplicator {
    pub fn new(orchestrator: Arc<MockOrchestrator>) -> Self {
        Self {
            orchestrator,
            fail_on_apply: RwLock::new(false),
            applied: RwLock::new(Vec::new()),
        }
    }

    pub async fn set_fail_on_apply(&self, fail: bool) {
        *self.fail_on_apply.write().await = fail;
    }

    /// Objects successfully applied, oldest first.
    pub async fn applied(&self) -> Vec<ApplicationObject> {
        self.applied.read().await.clone()
    }
}

#[async_trait]
impl Applicator for MockApplicator {
    async fn apply(&self, app: &ApplicationObject) -> Result<()> {
        if *self.fail_on_apply.read().await {
            return Err(OrchestratorError::Api("injected apply failure".to_string()));
        }
        self.orchestrator.insert_application(app.clone()).await;
        self.applied.write().await.push(app.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::WorkflowStatus;

    #[test]
    fn test_merge_patch_replaces_and_removes() {
        let mut target = serde_json::json!({"a": 1, "b": {"c": 2, "d": 3}});
        merge_patch(&mut target, &serde_json::json!({"b": {"c": null, "e": 4}, "f": 5}));
        assert_eq!(target, serde_json::json!({"a": 1, "b": {"d": 3, "e": 4}, "f": 5}));
    }

    #[tokio::test]
    async fn test_patch_status_merges_and_preserves_spec() {
        let orchestrator = MockOrchestrator::new();
        let mut app = ApplicationObject::new("default", "shop-prod");
        app.spec.components.push(serde_json::json!({"name": "web"}));
        app.status.workflow = Some(WorkflowStatus {
            suspend: true,
            ..Default::default()
        });
        orchestrator.insert_application(app.clone()).await;

        let mut patched = app.clone();
        patched.spec.components.clear();
        if let Some(workflow) = patched.status.workflow.as_mut() {
            workflow.suspend = false;
        }
        orchestrator.patch_application_status(&patched).await.unwrap();

        let stored = orchestrator
            .stored_application("default", "shop-prod")
            .await
            .unwrap();
        assert!(!stored.status.workflow.unwrap().suspend);
        assert_eq!(stored.spec.components.len(), 1);
        assert_eq!(orchestrator.status_patch_count().await, 1);
    }

    #[tokio::test]
    async fn test_missing_application_is_not_found() {
        let orchestrator = MockOrchestrator::new();
        let err = orchestrator
            .get_application("default", "absent")
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_applicator_failure_leaves_orchestrator_untouched() {
        let orchestrator = Arc::new(MockOrchestrator::new());
        let applicator = MockApplicator::new(Arc::clone(&orchestrator));
        applicator.set_fail_on_apply(true).await;

        let app = ApplicationObject::new("default", "shop-prod");
        assert!(applicator.apply(&app).await.is_err());
        assert!(orchestrator
            .stored_application("default", "shop-prod")
            .await
            .is_none());
        assert!(applicator.applied().await.is_empty());
    }
}
