//! Test utilities and mock wiring.
//!
//! [`TestHarness`] assembles a record store over in-memory repositories, a
//! mock orchestrator and a mock applicator around one application (`shop`
//! in namespace `default`) with one default workflow (`deploy` on `prod`).
//! Typed repository handles stay reachable for failure injection.

use std::sync::Arc;

use chrono::Utc;

use crate::model::{
    Application, ApplicationRevision, FinishedFlag, RecordStatus, Workflow, WorkflowRecord,
};
use crate::orchestrator::{
    convert_app_name, record_snapshot_name, ApplicationObject, ControllerRevision, MockApplicator,
    MockOrchestrator, WorkflowStatus, ANNOTATION_APP_NAME, ANNOTATION_DEPLOY_VERSION,
    ANNOTATION_PUBLISH_VERSION,
};
use crate::services::{WorkflowControl, WorkflowService, WorkflowSynchronizer};
use crate::storage::{MemoryRepository, Repositories};
use crate::store::RecordStore;

pub const TEST_APP: &str = "shop";
pub const TEST_NAMESPACE: &str = "default";
pub const TEST_WORKFLOW: &str = "deploy";
pub const TEST_ENV: &str = "prod";

/// In-memory wiring of every collaborator around one application.
pub struct TestHarness {
    pub app: Application,
    pub workflow: Workflow,
    pub store: RecordStore,
    pub workflows: Arc<MemoryRepository<Workflow>>,
    pub records: Arc<MemoryRepository<WorkflowRecord>>,
    pub revisions: Arc<MemoryRepository<ApplicationRevision>>,
    pub orchestrator: Arc<MockOrchestrator>,
    pub applicator: Arc<MockApplicator>,
}

impl TestHarness {
    /// Harness with the default workflow already stored.
    pub async fn new() -> Self {
        let workflows = Arc::new(MemoryRepository::<Workflow>::new());
        let records = Arc::new(MemoryRepository::<WorkflowRecord>::new());
        let revisions = Arc::new(MemoryRepository::<ApplicationRevision>::new());
        let store = RecordStore::new(Repositories {
            workflows: workflows.clone(),
            records: records.clone(),
            revisions: revisions.clone(),
        });
        let orchestrator = Arc::new(MockOrchestrator::new());
        let applicator = Arc::new(MockApplicator::new(orchestrator.clone()));

        let mut workflow = Workflow {
            name: TEST_WORKFLOW.to_string(),
            env_name: TEST_ENV.to_string(),
            app_primary_key: TEST_APP.to_string(),
            default: Some(true),
            ..Default::default()
        };
        store
            .add_workflow(&mut workflow)
            .await
            .expect("seed default workflow");

        Self {
            app: Application::new(TEST_APP, TEST_NAMESPACE),
            workflow,
            store,
            workflows,
            records,
            revisions,
            orchestrator,
            applicator,
        }
    }

    pub fn synchronizer(&self) -> WorkflowSynchronizer {
        WorkflowSynchronizer::new(self.store.clone(), self.orchestrator.clone())
    }

    pub fn control(&self) -> WorkflowControl {
        WorkflowControl::new(
            self.store.clone(),
            self.orchestrator.clone(),
            self.applicator.clone(),
        )
    }

    pub fn service(&self) -> WorkflowService {
        WorkflowService::new(self.store.clone())
    }

    /// Name of the live object of the test application.
    pub fn live_name(&self) -> String {
        convert_app_name(TEST_APP, TEST_ENV)
    }

    /// Observed workflow status with the given flags.
    pub fn status(finished: bool, terminated: bool) -> WorkflowStatus {
        WorkflowStatus {
            finished,
            terminated,
            ..Default::default()
        }
    }

    /// Unsaved, unfinished record of the default workflow.
    pub fn new_record(&self, name: &str, revision: &str) -> WorkflowRecord {
        WorkflowRecord {
            app_primary_key: TEST_APP.to_string(),
            workflow_name: TEST_WORKFLOW.to_string(),
            name: name.to_string(),
            revision_primary_key: revision.to_string(),
            namespace: TEST_NAMESPACE.to_string(),
            start_time: Utc::now(),
            finished: FinishedFlag::False,
            status: RecordStatus::Initializing,
            ..Default::default()
        }
    }

    /// Store a revision. `apply_app_config` is the serialized spec.
    pub async fn seed_revision(
        &self,
        version: &str,
        status: RecordStatus,
        apply_app_config: &str,
    ) -> ApplicationRevision {
        let mut revision = ApplicationRevision {
            app_primary_key: TEST_APP.to_string(),
            version: version.to_string(),
            apply_app_config: apply_app_config.to_string(),
            status,
            workflow_name: TEST_WORKFLOW.to_string(),
            env_name: TEST_ENV.to_string(),
            ..Default::default()
        };
        self.store
            .add_revision(&mut revision)
            .await
            .expect("seed revision");
        revision
    }

    /// Store an unfinished record, creating its revision if absent.
    pub async fn seed_record(&self, name: &str, revision: &str) -> WorkflowRecord {
        if self.store.get_revision(TEST_APP, revision).await.is_err() {
            self.seed_revision(revision, RecordStatus::Initializing, "")
                .await;
        }
        let mut record = self.new_record(name, revision);
        self.store
            .add_record(&mut record)
            .await
            .expect("seed record");
        record
    }

    /// Live object correlated with `record_name`.
    pub fn live_object(
        &self,
        record_name: &str,
        revision: &str,
        status: Option<WorkflowStatus>,
    ) -> ApplicationObject {
        let mut app = ApplicationObject::new(TEST_NAMESPACE, self.live_name());
        let annotations = &mut app.metadata.annotations;
        annotations.insert(ANNOTATION_APP_NAME.to_string(), TEST_APP.to_string());
        annotations.insert(ANNOTATION_PUBLISH_VERSION.to_string(), record_name.to_string());
        annotations.insert(ANNOTATION_DEPLOY_VERSION.to_string(), revision.to_string());
        app.spec
            .components
            .push(serde_json::json!({"name": "web", "type": "webservice"}));
        app.status.workflow = status;
        app
    }

    /// Make `record_name` the execution the live object is running.
    pub async fn set_live(&self, record_name: &str, revision: &str, status: Option<WorkflowStatus>) {
        self.orchestrator
            .insert_application(self.live_object(record_name, revision, status))
            .await;
    }

    /// Archive the final state of a superseded execution.
    pub async fn set_snapshot(&self, record_name: &str, revision: &str, status: WorkflowStatus) {
        let app = self.live_object(record_name, revision, Some(status));
        let snapshot = ControllerRevision::from_application(
            record_snapshot_name(&self.live_name(), record_name),
            &app,
            1,
        )
        .expect("encode snapshot");
        self.orchestrator.insert_controller_revision(snapshot).await;
    }

    /// Stored record of the default workflow.
    pub async fn record(&self, name: &str) -> WorkflowRecord {
        self.store
            .get_record(TEST_APP, TEST_WORKFLOW, name)
            .await
            .expect("stored record")
    }

    /// Stored revision of the test application.
    pub async fn revision(&self, version: &str) -> ApplicationRevision {
        self.store
            .get_revision(TEST_APP, version)
            .await
            .expect("stored revision")
    }

    /// Names of all stored records of the default workflow, in insertion order.
    pub async fn record_names(&self) -> Vec<String> {
        self.store
            .list_workflow_records(TEST_APP, TEST_WORKFLOW, &Default::default())
            .await
            .expect("list records")
            .into_iter()
            .map(|r| r.name)
            .collect()
    }
}
