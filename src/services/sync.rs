//! Workflow record synchronizer.
//!
//! Folds the orchestrator's observed execution state back into the record
//! store. A sweep visits every record whose finished flag is `"false"`,
//! resolves it to the live application object (or, once that object has
//! moved on to a newer execution, to the historical snapshot of it), and
//! persists the derived summary status onto the record and its revision.
//!
//! Sweeps are idempotent and isolate failures per record: a record whose
//! lookups fail is logged and skipped until the next sweep.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::error::{Result, WorkflowError};
use crate::interfaces::OrchestratorClient;
use crate::model::entity::INDEX_FINISHED;
use crate::model::{FinishedFlag, Index, ListOptions, RecordStatus, WorkflowRecord};
use crate::orchestrator::{
    convert_app_name, record_snapshot_name, ApplicationObject, WorkflowStatus, ANNOTATION_APP_NAME,
};
use crate::store::RecordStore;

/// Map an observed workflow status to a summary status.
///
/// Terminated wins over finished; anything else is still running.
pub fn summary_status(status: &WorkflowStatus) -> RecordStatus {
    if status.terminated {
        RecordStatus::Terminated
    } else if status.finished {
        RecordStatus::Complete
    } else {
        RecordStatus::Running
    }
}

/// Counters for one sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Unfinished records visited.
    pub examined: usize,
    /// Records whose status source was resolved and written.
    pub synced: usize,
    /// Records skipped after a failed lookup or write.
    pub skipped: usize,
}

/// Reconciles persisted records with orchestrator state.
#[derive(Clone)]
pub struct WorkflowSynchronizer {
    store: RecordStore,
    orchestrator: Arc<dyn OrchestratorClient>,
}

impl WorkflowSynchronizer {
    pub fn new(store: RecordStore, orchestrator: Arc<dyn OrchestratorClient>) -> Self {
        Self {
            store,
            orchestrator,
        }
    }

    /// Run one sweep over all unfinished records.
    ///
    /// Only failure to list the candidates is returned; per-record failures
    /// are logged and counted as skipped.
    pub async fn sync_workflow_records(&self) -> Result<SyncReport> {
        let mut filter = Index::new();
        filter.insert(INDEX_FINISHED, "false".to_string());
        let records = self
            .store
            .list_records(&filter, &ListOptions::default())
            .await?;

        let mut report = SyncReport {
            examined: records.len(),
            ..Default::default()
        };
        for record in &records {
            if self.sync_record(record).await {
                report.synced += 1;
            } else {
                report.skipped += 1;
            }
        }

        debug!(
            examined = report.examined,
            synced = report.synced,
            skipped = report.skipped,
            "Workflow record sweep finished"
        );
        Ok(report)
    }

    /// Reconcile one record found by a sweep. Returns false when skipped.
    async fn sync_record(&self, record: &WorkflowRecord) -> bool {
        let workflow = match self
            .store
            .get_workflow(&record.app_primary_key, &record.workflow_name)
            .await
        {
            Ok(workflow) => workflow,
            Err(e) => {
                warn!(
                    app = %record.app_primary_key,
                    workflow = %record.workflow_name,
                    record = %record.name,
                    stage = "workflow",
                    error = %e,
                    "Failed to load workflow for record, skipping"
                );
                return false;
            }
        };

        let live_name = convert_app_name(&record.app_primary_key, &workflow.env_name);
        let live = match self
            .orchestrator
            .get_application(&record.namespace, &live_name)
            .await
        {
            Ok(live) => live,
            Err(e) => {
                warn!(
                    app = %live_name,
                    workflow = %record.workflow_name,
                    record = %record.name,
                    stage = "application",
                    error = %e,
                    "Failed to get live application, skipping"
                );
                return false;
            }
        };

        let (source_app, source) = if live.publish_version() == Some(record.name.as_str()) {
            let source = live.name().to_string();
            (live, source)
        } else {
            match self.load_snapshot(record, &live_name).await {
                Some(resolved) => resolved,
                None => return false,
            }
        };

        match self
            .sync_workflow_status(&source_app, &workflow.name, &record.name, &source)
            .await
        {
            Ok(()) => true,
            Err(e) => {
                warn!(
                    app = %live_name,
                    workflow = %record.workflow_name,
                    record = %record.name,
                    source = %source,
                    stage = "status",
                    error = %e,
                    "Failed to sync workflow status, skipping"
                );
                false
            }
        }
    }

    /// Resolve the historical snapshot of a superseded execution.
    async fn load_snapshot(
        &self,
        record: &WorkflowRecord,
        live_name: &str,
    ) -> Option<(ApplicationObject, String)> {
        let snapshot_name = record_snapshot_name(live_name, &record.name);
        let snapshot = match self
            .orchestrator
            .get_controller_revision(&record.namespace, &snapshot_name)
            .await
        {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(
                    app = %live_name,
                    workflow = %record.workflow_name,
                    record = %record.name,
                    source = %snapshot_name,
                    stage = "controller_revision",
                    error = %e,
                    "Failed to get historical snapshot, skipping"
                );
                return None;
            }
        };

        match snapshot.decode_application() {
            Ok(app) => Some((app, snapshot_name)),
            Err(e) => {
                warn!(
                    app = %live_name,
                    workflow = %record.workflow_name,
                    record = %record.name,
                    source = %snapshot_name,
                    stage = "decode",
                    error = %e,
                    "Failed to decode historical snapshot, skipping"
                );
                None
            }
        }
    }

    /// Write the status observed on `app` onto one record and its revision.
    ///
    /// The finished flag is flipped last, so a partial write keeps the record
    /// in the next sweep.
    ///
    /// The record is located by the application annotation plus
    /// `workflow_name`/`record_name`. An object without a workflow status
    /// leaves both untouched.
    pub async fn sync_workflow_status(
        &self,
        app: &ApplicationObject,
        workflow_name: &str,
        record_name: &str,
        source: &str,
    ) -> Result<()> {
        let app_key = app
            .annotation(ANNOTATION_APP_NAME)
            .ok_or(WorkflowError::MissingAnnotation(ANNOTATION_APP_NAME))?;

        let mut record = self
            .store
            .get_record(app_key, workflow_name, record_name)
            .await
            .map_err(|e| WorkflowError::or_not_found(e, WorkflowError::WorkflowRecordNotExist))?;

        let mut revision = self
            .store
            .get_revision(app_key, &record.revision_primary_key)
            .await
            .map_err(|e| {
                WorkflowError::or_not_found(e, WorkflowError::ApplicationRevisionNotExist)
            })?;

        let Some(status) = app.status.workflow.as_ref() else {
            debug!(
                app = %app_key,
                workflow = %workflow_name,
                record = %record_name,
                source = %source,
                "No workflow status on application"
            );
            return Ok(());
        };

        let summary = summary_status(status);
        record.status = summary;
        record.steps = status.steps.clone();
        self.store.put_record(&mut record).await?;

        revision.status = summary;
        self.store.put_revision(&mut revision).await?;

        // The record leaves the sweep only once its revision mirror is written.
        let finished = FinishedFlag::from(status.finished);
        if record.finished != finished {
            record.finished = finished;
            self.store.put_record(&mut record).await?;
        }

        if summary == RecordStatus::Complete {
            info!(
                app = %app_key,
                workflow = %workflow_name,
                record = %record_name,
                source = %source,
                "Successfully synced workflow status"
            );
        }
        Ok(())
    }
}
