//! Control operations on a workflow execution: resume, terminate, rollback.
//!
//! Each operation re-reads the live application object and refuses to act
//! while its execution is running. Resume and terminate patch the status
//! and immediately re-sync the record. Rollback re-applies an archived
//! revision as a new execution, deleting the new record again if the apply
//! fails.

use std::sync::Arc;

use tracing::{error, info};

use super::sync::WorkflowSynchronizer;
use super::workflow::new_workflow_record;
use crate::error::{Result, WorkflowError};
use crate::interfaces::{Applicator, OrchestratorClient};
use crate::model::entity::SORT_CREATE_TIME;
use crate::model::{Application, ListOptions, RecordStatus, SortOption, Workflow};
use crate::orchestrator::{
    convert_app_name, ApplicationObject, WorkflowStatus, ANNOTATION_DEPLOY_VERSION,
    ANNOTATION_PUBLISH_VERSION,
};
use crate::store::RecordStore;
use crate::utils::version::generate_version;

/// Resume, terminate and rollback of workflow executions.
#[derive(Clone)]
pub struct WorkflowControl {
    store: RecordStore,
    orchestrator: Arc<dyn OrchestratorClient>,
    applicator: Arc<dyn Applicator>,
    synchronizer: WorkflowSynchronizer,
}

impl WorkflowControl {
    pub fn new(
        store: RecordStore,
        orchestrator: Arc<dyn OrchestratorClient>,
        applicator: Arc<dyn Applicator>,
    ) -> Self {
        let synchronizer = WorkflowSynchronizer::new(store.clone(), orchestrator.clone());
        Self {
            store,
            orchestrator,
            applicator,
            synchronizer,
        }
    }

    /// Fetch the live object of `app` in `env_name`, failing if its
    /// execution is running. An object without workflow status passes.
    pub async fn check_record_running(
        &self,
        app: &Application,
        env_name: &str,
    ) -> Result<ApplicationObject> {
        let mut live = self
            .orchestrator
            .get_application(&app.namespace, &convert_app_name(&app.name, env_name))
            .await?;
        if live
            .status
            .workflow
            .as_ref()
            .is_some_and(WorkflowStatus::is_running)
        {
            return Err(WorkflowError::WorkflowStillRunning);
        }
        live.ensure_type_meta();
        Ok(live)
    }

    /// Clear the suspend flag of a paused execution.
    pub async fn resume_record(
        &self,
        app: &Application,
        workflow: &Workflow,
        record_name: &str,
    ) -> Result<()> {
        self.patch_control_flags(app, workflow, record_name, |status| {
            status.suspend = false
        })
        .await
    }

    /// Mark an execution terminated.
    pub async fn terminate_record(
        &self,
        app: &Application,
        workflow: &Workflow,
        record_name: &str,
    ) -> Result<()> {
        self.patch_control_flags(app, workflow, record_name, |status| {
            status.terminated = true
        })
        .await
    }

    async fn patch_control_flags(
        &self,
        app: &Application,
        workflow: &Workflow,
        record_name: &str,
        mutate: impl FnOnce(&mut WorkflowStatus),
    ) -> Result<()> {
        let mut live = self.check_record_running(app, &workflow.env_name).await?;
        let status = live
            .status
            .workflow
            .as_mut()
            .ok_or(WorkflowError::WorkflowStatusMissing)?;
        mutate(status);

        self.orchestrator.patch_application_status(&live).await?;
        self.synchronizer
            .sync_workflow_status(&live, &workflow.name, record_name, live.name())
            .await
    }

    /// Re-apply an archived revision as a new execution.
    ///
    /// Without `revision_version`, the most recently created complete
    /// revision of the application is used. Returns the new record name.
    pub async fn rollback_record(
        &self,
        app: &Application,
        workflow: &Workflow,
        record_name: &str,
        revision_version: Option<&str>,
    ) -> Result<String> {
        let revision_version = match revision_version.filter(|v| !v.is_empty()) {
            Some(version) => version.to_string(),
            None => self.latest_complete_revision(app).await?,
        };

        let record = self
            .store
            .get_record(app.primary_key(), &workflow.name, record_name)
            .await
            .map_err(|e| WorkflowError::or_not_found(e, WorkflowError::WorkflowRecordNotExist))?;

        let mut live = self.check_record_running(app, &workflow.env_name).await?;

        let revision = self
            .store
            .get_revision(app.primary_key(), &revision_version)
            .await
            .map_err(|e| {
                WorkflowError::or_not_found(e, WorkflowError::ApplicationRevisionNotExist)
            })?;
        let archived: ApplicationObject = serde_yaml::from_str(&revision.apply_app_config)
            .map_err(|e| WorkflowError::InvalidRevisionConfig(e.to_string()))?;

        live.spec.components = archived.spec.components;
        live.spec.policies = archived.spec.policies;
        let new_record_name = generate_version(&record.workflow_name);
        live.metadata
            .annotations
            .insert(ANNOTATION_DEPLOY_VERSION.to_string(), revision_version.clone());
        live.metadata
            .annotations
            .insert(ANNOTATION_PUBLISH_VERSION.to_string(), new_record_name.clone());

        let mut new_record = new_workflow_record(app, &live, workflow)?;
        self.store.add_record(&mut new_record).await?;

        if let Err(e) = self.applicator.apply(&live).await {
            if let Err(cleanup) = self.store.delete_record(&new_record).await {
                error!(
                    app = %app.primary_key(),
                    workflow = %workflow.name,
                    record = %new_record_name,
                    error = %cleanup,
                    "Failed to delete record after failed rollback"
                );
            }
            return Err(e.into());
        }

        info!(
            app = %app.primary_key(),
            workflow = %workflow.name,
            record = %new_record_name,
            revision = %revision_version,
            "Rolled back workflow"
        );
        Ok(new_record_name)
    }

    async fn latest_complete_revision(&self, app: &Application) -> Result<String> {
        let options = ListOptions::paged(1, 1).sorted_by(SortOption::descending(SORT_CREATE_TIME));
        self.store
            .list_revisions_with_status(app.primary_key(), RecordStatus::Complete, &options)
            .await?
            .into_iter()
            .next()
            .map(|revision| revision.version)
            .ok_or(WorkflowError::NoReadyRevision)
    }
}
