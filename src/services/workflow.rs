//! Workflow CRUD, record queries and record creation.

use chrono::Utc;
use tracing::{error, info};

use crate::api::{
    convert_from_record_model, convert_workflow_base, steps_from_requests, CreateWorkflowRequest,
    DetailWorkflowRecordResponse, DetailWorkflowResponse, ListWorkflowRecordsResponse,
    UpdateWorkflowRequest, WorkflowBase,
};
use crate::error::{Result, WorkflowError};
use crate::model::entity::INDEX_DEFAULT;
use crate::model::{
    Application, FinishedFlag, Index, ListOptions, RecordStatus, Workflow, WorkflowRecord,
};
use crate::orchestrator::{ApplicationObject, ANNOTATION_DEPLOY_VERSION, ANNOTATION_PUBLISH_VERSION};
use crate::store::{CascadeReport, RecordStore};

/// Build the record for a new execution of `workflow` started by `live`.
///
/// The live object must carry the publish version (record name) and the
/// deploy version (revision pointer).
pub(crate) fn new_workflow_record(
    app: &Application,
    live: &ApplicationObject,
    workflow: &Workflow,
) -> Result<WorkflowRecord> {
    if live.metadata.annotations.is_empty() {
        return Err(WorkflowError::MissingAnnotations);
    }
    let name = live
        .annotation(ANNOTATION_PUBLISH_VERSION)
        .filter(|v| !v.is_empty())
        .ok_or(WorkflowError::MissingAnnotation(ANNOTATION_PUBLISH_VERSION))?;
    let revision = live
        .annotation(ANNOTATION_DEPLOY_VERSION)
        .filter(|v| !v.is_empty())
        .ok_or(WorkflowError::MissingAnnotation(ANNOTATION_DEPLOY_VERSION))?;

    Ok(WorkflowRecord {
        app_primary_key: app.primary_key().to_string(),
        workflow_name: workflow.name.clone(),
        name: name.to_string(),
        revision_primary_key: revision.to_string(),
        namespace: app.namespace.clone(),
        start_time: Utc::now(),
        finished: FinishedFlag::False,
        status: RecordStatus::Initializing,
        ..Default::default()
    })
}

/// Workflow definitions and their execution history.
#[derive(Clone)]
pub struct WorkflowService {
    store: RecordStore,
}

impl WorkflowService {
    pub fn new(store: RecordStore) -> Self {
        Self { store }
    }

    pub async fn list_application_workflows(&self, app: &Application) -> Result<Vec<WorkflowBase>> {
        let workflows = self.store.list_workflows(app.primary_key()).await?;
        Ok(workflows.iter().map(convert_workflow_base).collect())
    }

    pub async fn get_workflow(&self, app: &Application, name: &str) -> Result<Workflow> {
        self.store
            .get_workflow(app.primary_key(), name)
            .await
            .map_err(|e| WorkflowError::or_not_found(e, WorkflowError::WorkflowNotExist))
    }

    pub fn detail_workflow(&self, workflow: &Workflow) -> DetailWorkflowResponse {
        DetailWorkflowResponse::from(workflow)
    }

    /// First workflow marked default, in repository order.
    pub async fn get_application_default_workflow(&self, app: &Application) -> Result<Workflow> {
        let mut filter = Index::new();
        filter.insert(INDEX_DEFAULT, true.to_string());
        self.store
            .list_workflows_where(app.primary_key(), filter)
            .await?
            .into_iter()
            .next()
            .ok_or(WorkflowError::WorkflowNoDefault)
    }

    /// Number of workflows of `app`. Repository failures count as zero.
    pub async fn count_workflow(&self, app: &Application) -> u64 {
        match self.store.count_workflows(app.primary_key()).await {
            Ok(count) => count,
            Err(e) => {
                error!(app = %app.primary_key(), error = %e, "Failed to count workflows");
                0
            }
        }
    }

    /// Create the workflow, or replace steps and metadata of the existing
    /// one with the same name.
    pub async fn create_or_update_workflow(
        &self,
        app: &Application,
        req: CreateWorkflowRequest,
    ) -> Result<DetailWorkflowResponse> {
        if req.env_name.is_empty() {
            return Err(WorkflowError::WorkflowNoEnv);
        }
        let steps = steps_from_requests(&req.steps).map_err(WorkflowError::InvalidProperties)?;

        match self.store.get_workflow(app.primary_key(), &req.name).await {
            Ok(mut workflow) => {
                workflow.steps = steps;
                workflow.alias = req.alias;
                workflow.description = req.description;
                workflow.default = Some(req.default);
                self.store.put_workflow(&mut workflow).await?;
                Ok(DetailWorkflowResponse::from(&workflow))
            }
            Err(e) if e.is_not_found() => {
                let mut workflow = Workflow {
                    name: req.name,
                    alias: req.alias,
                    description: req.description,
                    steps,
                    default: Some(req.default),
                    env_name: req.env_name,
                    app_primary_key: app.primary_key().to_string(),
                    ..Default::default()
                };
                self.store.add_workflow(&mut workflow).await?;
                info!(
                    app = %app.primary_key(),
                    workflow = %workflow.name,
                    env = %workflow.env_name,
                    "Created workflow"
                );
                Ok(DetailWorkflowResponse::from(&workflow))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Replace steps, description and default flag. Alias and environment
    /// are kept.
    pub async fn update_workflow(
        &self,
        workflow: &Workflow,
        req: UpdateWorkflowRequest,
    ) -> Result<DetailWorkflowResponse> {
        let steps = steps_from_requests(&req.steps).map_err(WorkflowError::InvalidProperties)?;

        let mut workflow = workflow.clone();
        workflow.steps = steps;
        workflow.description = req.description;
        workflow.default = Some(req.default);
        self.store
            .put_workflow(&mut workflow)
            .await
            .map_err(|e| WorkflowError::or_not_found(e, WorkflowError::WorkflowNotExist))?;
        Ok(DetailWorkflowResponse::from(&workflow))
    }

    /// Delete a workflow and, best effort, its records.
    pub async fn delete_workflow(
        &self,
        app: &Application,
        workflow_name: &str,
    ) -> Result<CascadeReport> {
        self.store
            .delete_workflow(app.primary_key(), workflow_name)
            .await
            .map_err(|e| WorkflowError::or_not_found(e, WorkflowError::WorkflowNotExist))
    }

    /// Delete every workflow of `app`, best effort.
    pub async fn delete_workflow_by_app(&self, app: &Application) -> Result<CascadeReport> {
        Ok(self.store.delete_workflows_by_app(app.primary_key()).await?)
    }

    /// One page of a workflow's records plus the unpaged total.
    pub async fn list_workflow_records(
        &self,
        workflow: &Workflow,
        page: usize,
        page_size: usize,
    ) -> Result<ListWorkflowRecordsResponse> {
        let records = self
            .store
            .list_workflow_records(
                &workflow.app_primary_key,
                &workflow.name,
                &ListOptions::paged(page, page_size),
            )
            .await?;
        let total = self
            .store
            .count_workflow_records(&workflow.app_primary_key, &workflow.name)
            .await?;

        Ok(ListWorkflowRecordsResponse {
            records: records.iter().map(convert_from_record_model).collect(),
            total,
        })
    }

    /// A record with the deploy metadata of the revision it applies.
    pub async fn detail_workflow_record(
        &self,
        workflow: &Workflow,
        record_name: &str,
    ) -> Result<DetailWorkflowRecordResponse> {
        let record = self
            .store
            .get_record(&workflow.app_primary_key, &workflow.name, record_name)
            .await
            .map_err(|e| WorkflowError::or_not_found(e, WorkflowError::WorkflowRecordNotExist))?;

        let revision = self
            .store
            .get_revision(&record.app_primary_key, &record.revision_primary_key)
            .await
            .map_err(|e| {
                WorkflowError::or_not_found(e, WorkflowError::ApplicationRevisionNotExist)
            })?;

        Ok(DetailWorkflowRecordResponse {
            record: convert_from_record_model(&record),
            deploy_time: revision.base.create_time,
            deploy_user: revision.deploy_user,
            note: revision.note,
            trigger_type: revision.trigger_type,
        })
    }

    /// Persist the record for an execution the live object has just started.
    pub async fn create_workflow_record(
        &self,
        app: &Application,
        live: &ApplicationObject,
        workflow: &Workflow,
    ) -> Result<WorkflowRecord> {
        let mut record = new_workflow_record(app, live, workflow)?;
        self.store.add_record(&mut record).await?;
        Ok(record)
    }
}
