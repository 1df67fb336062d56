//! Record store: typed access to workflows, records and revisions.
//!
//! Thin wrapper over the three repositories that knows each kind's key
//! layout and owner filters, plus the best-effort cascade deletes.

use tracing::{error, info, warn};

use crate::interfaces::repository::{Result, StorageError};
use crate::model::entity::{INDEX_APP_PRIMARY_KEY, INDEX_STATUS, INDEX_WORKFLOW_NAME};
use crate::model::{
    ApplicationRevision, Entity, Index, ListOptions, RecordStatus, Workflow,
    WorkflowRecord,
};
use crate::storage::Repositories;

/// Outcome of a best-effort cascade delete.
///
/// Failures are collected rather than aborting, so a partial cascade is a
/// normal terminal state.
#[derive(Debug, Default)]
pub struct CascadeReport {
    /// Primary keys removed, dependents first.
    pub deleted: Vec<String>,
    /// Primary keys that could not be removed, with the cause.
    pub failures: Vec<(String, StorageError)>,
}

impl CascadeReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    fn merge(&mut self, other: CascadeReport) {
        self.deleted.extend(other.deleted);
        self.failures.extend(other.failures);
    }
}

fn app_filter(app_primary_key: &str) -> Index {
    let mut filter = Index::new();
    filter.insert(INDEX_APP_PRIMARY_KEY, app_primary_key.to_string());
    filter
}

fn workflow_filter(app_primary_key: &str, workflow_name: &str) -> Index {
    let mut filter = app_filter(app_primary_key);
    filter.insert(INDEX_WORKFLOW_NAME, workflow_name.to_string());
    filter
}

/// Typed record store over a set of [`Repositories`].
#[derive(Clone)]
pub struct RecordStore {
    repos: Repositories,
}

impl RecordStore {
    pub fn new(repos: Repositories) -> Self {
        Self { repos }
    }

    // Workflows

    pub async fn get_workflow(&self, app_primary_key: &str, name: &str) -> Result<Workflow> {
        self.repos
            .workflows
            .get(&Workflow::key(app_primary_key, name))
            .await
    }

    pub async fn list_workflows(&self, app_primary_key: &str) -> Result<Vec<Workflow>> {
        self.repos
            .workflows
            .list(&app_filter(app_primary_key), &ListOptions::default())
            .await
    }

    /// Workflows of an application matching `filter` on top of the owner.
    pub async fn list_workflows_where(
        &self,
        app_primary_key: &str,
        mut filter: Index,
    ) -> Result<Vec<Workflow>> {
        filter.insert(INDEX_APP_PRIMARY_KEY, app_primary_key.to_string());
        self.repos
            .workflows
            .list(&filter, &ListOptions::default())
            .await
    }

    pub async fn count_workflows(&self, app_primary_key: &str) -> Result<u64> {
        self.repos
            .workflows
            .count(&app_filter(app_primary_key), None)
            .await
    }

    pub async fn add_workflow(&self, workflow: &mut Workflow) -> Result<()> {
        self.repos.workflows.add(workflow).await
    }

    pub async fn put_workflow(&self, workflow: &mut Workflow) -> Result<()> {
        self.repos.workflows.put(workflow).await
    }

    // Records

    pub async fn get_record(
        &self,
        app_primary_key: &str,
        workflow_name: &str,
        name: &str,
    ) -> Result<WorkflowRecord> {
        self.repos
            .records
            .get(&WorkflowRecord::key(app_primary_key, workflow_name, name))
            .await
    }

    pub async fn list_records(
        &self,
        filter: &Index,
        options: &ListOptions,
    ) -> Result<Vec<WorkflowRecord>> {
        self.repos.records.list(filter, options).await
    }

    /// Records of one workflow, paged.
    pub async fn list_workflow_records(
        &self,
        app_primary_key: &str,
        workflow_name: &str,
        options: &ListOptions,
    ) -> Result<Vec<WorkflowRecord>> {
        self.repos
            .records
            .list(&workflow_filter(app_primary_key, workflow_name), options)
            .await
    }

    pub async fn count_workflow_records(
        &self,
        app_primary_key: &str,
        workflow_name: &str,
    ) -> Result<u64> {
        self.repos
            .records
            .count(&workflow_filter(app_primary_key, workflow_name), None)
            .await
    }

    pub async fn add_record(&self, record: &mut WorkflowRecord) -> Result<()> {
        self.repos.records.add(record).await
    }

    pub async fn put_record(&self, record: &mut WorkflowRecord) -> Result<()> {
        self.repos.records.put(record).await
    }

    pub async fn delete_record(&self, record: &WorkflowRecord) -> Result<()> {
        self.repos.records.delete(&record.primary_key()).await
    }

    // Revisions

    pub async fn get_revision(
        &self,
        app_primary_key: &str,
        version: &str,
    ) -> Result<ApplicationRevision> {
        self.repos
            .revisions
            .get(&ApplicationRevision::key(app_primary_key, version))
            .await
    }

    /// Revisions of an application in `status`, ordered and paged by `options`.
    pub async fn list_revisions_with_status(
        &self,
        app_primary_key: &str,
        status: RecordStatus,
        options: &ListOptions,
    ) -> Result<Vec<ApplicationRevision>> {
        let mut filter = app_filter(app_primary_key);
        filter.insert(INDEX_STATUS, status.as_str().to_string());
        self.repos.revisions.list(&filter, options).await
    }

    pub async fn add_revision(&self, revision: &mut ApplicationRevision) -> Result<()> {
        self.repos.revisions.add(revision).await
    }

    pub async fn put_revision(&self, revision: &mut ApplicationRevision) -> Result<()> {
        self.repos.revisions.put(revision).await
    }

    // Cascades

    /// Delete a workflow after its records, best effort.
    ///
    /// Record listing and record deletion failures are logged and reported;
    /// only failure to delete the workflow itself is returned as an error.
    pub async fn delete_workflow(
        &self,
        app_primary_key: &str,
        workflow_name: &str,
    ) -> Result<CascadeReport> {
        let mut report = CascadeReport::default();

        match self
            .list_workflow_records(app_primary_key, workflow_name, &ListOptions::default())
            .await
        {
            Ok(records) => {
                for record in records {
                    let key = record.primary_key();
                    match self.repos.records.delete(&key).await {
                        Ok(()) => report.deleted.push(key),
                        Err(e) => {
                            error!(
                                app = %app_primary_key,
                                workflow = %workflow_name,
                                record = %record.name,
                                error = %e,
                                "Failed to delete workflow record"
                            );
                            report.failures.push((key, e));
                        }
                    }
                }
            }
            Err(e) => {
                error!(
                    app = %app_primary_key,
                    workflow = %workflow_name,
                    error = %e,
                    "Failed to list workflow records"
                );
            }
        }

        let key = Workflow::key(app_primary_key, workflow_name);
        self.repos.workflows.delete(&key).await?;
        report.deleted.push(key);

        info!(
            app = %app_primary_key,
            workflow = %workflow_name,
            deleted = report.deleted.len(),
            failed = report.failures.len(),
            "Deleted workflow"
        );
        Ok(report)
    }

    /// Delete every workflow of an application, best effort.
    ///
    /// An application without workflows is a no-op.
    pub async fn delete_workflows_by_app(&self, app_primary_key: &str) -> Result<CascadeReport> {
        let workflows = match self.list_workflows(app_primary_key).await {
            Ok(workflows) => workflows,
            Err(e) if e.is_not_found() => return Ok(CascadeReport::default()),
            Err(e) => return Err(e),
        };

        let mut report = CascadeReport::default();
        for workflow in workflows {
            match self.delete_workflow(app_primary_key, &workflow.name).await {
                Ok(cascade) => report.merge(cascade),
                Err(e) => {
                    warn!(
                        app = %app_primary_key,
                        workflow = %workflow.name,
                        error = %e,
                        "Failed to delete workflow"
                    );
                    report.failures.push((workflow.primary_key(), e));
                }
            }
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests;
