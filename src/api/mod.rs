//! API-facing view models and the conversion layer.
//!
//! Views are what a transport layer would serialize. Conversions live in
//! [`convert`] and never touch storage or the orchestrator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{RecordStatus, StepInput, StepOutput};
use crate::orchestrator::StepStatus;

pub mod convert;

pub use convert::{convert_from_record_model, convert_workflow_base, steps_from_requests};

/// A workflow step as shown to API clients; properties rendered as JSON text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowStepView {
    pub name: String,
    #[serde(rename = "type")]
    pub step_type: String,
    #[serde(default)]
    pub alias: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub inputs: Vec<StepInput>,
    #[serde(default)]
    pub outputs: Vec<StepOutput>,
    #[serde(default)]
    pub depends_on: Vec<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub properties: String,
}

/// Summary of one workflow.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowBase {
    pub name: String,
    pub alias: String,
    pub description: String,
    pub default: bool,
    pub env_name: String,
    pub create_time: DateTime<Utc>,
    pub update_time: DateTime<Utc>,
    pub steps: Vec<WorkflowStepView>,
}

/// Full detail of one workflow.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailWorkflowResponse {
    #[serde(flatten)]
    pub base: WorkflowBase,
}

/// A step as submitted by API clients; `properties` is unparsed JSON text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowStepRequest {
    pub name: String,
    #[serde(rename = "type")]
    pub step_type: String,
    #[serde(default)]
    pub alias: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub inputs: Vec<StepInput>,
    #[serde(default)]
    pub outputs: Vec<StepOutput>,
    #[serde(default)]
    pub depends_on: Vec<String>,
    #[serde(default)]
    pub properties: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateWorkflowRequest {
    pub name: String,
    #[serde(default)]
    pub alias: String,
    #[serde(default)]
    pub description: String,
    pub env_name: String,
    #[serde(default)]
    pub default: bool,
    #[serde(default)]
    pub steps: Vec<WorkflowStepRequest>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateWorkflowRequest {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub default: bool,
    #[serde(default)]
    pub steps: Vec<WorkflowStepRequest>,
}

/// One execution as shown to API clients.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowRecordView {
    pub name: String,
    pub namespace: String,
    pub workflow_name: String,
    pub start_time: DateTime<Utc>,
    pub status: RecordStatus,
    pub steps: Vec<StepStatus>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListWorkflowRecordsResponse {
    pub records: Vec<WorkflowRecordView>,
    /// Count of all records of the workflow, ignoring pagination.
    pub total: u64,
}

/// An execution plus deploy metadata from its revision.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailWorkflowRecordResponse {
    #[serde(flatten)]
    pub record: WorkflowRecordView,
    pub deploy_time: DateTime<Utc>,
    pub deploy_user: String,
    pub note: String,
    pub trigger_type: String,
}
