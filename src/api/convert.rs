//! Pure conversions between persisted entities and views.

use super::{
    DetailWorkflowResponse, WorkflowBase, WorkflowRecordView, WorkflowStepRequest,
    WorkflowStepView,
};
use crate::model::{parse_properties, Workflow, WorkflowRecord, WorkflowStep};

impl From<&Workflow> for DetailWorkflowResponse {
    fn from(workflow: &Workflow) -> Self {
        Self {
            base: convert_workflow_base(workflow),
        }
    }
}

fn convert_step(step: &WorkflowStep) -> WorkflowStepView {
    WorkflowStepView {
        name: step.name.clone(),
        step_type: step.step_type.clone(),
        alias: step.alias.clone(),
        description: step.description.clone(),
        inputs: step.inputs.clone(),
        outputs: step.outputs.clone(),
        depends_on: step.depends_on.clone(),
        properties: step
            .properties
            .as_ref()
            .map(|props| serde_json::Value::Object(props.clone()).to_string())
            .unwrap_or_default(),
    }
}

pub fn convert_workflow_base(workflow: &Workflow) -> WorkflowBase {
    WorkflowBase {
        name: workflow.name.clone(),
        alias: workflow.alias.clone(),
        description: workflow.description.clone(),
        default: workflow.is_default(),
        env_name: workflow.env_name.clone(),
        create_time: workflow.base.create_time,
        update_time: workflow.base.update_time,
        steps: workflow.steps.iter().map(convert_step).collect(),
    }
}

pub fn convert_from_record_model(record: &WorkflowRecord) -> WorkflowRecordView {
    WorkflowRecordView {
        name: record.name.clone(),
        namespace: record.namespace.clone(),
        workflow_name: record.workflow_name.clone(),
        start_time: record.start_time,
        status: record.status,
        steps: record.steps.clone(),
    }
}

/// Build model steps from requests, parsing every properties document.
///
/// The first malformed document fails the whole conversion.
pub fn steps_from_requests(
    requests: &[WorkflowStepRequest],
) -> Result<Vec<WorkflowStep>, serde_json::Error> {
    requests
        .iter()
        .map(|req| {
            Ok(WorkflowStep {
                name: req.name.clone(),
                step_type: req.step_type.clone(),
                alias: req.alias.clone(),
                description: req.description.clone(),
                inputs: req.inputs.clone(),
                outputs: req.outputs.clone(),
                depends_on: req.depends_on.clone(),
                properties: parse_properties(&req.properties)?,
            })
        })
        .collect()
}
