//! Workflow execution records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::entity::{
    BaseModel, Entity, Index, INDEX_APP_PRIMARY_KEY, INDEX_FINISHED, INDEX_NAME, INDEX_NAMESPACE,
    INDEX_REVISION_PRIMARY_KEY, INDEX_STATUS, INDEX_WORKFLOW_NAME,
};
use crate::orchestrator::StepStatus;

/// Summary status of one execution, mirrored onto its revision.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordStatus {
    #[default]
    #[serde(rename = "initing")]
    Initializing,
    Running,
    Complete,
    Terminated,
}

impl RecordStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordStatus::Initializing => "initing",
            RecordStatus::Running => "running",
            RecordStatus::Complete => "complete",
            RecordStatus::Terminated => "terminated",
        }
    }
}

impl std::fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Three-state finished marker, persisted as the strings `"true"`/`"false"`
/// or left out entirely.
///
/// Repository filters match on the string form, so an unset flag is not the
/// same as `False`: sweeps select `finished == "false"` only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum FinishedFlag {
    #[default]
    Unset,
    True,
    False,
}

impl FinishedFlag {
    pub fn as_index_value(&self) -> Option<&'static str> {
        match self {
            FinishedFlag::Unset => None,
            FinishedFlag::True => Some("true"),
            FinishedFlag::False => Some("false"),
        }
    }

    pub fn is_unset(&self) -> bool {
        matches!(self, FinishedFlag::Unset)
    }
}

impl From<bool> for FinishedFlag {
    fn from(finished: bool) -> Self {
        if finished {
            FinishedFlag::True
        } else {
            FinishedFlag::False
        }
    }
}

impl Serialize for FinishedFlag {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.as_index_value() {
            Some(value) => serializer.serialize_str(value),
            None => serializer.serialize_none(),
        }
    }
}

impl<'de> Deserialize<'de> for FinishedFlag {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        match raw.as_deref() {
            None | Some("") => Ok(FinishedFlag::Unset),
            Some("true") => Ok(FinishedFlag::True),
            Some("false") => Ok(FinishedFlag::False),
            Some(other) => Err(serde::de::Error::custom(format!(
                "invalid finished flag: {}",
                other
            ))),
        }
    }
}

/// One execution instance of a workflow.
///
/// Status fields are written by the synchronizer only.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowRecord {
    #[serde(flatten)]
    pub base: BaseModel,
    pub app_primary_key: String,
    pub workflow_name: String,
    /// Version token distinguishing this execution.
    pub name: String,
    /// Version of the [`super::ApplicationRevision`] this execution applies.
    pub revision_primary_key: String,
    pub namespace: String,
    pub start_time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "FinishedFlag::is_unset")]
    pub finished: FinishedFlag,
    #[serde(default)]
    pub status: RecordStatus,
    #[serde(default)]
    pub steps: Vec<StepStatus>,
}

impl WorkflowRecord {
    /// Primary key for a record of `workflow_name` under `app_primary_key`.
    pub fn key(app_primary_key: &str, workflow_name: &str, name: &str) -> String {
        format!("{}/{}/{}", app_primary_key, workflow_name, name)
    }
}

impl Entity for WorkflowRecord {
    const KIND: &'static str = "workflow_record";

    fn primary_key(&self) -> String {
        Self::key(&self.app_primary_key, &self.workflow_name, &self.name)
    }

    fn index(&self) -> Index {
        let mut index = Index::new();
        if !self.app_primary_key.is_empty() {
            index.insert(INDEX_APP_PRIMARY_KEY, self.app_primary_key.clone());
        }
        if !self.workflow_name.is_empty() {
            index.insert(INDEX_WORKFLOW_NAME, self.workflow_name.clone());
        }
        if !self.name.is_empty() {
            index.insert(INDEX_NAME, self.name.clone());
        }
        if !self.revision_primary_key.is_empty() {
            index.insert(INDEX_REVISION_PRIMARY_KEY, self.revision_primary_key.clone());
        }
        if !self.namespace.is_empty() {
            index.insert(INDEX_NAMESPACE, self.namespace.clone());
        }
        if let Some(finished) = self.finished.as_index_value() {
            index.insert(INDEX_FINISHED, finished.to_string());
        }
        index.insert(INDEX_STATUS, self.status.as_str().to_string());
        index
    }

    fn base(&self) -> &BaseModel {
        &self.base
    }

    fn base_mut(&mut self) -> &mut BaseModel {
        &mut self.base
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finished_flag_serializes_as_string_sentinel() {
        let record = WorkflowRecord {
            name: "deploy-1".to_string(),
            finished: FinishedFlag::False,
            ..Default::default()
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["finished"], "false");

        let decoded: WorkflowRecord = serde_json::from_value(json).unwrap();
        assert_eq!(decoded.finished, FinishedFlag::False);
    }

    #[test]
    fn test_unset_finished_flag_is_omitted() {
        let record = WorkflowRecord::default();
        let json = serde_json::to_value(&record).unwrap();
        assert!(json.get("finished").is_none());
        assert!(!record.index().contains_key(INDEX_FINISHED));

        let decoded: WorkflowRecord = serde_json::from_value(json).unwrap();
        assert!(decoded.finished.is_unset());
    }

    #[test]
    fn test_finished_flag_rejects_unknown_value() {
        let result: Result<FinishedFlag, _> = serde_json::from_str(r#""maybe""#);
        assert!(result.is_err());
    }

    #[test]
    fn test_record_status_wire_names() {
        assert_eq!(
            serde_json::to_string(&RecordStatus::Initializing).unwrap(),
            r#""initing""#
        );
        assert_eq!(
            serde_json::to_string(&RecordStatus::Terminated).unwrap(),
            r#""terminated""#
        );
    }
}
