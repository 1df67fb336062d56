//! Immutable snapshots of applied application specs.

use serde::{Deserialize, Serialize};

use super::entity::{
    BaseModel, Entity, Index, INDEX_APP_PRIMARY_KEY, INDEX_ENV_NAME, INDEX_STATUS,
    INDEX_TRIGGER_TYPE, INDEX_VERSION, INDEX_WORKFLOW_NAME,
};
use super::record::RecordStatus;

/// The exact spec applied for one execution.
///
/// Only `status` changes after creation; it mirrors the summary status of
/// the record that references this revision.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationRevision {
    #[serde(flatten)]
    pub base: BaseModel,
    pub app_primary_key: String,
    pub version: String,
    /// Serialized live application object (YAML or JSON).
    pub apply_app_config: String,
    #[serde(default)]
    pub status: RecordStatus,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub deploy_user: String,
    #[serde(default)]
    pub note: String,
    #[serde(default)]
    pub trigger_type: String,
    #[serde(default)]
    pub workflow_name: String,
    #[serde(default)]
    pub env_name: String,
}

impl ApplicationRevision {
    pub fn key(app_primary_key: &str, version: &str) -> String {
        format!("{}/{}", app_primary_key, version)
    }
}

impl Entity for ApplicationRevision {
    const KIND: &'static str = "application_revision";

    fn primary_key(&self) -> String {
        Self::key(&self.app_primary_key, &self.version)
    }

    fn index(&self) -> Index {
        let mut index = Index::new();
        if !self.app_primary_key.is_empty() {
            index.insert(INDEX_APP_PRIMARY_KEY, self.app_primary_key.clone());
        }
        if !self.version.is_empty() {
            index.insert(INDEX_VERSION, self.version.clone());
        }
        if !self.workflow_name.is_empty() {
            index.insert(INDEX_WORKFLOW_NAME, self.workflow_name.clone());
        }
        if !self.env_name.is_empty() {
            index.insert(INDEX_ENV_NAME, self.env_name.clone());
        }
        if !self.trigger_type.is_empty() {
            index.insert(INDEX_TRIGGER_TYPE, self.trigger_type.clone());
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
