//! Workflow definitions bound to one deployment environment.

use serde::{Deserialize, Serialize};

use super::entity::{
    BaseModel, Entity, Index, INDEX_APP_PRIMARY_KEY, INDEX_DEFAULT, INDEX_ENV_NAME, INDEX_NAME,
};

/// Free-form JSON object document.
pub type JsonStruct = serde_json::Map<String, serde_json::Value>;

/// Parse a step properties document from its textual form.
///
/// Empty text means "no properties".
pub fn parse_properties(text: &str) -> Result<Option<JsonStruct>, serde_json::Error> {
    if text.trim().is_empty() {
        return Ok(None);
    }
    serde_json::from_str(text).map(Some)
}

/// A value a step consumes from an earlier step's output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepInput {
    pub from: String,
    pub parameter_key: String,
}

/// A value a step publishes for later steps.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepOutput {
    pub name: String,
    pub value_from: String,
}

/// One step of a workflow pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowStep {
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
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<JsonStruct>,
}

/// A named pipeline of steps owned by an application.
///
/// Several workflows of one application may carry `default = Some(true)`;
/// uniqueness is left to consumers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workflow {
    #[serde(flatten)]
    pub base: BaseModel,
    pub name: String,
    #[serde(default)]
    pub alias: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub steps: Vec<WorkflowStep>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<bool>,
    pub env_name: String,
    pub app_primary_key: String,
}

impl Workflow {
    /// Primary key for a workflow of `app_primary_key`.
    pub fn key(app_primary_key: &str, name: &str) -> String {
        format!("{}/{}", app_primary_key, name)
    }

    /// Whether this workflow is marked default. Unset counts as `false`.
    pub fn is_default(&self) -> bool {
        self.default.unwrap_or(false)
    }
}

impl Entity for Workflow {
    const KIND: &'static str = "workflow";

    fn primary_key(&self) -> String {
        Self::key(&self.app_primary_key, &self.name)
    }

    fn index(&self) -> Index {
        let mut index = Index::new();
        if !self.app_primary_key.is_empty() {
            index.insert(INDEX_APP_PRIMARY_KEY, self.app_primary_key.clone());
        }
        if !self.name.is_empty() {
            index.insert(INDEX_NAME, self.name.clone());
        }
        if !self.env_name.is_empty() {
            index.insert(INDEX_ENV_NAME, self.env_name.clone());
        }
        if let Some(default) = self.default {
            index.insert(INDEX_DEFAULT, default.to_string());
        }
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
    fn test_parse_properties_empty_is_none() {
        assert!(parse_properties("").unwrap().is_none());
        assert!(parse_properties("   ").unwrap().is_none());
    }

    #[test]
    fn test_parse_properties_object() {
        let props = parse_properties(r#"{"policy":"topology","replicas":2}"#)
            .unwrap()
            .unwrap();
        assert_eq!(props["policy"], "topology");
        assert_eq!(props["replicas"], 2);
    }

    #[test]
    fn test_parse_properties_rejects_malformed_and_non_objects() {
        assert!(parse_properties("{not json").is_err());
        assert!(parse_properties("[1,2]").is_err());
    }

    #[test]
    fn test_index_omits_unset_default() {
        let workflow = Workflow {
            name: "deploy".to_string(),
            env_name: "prod".to_string(),
            app_primary_key: "shop".to_string(),
            ..Default::default()
        };
        let index = workflow.index();
        assert_eq!(index.get(INDEX_NAME).map(String::as_str), Some("deploy"));
        assert!(!index.contains_key(INDEX_DEFAULT));
        assert_eq!(workflow.primary_key(), "shop/deploy");
    }
}
