//! Persisted entities and the owning application.
//!
//! Three entity kinds are stored: [`Workflow`], [`WorkflowRecord`] and
//! [`ApplicationRevision`]. [`Application`] is the owner passed in by
//! callers and is not persisted here.

pub mod entity;
pub mod record;
pub mod revision;
pub mod workflow;

pub use entity::{
    BaseModel, Entity, FilterOptions, FuzzyQuery, InQuery, Index, ListOptions, SortOption,
    SortOrder,
};
pub use record::{FinishedFlag, RecordStatus, WorkflowRecord};
pub use revision::ApplicationRevision;
pub use workflow::{parse_properties, JsonStruct, StepInput, StepOutput, Workflow, WorkflowStep};

use serde::{Deserialize, Serialize};

/// The application that owns workflows, records and revisions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    pub name: String,
    pub namespace: String,
    #[serde(default)]
    pub alias: String,
    #[serde(default)]
    pub project: String,
}

impl Application {
    pub fn new(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            ..Default::default()
        }
    }

    pub fn primary_key(&self) -> &str {
        &self.name
    }
}
