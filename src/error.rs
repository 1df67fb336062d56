//! Domain errors returned by workflow services.

use crate::interfaces::{OrchestratorError, StorageError};

/// Result type for workflow service operations.
pub type Result<T> = std::result::Result<T, WorkflowError>;

/// Coarse classification of a [`WorkflowError`], for callers that map
/// errors onto transport status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Validation,
    Precondition,
    Infrastructure,
}

/// Errors from workflow CRUD, record queries, synchronization and control.
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    #[error("workflow does not exist")]
    WorkflowNotExist,

    #[error("workflow record does not exist")]
    WorkflowRecordNotExist,

    #[error("application revision does not exist")]
    ApplicationRevisionNotExist,

    #[error("application has no default workflow")]
    WorkflowNoDefault,

    #[error("workflow must specify the env name")]
    WorkflowNoEnv,

    #[error("invalid step properties: {0}")]
    InvalidProperties(#[source] serde_json::Error),

    #[error("empty annotations in application")]
    MissingAnnotations,

    #[error("missing annotation {0} in application")]
    MissingAnnotation(&'static str),

    #[error("invalid application revision config: {0}")]
    InvalidRevisionConfig(String),

    #[error("application has no workflow status")]
    WorkflowStatusMissing,

    #[error("workflow is still running, can not operate a running workflow")]
    WorkflowStillRunning,

    #[error("no ready application revision to roll back to")]
    NoReadyRevision,

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Orchestrator(#[from] OrchestratorError),
}

impl WorkflowError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            WorkflowError::WorkflowNotExist
            | WorkflowError::WorkflowRecordNotExist
            | WorkflowError::ApplicationRevisionNotExist
            | WorkflowError::WorkflowNoDefault => ErrorKind::NotFound,
            WorkflowError::WorkflowNoEnv
            | WorkflowError::InvalidProperties(_)
            | WorkflowError::MissingAnnotations
            | WorkflowError::MissingAnnotation(_)
            | WorkflowError::InvalidRevisionConfig(_)
            | WorkflowError::WorkflowStatusMissing => ErrorKind::Validation,
            WorkflowError::WorkflowStillRunning | WorkflowError::NoReadyRevision => {
                ErrorKind::Precondition
            }
            WorkflowError::Storage(StorageError::NotFound { .. })
            | WorkflowError::Orchestrator(OrchestratorError::NotFound { .. }) => {
                ErrorKind::NotFound
            }
            WorkflowError::Storage(_) | WorkflowError::Orchestrator(_) => {
                ErrorKind::Infrastructure
            }
        }
    }

    /// Replace a repository not-found with `not_found`, passing other errors
    /// through unchanged.
    pub(crate) fn or_not_found(err: StorageError, not_found: WorkflowError) -> WorkflowError {
        if err.is_not_found() {
            not_found
        } else {
            WorkflowError::Storage(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_classification() {
        assert_eq!(WorkflowError::WorkflowNotExist.kind(), ErrorKind::NotFound);
        assert_eq!(WorkflowError::WorkflowNoEnv.kind(), ErrorKind::Validation);
        assert_eq!(
            WorkflowError::WorkflowStillRunning.kind(),
            ErrorKind::Precondition
        );
        assert_eq!(
            WorkflowError::from(StorageError::Unavailable("down".to_string())).kind(),
            ErrorKind::Infrastructure
        );
        assert_eq!(
            WorkflowError::from(StorageError::NotFound {
                kind: "workflow",
                key: "shop/deploy".to_string(),
            })
            .kind(),
            ErrorKind::NotFound
        );
    }

    #[test]
    fn test_or_not_found_maps_only_not_found() {
        let mapped = WorkflowError::or_not_found(
            StorageError::NotFound {
                kind: "workflow",
                key: "shop/deploy".to_string(),
            },
            WorkflowError::WorkflowNotExist,
        );
        assert!(matches!(mapped, WorkflowError::WorkflowNotExist));

        let passed = WorkflowError::or_not_found(
            StorageError::Unavailable("down".to_string()),
            WorkflowError::WorkflowNotExist,
        );
        assert!(matches!(passed, WorkflowError::Storage(_)));
    }

    #[test]
    fn test_running_message() {
        assert_eq!(
            WorkflowError::WorkflowStillRunning.to_string(),
            "workflow is still running, can not operate a running workflow"
        );
    }
}
