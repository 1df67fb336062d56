//! workflow-sync: workflow execution records kept consistent with a
//! reconciling application orchestrator.
//!
//! Records of workflow executions live in a durable store; the orchestrator
//! owns the live application objects that actually run them. The
//! [`services::WorkflowSynchronizer`] folds live and archived orchestrator
//! state back into the store, while [`services::WorkflowControl`] resumes,
//! terminates and rolls back executions. [`services::WorkflowService`] covers
//! workflow CRUD and record queries.

pub mod api;
pub mod config;
pub mod error;
pub mod interfaces;
pub mod model;
pub mod orchestrator;
pub mod services;
pub mod storage;
pub mod store;
pub mod utils;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use error::{ErrorKind, WorkflowError};
