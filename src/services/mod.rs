//! Workflow services.
//!
//! - [`WorkflowService`]: workflow CRUD, record queries, record creation
//! - [`WorkflowSynchronizer`]: folds orchestrator state into records
//! - [`WorkflowControl`]: resume, terminate and rollback
//! - [`SyncScheduler`]: periodic sweep driver

pub mod control;
pub mod scheduler;
pub mod sync;
pub mod workflow;

pub use control::WorkflowControl;
pub use scheduler::SyncScheduler;
pub use sync::{summary_status, SyncReport, WorkflowSynchronizer};
pub use workflow::WorkflowService;
