//! Abstract interfaces for external collaborators.
//!
//! These traits define the contracts for:
//! - Entity persistence (typed repositories)
//! - Live application objects (orchestrator client)
//! - Applying application objects (applicator)

pub mod orchestrator;
pub mod repository;

pub use orchestrator::{Applicator, OrchestratorClient, OrchestratorError};
pub use repository::{Repository, StorageError};
