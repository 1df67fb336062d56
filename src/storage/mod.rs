//! Storage implementations.
//!
//! One typed [`Repository`] per entity kind, backed by memory or SQLite.

use std::sync::Arc;

use tracing::info;

use crate::config::{StorageConfig, StorageType};
use crate::interfaces::Repository;
use crate::model::{ApplicationRevision, Workflow, WorkflowRecord};

pub mod helpers;
pub mod mock;

#[cfg(feature = "sqlite")]
pub mod schema;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use mock::MemoryRepository;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteRepository;

/// The three typed repositories the record store is built from.
#[derive(Clone)]
pub struct Repositories {
    pub workflows: Arc<dyn Repository<Workflow>>,
    pub records: Arc<dyn Repository<WorkflowRecord>>,
    pub revisions: Arc<dyn Repository<ApplicationRevision>>,
}

impl Repositories {
    /// Fresh in-memory repositories.
    pub fn memory() -> Self {
        Self {
            workflows: Arc::new(MemoryRepository::<Workflow>::new()),
            records: Arc::new(MemoryRepository::<WorkflowRecord>::new()),
            revisions: Arc::new(MemoryRepository::<ApplicationRevision>::new()),
        }
    }

    /// SQLite repositories sharing one pool, with the schema initialized.
    #[cfg(feature = "sqlite")]
    pub async fn sqlite(pool: sqlx::SqlitePool) -> crate::interfaces::repository::Result<Self> {
        let workflows = SqliteRepository::<Workflow>::new(pool.clone());
        workflows.init().await?;

        Ok(Self {
            workflows: Arc::new(workflows),
            records: Arc::new(SqliteRepository::<WorkflowRecord>::new(pool.clone())),
            revisions: Arc::new(SqliteRepository::<ApplicationRevision>::new(pool)),
        })
    }
}

/// Initialize storage based on configuration.
pub async fn init_repositories(
    config: &StorageConfig,
) -> Result<Repositories, Box<dyn std::error::Error>> {
    info!("Storage: {} at {}", config.storage_type, config.path);

    match config.storage_type {
        StorageType::Memory => Ok(Repositories::memory()),
        #[cfg(feature = "sqlite")]
        StorageType::Sqlite => {
            if let Some(parent) = std::path::Path::new(&config.path).parent() {
                std::fs::create_dir_all(parent)?;
            }

            let pool =
                sqlx::SqlitePool::connect(&format!("sqlite:{}?mode=rwc", config.path)).await?;
            Ok(Repositories::sqlite(pool).await?)
        }
        #[cfg(not(feature = "sqlite"))]
        StorageType::Sqlite => {
            tracing::error!("SQLite storage requested but 'sqlite' feature is not enabled");
            Err("SQLite feature not enabled".into())
        }
    }
}
