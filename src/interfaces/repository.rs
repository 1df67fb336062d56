//! Typed repository contract.

use async_trait::async_trait;

use crate::model::{Entity, FilterOptions, Index, ListOptions};

/// Result type for repository operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Errors from repository operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Record not exist: kind={kind}, key={key}")]
    NotFound { kind: &'static str, key: String },

    #[error("Record already exists: kind={kind}, key={key}")]
    AlreadyExists { kind: &'static str, key: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[cfg(feature = "sqlite")]
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Datastore unavailable: {0}")]
    Unavailable(String),
}

impl StorageError {
    /// Whether this is the distinguished record-not-exist condition.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::NotFound { .. })
    }
}

/// Persistence for one entity kind, keyed by [`Entity::primary_key`].
///
/// `list` and `count` select entities whose [`Entity::index`] contains every
/// pair of `filter` (an empty filter selects all), then apply
/// [`ListOptions::filter`] / `options`.
///
/// Implementations:
/// - `MemoryRepository`: in-memory, with failure injection for tests
/// - `SqliteRepository`: SQLite storage (`sqlite` feature)
#[async_trait]
pub trait Repository<T: Entity>: Send + Sync {
    /// Fetch by primary key. Missing ⇒ [`StorageError::NotFound`].
    async fn get(&self, key: &str) -> Result<T>;

    /// Insert a new entity, stamping update time and, when unset, create time.
    /// Existing key ⇒ [`StorageError::AlreadyExists`].
    async fn add(&self, entity: &mut T) -> Result<()>;

    /// Replace an existing entity, stamping update time.
    /// Missing ⇒ [`StorageError::NotFound`].
    async fn put(&self, entity: &mut T) -> Result<()>;

    /// Remove by primary key. Missing ⇒ [`StorageError::NotFound`].
    async fn delete(&self, key: &str) -> Result<()>;

    /// List matching entities.
    async fn list(&self, filter: &Index, options: &ListOptions) -> Result<Vec<T>>;

    /// Count matching entities, ignoring pagination.
    async fn count(&self, filter: &Index, options: Option<&FilterOptions>) -> Result<u64>;
}
