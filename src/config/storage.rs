//! Storage configuration types.

use serde::Deserialize;

/// Default SQLite database path.
pub const DEFAULT_SQLITE_PATH: &str = "data/workflow-sync.db";

/// Storage type discriminator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageType {
    #[default]
    Sqlite,
    Memory,
}

impl std::fmt::Display for StorageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageType::Sqlite => f.write_str("sqlite"),
            StorageType::Memory => f.write_str("memory"),
        }
    }
}

/// Storage configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Storage type discriminator.
    #[serde(rename = "type")]
    pub storage_type: StorageType,
    /// Database file path (SQLite only).
    pub path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            storage_type: StorageType::Sqlite,
            path: DEFAULT_SQLITE_PATH.to_string(),
        }
    }
}

impl StorageConfig {
    /// In-memory storage, for tests and dry runs.
    pub fn memory() -> Self {
        Self {
            storage_type: StorageType::Memory,
            ..Default::default()
        }
    }
}
