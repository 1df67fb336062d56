//! Application configuration.
//!
//! Aggregates configuration from all modules into a single Config struct
//! that can be loaded from YAML files or environment variables.

mod storage;
mod sync;

pub use storage::{StorageConfig, StorageType, DEFAULT_SQLITE_PATH};
pub use sync::{OrchestratorConfig, SyncConfig};

use serde::Deserialize;

/// Default configuration file name.
pub const DEFAULT_CONFIG_FILE: &str = "workflow-sync.yaml";
/// Environment variable for configuration file path.
pub const CONFIG_ENV_VAR: &str = "WORKFLOW_SYNC_CONFIG";
/// Prefix for configuration environment variables.
pub const CONFIG_ENV_PREFIX: &str = "WORKFLOW_SYNC";
/// Environment variable for logging configuration.
pub const LOG_ENV_VAR: &str = "WORKFLOW_SYNC_LOG";

/// Main application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Storage configuration.
    pub storage: StorageConfig,
    /// Sweep scheduling.
    pub sync: SyncConfig,
    /// Orchestrator API settings.
    pub orchestrator: OrchestratorConfig,
}

impl Config {
    /// Load configuration from file and environment.
    ///
    /// Configuration sources (in order of priority, later overrides earlier):
    /// 1. `workflow-sync.yaml` in current directory (if exists)
    /// 2. File specified by `path` argument (if provided)
    /// 3. File specified by `CONFIG_ENV_VAR` environment variable (if set)
    /// 4. Environment variables with `CONFIG_ENV_PREFIX` prefix
    pub fn load(path: Option<&str>) -> Result<Self, Box<dyn std::error::Error>> {
        use ::config::{Config as ConfigLib, Environment, File, FileFormat};

        let mut builder = ConfigLib::builder()
            .add_source(File::new(DEFAULT_CONFIG_FILE, FileFormat::Yaml).required(false));

        if let Some(config_path) = path {
            builder = builder.add_source(File::new(config_path, FileFormat::Yaml).required(true));
        }

        if let Ok(config_path) = std::env::var(CONFIG_ENV_VAR) {
            builder = builder.add_source(File::new(&config_path, FileFormat::Yaml).required(true));
        }

        let config = builder
            .add_source(
                Environment::with_prefix(CONFIG_ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Config = config.try_deserialize()?;
        Ok(config)
    }

    /// Create config for testing: in-memory storage.
    pub fn for_test() -> Self {
        Self {
            storage: StorageConfig::memory(),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.storage.storage_type, StorageType::Sqlite);
        assert_eq!(config.storage.path, DEFAULT_SQLITE_PATH);
        assert_eq!(config.sync.interval_secs, 5);
        assert!(config.sync.enabled);
        assert_eq!(config.orchestrator.group, "core.oam.dev");
    }

    #[test]
    fn test_config_for_test() {
        let config = Config::for_test();
        assert_eq!(config.storage.storage_type, StorageType::Memory);
    }

    #[test]
    #[serial]
    fn test_load_from_file_then_env_override() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(
            file,
            "storage:\n  type: memory\nsync:\n  interval_secs: 30\norchestrator:\n  field_manager: tester"
        )
        .unwrap();

        std::env::set_var("WORKFLOW_SYNC__SYNC__ENABLED", "false");
        let config = Config::load(file.path().to_str());
        std::env::remove_var("WORKFLOW_SYNC__SYNC__ENABLED");

        let config = config.unwrap();
        assert_eq!(config.storage.storage_type, StorageType::Memory);
        assert_eq!(config.sync.interval_secs, 30);
        assert!(!config.sync.enabled);
        assert_eq!(config.orchestrator.field_manager, "tester");
        assert_eq!(config.orchestrator.version, "v1beta1");
    }

    #[test]
    #[serial]
    fn test_missing_explicit_file_is_error() {
        assert!(Config::load(Some("/nonexistent/workflow-sync.yaml")).is_err());
    }

    #[test]
    fn test_zero_interval_is_clamped() {
        let sync = SyncConfig {
            interval_secs: 0,
            enabled: true,
        };
        assert_eq!(sync.interval(), std::time::Duration::from_secs(1));
    }
}
