//! Synchronizer and orchestrator configuration types.

use std::time::Duration;

use serde::Deserialize;

/// Periodic sweep settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Seconds between sweeps.
    pub interval_secs: u64,
    /// Whether the daemon runs sweeps at all.
    pub enabled: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            interval_secs: 5,
            enabled: true,
        }
    }
}

impl SyncConfig {
    /// Sweep period. Zero is clamped to one second.
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs.max(1))
    }
}

/// Orchestrator API settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// Field manager name used for server-side apply.
    pub field_manager: String,
    /// API group of application objects.
    pub group: String,
    /// API version of application objects.
    pub version: String,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            field_manager: "workflow-sync".to_string(),
            group: "core.oam.dev".to_string(),
            version: "v1beta1".to_string(),
        }
    }
}
