//! Periodic driver for the workflow record synchronizer.
//!
//! Runs one sweep per tick. A failed sweep is logged and retried on the
//! next tick; the loop itself never exits.

use std::time::Duration;

use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, info, warn};

use super::sync::{SyncReport, WorkflowSynchronizer};
use crate::config::SyncConfig;
use crate::utils::retry::is_retryable;

/// Sync scheduler service.
pub struct SyncScheduler {
    synchronizer: WorkflowSynchronizer,
    period: Duration,
}

impl SyncScheduler {
    pub fn new(synchronizer: WorkflowSynchronizer, config: &SyncConfig) -> Self {
        Self {
            synchronizer,
            period: config.interval(),
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Run the scheduler loop.
    ///
    /// This runs indefinitely; drop the future to stop it.
    pub async fn run(&self) {
        info!(period = ?self.period, "Starting workflow record sync scheduler");

        let mut ticker = interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            self.run_once().await;
        }
    }

    /// Run a single sweep, logging its outcome.
    pub async fn run_once(&self) -> Option<SyncReport> {
        match self.synchronizer.sync_workflow_records().await {
            Ok(report) => {
                if report.examined > 0 {
                    info!(
                        examined = report.examined,
                        synced = report.synced,
                        skipped = report.skipped,
                        "Synced workflow records"
                    );
                }
                Some(report)
            }
            Err(e) if is_retryable(&e) => {
                warn!(error = %e, "Failed to list workflow records for sync, retrying next tick");
                None
            }
            Err(e) => {
                error!(error = %e, "Workflow record sync failed");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RecordStatus;
    use crate::test_utils::TestHarness;

    #[tokio::test]
    async fn test_run_once_reports_sweep() {
        let h = TestHarness::new().await;
        h.seed_record("deploy-v1", "v1").await;
        h.set_live("deploy-v1", "v1", Some(TestHarness::status(true, false))).await;

        let scheduler = SyncScheduler::new(h.synchronizer(), &SyncConfig::default());
        let report = scheduler.run_once().await.unwrap();

        assert_eq!(report.synced, 1);
        assert_eq!(h.record("deploy-v1").await.status, RecordStatus::Complete);
    }

    #[tokio::test]
    async fn test_run_once_swallows_listing_failure() {
        let h = TestHarness::new().await;
        h.records.set_fail_on_list(true).await;

        let scheduler = SyncScheduler::new(h.synchronizer(), &SyncConfig::default());
        assert!(scheduler.run_once().await.is_none());
    }

    #[tokio::test]
    async fn test_period_follows_config() {
        let h = TestHarness::new().await;
        let every_thirty = SyncConfig {
            interval_secs: 30,
            ..Default::default()
        };
        let scheduler = SyncScheduler::new(h.synchronizer(), &every_thirty);
        assert_eq!(scheduler.period(), Duration::from_secs(30));

        let zero = SyncConfig {
            interval_secs: 0,
            ..Default::default()
        };
        let scheduler = SyncScheduler::new(h.synchronizer(), &zero);
        assert_eq!(scheduler.period(), Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_run_sweeps_on_first_tick() {
        let h = TestHarness::new().await;
        h.seed_record("deploy-v1", "v1").await;
        h.set_live("deploy-v1", "v1", Some(TestHarness::status(false, false))).await;

        let scheduler = SyncScheduler::new(h.synchronizer(), &SyncConfig::default());
        let stopped = tokio::time::timeout(Duration::from_millis(200), scheduler.run()).await;

        assert!(stopped.is_err());
        assert_eq!(h.record("deploy-v1").await.status, RecordStatus::Running);
    }
}
