//! Retry utilities: backoff builders and retryable error classification.
//!
//! Uses `backon` for exponential backoff with jitter. Services never retry
//! inside a call; retries belong to hosts (daemon startup, sweep ticks).

use std::time::Duration;

use backon::ExponentialBuilder;

use crate::error::{ErrorKind, WorkflowError};

/// Backoff for orchestrator and datastore connection retries at startup.
///
/// - Min delay: 100ms
/// - Max delay: 5s
/// - Max attempts: 30
/// - Jitter enabled
pub fn connection_backoff() -> ExponentialBuilder {
    ExponentialBuilder::default()
        .with_min_delay(Duration::from_millis(100))
        .with_max_delay(Duration::from_secs(5))
        .with_max_times(30)
        .with_jitter()
}

/// Whether an error may succeed if the same call is repeated.
///
/// Only infrastructure failures qualify; not-found, validation and
/// precondition errors are answers, not outages.
pub fn is_retryable(err: &WorkflowError) -> bool {
    err.kind() == ErrorKind::Infrastructure
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interfaces::{OrchestratorError, StorageError};

    #[test]
    fn test_is_retryable() {
        assert!(is_retryable(&WorkflowError::from(StorageError::Unavailable(
            "down".to_string()
        ))));
        assert!(is_retryable(&WorkflowError::from(OrchestratorError::Api(
            "timeout".to_string()
        ))));
        assert!(!is_retryable(&WorkflowError::WorkflowStillRunning));
        assert!(!is_retryable(&WorkflowError::WorkflowRecordNotExist));
        assert!(!is_retryable(&WorkflowError::WorkflowNoEnv));
    }
}
