use super::state::OperationTracker;
use crate::config::{OrchestratorConfig, SvcoffConfig, MAX_PARALLEL};
use crate::service::{self, ServiceManager};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// Runs one shutdown operation per service name under a concurrency cap
pub struct ShutdownOrchestrator {
    pub(super) manager: Arc<dyn ServiceManager>,
    pub(super) max_parallel: usize,
    pub(super) stop_timeout: Duration,
    pub(super) poll_interval: Duration,
    pub(super) tracker: OperationTracker,
    pub(super) run_lock: Mutex<()>,
}

impl ShutdownOrchestrator {
    /// Create an orchestrator with default settings
    pub fn new(manager: Arc<dyn ServiceManager>) -> Self {
        Self::with_settings(manager, &OrchestratorConfig::default())
    }

    /// Create an orchestrator from the `[orchestrator]` settings.
    ///
    /// `max_parallel` is clamped to `1..=MAX_PARALLEL`.
    pub fn with_settings(manager: Arc<dyn ServiceManager>, settings: &OrchestratorConfig) -> Self {
        Self {
            manager,
            max_parallel: settings.max_parallel.clamp(1, MAX_PARALLEL),
            stop_timeout: settings.stop_timeout(),
            poll_interval: settings.poll_interval(),
            tracker: OperationTracker::new(),
            run_lock: Mutex::new(()),
        }
    }

    /// Create an orchestrator with the backend selected in the configuration
    pub fn from_config(config: &SvcoffConfig) -> Self {
        Self::with_settings(
            service::manager_for(config.services.backend),
            &config.orchestrator,
        )
    }

    pub fn max_parallel(&self) -> usize {
        self.max_parallel
    }

    pub fn stop_timeout(&self) -> Duration {
        self.stop_timeout
    }

    pub fn backend_name(&self) -> &'static str {
        self.manager.name()
    }
}
