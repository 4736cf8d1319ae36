use super::types::ShutdownOutcome;
use crate::service::ServiceHandle;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Default time a service is given to reach the stopped state
pub const DEFAULT_STOP_TIMEOUT: Duration = Duration::from_secs(10);

/// Stop-then-disable sequence for exactly one service
pub struct ShutdownOperation {
    handle: ServiceHandle,
    stop_timeout: Duration,
}

impl ShutdownOperation {
    /// `None` for blank service names, which are skipped entirely
    pub fn new(handle: ServiceHandle, stop_timeout: Duration) -> Option<Self> {
        if handle.name().trim().is_empty() {
            return None;
        }
        Some(Self {
            handle,
            stop_timeout,
        })
    }

    pub fn service(&self) -> &str {
        self.handle.name()
    }

    /// Run the sequence to completion; failures are carried in the outcome
    pub async fn execute(mut self) -> ShutdownOutcome {
        let started = Instant::now();
        let service = self.handle.name().to_string();
        debug!("Shutting down service '{}'", service);

        // Disable only runs once the stop has succeeded
        let stopped = self.handle.request_stop(self.stop_timeout).await;
        let disabled = stopped && self.handle.request_disable().await;

        let error = self.handle.take_error().map(|e| e.to_string());
        let outcome = ShutdownOutcome::new(service, stopped, disabled, error, started.elapsed());

        if outcome.succeeded() {
            info!(
                "Service '{}' stopped and disabled in {:?}",
                outcome.service(),
                outcome.duration()
            );
        } else {
            warn!(
                "Service '{}': {} ({})",
                outcome.service(),
                outcome.summary(),
                outcome.error().unwrap_or("no details")
            );
        }

        outcome
    }
}
