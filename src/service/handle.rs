use super::manager::ServiceManager;
use super::state::ServiceState;
use crate::error::{Result, SvcoffError};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, timeout};
use tracing::{debug, info, warn};

/// Default interval between state queries while waiting for a stop
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// One named OS service.
///
/// `request_stop` and `request_disable` never return errors: failures are
/// turned into `false` and the error is kept on the handle until
/// [`ServiceHandle::take_error`] is called.
pub struct ServiceHandle {
    name: String,
    manager: Arc<dyn ServiceManager>,
    poll_interval: Duration,
    last_error: Option<SvcoffError>,
}

impl ServiceHandle {
    pub fn new<S: Into<String>>(name: S, manager: Arc<dyn ServiceManager>) -> Self {
        Self {
            name: name.into(),
            manager,
            poll_interval: DEFAULT_POLL_INTERVAL,
            last_error: None,
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Query the live state of the service
    pub async fn query_state(&self) -> Result<ServiceState> {
        Ok(self.manager.query(&self.name).await?.state)
    }

    /// Stop the service and wait up to `timeout_duration` for it to reach `Stopped`
    pub async fn request_stop(&mut self, timeout_duration: Duration) -> bool {
        match self.stop_and_wait(timeout_duration).await {
            Ok(()) => true,
            Err(e) => {
                warn!("Stop of '{}' failed: {}", self.name, e);
                self.last_error = Some(e);
                false
            }
        }
    }

    /// Set the startup mode of the service to disabled
    pub async fn request_disable(&mut self) -> bool {
        match self.manager.set_start_disabled(&self.name).await {
            Ok(()) => {
                info!("Service '{}' startup mode set to disabled", self.name);
                true
            }
            Err(e) => {
                let e = match e {
                    e @ SvcoffError::DisableFailed { .. } => e,
                    other => SvcoffError::disable_failed(self.name.clone(), other.to_string()),
                };
                warn!("Disable of '{}' failed: {}", self.name, e);
                self.last_error = Some(e);
                false
            }
        }
    }

    /// Take the error recorded by the last failed request, if any
    pub fn take_error(&mut self) -> Option<SvcoffError> {
        self.last_error.take()
    }

    async fn stop_and_wait(&self, timeout_duration: Duration) -> Result<()> {
        let status = self.manager.query(&self.name).await?;

        if status.state.is_stopped() {
            debug!("Service '{}' already stopped", self.name);
            return Ok(());
        }

        // Already on its way down; the OS refuses further controls meanwhile
        if status.state == ServiceState::StopPending {
            return self.wait_for_stopped(timeout_duration, status.state).await;
        }

        if !status.can_stop {
            return Err(SvcoffError::StopRejected {
                service: self.name.clone(),
            });
        }

        debug!("Sending stop to '{}' via {}", self.name, self.manager.name());
        self.manager.send_stop(&self.name).await?;

        self.wait_for_stopped(timeout_duration, status.state).await
    }

    async fn wait_for_stopped(
        &self,
        timeout_duration: Duration,
        initial_state: ServiceState,
    ) -> Result<()> {
        debug!(
            "Waiting for '{}' to stop (timeout: {:?})",
            self.name, timeout_duration
        );

        let mut last_state = initial_state;

        let result = timeout(timeout_duration, async {
            loop {
                let state = self.query_state().await?;
                last_state = state;
                if state.is_stopped() {
                    return Ok::<(), SvcoffError>(());
                }
                sleep(self.poll_interval).await;
            }
        })
        .await;

        match result {
            Ok(Ok(())) => {
                info!("Service '{}' stopped", self.name);
                Ok(())
            }
            Ok(Err(e)) => Err(e),
            Err(_) => Err(SvcoffError::StopTimeout {
                service: self.name.clone(),
                timeout_secs: timeout_duration.as_secs_f64(),
                last_state: last_state.to_string(),
            }),
        }
    }
}
