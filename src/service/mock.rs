use super::manager::ServiceManager;
use super::state::{ServiceState, ServiceStatus};
use crate::error::{Result, SvcoffError};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::debug;

/// How a mock service reacts to a stop request
#[derive(Debug, Clone)]
pub enum StopBehavior {
    /// Reaches `Stopped` this long after the request
    StopsAfter(Duration),
    /// Accepts the request but never leaves `StopPending`
    Hangs,
    /// Rejects the request with the given message
    Fails(String),
}

/// Scripted behavior of one mock service
#[derive(Debug, Clone)]
pub struct MockService {
    state: ServiceState,
    can_stop: bool,
    stop: StopBehavior,
    query_error: Option<String>,
    disable_error: Option<String>,
}

impl MockService {
    pub fn running() -> Self {
        Self {
            state: ServiceState::Running,
            can_stop: true,
            stop: StopBehavior::StopsAfter(Duration::ZERO),
            query_error: None,
            disable_error: None,
        }
    }

    pub fn stopped() -> Self {
        Self {
            state: ServiceState::Stopped,
            can_stop: false,
            ..Self::running()
        }
    }

    pub fn not_stoppable(mut self) -> Self {
        self.can_stop = false;
        self
    }

    pub fn stops_after(mut self, delay: Duration) -> Self {
        self.stop = StopBehavior::StopsAfter(delay);
        self
    }

    pub fn hangs_on_stop(mut self) -> Self {
        self.stop = StopBehavior::Hangs;
        self
    }

    pub fn fails_stop<S: Into<String>>(mut self, message: S) -> Self {
        self.stop = StopBehavior::Fails(message.into());
        self
    }

    pub fn fails_query<S: Into<String>>(mut self, message: S) -> Self {
        self.query_error = Some(message.into());
        self
    }

    pub fn fails_disable<S: Into<String>>(mut self, message: S) -> Self {
        self.disable_error = Some(message.into());
        self
    }
}

#[derive(Debug, Default)]
struct ServiceRecord {
    stop_requested_at: Option<Instant>,
    stop_calls: usize,
    disable_calls: usize,
    disabled: bool,
}

#[derive(Debug, Default)]
struct MockState {
    services: HashMap<String, MockService>,
    records: HashMap<String, ServiceRecord>,
    active_calls: usize,
    peak_active_calls: usize,
}

/// Counts one backend call as in flight until dropped
struct ActiveCall<'a> {
    state: &'a Mutex<MockState>,
}

impl Drop for ActiveCall<'_> {
    fn drop(&mut self) {
        let mut state = self.state.lock();
        state.active_calls = state.active_calls.saturating_sub(1);
    }
}

/// Mock service manager for testing without touching the host.
///
/// Names that were never registered report `ServiceNotFound`. Every backend
/// call is counted while in flight, optionally held open for `call_latency`,
/// so tests can check how many operations were talking to the backend at once.
/// An operation makes its calls one after another, so this count never exceeds
/// the number of operations holding a concurrency slot.
#[derive(Debug, Default)]
pub struct MockServiceManager {
    state: Mutex<MockState>,
    call_latency: Duration,
}

impl MockServiceManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a service, replacing any previous script for that name
    pub fn with_service<S: Into<String>>(self, name: S, service: MockService) -> Self {
        self.add_service(name, service);
        self
    }

    /// Hold every backend call open for this long
    pub fn with_call_latency(mut self, latency: Duration) -> Self {
        self.call_latency = latency;
        self
    }

    pub fn add_service<S: Into<String>>(&self, name: S, service: MockService) {
        self.state.lock().services.insert(name.into(), service);
    }

    pub fn stop_calls(&self, name: &str) -> usize {
        self.state
            .lock()
            .records
            .get(name)
            .map(|r| r.stop_calls)
            .unwrap_or(0)
    }

    pub fn disable_calls(&self, name: &str) -> usize {
        self.state
            .lock()
            .records
            .get(name)
            .map(|r| r.disable_calls)
            .unwrap_or(0)
    }

    pub fn is_disabled(&self, name: &str) -> bool {
        self.state
            .lock()
            .records
            .get(name)
            .map(|r| r.disabled)
            .unwrap_or(false)
    }

    /// Highest number of backend calls in flight at the same time
    pub fn peak_concurrent_calls(&self) -> usize {
        self.state.lock().peak_active_calls
    }

    /// Backend calls in flight right now
    pub fn active_calls(&self) -> usize {
        self.state.lock().active_calls
    }

    async fn enter(&self) -> ActiveCall<'_> {
        {
            let mut state = self.state.lock();
            state.active_calls += 1;
            state.peak_active_calls = state.peak_active_calls.max(state.active_calls);
        }
        let call = ActiveCall { state: &self.state };
        if !self.call_latency.is_zero() {
            tokio::time::sleep(self.call_latency).await;
        }
        call
    }
}

#[async_trait]
impl ServiceManager for MockServiceManager {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn query(&self, service: &str) -> Result<ServiceStatus> {
        let _call = self.enter().await;
        let mut guard = self.state.lock();
        let state = &mut *guard;

        let script = state
            .services
            .get_mut(service)
            .ok_or_else(|| SvcoffError::not_found(service))?;

        if let Some(message) = &script.query_error {
            return Err(SvcoffError::query(service, message.clone()));
        }

        if script.state == ServiceState::StopPending {
            let record = state.records.entry(service.to_string()).or_default();
            let reached = match (&script.stop, record.stop_requested_at) {
                (StopBehavior::StopsAfter(delay), Some(at)) => at.elapsed() >= *delay,
                _ => false,
            };
            if reached {
                script.state = ServiceState::Stopped;
                debug!("Mock service '{}' reached stopped", service);
            }
        }

        Ok(ServiceStatus::new(script.state, script.can_stop))
    }

    async fn send_stop(&self, service: &str) -> Result<()> {
        let _call = self.enter().await;
        let mut guard = self.state.lock();
        let state = &mut *guard;

        let script = state
            .services
            .get_mut(service)
            .ok_or_else(|| SvcoffError::not_found(service))?;
        let record = state.records.entry(service.to_string()).or_default();
        record.stop_calls += 1;

        if let StopBehavior::Fails(message) = &script.stop {
            return Err(SvcoffError::stop_failed(service, message.clone()));
        }

        if script.state != ServiceState::StopPending {
            script.state = ServiceState::StopPending;
            record.stop_requested_at = Some(Instant::now());
        }

        Ok(())
    }

    async fn set_start_disabled(&self, service: &str) -> Result<()> {
        let _call = self.enter().await;
        let mut guard = self.state.lock();
        let state = &mut *guard;

        let script = state
            .services
            .get(service)
            .ok_or_else(|| SvcoffError::disable_failed(service, "service does not exist"))?;
        let record = state.records.entry(service.to_string()).or_default();
        record.disable_calls += 1;

        if let Some(message) = &script.disable_error {
            return Err(SvcoffError::disable_failed(service, message.clone()));
        }

        record.disabled = true;
        Ok(())
    }
}
