use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;
use uuid::Uuid;

/// Lifecycle of one scheduled service name, as seen by the orchestrator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum OperationState {
    /// Waiting for a free concurrency slot
    Pending,
    /// Shutdown operation executing
    Running,
    /// Outcome recorded
    Completed,
}

/// Final record of one stop-and-disable attempt
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShutdownOutcome {
    service: String,
    stopped: bool,
    disabled: bool,
    succeeded: bool,
    error: Option<String>,
    duration_ms: u64,
}

impl ShutdownOutcome {
    pub fn new<S: Into<String>>(
        service: S,
        stopped: bool,
        disabled: bool,
        error: Option<String>,
        duration: Duration,
    ) -> Self {
        Self {
            service: service.into(),
            stopped,
            disabled,
            succeeded: stopped && disabled,
            error,
            duration_ms: u64::try_from(duration.as_millis()).unwrap_or(u64::MAX),
        }
    }

    /// Outcome for an operation that never produced a result of its own
    pub fn failed<S: Into<String>, M: Into<String>>(service: S, error: M) -> Self {
        Self::new(service, false, false, Some(error.into()), Duration::ZERO)
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    pub fn stopped(&self) -> bool {
        self.stopped
    }

    pub fn disabled(&self) -> bool {
        self.disabled
    }

    pub fn succeeded(&self) -> bool {
        self.succeeded
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }

    /// One-word description of where the service ended up
    pub fn summary(&self) -> &'static str {
        match (self.stopped, self.disabled) {
            (true, true) => "stopped and disabled",
            (true, false) => "stopped, disable failed",
            (false, _) => "stop failed",
        }
    }
}

/// Tally of a complete shutdown run
#[derive(Debug, Clone, Serialize)]
pub struct AggregateResult {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub total_attempted: usize,
    pub total_succeeded: usize,
    pub outcomes: Vec<ShutdownOutcome>,
}

impl AggregateResult {
    pub fn all_succeeded(&self) -> bool {
        self.total_succeeded == self.total_attempted
    }

    pub fn total_failed(&self) -> usize {
        self.total_attempted - self.total_succeeded
    }

    /// Process exit status for this run
    pub fn exit_code(&self) -> i32 {
        if self.all_succeeded() {
            0
        } else {
            1
        }
    }

    /// First outcome recorded for a service name
    pub fn outcome(&self, service: &str) -> Option<&ShutdownOutcome> {
        self.outcomes.iter().find(|o| o.service() == service)
    }

    pub fn failures(&self) -> impl Iterator<Item = &ShutdownOutcome> {
        self.outcomes.iter().filter(|o| !o.succeeded())
    }

    pub fn elapsed(&self) -> Duration {
        (self.finished_at - self.started_at)
            .to_std()
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_duration_saturates() {
        let outcome = ShutdownOutcome::new("SysMain", true, true, None, Duration::MAX);
        assert_eq!(outcome.duration(), Duration::from_millis(u64::MAX));

        let outcome = ShutdownOutcome::new("SysMain", true, true, None, Duration::from_millis(1500));
        assert_eq!(outcome.duration(), Duration::from_millis(1500));
    }

    #[test]
    fn test_outcome_succeeded_requires_both_steps() {
        assert!(ShutdownOutcome::new("A", true, true, None, Duration::ZERO).succeeded());
        assert!(!ShutdownOutcome::new("A", true, false, None, Duration::ZERO).succeeded());
        assert!(!ShutdownOutcome::failed("A", "operation faulted").succeeded());
    }
}
