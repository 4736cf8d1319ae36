use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state reported by the OS service manager
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServiceState {
    Running,
    StopPending,
    Stopped,
    StartPending,
    ContinuePending,
    PausePending,
    Paused,
    Unknown,
}

impl ServiceState {
    pub fn is_stopped(&self) -> bool {
        matches!(self, ServiceState::Stopped)
    }
}

impl fmt::Display for ServiceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ServiceState::Running => "running",
            ServiceState::StopPending => "stop pending",
            ServiceState::Stopped => "stopped",
            ServiceState::StartPending => "start pending",
            ServiceState::ContinuePending => "continue pending",
            ServiceState::PausePending => "pause pending",
            ServiceState::Paused => "paused",
            ServiceState::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// Point-in-time snapshot of a service, never cached between calls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceStatus {
    pub state: ServiceState,
    /// Whether the service accepts stop requests
    pub can_stop: bool,
}

impl ServiceStatus {
    pub fn new(state: ServiceState, can_stop: bool) -> Self {
        Self { state, can_stop }
    }
}
