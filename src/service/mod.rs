mod command;
mod handle;
mod manager;
mod mock;
mod sc;
mod state;
mod systemd;

#[cfg(test)]
mod tests;

pub use command::{run as run_command, CommandOutput};
pub use handle::{ServiceHandle, DEFAULT_POLL_INTERVAL};
pub use manager::ServiceManager;
pub use mock::{MockService, MockServiceManager, StopBehavior};
pub use sc::ScServiceManager;
pub use state::{ServiceState, ServiceStatus};
pub use systemd::SystemdServiceManager;

use crate::config::BackendKind;
use std::sync::Arc;

/// Build the service manager for a backend selection
pub fn manager_for(backend: BackendKind) -> Arc<dyn ServiceManager> {
    match backend.resolve() {
        BackendKind::Windows => Arc::new(ScServiceManager::new()),
        _ => Arc::new(SystemdServiceManager::new()),
    }
}
