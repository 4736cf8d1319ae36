pub mod app;
pub mod config;
pub mod error;
pub mod precheck;
pub mod report;
pub mod service;

pub use app::{
    AggregateResult, OperationState, ShutdownOperation, ShutdownOrchestrator, ShutdownOutcome,
};
pub use config::{BackendKind, SvcoffConfig, DEFAULT_SERVICES, MAX_PARALLEL};
pub use error::{Result, SvcoffError};
pub use report::{OutputFormat, Reporter};
pub use service::{
    MockService, MockServiceManager, ScServiceManager, ServiceHandle, ServiceManager,
    ServiceState, ServiceStatus, SystemdServiceManager,
};
