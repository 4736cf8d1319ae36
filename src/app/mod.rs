mod orchestrator;
mod runtime;
mod shutdown;
mod state;
mod types;


pub use orchestrator::ShutdownOrchestrator;
pub use shutdown::{ShutdownOperation, DEFAULT_STOP_TIMEOUT};
pub use state::{OperationId, OperationRecord, OperationTracker};
pub use types::{AggregateResult, OperationState, ShutdownOutcome};
