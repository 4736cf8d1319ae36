use super::types::OperationState;
use super::ShutdownOrchestrator;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

/// Position of a name in the submitted list; duplicates get distinct ids
pub type OperationId = usize;

/// Service name and lifecycle state of one scheduled operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationRecord {
    pub service: String,
    pub state: OperationState,
}

/// Shared lifecycle table written by the operation tasks
#[derive(Debug, Clone, Default)]
pub struct OperationTracker {
    records: Arc<Mutex<HashMap<OperationId, OperationRecord>>>,
}

impl OperationTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget every record from a previous run
    pub async fn reset(&self) {
        self.records.lock().await.clear();
    }

    pub async fn register(&self, id: OperationId, service: &str) {
        let mut records = self.records.lock().await;
        records.insert(
            id,
            OperationRecord {
                service: service.to_string(),
                state: OperationState::Pending,
            },
        );
    }

    pub async fn set_state(&self, id: OperationId, state: OperationState) {
        let mut records = self.records.lock().await;
        if let Some(record) = records.get_mut(&id) {
            record.state = state;
            debug!("Operation {} ('{}') state changed to: {:?}", id, record.service, state);
        }
    }

    pub async fn get(&self, id: OperationId) -> Option<OperationRecord> {
        self.records.lock().await.get(&id).cloned()
    }

    pub async fn snapshot(&self) -> HashMap<OperationId, OperationRecord> {
        self.records.lock().await.clone()
    }

    pub async fn count_in(&self, state: OperationState) -> usize {
        self.records
            .lock()
            .await
            .values()
            .filter(|r| r.state == state)
            .count()
    }
}

impl ShutdownOrchestrator {
    /// Get the lifecycle state of one scheduled operation
    pub async fn get_operation_state(&self, id: OperationId) -> Option<OperationState> {
        self.tracker.get(id).await.map(|r| r.state)
    }

    /// Get all operations of the current or last run
    pub async fn get_all_operation_states(&self) -> HashMap<OperationId, OperationRecord> {
        self.tracker.snapshot().await
    }

    /// Number of operations currently holding a concurrency slot
    pub async fn running_operations(&self) -> usize {
        self.tracker.count_in(OperationState::Running).await
    }
}
