use super::shutdown::ShutdownOperation;
use super::state::{OperationId, OperationTracker};
use super::types::{AggregateResult, OperationState, ShutdownOutcome};
use super::ShutdownOrchestrator;
use crate::service::ServiceHandle;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

impl ShutdownOrchestrator {
    /// Stop and disable every non-blank service name.
    ///
    /// Returns only after every scheduled name has an outcome. Blank names are
    /// dropped before scheduling and do not count as attempted. Runs on the same
    /// orchestrator are serialized, so the lifecycle table always describes a
    /// single run.
    pub async fn run<I, S>(&self, names: I) -> AggregateResult
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let operations: Vec<ShutdownOperation> = names
            .into_iter()
            .map(|name| {
                ServiceHandle::new(name.as_ref().trim(), Arc::clone(&self.manager))
                    .with_poll_interval(self.poll_interval)
            })
            .filter_map(|handle| ShutdownOperation::new(handle, self.stop_timeout))
            .collect();

        let _run = self.run_lock.lock().await;
        let run_id = Uuid::new_v4();
        self.run_operations(run_id, operations)
            .instrument(info_span!("shutdown_run", %run_id))
            .await
    }

    async fn run_operations(
        &self,
        run_id: Uuid,
        operations: Vec<ShutdownOperation>,
    ) -> AggregateResult {
        let started_at = Utc::now();
        let total = operations.len();
        let targets: Vec<String> = operations.iter().map(|op| op.service().to_string()).collect();

        info!(
            "Shutting down {} service(s) via {} backend, at most {} at a time",
            total,
            self.manager.name(),
            self.max_parallel
        );

        self.tracker.reset().await;
        for (id, service) in targets.iter().enumerate() {
            self.tracker.register(id, service).await;
        }

        let semaphore = Arc::new(Semaphore::new(self.max_parallel));
        let mut tasks = JoinSet::new();

        for (id, operation) in operations.into_iter().enumerate() {
            tasks.spawn(
                run_operation(id, operation, Arc::clone(&semaphore), self.tracker.clone())
                    .in_current_span(),
            );
        }

        // Single consumer: outcomes are only ever written from this loop
        let mut outcomes: HashMap<OperationId, ShutdownOutcome> = HashMap::with_capacity(total);
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((id, outcome)) => {
                    info!(
                        "[{}/{}] {}: {}",
                        outcomes.len() + 1,
                        total,
                        outcome.service(),
                        outcome.summary()
                    );
                    outcomes.insert(id, outcome);
                }
                Err(e) => error!("Shutdown task failed to report: {}", e),
            }
        }

        // A task that died before reporting still owes its name an outcome
        for (id, service) in targets.iter().enumerate() {
            if !outcomes.contains_key(&id) {
                warn!("No outcome recorded for '{}', marking as failed", service);
                self.tracker.set_state(id, OperationState::Completed).await;
                outcomes.insert(id, ShutdownOutcome::failed(service, "operation aborted"));
            }
        }

        let mut outcomes: Vec<(OperationId, ShutdownOutcome)> = outcomes.into_iter().collect();
        outcomes.sort_by_key(|(id, _)| *id);
        let outcomes: Vec<ShutdownOutcome> = outcomes.into_iter().map(|(_, o)| o).collect();

        let total_succeeded = outcomes.iter().filter(|o| o.succeeded()).count();

        info!(
            "Shutdown run finished: {}/{} service(s) stopped and disabled",
            total_succeeded, total
        );

        AggregateResult {
            run_id,
            started_at,
            finished_at: Utc::now(),
            total_attempted: total,
            total_succeeded,
            outcomes,
        }
    }
}

/// One scheduled operation: wait for a slot, run, report.
///
/// The operation is marked `Completed` before its slot is released, so at no
/// point are more than `max_parallel` operations `Running`. It runs in its own
/// task so a panic inside a backend turns into a failed outcome instead of a
/// missing one.
async fn run_operation(
    id: OperationId,
    operation: ShutdownOperation,
    semaphore: Arc<Semaphore>,
    tracker: OperationTracker,
) -> (OperationId, ShutdownOutcome) {
    let Ok(_permit) = semaphore.acquire_owned().await else {
        unreachable!("shutdown semaphore is never closed");
    };

    tracker.set_state(id, OperationState::Running).await;
    let started = Instant::now();
    let service = operation.service().to_string();

    let outcome = match tokio::spawn(operation.execute().in_current_span()).await {
        Ok(outcome) => outcome,
        Err(e) => {
            error!("Shutdown of '{}' faulted: {}", service, e);
            ShutdownOutcome::new(
                service,
                false,
                false,
                Some(format!("operation faulted: {}", e)),
                started.elapsed(),
            )
        }
    };

    tracker.set_state(id, OperationState::Completed).await;
    (id, outcome)
}
