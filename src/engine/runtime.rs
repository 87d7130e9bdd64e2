// ABOUTME: Shared per-run machinery used by every execution strategy
// ABOUTME: Invokes one task, writes its outputs to the context, and records its result

use chrono::Utc;
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use super::context::ExecutionContext;
use super::events::EventPublisher;
use super::registry::WorkerRegistry;
use super::result::{ExecutionHistory, ExecutionResult, SkipReason, TaskStatus};
use super::task::TaskDescriptor;

/// Collects results for one run and announces each one as it lands.
#[derive(Debug, Clone)]
pub struct HistoryRecorder {
    history: Arc<RwLock<ExecutionHistory>>,
    events: EventPublisher,
}

impl HistoryRecorder {
    pub fn new(history: ExecutionHistory, events: EventPublisher) -> Self {
        Self {
            history: Arc::new(RwLock::new(history)),
            events,
        }
    }

    pub async fn record(&self, result: ExecutionResult) {
        let mut history = self.history.write().await;
        let run_id = history.run_id.clone();
        match history.record(result.clone()) {
            Ok(()) => self.events.publish(&run_id, &result),
            Err(err) => error!("Discarding result: {}", err),
        }
    }

    pub async fn status_of(&self, task_id: &str) -> Option<TaskStatus> {
        self.history.read().await.status_of(task_id)
    }

    pub async fn contains(&self, task_id: &str) -> bool {
        self.history.read().await.contains(task_id)
    }

    /// Copy of the history as it stands right now
    pub async fn snapshot(&self) -> ExecutionHistory {
        self.history.read().await.clone()
    }

    /// Seal the history and hand back the final copy
    pub async fn finish(&self) -> ExecutionHistory {
        let mut history = self.history.write().await;
        history.mark_completed();
        history.clone()
    }
}

#[derive(Clone)]
pub struct TaskRuntime {
    registry: Arc<WorkerRegistry>,
    context: ExecutionContext,
    recorder: HistoryRecorder,
    default_timeout: Option<Duration>,
}

impl TaskRuntime {
    pub fn new(
        registry: Arc<WorkerRegistry>,
        context: ExecutionContext,
        recorder: HistoryRecorder,
        default_timeout: Option<Duration>,
    ) -> Self {
        Self {
            registry,
            context,
            recorder,
            default_timeout,
        }
    }

    pub fn context(&self) -> &ExecutionContext {
        &self.context
    }

    pub fn recorder(&self) -> &HistoryRecorder {
        &self.recorder
    }

    /// Attempt a task exactly once and record the outcome
    pub async fn run_task(&self, task: &TaskDescriptor) -> ExecutionResult {
        let result = self.invoke(task).await;
        self.recorder.record(result.clone()).await;
        result
    }

    /// Record a task as skipped without attempting it
    pub async fn skip_task(&self, task_id: &str, reason: SkipReason) -> ExecutionResult {
        warn!("Skipping task {}: {}", task_id, reason);
        let result = ExecutionResult::skipped(task_id, reason);
        self.recorder.record(result.clone()).await;
        result
    }

    pub async fn record(&self, result: ExecutionResult) {
        self.recorder.record(result).await;
    }

    /// First declared dependency whose recorded status is not success
    pub async fn unsuccessful_dependency(&self, task: &TaskDescriptor) -> Option<String> {
        for dependency in &task.dependencies {
            if self.recorder.status_of(dependency).await != Some(TaskStatus::Success) {
                return Some(dependency.clone());
            }
        }
        None
    }

    async fn invoke(&self, task: &TaskDescriptor) -> ExecutionResult {
        let worker = match self.registry.resolve(task) {
            Ok(worker) => worker,
            Err(err) => {
                return ExecutionResult::failed(&task.id, err.to_string(), None, Duration::ZERO);
            }
        };

        let snapshot = self.context.snapshot().await;
        let inputs = task.effective_inputs(&snapshot);

        debug!(
            "Executing task: {} ({}.{})",
            task.id, task.worker_category, task.operation
        );

        let started_at = Utc::now();
        let clock = Instant::now();
        let call = AssertUnwindSafe(worker.invoke(&task.operation, inputs)).catch_unwind();

        let outcome = match task.timeout.or(self.default_timeout) {
            Some(limit) => match timeout(limit, call).await {
                Ok(outcome) => outcome.map_err(panic_message),
                Err(_) => {
                    let result = ExecutionResult::failed(
                        &task.id,
                        format!("Task timed out after {:?}", limit),
                        Some(started_at),
                        clock.elapsed(),
                    );
                    warn!("Task {} timed out after {:?}", task.id, limit);
                    return result;
                }
            },
            None => call.await.map_err(panic_message),
        };
        let elapsed = clock.elapsed();

        match outcome {
            Ok(Ok(outputs)) => {
                if let Err(err) = self.context.record(&task.id, outputs.clone()).await {
                    error!("Task {} output rejected: {}", task.id, err);
                    return ExecutionResult::failed(
                        &task.id,
                        err.to_string(),
                        Some(started_at),
                        elapsed,
                    );
                }
                info!("Task {} completed successfully in {:?}", task.id, elapsed);
                ExecutionResult::success(&task.id, outputs, started_at, elapsed)
            }
            Ok(Err(worker_error)) => {
                warn!("Task {} failed: {}", task.id, worker_error);
                ExecutionResult::failed(&task.id, worker_error.message, Some(started_at), elapsed)
            }
            Err(message) => {
                error!("Task {} worker panicked: {}", task.id, message);
                ExecutionResult::failed(
                    &task.id,
                    format!("Worker panicked: {}", message),
                    Some(started_at),
                    elapsed,
                )
            }
        }
    }
}

pub(crate) fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
