// ABOUTME: Public orchestrator facade validating task graphs and driving strategies
// ABOUTME: Produces one execution history per invocation and keeps the latest for diagnostics

use indexmap::IndexMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tracing::{error, info, instrument, warn};

use super::config::OrchestratorConfig;
use super::context::ExecutionContext;
use super::dependency::{DependencyGraph, ExecutionPlan};
use super::error::Result;
use super::events::{EventPublisher, TaskEvent};
use super::registry::WorkerRegistry;
use super::result::{ExecutionHistory, ExecutionResult};
use super::runtime::{HistoryRecorder, TaskRuntime};
use super::strategy::{Strategy, TaskTable};
use super::task::TaskDescriptor;

pub struct Orchestrator {
    registry: Arc<WorkerRegistry>,
    config: OrchestratorConfig,
    events: EventPublisher,
    runs: AtomicU64,
    current: RwLock<Option<HistoryRecorder>>,
    // Tagged with the start sequence so an older run finishing late never wins
    last: RwLock<Option<(u64, ExecutionHistory)>>,
}

impl Orchestrator {
    /// Create an orchestrator owning a fully populated registry
    pub fn new(registry: WorkerRegistry) -> Self {
        Self::with_config(registry, OrchestratorConfig::default())
    }

    pub fn with_config(registry: WorkerRegistry, config: OrchestratorConfig) -> Self {
        let events = EventPublisher::new(config.event_capacity);
        Self {
            registry: Arc::new(registry),
            config,
            events,
            runs: AtomicU64::new(0),
            current: RwLock::new(None),
            last: RwLock::new(None),
        }
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    pub fn registry(&self) -> &WorkerRegistry {
        &self.registry
    }

    /// Check a task list without running it
    pub fn validate(&self, tasks: &[TaskDescriptor]) -> Result<ExecutionPlan> {
        let graph = DependencyGraph::from_tasks(tasks)?;
        self.registry.validate(tasks)?;
        Ok(graph.create_execution_plan())
    }

    /// Run a task list to completion under the chosen strategy.
    ///
    /// Returns `Err` only for configuration problems, in which case no task
    /// was attempted. Task failures are reported inside the history.
    #[instrument(skip_all, fields(strategy = %strategy, tasks = tasks.len()))]
    pub async fn execute(
        &self,
        tasks: Vec<TaskDescriptor>,
        strategy: Strategy,
    ) -> Result<ExecutionHistory> {
        let plan = self.validate(&tasks).map_err(|err| {
            warn!("Rejecting workflow: {}", err);
            err
        })?;

        let sequence = self.runs.fetch_add(1, Ordering::SeqCst);
        let run_id = uuid::Uuid::new_v4().to_string();
        info!(
            "Starting run {} ({} strategy): {} tasks, {} waves, max parallelism {}",
            run_id,
            strategy,
            plan.total_tasks,
            plan.depth(),
            plan.max_parallelism()
        );

        let recorder = HistoryRecorder::new(
            ExecutionHistory::new(run_id.clone(), strategy),
            self.events.clone(),
        );
        *self.current.write().await = Some(recorder.clone());

        let runtime = TaskRuntime::new(
            Arc::clone(&self.registry),
            ExecutionContext::new(),
            recorder.clone(),
            self.config.default_timeout,
        );
        let table: TaskTable = tasks
            .into_iter()
            .map(|task| (task.id.clone(), task))
            .collect::<IndexMap<_, _>>();

        strategy
            .build(&self.config)
            .execute(&table, &plan, &runtime)
            .await;

        for task_id in &plan.order {
            if !recorder.contains(task_id).await {
                error!("Task {} finished the run without a result", task_id);
                runtime
                    .record(ExecutionResult::failed(
                        task_id,
                        "Task was never dispatched",
                        None,
                        std::time::Duration::ZERO,
                    ))
                    .await;
            }
        }

        let history = recorder.finish().await;
        {
            let mut last = self.last.write().await;
            let newer = match last.as_ref() {
                Some((stored, _)) => sequence >= *stored,
                None => true,
            };
            if newer {
                *last = Some((sequence, history.clone()));
            }
        }

        let summary = history.summary();
        info!(
            "Run {} finished with status {}: {} succeeded, {} failed, {} skipped",
            run_id,
            history.status(),
            summary.successful_tasks,
            summary.failed_tasks,
            summary.skipped_tasks
        );

        Ok(history)
    }

    /// History of the most recently started invocation that has completed.
    /// When runs overlap, a run that started earlier but finished later does
    /// not replace it.
    pub async fn last_history(&self) -> Option<ExecutionHistory> {
        self.last
            .read()
            .await
            .as_ref()
            .map(|(_, history)| history.clone())
    }

    /// Snapshot of the most recently started invocation, finished or not
    pub async fn progress(&self) -> Option<ExecutionHistory> {
        let current = self.current.read().await.clone();
        match current {
            Some(recorder) => Some(recorder.snapshot().await),
            None => None,
        }
    }

    /// Receive an event for each result as it is recorded
    pub fn subscribe(&self) -> broadcast::Receiver<TaskEvent> {
        self.events.subscribe()
    }
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("registry", &self.registry)
            .field("config", &self.config)
            .finish()
    }
}
