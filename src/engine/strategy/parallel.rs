// ABOUTME: Wave-based parallel execution on a bounded worker pool
// ABOUTME: Failures only prune their dependents; siblings always run to completion

use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, info};

use super::{ExecutionStrategy, Strategy, TaskTable};
use crate::engine::dependency::ExecutionPlan;
use crate::engine::result::{ExecutionResult, SkipReason};
use crate::engine::runtime::TaskRuntime;
use crate::engine::scheduler::TaskScheduler;

pub struct ParallelStrategy {
    scheduler: TaskScheduler,
}

impl ParallelStrategy {
    pub fn new(max_concurrent: usize) -> Self {
        Self {
            scheduler: TaskScheduler::new(max_concurrent),
        }
    }
}

#[async_trait]
impl ExecutionStrategy for ParallelStrategy {
    fn kind(&self) -> Strategy {
        Strategy::Parallel
    }

    async fn execute(&self, tasks: &TaskTable, plan: &ExecutionPlan, runtime: &TaskRuntime) {
        for (wave_number, wave) in plan.waves.iter().enumerate() {
            let mut dispatch = Vec::with_capacity(wave.len());

            for task_id in wave {
                let Some(task) = tasks.get(task_id) else {
                    continue;
                };
                if let Some(dependency) = runtime.unsuccessful_dependency(task).await {
                    runtime
                        .skip_task(task_id, SkipReason::UpstreamFailed { task_id: dependency })
                        .await;
                    continue;
                }
                if task.has_predicate() {
                    debug!("Ignoring predicate of task {} under parallel strategy", task_id);
                }
                dispatch.push(task.clone());
            }

            info!(
                "Executing wave {}/{} with {} tasks",
                wave_number + 1,
                plan.waves.len(),
                dispatch.len()
            );

            let wave_runtime = runtime.clone();
            let outcomes = self
                .scheduler
                .execute_wave(dispatch, move |task| {
                    let runtime = wave_runtime.clone();
                    async move { runtime.run_task(&task).await }
                })
                .await;

            // Only a task whose spawned body never returned is missing here
            for (task_id, outcome) in outcomes {
                if let Err(err) = outcome {
                    runtime
                        .record(ExecutionResult::failed(
                            task_id,
                            err.to_string(),
                            None,
                            Duration::ZERO,
                        ))
                        .await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::context::ExecutionContext;
    use crate::engine::dependency::DependencyGraph;
    use crate::engine::error::WorkerError;
    use crate::engine::events::EventPublisher;
    use crate::engine::registry::WorkerRegistry;
    use crate::engine::result::{ExecutionHistory, TaskStatus};
    use crate::engine::runtime::HistoryRecorder;
    use crate::engine::task::TaskDescriptor;
    use std::sync::Arc;

    async fn run(tasks: Vec<TaskDescriptor>, max_concurrent: usize) -> ExecutionHistory {
        let mut registry = WorkerRegistry::new();
        registry.register_fn("util", "ok", |inputs| async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            Ok(inputs)
        });
        registry.register_fn("util", "fail", |_inputs| async move {
            tokio::time::sleep(Duration::from_millis(5)).await;
            Err(WorkerError::new("boom"))
        });

        let plan = DependencyGraph::from_tasks(&tasks)
            .unwrap()
            .create_execution_plan();
        let recorder = HistoryRecorder::new(
            ExecutionHistory::new("run", Strategy::Parallel),
            EventPublisher::default(),
        );
        let runtime = TaskRuntime::new(
            Arc::new(registry),
            ExecutionContext::new(),
            recorder.clone(),
            None,
        );
        let table: TaskTable = tasks.into_iter().map(|t| (t.id.clone(), t)).collect();

        ParallelStrategy::new(max_concurrent)
            .execute(&table, &plan, &runtime)
            .await;
        recorder.finish().await
    }

    #[tokio::test]
    async fn test_failed_dependency_prunes_only_dependents() {
        let history = run(
            vec![
                TaskDescriptor::new("a", "util", "ok"),
                TaskDescriptor::new("b", "util", "fail"),
                TaskDescriptor::new("c", "util", "ok").with_dependencies(["a", "b"]),
                TaskDescriptor::new("d", "util", "ok").depends_on("a"),
                TaskDescriptor::new("e", "util", "ok").depends_on("c"),
            ],
            4,
        )
        .await;

        assert_eq!(history.len(), 5);
        assert_eq!(history.status_of("a"), Some(TaskStatus::Success));
        assert_eq!(history.status_of("b"), Some(TaskStatus::Failed));
        assert_eq!(history.status_of("d"), Some(TaskStatus::Success));

        let c = history.get("c").unwrap();
        assert_eq!(c.status, TaskStatus::Skipped);
        assert_eq!(c.error.as_deref(), Some("upstream task failed: b"));

        let e = history.get("e").unwrap();
        assert_eq!(
            e.skip_reason,
            Some(SkipReason::UpstreamFailed {
                task_id: "c".to_string()
            })
        );
    }

    #[tokio::test]
    async fn test_single_slot_pool_still_completes() {
        let tasks = (0..4)
            .map(|i| TaskDescriptor::new(format!("t{}", i), "util", "ok"))
            .collect();
        let history = run(tasks, 1).await;
        assert_eq!(history.succeeded().len(), 4);
    }

    #[tokio::test]
    async fn test_pool_size_bounds_in_flight_workers() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let mut registry = WorkerRegistry::new();
        {
            let in_flight = Arc::clone(&in_flight);
            let peak = Arc::clone(&peak);
            registry.register_fn("util", "ok", move |inputs| {
                let in_flight = Arc::clone(&in_flight);
                let peak = Arc::clone(&peak);
                async move {
                    let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    in_flight.fetch_sub(1, Ordering::SeqCst);
                    Ok(inputs)
                }
            });
        }

        let tasks: Vec<TaskDescriptor> = (0..6)
            .map(|i| TaskDescriptor::new(format!("t{}", i), "util", "ok"))
            .collect();
        let plan = DependencyGraph::from_tasks(&tasks)
            .unwrap()
            .create_execution_plan();
        let recorder = HistoryRecorder::new(
            ExecutionHistory::new("run", Strategy::Parallel),
            EventPublisher::default(),
        );
        let runtime = TaskRuntime::new(
            Arc::new(registry),
            ExecutionContext::new(),
            recorder.clone(),
            None,
        );
        let table: TaskTable = tasks.into_iter().map(|t| (t.id.clone(), t)).collect();

        ParallelStrategy::new(2)
            .execute(&table, &plan, &runtime)
            .await;

        let history = recorder.finish().await;
        assert_eq!(history.succeeded().len(), 6);
        assert_eq!(peak.load(Ordering::SeqCst), 2);
        assert_eq!(in_flight.load(Ordering::SeqCst), 0);
    }
}
