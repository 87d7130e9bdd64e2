// ABOUTME: Conditional execution gating each task on a predicate over the context
// ABOUTME: Tasks run one at a time in dependency order; false predicates skip for good

use async_trait::async_trait;
use std::panic::{self, AssertUnwindSafe};
use std::time::Duration;
use tracing::{debug, error};

use super::{ExecutionStrategy, Strategy, TaskTable};
use crate::engine::dependency::ExecutionPlan;
use crate::engine::result::{ExecutionResult, SkipReason};
use crate::engine::runtime::{panic_message, TaskRuntime};

pub struct ConditionalStrategy;

#[async_trait]
impl ExecutionStrategy for ConditionalStrategy {
    fn kind(&self) -> Strategy {
        Strategy::Conditional
    }

    async fn execute(&self, tasks: &TaskTable, plan: &ExecutionPlan, runtime: &TaskRuntime) {
        for task_id in &plan.order {
            let Some(task) = tasks.get(task_id) else {
                continue;
            };

            if let Some(dependency) = runtime.unsuccessful_dependency(task).await {
                runtime
                    .skip_task(task_id, SkipReason::UpstreamFailed { task_id: dependency })
                    .await;
                continue;
            }

            // Evaluated exactly once, against the context as it stands now
            let snapshot = runtime.context().snapshot().await;
            let eligible = panic::catch_unwind(AssertUnwindSafe(|| task.is_eligible(&snapshot)));

            match eligible {
                Ok(true) => {
                    debug!("Condition met for task {}", task_id);
                    runtime.run_task(task).await;
                }
                Ok(false) => {
                    runtime.skip_task(task_id, SkipReason::ConditionNotMet).await;
                }
                Err(payload) => {
                    let message = panic_message(payload);
                    error!("Predicate of task {} panicked: {}", task_id, message);
                    runtime
                        .record(ExecutionResult::failed(
                            task_id,
                            format!("Predicate panicked: {}", message),
                            None,
                            Duration::ZERO,
                        ))
                        .await;
                }
            }
        }
    }
}
