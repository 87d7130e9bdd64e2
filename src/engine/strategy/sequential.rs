// ABOUTME: Sequential chain execution, one task at a time in dependency order
// ABOUTME: The first failure halts the chain and skips every task not yet attempted

use async_trait::async_trait;
use tracing::{debug, warn};

use super::{ExecutionStrategy, Strategy, TaskTable};
use crate::engine::dependency::ExecutionPlan;
use crate::engine::result::SkipReason;
use crate::engine::runtime::TaskRuntime;

pub struct SequentialStrategy;

#[async_trait]
impl ExecutionStrategy for SequentialStrategy {
    fn kind(&self) -> Strategy {
        Strategy::Sequential
    }

    async fn execute(&self, tasks: &TaskTable, plan: &ExecutionPlan, runtime: &TaskRuntime) {
        for (position, task_id) in plan.order.iter().enumerate() {
            let Some(task) = tasks.get(task_id) else {
                continue;
            };

            if task.has_predicate() {
                debug!("Ignoring predicate of task {} under sequential strategy", task_id);
            }

            let result = runtime.run_task(task).await;
            if result.is_successful() {
                continue;
            }

            warn!(
                "Task {} failed, halting chain with {} tasks remaining",
                task_id,
                plan.order.len() - position - 1
            );
            for remaining in &plan.order[position + 1..] {
                runtime
                    .skip_task(
                        remaining,
                        SkipReason::UpstreamFailed {
                            task_id: task_id.clone(),
                        },
                    )
                    .await;
            }
            return;
        }
    }
}
