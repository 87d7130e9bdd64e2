// ABOUTME: Bounded concurrent dispatch of one wave of tasks
// ABOUTME: Limits in-flight worker bodies with a semaphore and waits for the whole wave

use futures::future::join_all;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, error, info};

use super::error::ExecutionError;
use super::task::TaskDescriptor;

pub struct TaskScheduler {
    max_concurrent: usize,
    semaphore: Arc<Semaphore>,
}

impl TaskScheduler {
    /// Create a scheduler allowing at most `max_concurrent` tasks in flight
    pub fn new(max_concurrent: usize) -> Self {
        let max_concurrent = max_concurrent.max(1);
        Self {
            max_concurrent,
            semaphore: Arc::new(Semaphore::new(max_concurrent)),
        }
    }

    /// Run every task of a wave concurrently and wait for all of them.
    /// A failing or panicking member never cancels its siblings. Outcomes are
    /// returned in the order the tasks were given.
    pub async fn execute_wave<F, Fut, T>(
        &self,
        tasks: Vec<TaskDescriptor>,
        executor_fn: F,
    ) -> Vec<(String, Result<T, ExecutionError>)>
    where
        F: Fn(TaskDescriptor) -> Fut + Send + Sync + Clone + 'static,
        Fut: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        if tasks.is_empty() {
            return Vec::new();
        }

        info!("Dispatching wave of {} tasks", tasks.len());

        let task_ids: Vec<String> = tasks.iter().map(|task| task.id.clone()).collect();
        let handles = tasks.into_iter().map(|task| {
            let semaphore = Arc::clone(&self.semaphore);
            let executor = executor_fn.clone();

            tokio::spawn(async move {
                // The semaphore is owned here and never closed
                let _permit = semaphore.acquire_owned().await.ok();
                debug!("Starting task execution: {}", task.id);
                executor(task).await
            })
        });

        let joined = join_all(handles).await;

        task_ids
            .into_iter()
            .zip(joined)
            .map(|(task_id, joined)| {
                let outcome = joined.map_err(|join_error| {
                    error!("Task {} join error: {}", task_id, join_error);
                    ExecutionError::WorkerPanicked {
                        task_id: task_id.clone(),
                        message: join_error.to_string(),
                    }
                });
                (task_id, outcome)
            })
            .collect()
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }
}
