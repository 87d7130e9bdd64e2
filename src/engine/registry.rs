// ABOUTME: Worker registry resolving (category, operation) pairs to invocable workers
// ABOUTME: Boundary across which the orchestrator delegates to external collaborators

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;

use super::error::{OrchestratorError, Result, WorkerError};
use super::task::{TaskData, TaskDescriptor};

pub type WorkerResult = std::result::Result<TaskData, WorkerError>;

/// A collaborator that performs the actual work of a task.
#[async_trait]
pub trait Worker: Send + Sync {
    async fn invoke(&self, operation: &str, inputs: TaskData) -> WorkerResult;
}

/// Adapts an async closure taking the merged inputs into a [`Worker`].
pub struct FnWorker<F> {
    func: F,
}

impl<F> FnWorker<F> {
    pub fn new(func: F) -> Self {
        Self { func }
    }
}

#[async_trait]
impl<F, Fut> Worker for FnWorker<F>
where
    F: Fn(TaskData) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = WorkerResult> + Send + 'static,
{
    async fn invoke(&self, _operation: &str, inputs: TaskData) -> WorkerResult {
        (self.func)(inputs).await
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct WorkerKey {
    category: String,
    operation: String,
}

#[derive(Default)]
pub struct WorkerRegistry {
    workers: BTreeMap<WorkerKey, Arc<dyn Worker>>,
}

impl WorkerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind one operation of a category to a worker, replacing any previous binding
    pub fn register(
        &mut self,
        category: impl Into<String>,
        operation: impl Into<String>,
        worker: Arc<dyn Worker>,
    ) -> &mut Self {
        self.workers.insert(
            WorkerKey {
                category: category.into(),
                operation: operation.into(),
            },
            worker,
        );
        self
    }

    /// Bind several operations of one category to the same worker
    pub fn register_family(
        &mut self,
        category: &str,
        operations: &[&str],
        worker: Arc<dyn Worker>,
    ) -> &mut Self {
        for operation in operations {
            self.register(category, *operation, Arc::clone(&worker));
        }
        self
    }

    pub fn register_fn<F, Fut>(
        &mut self,
        category: impl Into<String>,
        operation: impl Into<String>,
        func: F,
    ) -> &mut Self
    where
        F: Fn(TaskData) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = WorkerResult> + Send + 'static,
    {
        self.register(category, operation, Arc::new(FnWorker::new(func)))
    }

    pub fn get(&self, category: &str, operation: &str) -> Option<Arc<dyn Worker>> {
        self.workers
            .get(&WorkerKey {
                category: category.to_string(),
                operation: operation.to_string(),
            })
            .cloned()
    }

    /// Resolve the worker bound to a task's category and operation
    pub fn resolve(&self, task: &TaskDescriptor) -> Result<Arc<dyn Worker>> {
        self.get(&task.worker_category, &task.operation)
            .ok_or_else(|| OrchestratorError::UnknownOperation {
                task_id: task.id.clone(),
                category: task.worker_category.clone(),
                operation: task.operation.clone(),
            })
    }

    /// Check every task resolves before anything runs
    pub fn validate(&self, tasks: &[TaskDescriptor]) -> Result<()> {
        for task in tasks {
            self.resolve(task)?;
        }
        Ok(())
    }

    pub fn contains(&self, category: &str, operation: &str) -> bool {
        self.get(category, operation).is_some()
    }

    /// Registered (category, operation) pairs, sorted
    pub fn operations(&self) -> Vec<(&str, &str)> {
        self.workers
            .keys()
            .map(|key| (key.category.as_str(), key.operation.as_str()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.workers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }
}

impl std::fmt::Debug for WorkerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerRegistry")
            .field("operations", &self.operations())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Inventory;

    #[async_trait]
    impl Worker for Inventory {
        async fn invoke(&self, operation: &str, inputs: TaskData) -> WorkerResult {
            let stock = inputs.get("stock").and_then(|v| v.as_i64()).unwrap_or(0);
            let mut out = TaskData::new();
            match operation {
                "double" => out.insert("stock".to_string(), json!(stock * 2)),
                "reset" => out.insert("stock".to_string(), json!(0)),
                other => return Err(WorkerError::new(format!("unsupported: {}", other))),
            };
            Ok(out)
        }
    }

    #[tokio::test]
    async fn test_register_and_resolve_closure() {
        let mut registry = WorkerRegistry::new();
        registry.register_fn("messaging", "notify", |inputs| async move {
            let mut out = TaskData::new();
            out.insert("sent".to_string(), json!(inputs.len()));
            Ok(out)
        });

        let task = TaskDescriptor::new("n", "messaging", "notify").with_input("to", "ops");
        let worker = registry.resolve(&task).unwrap();
        let out = worker.invoke("notify", task.inputs.clone()).await.unwrap();
        assert_eq!(out.get("sent"), Some(&json!(1)));
    }

    #[tokio::test]
    async fn test_family_shares_worker_across_operations() {
        let mut registry = WorkerRegistry::new();
        registry.register_family("inventory", &["double", "reset"], Arc::new(Inventory));

        assert_eq!(registry.len(), 2);
        assert_eq!(
            registry.operations(),
            vec![("inventory", "double"), ("inventory", "reset")]
        );

        let mut inputs = TaskData::new();
        inputs.insert("stock".to_string(), json!(21));
        let worker = registry.get("inventory", "double").unwrap();
        let out = worker.invoke("double", inputs).await.unwrap();
        assert_eq!(out.get("stock"), Some(&json!(42)));
    }

    #[test]
    fn test_unknown_operation() {
        let registry = WorkerRegistry::new();
        let task = TaskDescriptor::new("f", "forecasting", "predict");

        let err = registry.validate(&[task]).unwrap_err();
        assert_eq!(
            err,
            OrchestratorError::UnknownOperation {
                task_id: "f".to_string(),
                category: "forecasting".to_string(),
                operation: "predict".to_string(),
            }
        );
        assert!(!registry.contains("forecasting", "predict"));
        assert!(registry.is_empty());
    }
}
