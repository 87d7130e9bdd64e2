// ABOUTME: Error types for the orchestrator engine
// ABOUTME: Separates configuration errors that abort a run from runtime faults captured per task

use thiserror::Error;

/// Configuration-level errors. Any of these aborts an invocation before a
/// single worker is invoked, and no history is produced.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OrchestratorError {
    #[error("Empty workflow: no tasks supplied")]
    EmptyWorkflow,

    #[error("Duplicate task id: {task_id}")]
    DuplicateTaskId { task_id: String },

    #[error("Task '{task}' depends on unknown task '{dependency}'")]
    UnknownDependency { task: String, dependency: String },

    #[error("Circular dependency detected: {tasks:?}")]
    CycleDetected { tasks: Vec<String> },

    #[error("Unknown operation '{operation}' in worker category '{category}' (task '{task_id}')")]
    UnknownOperation {
        task_id: String,
        category: String,
        operation: String,
    },
}

impl OrchestratorError {
    /// Task ids named by this error, for diagnostics
    pub fn tasks(&self) -> Vec<String> {
        match self {
            OrchestratorError::EmptyWorkflow => Vec::new(),
            OrchestratorError::DuplicateTaskId { task_id } => vec![task_id.clone()],
            OrchestratorError::UnknownDependency { task, .. } => vec![task.clone()],
            OrchestratorError::CycleDetected { tasks } => tasks.clone(),
            OrchestratorError::UnknownOperation { task_id, .. } => vec![task_id.clone()],
        }
    }
}

/// Faults raised while a run is in progress. These never escape `execute`;
/// they are folded into the failed result of the task they concern.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExecutionError {
    #[error("Execution context already holds outputs for task '{task_id}'")]
    ContextOverwrite { task_id: String },

    #[error("Execution history already holds a result for task '{task_id}'")]
    DuplicateResult { task_id: String },

    #[error("Worker for task '{task_id}' panicked: {message}")]
    WorkerPanicked { task_id: String, message: String },
}

/// Failure reported by a worker callable for its own task.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct WorkerError {
    pub message: String,
}

impl WorkerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<String> for WorkerError {
    fn from(message: String) -> Self {
        Self { message }
    }
}

impl From<&str> for WorkerError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

impl From<serde_json::Error> for WorkerError {
    fn from(err: serde_json::Error) -> Self {
        Self::new(format!("invalid worker data: {}", err))
    }
}

pub type Result<T> = std::result::Result<T, OrchestratorError>;
