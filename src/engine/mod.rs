// ABOUTME: Task graph orchestration engine
// ABOUTME: Handles graph validation, worker dispatch, execution strategies, and result history

pub mod config;
pub mod context;
pub mod dependency;
pub mod error;
pub mod events;
pub mod orchestrator;
pub mod registry;
pub mod result;
pub mod runtime;
pub mod scheduler;
pub mod strategy;
pub mod task;

pub use config::OrchestratorConfig;
pub use context::{ContextSnapshot, ExecutionContext};
pub use dependency::{DependencyGraph, ExecutionPlan};
pub use error::{ExecutionError, OrchestratorError, Result, WorkerError};
pub use events::{EventPublisher, TaskEvent};
pub use orchestrator::Orchestrator;
pub use registry::{FnWorker, Worker, WorkerRegistry, WorkerResult};
pub use result::{
    ExecutionHistory, ExecutionResult, HistoryStatus, HistorySummary, SkipReason, TaskStatus,
};
pub use scheduler::TaskScheduler;
pub use strategy::{ExecutionStrategy, Strategy};
pub use task::{Predicate, TaskData, TaskDescriptor};
