// ABOUTME: Main library module for the taskgraph orchestrator
// ABOUTME: Exports the engine, declarative workflows, built-in workers, and CLI glue

pub mod cli;
pub mod engine;
pub mod workers;
pub mod workflow;

// Re-export commonly used types
pub use cli::{App, Args, Config};
pub use engine::{
    ExecutionHistory, ExecutionResult, Orchestrator, OrchestratorConfig, OrchestratorError,
    SkipReason, Strategy, TaskData, TaskDescriptor, TaskStatus, Worker, WorkerError,
    WorkerRegistry,
};
pub use workflow::{WorkflowDefinition, WorkflowParser};

// Error handling
pub type Result<T> = anyhow::Result<T>;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
