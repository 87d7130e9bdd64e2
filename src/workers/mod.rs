// ABOUTME: Built-in worker implementations shipped with the taskgraph binary
// ABOUTME: Registers the `builtin` category so workflow files can run without custom code

pub mod builtin;

use std::sync::Arc;

use crate::engine::WorkerRegistry;

pub use builtin::BuiltinWorker;

pub const BUILTIN_CATEGORY: &str = "builtin";

pub const BUILTIN_OPERATIONS: [&str; 4] = ["echo", "sum", "fail", "sleep"];

/// Register every built-in operation under the `builtin` category
pub fn register_builtins(registry: &mut WorkerRegistry) -> &mut WorkerRegistry {
    registry.register_family(
        BUILTIN_CATEGORY,
        &BUILTIN_OPERATIONS,
        Arc::new(BuiltinWorker),
    )
}

/// A registry holding only the built-in workers
pub fn builtin_registry() -> WorkerRegistry {
    let mut registry = WorkerRegistry::new();
    register_builtins(&mut registry);
    registry
}
