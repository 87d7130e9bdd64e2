// ABOUTME: Declarative workflow documents compiled into task descriptors
// ABOUTME: Exports the YAML definition types, parser, and condition language

pub mod condition;
pub mod definition;
pub mod error;

pub use condition::{CompareOp, Condition};
pub use definition::{TaskSpec, WorkflowDefinition, WorkflowParser};
pub use error::{Result, WorkflowError};
