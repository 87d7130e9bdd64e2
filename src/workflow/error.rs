// ABOUTME: Error types for loading declarative workflow documents
// ABOUTME: Covers IO, YAML syntax, structural problems, and malformed conditions

use thiserror::Error;

#[derive(Error, Debug)]
pub enum WorkflowError {
    #[error("Failed to read workflow file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid task '{task}': {reason}")]
    InvalidTask { task: String, reason: String },

    #[error("Invalid condition '{expression}': {reason}")]
    InvalidCondition { expression: String, reason: String },
}

pub type Result<T> = std::result::Result<T, WorkflowError>;
