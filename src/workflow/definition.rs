// ABOUTME: YAML workflow definition structures and their conversion into task descriptors
// ABOUTME: Defines the document format, parser entry points, and structural checks

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;
use tokio::fs;
use tracing::warn;

use super::condition::Condition;
use super::error::{Result, WorkflowError};
use crate::engine::{Strategy, TaskData, TaskDescriptor};

fn default_version() -> String {
    "1.0".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowDefinition {
    pub name: String,
    pub description: Option<String>,
    #[serde(default = "default_version")]
    pub version: String,
    /// Strategy used when the caller does not pick one
    #[serde(default)]
    pub strategy: Option<Strategy>,
    pub tasks: Vec<TaskSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskSpec {
    pub id: String,
    pub description: Option<String>,
    #[serde(alias = "category")]
    pub worker: String,
    pub operation: String,
    #[serde(default)]
    pub inputs: TaskData,
    #[serde(default, alias = "dependencies")]
    pub depends_on: Vec<String>,
    pub when: Option<String>,
    #[serde(with = "humantime_serde", default)]
    pub timeout: Option<Duration>,
}

impl WorkflowDefinition {
    /// Parse workflow from YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&content)
    }

    /// Parse workflow from YAML string
    pub fn from_yaml(content: &str) -> Result<Self> {
        let workflow: WorkflowDefinition = serde_yaml::from_str(content)?;
        workflow.validate_structure()?;
        Ok(workflow)
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Field-level checks. Graph problems (duplicate ids, unknown
    /// dependencies, cycles) are left to the orchestrator.
    fn validate_structure(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(WorkflowError::MissingField("name".to_string()));
        }

        for task in &self.tasks {
            let invalid = |reason: &str| WorkflowError::InvalidTask {
                task: task.id.clone(),
                reason: reason.to_string(),
            };
            if task.id.trim().is_empty() {
                return Err(invalid("id cannot be empty"));
            }
            if task.worker.trim().is_empty() {
                return Err(invalid("worker cannot be empty"));
            }
            if task.operation.trim().is_empty() {
                return Err(invalid("operation cannot be empty"));
            }
        }

        Ok(())
    }

    /// Compile every task into a descriptor, parsing `when` conditions
    pub fn into_tasks(self) -> Result<Vec<TaskDescriptor>> {
        self.tasks.into_iter().map(TaskSpec::into_descriptor).collect()
    }

    pub fn task_ids(&self) -> Vec<&str> {
        self.tasks.iter().map(|task| task.id.as_str()).collect()
    }

    pub fn get_task(&self, task_id: &str) -> Option<&TaskSpec> {
        self.tasks.iter().find(|task| task.id == task_id)
    }

    /// Strategy to run with: explicit choice, then the document's, then the default
    pub fn resolve_strategy(&self, requested: Option<Strategy>) -> Strategy {
        requested.or(self.strategy).unwrap_or_default()
    }
}

impl TaskSpec {
    pub fn into_descriptor(self) -> Result<TaskDescriptor> {
        let mut descriptor = TaskDescriptor::new(&self.id, self.worker, self.operation)
            .with_inputs(self.inputs)
            .with_dependencies(self.depends_on);

        if let Some(expression) = &self.when {
            let condition = Condition::parse(expression)?;
            let declared: HashSet<&str> =
                descriptor.dependencies.iter().map(String::as_str).collect();
            if !declared.contains(condition.task_id.as_str()) {
                warn!(
                    "Condition of task '{}' reads '{}', which is not among its dependencies",
                    self.id, condition.task_id
                );
            }
            descriptor.predicate = Some(condition.into_predicate());
        }

        if let Some(timeout) = self.timeout {
            descriptor = descriptor.with_timeout(timeout);
        }

        Ok(descriptor)
    }
}

/// Loads workflow documents from disk
#[derive(Debug, Default)]
pub struct WorkflowParser;

impl WorkflowParser {
    pub fn new() -> Self {
        Self
    }

    pub async fn parse_file<P: AsRef<Path>>(&self, path: P) -> Result<WorkflowDefinition> {
        let content = fs::read_to_string(path.as_ref()).await?;
        self.parse_str(&content)
    }

    pub fn parse_str(&self, content: &str) -> Result<WorkflowDefinition> {
        WorkflowDefinition::from_yaml(content)
    }
}
