// ABOUTME: Task descriptor definitions for orchestrated units of work
// ABOUTME: Declares worker binding, inputs, dependencies, optional predicate and timeout

use indexmap::IndexMap;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use super::context::ContextSnapshot;

/// String-keyed mapping used for task inputs and outputs.
pub type TaskData = IndexMap<String, Value>;

/// Eligibility gate evaluated against the execution context. Must be pure.
pub type Predicate = Arc<dyn Fn(&ContextSnapshot) -> bool + Send + Sync>;

/// Immutable declaration of one unit of work.
#[derive(Clone)]
pub struct TaskDescriptor {
    pub id: String,
    pub worker_category: String,
    pub operation: String,
    pub inputs: TaskData,
    pub dependencies: Vec<String>,
    pub predicate: Option<Predicate>,
    pub timeout: Option<Duration>,
}

impl TaskDescriptor {
    pub fn new(
        id: impl Into<String>,
        worker_category: impl Into<String>,
        operation: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            worker_category: worker_category.into(),
            operation: operation.into(),
            inputs: TaskData::new(),
            dependencies: Vec::new(),
            predicate: None,
            timeout: None,
        }
    }

    pub fn with_input(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.inputs.insert(key.into(), value.into());
        self
    }

    pub fn with_inputs(mut self, inputs: TaskData) -> Self {
        self.inputs.extend(inputs);
        self
    }

    pub fn depends_on(mut self, task_id: impl Into<String>) -> Self {
        self.dependencies.push(task_id.into());
        self
    }

    pub fn with_dependencies<I, S>(mut self, task_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependencies.extend(task_ids.into_iter().map(Into::into));
        self
    }

    pub fn with_predicate<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&ContextSnapshot) -> bool + Send + Sync + 'static,
    {
        self.predicate = Some(Arc::new(predicate));
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Evaluate the predicate; absence means always eligible
    pub fn is_eligible(&self, snapshot: &ContextSnapshot) -> bool {
        match &self.predicate {
            Some(predicate) => predicate(snapshot),
            None => true,
        }
    }

    pub fn has_predicate(&self) -> bool {
        self.predicate.is_some()
    }

    /// Declared inputs overlaid with dependency outputs. Dependencies are
    /// applied in declaration order, so the last declared one wins a key clash.
    pub fn effective_inputs(&self, snapshot: &ContextSnapshot) -> TaskData {
        let mut merged = self.inputs.clone();
        for dependency in &self.dependencies {
            if let Some(outputs) = snapshot.get(dependency) {
                for (key, value) in outputs {
                    merged.insert(key.clone(), value.clone());
                }
            }
        }
        merged
    }
}

impl fmt::Debug for TaskDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskDescriptor")
            .field("id", &self.id)
            .field("worker_category", &self.worker_category)
            .field("operation", &self.operation)
            .field("inputs", &self.inputs)
            .field("dependencies", &self.dependencies)
            .field("predicate", &self.predicate.as_ref().map(|_| "<fn>"))
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn data(pairs: &[(&str, Value)]) -> TaskData {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_builder() {
        let task = TaskDescriptor::new("report", "reporting", "export")
            .with_input("format", "csv")
            .depends_on("forecast")
            .with_dependencies(["inventory"])
            .with_timeout(Duration::from_secs(5));

        assert_eq!(task.id, "report");
        assert_eq!(task.inputs.get("format"), Some(&json!("csv")));
        assert_eq!(task.dependencies, vec!["forecast", "inventory"]);
        assert!(!task.has_predicate());
        assert_eq!(task.timeout, Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_effective_inputs_precedence() {
        let snapshot = ContextSnapshot::from_entries(vec![
            ("a".to_string(), data(&[("shared", json!("from_a")), ("a_only", json!(1))])),
            ("b".to_string(), data(&[("shared", json!("from_b"))])),
        ]);

        let task = TaskDescriptor::new("c", "util", "noop")
            .with_input("shared", "declared")
            .with_input("own", true)
            .with_dependencies(["a", "b"]);

        let merged = task.effective_inputs(&snapshot);
        assert_eq!(merged.get("shared"), Some(&json!("from_b")));
        assert_eq!(merged.get("a_only"), Some(&json!(1)));
        assert_eq!(merged.get("own"), Some(&json!(true)));
    }

    #[test]
    fn test_predicate_default_and_custom() {
        let snapshot = ContextSnapshot::default();
        let plain = TaskDescriptor::new("x", "util", "noop");
        assert!(plain.is_eligible(&snapshot));

        let gated = plain.clone().with_predicate(|ctx| ctx.contains("missing"));
        assert!(!gated.is_eligible(&snapshot));
        assert!(format!("{:?}", gated).contains("<fn>"));
    }
}
