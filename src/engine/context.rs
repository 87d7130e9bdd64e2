// ABOUTME: Append-only execution context shared by all strategies during a run
// ABOUTME: Stores completed task outputs and hands out consistent snapshots for reads

use indexmap::IndexMap;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::error::ExecutionError;
use super::task::TaskData;

/// Outputs of successfully completed tasks, keyed by task id. Entries are
/// written once and never replaced.
#[derive(Debug, Clone, Default)]
pub struct ExecutionContext {
    outputs: Arc<RwLock<IndexMap<String, Arc<TaskData>>>>,
}

/// Immutable view of the context taken under a single read lock.
#[derive(Debug, Clone, Default)]
pub struct ContextSnapshot {
    outputs: IndexMap<String, Arc<TaskData>>,
}

impl ExecutionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a task's outputs. Fails if the task already has an entry.
    pub async fn record(
        &self,
        task_id: &str,
        outputs: TaskData,
    ) -> std::result::Result<(), ExecutionError> {
        let mut guard = self.outputs.write().await;
        if guard.contains_key(task_id) {
            return Err(ExecutionError::ContextOverwrite {
                task_id: task_id.to_string(),
            });
        }
        guard.insert(task_id.to_string(), Arc::new(outputs));
        Ok(())
    }

    pub async fn snapshot(&self) -> ContextSnapshot {
        let guard = self.outputs.read().await;
        ContextSnapshot {
            outputs: guard.clone(),
        }
    }

    pub async fn get(&self, task_id: &str) -> Option<Arc<TaskData>> {
        let guard = self.outputs.read().await;
        guard.get(task_id).cloned()
    }

    pub async fn contains(&self, task_id: &str) -> bool {
        self.outputs.read().await.contains_key(task_id)
    }

    pub async fn len(&self) -> usize {
        self.outputs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.outputs.read().await.is_empty()
    }
}

impl ContextSnapshot {
    /// Build a snapshot directly, mostly useful for exercising predicates
    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (String, TaskData)>,
    {
        Self {
            outputs: entries
                .into_iter()
                .map(|(id, data)| (id, Arc::new(data)))
                .collect(),
        }
    }

    pub fn get(&self, task_id: &str) -> Option<&TaskData> {
        self.outputs.get(task_id).map(|data| data.as_ref())
    }

    pub fn value(&self, task_id: &str, key: &str) -> Option<&Value> {
        self.get(task_id).and_then(|data| data.get(key))
    }

    /// Resolve a dotted path such as `totals.units` inside a task's outputs.
    /// Numeric segments index into arrays.
    pub fn lookup(&self, task_id: &str, path: &str) -> Option<&Value> {
        let mut segments = path.split('.');
        let first = segments.next()?;
        let mut current = self.value(task_id, first)?;
        for segment in segments {
            current = match current {
                Value::Object(map) => map.get(segment)?,
                Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        Some(current)
    }

    pub fn contains(&self, task_id: &str) -> bool {
        self.outputs.contains_key(task_id)
    }

    pub fn task_ids(&self) -> impl Iterator<Item = &str> {
        self.outputs.keys().map(|id| id.as_str())
    }

    pub fn len(&self) -> usize {
        self.outputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn outputs(value: Value) -> TaskData {
        let mut data = TaskData::new();
        data.insert("value".to_string(), value);
        data
    }

    #[tokio::test]
    async fn test_record_and_snapshot() {
        let context = ExecutionContext::new();
        assert!(context.is_empty().await);

        context.record("a", outputs(json!(50))).await.unwrap();
        context.record("b", outputs(json!(150))).await.unwrap();

        let snapshot = context.snapshot().await;
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.value("a", "value"), Some(&json!(50)));
        assert_eq!(snapshot.task_ids().collect::<Vec<_>>(), vec!["a", "b"]);
        assert!(context.contains("b").await);
    }

    #[tokio::test]
    async fn test_context_is_append_only() {
        let context = ExecutionContext::new();
        context.record("a", outputs(json!(1))).await.unwrap();

        let err = context.record("a", outputs(json!(2))).await.unwrap_err();
        assert_eq!(
            err,
            ExecutionError::ContextOverwrite {
                task_id: "a".to_string()
            }
        );
        let stored = context.get("a").await.unwrap();
        assert_eq!(stored.get("value"), Some(&json!(1)));
    }

    #[tokio::test]
    async fn test_snapshot_is_isolated_from_later_writes() {
        let context = ExecutionContext::new();
        context.record("a", outputs(json!(1))).await.unwrap();
        let snapshot = context.snapshot().await;

        context.record("b", outputs(json!(2))).await.unwrap();
        assert!(!snapshot.contains("b"));
        assert_eq!(context.len().await, 2);
    }

    #[test]
    fn test_lookup_nested_path() {
        let mut data = TaskData::new();
        data.insert(
            "totals".to_string(),
            json!({"units": 12, "regions": [{"name": "north"}]}),
        );
        let snapshot = ContextSnapshot::from_entries(vec![("inv".to_string(), data)]);

        assert_eq!(snapshot.lookup("inv", "totals.units"), Some(&json!(12)));
        assert_eq!(
            snapshot.lookup("inv", "totals.regions.0.name"),
            Some(&json!("north"))
        );
        assert_eq!(snapshot.lookup("inv", "totals.missing"), None);
        assert_eq!(snapshot.lookup("other", "totals"), None);
    }
}
