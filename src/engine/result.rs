// ABOUTME: Task execution result types and execution history aggregation
// ABOUTME: Defines terminal task statuses, skip reasons, and the per-run outcome record

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use super::error::ExecutionError;
use super::strategy::Strategy;
use super::task::TaskData;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Success,
    Failed,
    Skipped,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SkipReason {
    /// A task this one depends on (or, in a sequential chain, an earlier
    /// task) did not succeed.
    UpstreamFailed { task_id: String },
    ConditionNotMet,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExecutionResult {
    pub task_id: String,
    pub status: TaskStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<TaskData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip_reason: Option<SkipReason>,
    pub execution_time_ms: u64,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum HistoryStatus {
    Success,
    PartialSuccess,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HistorySummary {
    pub total_tasks: usize,
    pub successful_tasks: usize,
    pub failed_tasks: usize,
    pub skipped_tasks: usize,
    pub success_rate: f64,
    pub total_execution_time_ms: u64,
}

/// Per-task outcomes of one invocation, in completion order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExecutionHistory {
    pub run_id: String,
    pub strategy: Strategy,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    results: IndexMap<String, ExecutionResult>,
}

impl ExecutionResult {
    pub fn success(
        task_id: impl Into<String>,
        output: TaskData,
        started_at: DateTime<Utc>,
        elapsed: Duration,
    ) -> Self {
        Self {
            task_id: task_id.into(),
            status: TaskStatus::Success,
            output: Some(output),
            error: None,
            skip_reason: None,
            execution_time_ms: elapsed.as_millis() as u64,
            started_at: Some(started_at),
            finished_at: Utc::now(),
        }
    }

    pub fn failed(
        task_id: impl Into<String>,
        error: impl Into<String>,
        started_at: Option<DateTime<Utc>>,
        elapsed: Duration,
    ) -> Self {
        Self {
            task_id: task_id.into(),
            status: TaskStatus::Failed,
            output: None,
            error: Some(error.into()),
            skip_reason: None,
            execution_time_ms: elapsed.as_millis() as u64,
            started_at,
            finished_at: Utc::now(),
        }
    }

    /// A task that was never attempted
    pub fn skipped(task_id: impl Into<String>, reason: SkipReason) -> Self {
        Self {
            task_id: task_id.into(),
            status: TaskStatus::Skipped,
            output: None,
            error: Some(reason.to_string()),
            skip_reason: Some(reason),
            execution_time_ms: 0,
            started_at: None,
            finished_at: Utc::now(),
        }
    }

    pub fn is_successful(&self) -> bool {
        self.status == TaskStatus::Success
    }

    pub fn is_failed(&self) -> bool {
        self.status == TaskStatus::Failed
    }

    pub fn is_skipped(&self) -> bool {
        self.status == TaskStatus::Skipped
    }
}

impl ExecutionHistory {
    pub fn new(run_id: impl Into<String>, strategy: Strategy) -> Self {
        Self {
            run_id: run_id.into(),
            strategy,
            started_at: Utc::now(),
            finished_at: None,
            results: IndexMap::new(),
        }
    }

    /// Append a result; each task may be recorded exactly once
    pub fn record(&mut self, result: ExecutionResult) -> std::result::Result<(), ExecutionError> {
        if self.results.contains_key(&result.task_id) {
            return Err(ExecutionError::DuplicateResult {
                task_id: result.task_id,
            });
        }
        self.results.insert(result.task_id.clone(), result);
        Ok(())
    }

    pub fn mark_completed(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    pub fn is_complete(&self) -> bool {
        self.finished_at.is_some()
    }

    pub fn get(&self, task_id: &str) -> Option<&ExecutionResult> {
        self.results.get(task_id)
    }

    pub fn status_of(&self, task_id: &str) -> Option<TaskStatus> {
        self.results.get(task_id).map(|result| result.status)
    }

    pub fn contains(&self, task_id: &str) -> bool {
        self.results.contains_key(task_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ExecutionResult)> {
        self.results.iter().map(|(id, result)| (id.as_str(), result))
    }

    pub fn results(&self) -> impl Iterator<Item = &ExecutionResult> {
        self.results.values()
    }

    pub fn task_ids(&self) -> Vec<&str> {
        self.results.keys().map(|id| id.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn succeeded(&self) -> Vec<&ExecutionResult> {
        self.with_status(TaskStatus::Success)
    }

    pub fn failed(&self) -> Vec<&ExecutionResult> {
        self.with_status(TaskStatus::Failed)
    }

    pub fn skipped(&self) -> Vec<&ExecutionResult> {
        self.with_status(TaskStatus::Skipped)
    }

    fn with_status(&self, status: TaskStatus) -> Vec<&ExecutionResult> {
        self.results
            .values()
            .filter(|result| result.status == status)
            .collect()
    }

    pub fn summary(&self) -> HistorySummary {
        let total = self.results.len();
        let successful = self.succeeded().len();
        let failed = self.failed().len();
        let skipped = self.skipped().len();

        let success_rate = if total > 0 {
            (successful as f64 / total as f64) * 100.0
        } else {
            0.0
        };

        HistorySummary {
            total_tasks: total,
            successful_tasks: successful,
            failed_tasks: failed,
            skipped_tasks: skipped,
            success_rate,
            total_execution_time_ms: self
                .results
                .values()
                .map(|result| result.execution_time_ms)
                .sum(),
        }
    }

    /// Overall outcome. A run where every task was skipped counts as failed.
    pub fn status(&self) -> HistoryStatus {
        let summary = self.summary();
        if summary.total_tasks > 0 && summary.successful_tasks == summary.total_tasks {
            HistoryStatus::Success
        } else if summary.successful_tasks > 0 {
            HistoryStatus::PartialSuccess
        } else {
            HistoryStatus::Failed
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }
}

impl<'a> IntoIterator for &'a ExecutionHistory {
    type Item = (&'a String, &'a ExecutionResult);
    type IntoIter = indexmap::map::Iter<'a, String, ExecutionResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.iter()
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskStatus::Success => write!(f, "success"),
            TaskStatus::Failed => write!(f, "failed"),
            TaskStatus::Skipped => write!(f, "skipped"),
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::UpstreamFailed { task_id } => {
                write!(f, "upstream task failed: {}", task_id)
            }
            SkipReason::ConditionNotMet => write!(f, "condition not met"),
        }
    }
}

impl fmt::Display for HistoryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HistoryStatus::Success => write!(f, "success"),
            HistoryStatus::PartialSuccess => write!(f, "partial_success"),
            HistoryStatus::Failed => write!(f, "failed"),
        }
    }
}
