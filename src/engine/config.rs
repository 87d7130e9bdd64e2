// ABOUTME: Orchestrator tuning knobs chosen by the deployer
// ABOUTME: Worker pool size, default task timeout, and event buffer capacity

use serde::{Deserialize, Serialize};
use std::time::Duration;

fn default_max_concurrent() -> usize {
    4
}

fn default_event_capacity() -> usize {
    256
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Upper bound on concurrently running tasks for the parallel strategy
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,

    /// Applied to tasks that declare no timeout of their own
    #[serde(with = "humantime_serde", default)]
    pub default_timeout: Option<Duration>,

    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_concurrent: default_max_concurrent(),
            default_timeout: None,
            event_capacity: default_event_capacity(),
        }
    }
}

impl OrchestratorConfig {
    pub fn with_max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent = max_concurrent;
        self
    }

    pub fn with_default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = Some(timeout);
        self
    }
}
