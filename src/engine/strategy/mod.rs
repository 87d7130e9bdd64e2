// ABOUTME: Interchangeable execution strategies for a validated task graph
// ABOUTME: Selects sequential, parallel, or conditional execution at invocation time

pub mod conditional;
pub mod parallel;
pub mod sequential;

use async_trait::async_trait;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::config::OrchestratorConfig;
use super::dependency::ExecutionPlan;
use super::runtime::TaskRuntime;
use super::task::TaskDescriptor;

pub use conditional::ConditionalStrategy;
pub use parallel::ParallelStrategy;
pub use sequential::SequentialStrategy;

/// Tasks of one invocation keyed by id, in declaration order
pub type TaskTable = IndexMap<String, TaskDescriptor>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    #[default]
    Sequential,
    Parallel,
    Conditional,
}

/// Drives every task of a plan to a terminal state, recording each result
/// through the runtime. Configuration problems are already ruled out.
#[async_trait]
pub trait ExecutionStrategy: Send + Sync {
    fn kind(&self) -> Strategy;

    async fn execute(&self, tasks: &TaskTable, plan: &ExecutionPlan, runtime: &TaskRuntime);
}

impl Strategy {
    pub fn build(&self, config: &OrchestratorConfig) -> Box<dyn ExecutionStrategy> {
        match self {
            Strategy::Sequential => Box::new(SequentialStrategy),
            Strategy::Parallel => Box::new(ParallelStrategy::new(config.max_concurrent)),
            Strategy::Conditional => Box::new(ConditionalStrategy),
        }
    }

    pub fn all() -> [Strategy; 3] {
        [Strategy::Sequential, Strategy::Parallel, Strategy::Conditional]
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Sequential => write!(f, "sequential"),
            Strategy::Parallel => write!(f, "parallel"),
            Strategy::Conditional => write!(f, "conditional"),
        }
    }
}

impl FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sequential" => Ok(Strategy::Sequential),
            "parallel" => Ok(Strategy::Parallel),
            "conditional" => Ok(Strategy::Conditional),
            other => Err(format!(
                "Unknown strategy '{}'. Expected one of: sequential, parallel, conditional",
                other
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strategy_parsing() {
        assert_eq!("parallel".parse::<Strategy>().unwrap(), Strategy::Parallel);
        assert_eq!(" Conditional ".parse::<Strategy>().unwrap(), Strategy::Conditional);
        assert!("eventual".parse::<Strategy>().is_err());

        for strategy in Strategy::all() {
            assert_eq!(strategy.to_string().parse::<Strategy>().unwrap(), strategy);
        }
    }

    #[test]
    fn test_build_matches_kind() {
        let config = OrchestratorConfig::default();
        for strategy in Strategy::all() {
            assert_eq!(strategy.build(&config).kind(), strategy);
        }
    }

    #[test]
    fn test_serde_lowercase() {
        let strategy: Strategy = serde_yaml::from_str("conditional").unwrap();
        assert_eq!(strategy, Strategy::Conditional);
        assert_eq!(serde_json::to_string(&Strategy::Parallel).unwrap(), "\"parallel\"");
    }
}
