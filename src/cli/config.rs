// ABOUTME: Configuration management for the taskgraph application
// ABOUTME: Handles loading and merging configuration from files and environment variables

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::engine::{OrchestratorConfig, Strategy};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub engine: OrchestratorConfig,

    /// Used when neither the command line nor the workflow names a strategy
    #[serde(default)]
    pub default_strategy: Option<Strategy>,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from file path or default locations
    pub fn load(path: Option<PathBuf>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p,
            None => Self::find_config_file(),
        };

        let mut config = if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path)
                .with_context(|| format!("Failed to read config {}", config_path.display()))?;
            serde_yaml::from_str(&contents)
                .with_context(|| format!("Invalid config {}", config_path.display()))?
        } else {
            Config::default()
        };

        config.merge_env()?;
        Ok(config)
    }

    /// Find configuration file in standard locations
    fn find_config_file() -> PathBuf {
        let possible_paths = [
            PathBuf::from("taskgraph.yaml"),
            PathBuf::from("taskgraph.yml"),
            PathBuf::from(".taskgraph.yaml"),
            PathBuf::from(".taskgraph.yml"),
        ];

        for path in possible_paths {
            if path.exists() {
                return path;
            }
        }

        if let Some(home_dir) = dirs::home_dir() {
            let home_config = home_dir.join(".taskgraph").join("config.yaml");
            if home_config.exists() {
                return home_config;
            }
        }

        // Default path (may not exist)
        PathBuf::from("taskgraph.yaml")
    }

    /// Merge environment variables into configuration
    fn merge_env(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(max) = lookup("TASKGRAPH_MAX_CONCURRENT") {
            self.engine.max_concurrent = max
                .parse()
                .with_context(|| format!("TASKGRAPH_MAX_CONCURRENT is not a number: {}", max))?;
        }
        if let Some(timeout) = lookup("TASKGRAPH_DEFAULT_TIMEOUT") {
            let timeout = humantime_serde::re::humantime::parse_duration(&timeout)
                .with_context(|| {
                    format!("TASKGRAPH_DEFAULT_TIMEOUT is not a duration: {}", timeout)
                })?;
            self.engine.default_timeout = Some(timeout);
        }
        if let Some(strategy) = lookup("TASKGRAPH_STRATEGY") {
            self.default_strategy = Some(strategy.parse().map_err(anyhow::Error::msg)?);
        }

        // Logging configuration
        if let Some(level) = lookup("TASKGRAPH_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = lookup("TASKGRAPH_LOG_FORMAT") {
            self.logging.format = format;
        }

        Ok(())
    }
}
