// ABOUTME: Common utilities and helpers for integration tests
// ABOUTME: Provides scripted workers that record invocations, task helpers, and workflow files

#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tempfile::TempDir;
use tokio::fs;

use taskgraph::engine::{
    Orchestrator, OrchestratorConfig, TaskData, TaskDescriptor, Worker, WorkerError,
    WorkerRegistry, WorkerResult,
};

pub const CATEGORY: &str = "test";

#[derive(Debug, Clone)]
pub struct Invocation {
    pub operation: String,
    pub inputs: TaskData,
    pub started: Instant,
    pub finished: Instant,
}

/// Shared record of every worker call made during a test
#[derive(Debug, Clone, Default)]
pub struct InvocationLog {
    entries: Arc<Mutex<Vec<Invocation>>>,
}

impl InvocationLog {
    fn push(&self, invocation: Invocation) {
        self.entries.lock().unwrap().push(invocation);
    }

    pub fn operations(&self) -> Vec<String> {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .map(|entry| entry.operation.clone())
            .collect()
    }

    pub fn count(&self, operation: &str) -> usize {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .filter(|entry| entry.operation == operation)
            .count()
    }

    pub fn was_invoked(&self, operation: &str) -> bool {
        self.count(operation) > 0
    }

    pub fn get(&self, operation: &str) -> Option<Invocation> {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .find(|entry| entry.operation == operation)
            .cloned()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().unwrap().is_empty()
    }
}

#[derive(Debug, Clone)]
enum Behavior {
    Succeed(TaskData),
    Fail(String),
    Panic(String),
}

struct ScriptedWorker {
    log: InvocationLog,
    behavior: Behavior,
    delay: Duration,
}

#[async_trait]
impl Worker for ScriptedWorker {
    async fn invoke(&self, operation: &str, inputs: TaskData) -> WorkerResult {
        let started = Instant::now();
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.log.push(Invocation {
            operation: operation.to_string(),
            inputs,
            started,
            finished: Instant::now(),
        });

        match &self.behavior {
            Behavior::Succeed(outputs) => Ok(outputs.clone()),
            Behavior::Fail(message) => Err(WorkerError::new(message.clone())),
            Behavior::Panic(message) => panic!("{}", message),
        }
    }
}

/// Builds an orchestrator whose `test` category workers are scripted per operation
pub struct TestRegistryBuilder {
    registry: WorkerRegistry,
    log: InvocationLog,
}

impl TestRegistryBuilder {
    pub fn new() -> Self {
        Self {
            registry: WorkerRegistry::new(),
            log: InvocationLog::default(),
        }
    }

    fn script(mut self, operation: &str, behavior: Behavior, delay_ms: u64) -> Self {
        self.registry.register(
            CATEGORY,
            operation,
            Arc::new(ScriptedWorker {
                log: self.log.clone(),
                behavior,
                delay: Duration::from_millis(delay_ms),
            }),
        );
        self
    }

    pub fn succeed(self, operation: &str, outputs: Value) -> Self {
        self.script(operation, Behavior::Succeed(data(outputs)), 0)
    }

    pub fn succeed_after(self, operation: &str, delay_ms: u64, outputs: Value) -> Self {
        self.script(operation, Behavior::Succeed(data(outputs)), delay_ms)
    }

    pub fn fail(self, operation: &str, message: &str) -> Self {
        self.script(operation, Behavior::Fail(message.to_string()), 0)
    }

    pub fn fail_after(self, operation: &str, delay_ms: u64, message: &str) -> Self {
        self.script(operation, Behavior::Fail(message.to_string()), delay_ms)
    }

    pub fn panic(self, operation: &str, message: &str) -> Self {
        self.script(operation, Behavior::Panic(message.to_string()), 0)
    }

    pub fn build(self) -> (Orchestrator, InvocationLog) {
        self.build_with_config(OrchestratorConfig::default())
    }

    pub fn build_with_config(self, config: OrchestratorConfig) -> (Orchestrator, InvocationLog) {
        (Orchestrator::with_config(self.registry, config), self.log)
    }
}

impl Default for TestRegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Task bound to the `test` category, using its id as the operation
pub fn task(id: &str) -> TaskDescriptor {
    TaskDescriptor::new(id, CATEGORY, id)
}

pub fn data(value: Value) -> TaskData {
    serde_json::from_value(value).expect("test data must be a JSON object")
}

pub struct TestEnvironment {
    pub temp_dir: TempDir,
}

impl TestEnvironment {
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().expect("Failed to create temp directory"),
        }
    }

    pub async fn create_workflow_file(&self, name: &str, content: &str) -> PathBuf {
        let path = self.temp_dir.path().join(format!("{}.yaml", name));
        fs::write(&path, content)
            .await
            .expect("Failed to write workflow file");
        path
    }

    pub fn output_file(&self, name: &str) -> PathBuf {
        self.temp_dir.path().join(name)
    }
}

impl Default for TestEnvironment {
    fn default() -> Self {
        Self::new()
    }
}
