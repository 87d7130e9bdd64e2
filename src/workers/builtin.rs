// ABOUTME: The builtin worker family: echo, sum, fail, and sleep operations
// ABOUTME: Small deterministic workers used by the CLI and by workflow-level tests

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Number, Value};
use std::time::Duration;
use tracing::debug;

use crate::engine::{TaskData, Worker, WorkerError, WorkerResult};

pub struct BuiltinWorker;

#[derive(Debug, Deserialize)]
struct SumConfig {
    #[serde(default)]
    values: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct FailConfig {
    #[serde(default = "default_fail_message")]
    message: String,
}

#[derive(Debug, Deserialize)]
struct SleepConfig {
    #[serde(default)]
    ms: u64,
}

fn default_fail_message() -> String {
    "failed on request".to_string()
}

fn parse_config<T: for<'de> Deserialize<'de>>(inputs: &TaskData) -> Result<T, WorkerError> {
    let value = serde_json::to_value(inputs)?;
    Ok(serde_json::from_value(value)?)
}

#[async_trait]
impl Worker for BuiltinWorker {
    async fn invoke(&self, operation: &str, inputs: TaskData) -> WorkerResult {
        debug!("builtin.{} invoked with {} inputs", operation, inputs.len());

        match operation {
            "echo" => Ok(inputs),
            "sum" => {
                let config: SumConfig = parse_config(&inputs)?;
                let mut outputs = TaskData::new();
                outputs.insert("total".to_string(), sum_values(&config.values)?);
                outputs.insert("count".to_string(), Value::from(config.values.len()));
                Ok(outputs)
            }
            "fail" => {
                let config: FailConfig = parse_config(&inputs)?;
                Err(WorkerError::new(config.message))
            }
            "sleep" => {
                let config: SleepConfig = parse_config(&inputs)?;
                tokio::time::sleep(Duration::from_millis(config.ms)).await;
                Ok(inputs)
            }
            other => Err(WorkerError::new(format!(
                "builtin worker has no operation '{}'",
                other
            ))),
        }
    }
}

/// Integers stay integral; any float in the list makes the total a float
fn sum_values(values: &[Value]) -> Result<Value, WorkerError> {
    let mut integral: Option<i64> = Some(0);
    let mut total = 0.0_f64;

    for value in values {
        let Value::Number(number) = value else {
            return Err(WorkerError::new(format!("sum expects numbers, got {}", value)));
        };
        integral = match (integral, number.as_i64()) {
            (Some(acc), Some(n)) => acc.checked_add(n),
            _ => None,
        };
        total += number.as_f64().unwrap_or(0.0);
    }

    Ok(match integral {
        Some(sum) => Value::from(sum),
        None => Number::from_f64(total).map(Value::Number).unwrap_or(Value::Null),
    })
}
