// ABOUTME: Command implementations for the taskgraph CLI
// ABOUTME: Handles execution of the run and validate commands

use anyhow::{Context, Result};
use std::fmt::Write as _;
use std::path::PathBuf;
use tracing::info;

use super::args::OutputFormat;
use crate::engine::{ExecutionHistory, HistoryStatus, Orchestrator, OrchestratorConfig, Strategy};
use crate::workers::builtin_registry;
use crate::workflow::WorkflowParser;

/// Settings for one `run` invocation after flags and config are merged
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub strategy: Option<Strategy>,
    pub fallback_strategy: Option<Strategy>,
    pub engine: OrchestratorConfig,
    pub format: OutputFormat,
    pub output: Option<PathBuf>,
}

/// Execute a workflow command
pub async fn run_workflow(workflow_path: PathBuf, options: RunOptions) -> Result<()> {
    info!("Starting workflow execution: {}", workflow_path.display());

    let workflow = WorkflowParser::new()
        .parse_file(&workflow_path)
        .await
        .with_context(|| format!("Failed to parse workflow {}", workflow_path.display()))?;
    info!("Loaded workflow: {}", workflow.name);

    let strategy = options
        .strategy
        .or(workflow.strategy)
        .or(options.fallback_strategy)
        .unwrap_or_default();
    let name = workflow.name.clone();
    let tasks = workflow
        .into_tasks()
        .context("Failed to compile workflow tasks")?;

    let orchestrator = Orchestrator::with_config(builtin_registry(), options.engine);
    let history = orchestrator
        .execute(tasks, strategy)
        .await
        .context("Workflow rejected")?;

    let report = render_report(&name, &history, options.format)?;
    match &options.output {
        Some(path) => {
            std::fs::write(path, &report)
                .with_context(|| format!("Failed to write output file '{}'", path.display()))?;
            info!("Results written to: {}", path.display());
        }
        None => print!("{}", report),
    }

    info!("Workflow execution completed");

    // Return error if any task did not succeed to ensure proper exit code
    match history.status() {
        HistoryStatus::Success => Ok(()),
        status => Err(anyhow::anyhow!(
            "Workflow '{}' finished with status {}",
            name,
            status
        )),
    }
}

/// Validate a workflow file and print its execution plan
pub async fn validate_workflow(workflow_path: PathBuf) -> Result<()> {
    info!("Validating workflow: {}", workflow_path.display());

    let workflow = WorkflowParser::new()
        .parse_file(&workflow_path)
        .await
        .with_context(|| format!("Workflow validation failed: {}", workflow_path.display()))?;
    let name = workflow.name.clone();
    let tasks = workflow
        .into_tasks()
        .context("Workflow validation failed")?;

    let orchestrator = Orchestrator::new(builtin_registry());
    let plan = orchestrator
        .validate(&tasks)
        .context("Workflow validation failed")?;

    println!("✓ Workflow '{}' is valid", name);
    println!("  Tasks: {}", plan.total_tasks);
    println!("  Order: {}", plan.order.join(" -> "));
    for (index, wave) in plan.waves.iter().enumerate() {
        println!("  Wave {}: {}", index + 1, wave.join(", "));
    }

    info!("Workflow validation completed successfully");

    Ok(())
}

/// Format a history for humans or machines
pub fn render_report(
    workflow_name: &str,
    history: &ExecutionHistory,
    format: OutputFormat,
) -> Result<String> {
    match format {
        OutputFormat::Json => {
            let mut json = history
                .to_json()
                .context("Failed to serialize results to JSON")?;
            json.push('\n');
            Ok(json)
        }
        OutputFormat::Yaml => history
            .to_yaml()
            .context("Failed to serialize results to YAML"),
        OutputFormat::Text => {
            let summary = history.summary();
            let mut text = String::new();
            writeln!(
                text,
                "Workflow '{}' completed with status: {} ({} strategy)",
                workflow_name,
                history.status(),
                history.strategy
            )?;
            for (task_id, result) in history {
                writeln!(
                    text,
                    "  Task '{}': {} ({}ms)",
                    task_id, result.status, result.execution_time_ms
                )?;
                if let Some(error) = &result.error {
                    writeln!(text, "    Reason: {}", error)?;
                }
                if let Some(output) = &result.output {
                    writeln!(text, "    Output: {}", serde_json::to_string(output)?)?;
                }
            }
            writeln!(
                text,
                "Summary: {} succeeded, {} failed, {} skipped",
                summary.successful_tasks, summary.failed_tasks, summary.skipped_tasks
            )?;
            Ok(text)
        }
    }
}
