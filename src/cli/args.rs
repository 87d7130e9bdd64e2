// ABOUTME: Command line argument definitions and parsing using Clap
// ABOUTME: Defines the main CLI structure and the run and validate subcommands

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::engine::Strategy;

#[derive(Parser)]
#[command(name = "taskgraph")]
#[command(about = "Run dependency-ordered task graphs from declarative YAML workflows")]
#[command(version)]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(short, long, global = true, help = "Path to configuration file")]
    pub config: Option<PathBuf>,

    #[arg(long, global = true, help = "Disable colored output")]
    pub no_color: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Execute a workflow from a YAML file
    Run {
        #[arg(help = "Path to workflow YAML file")]
        workflow: PathBuf,

        #[arg(
            short,
            long,
            help = "Execution strategy (sequential, parallel, conditional)",
            value_parser = parse_strategy
        )]
        strategy: Option<Strategy>,

        #[arg(long, help = "Maximum number of concurrent tasks")]
        max_concurrent: Option<usize>,

        #[arg(
            short,
            long,
            value_enum,
            default_value_t = OutputFormat::Text,
            help = "Report format"
        )]
        format: OutputFormat,

        #[arg(short, long, help = "Write the report to a file instead of stdout")]
        output: Option<PathBuf>,
    },

    /// Validate a workflow file without executing
    Validate {
        #[arg(help = "Path to workflow YAML file")]
        workflow: PathBuf,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Yaml,
}

fn parse_strategy(value: &str) -> Result<Strategy, String> {
    value.parse()
}

impl Args {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_run() {
        let args = Args::try_parse_from([
            "taskgraph",
            "run",
            "restock.yaml",
            "--strategy",
            "parallel",
            "--max-concurrent",
            "8",
            "--format",
            "json",
        ])
        .unwrap();

        match args.command {
            Commands::Run {
                workflow,
                strategy,
                max_concurrent,
                format,
                output,
            } => {
                assert_eq!(workflow, PathBuf::from("restock.yaml"));
                assert_eq!(strategy, Some(Strategy::Parallel));
                assert_eq!(max_concurrent, Some(8));
                assert_eq!(format, OutputFormat::Json);
                assert!(output.is_none());
            }
            Commands::Validate { .. } => panic!("expected run"),
        }
    }

    #[test]
    fn test_invalid_strategy() {
        let result = Args::try_parse_from(["taskgraph", "run", "x.yaml", "--strategy", "random"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_global_flags() {
        let args =
            Args::try_parse_from(["taskgraph", "validate", "x.yaml", "--verbose", "--no-color"])
                .unwrap();
        assert!(args.verbose);
        assert!(args.no_color);
        assert!(matches!(args.command, Commands::Validate { .. }));
    }
}
