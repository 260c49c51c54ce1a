//! Main CLI application structure

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use super::output::{Output, OutputFormat};
use super::{config_cmd, layout_cmd};

#[derive(Parser)]
#[command(name = "planner")]
#[command(author, version, about = "Lay out calendar tasks as non-overlapping bars")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Enable verbose output for debugging
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Layout configuration file (TOML)
    #[arg(long, short = 'c', global = true, env = "PLANNER_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Lay out tasks and print bars, statistics and recommendations
    Layout {
        /// Task file (.json, .jsonl, .yaml or .yml)
        file: PathBuf,

        /// Write the full JSON report to this path
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Show classified conflicts between overlapping tasks
    Conflicts {
        /// Task file (.json, .jsonl, .yaml or .yml)
        file: PathBuf,
    },

    /// Show priority scores, highest first
    Scores {
        /// Task file (.json, .jsonl, .yaml or .yml)
        file: PathBuf,
    },

    /// Validate a task file (ids, ranges, dependencies)
    Check {
        /// Task file (.json, .jsonl, .yaml or .yml)
        file: PathBuf,
    },

    /// Show or create layout configuration
    #[command(subcommand)]
    Config(config_cmd::ConfigCommands),
}

/// Installs the tracing subscriber; `RUST_LOG` still applies on top
fn init_tracing(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Main entry point for the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let output = Output::new(cli.format, cli.verbose);
    output.verbose("planner starting");

    let config = cli.config.as_deref();

    match cli.command {
        Commands::Layout { file, output: report } => {
            output.verbose_ctx("layout", &format!("Laying out {}", file.display()));
            layout_cmd::layout(&output, &file, config, report.as_deref())?
        }
        Commands::Conflicts { file } => {
            output.verbose_ctx("conflicts", &format!("Classifying {}", file.display()));
            layout_cmd::conflicts(&output, &file, config)?
        }
        Commands::Scores { file } => {
            output.verbose_ctx("scores", &format!("Scoring {}", file.display()));
            layout_cmd::scores(&output, &file, config)?
        }
        Commands::Check { file } => {
            output.verbose_ctx("check", &format!("Checking {}", file.display()));
            layout_cmd::check(&output, &file)?
        }
        Commands::Config(cmd) => config_cmd::run(cmd, &output, config)?,
    }

    output.verbose("Command completed successfully");
    Ok(())
}
