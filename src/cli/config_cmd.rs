//! Configuration commands

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Subcommand;

use super::output::Output;
use crate::storage::Config;

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the effective configuration as TOML
    Show,

    /// Write a default .planner/config.toml
    Init {
        /// Directory to initialize (defaults to current directory)
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },
}

pub fn run(cmd: ConfigCommands, output: &Output, explicit: Option<&Path>) -> Result<()> {
    match cmd {
        ConfigCommands::Show => show(output, explicit),
        ConfigCommands::Init { path, force } => init(output, &path, force),
    }
}

fn show(output: &Output, explicit: Option<&Path>) -> Result<()> {
    let config = Config::load(explicit)?;
    output.verbose_ctx("config", &format!("Source: {}", config.source.describe()));

    if output.is_json() {
        output.data(&serde_json::json!({
            "source": config.source.path().map(|p| p.display().to_string()),
            "config": config.layout,
        }));
    } else {
        output.line(format!("# source: {}", config.source.describe()));
        output.line(Config::to_toml(&config.layout)?.trim_end());
    }

    Ok(())
}

fn init(output: &Output, root: &Path, force: bool) -> Result<()> {
    output.verbose_ctx("config", &format!("Initializing config under {}", root.display()));
    let path = Config::init(root, force)?;
    output.success(&format!("Wrote default config to {}", path.display()));
    Ok(())
}
