//! # Command-Line Interface
//!
//! The `planner` binary: loads a task file, runs the layout engine and
//! prints the result.
//!
//! ## Commands
//!
//! | Command | Purpose |
//! |---------|---------|
//! | `layout FILE [--output PATH]` | Bars, statistics and recommendations |
//! | `conflicts FILE` | Classified conflicts and a risk summary |
//! | `scores FILE` | Priority scores, highest first |
//! | `check FILE` | Input validation, non-zero exit on issues |
//! | `config show` | Effective configuration as TOML |
//! | `config init [PATH]` | Write a default `.planner/config.toml` |
//!
//! ## Output Formats
//!
//! All commands support the `--format` flag:
//! - `text` (default) - Human-readable output
//! - `json` - Machine-parseable JSON
//!
//! ## Verbose Mode
//!
//! Use `--verbose` (or `-v`) for progress messages and engine debug logs:
//! ```bash
//! planner --verbose layout tasks.yaml
//! ```
//!
//! ## Entry Point
//!
//! Call [`run()`] to parse arguments and execute the appropriate command.

mod app;
mod config_cmd;
mod layout_cmd;
mod output;

pub use app::{run, Cli, Commands};
pub use output::{Output, OutputFormat};
