//! # Storage Layer
//!
//! File collaborators around the layout engine. The engine itself never
//! touches the filesystem.
//!
//! ## Files
//!
//! | Data | Format | Location |
//! |------|--------|----------|
//! | Tasks | JSON, JSONL, YAML or CSV | Any path given on the command line |
//! | Config | TOML | `--config`, `.planner/config.toml`, or the user config dir |
//! | Report | Pretty JSON | `layout --output PATH` |
//!
//! ## Concurrency Safety
//!
//! - Task files are read under a shared lock (`fs2`)
//! - Reports are written atomically (temp file + exclusive lock + rename)
//!
//! ## Key Types
//!
//! - [`load_tasks`] - Reads a task file, format picked by extension
//! - [`Config`] - Effective layout configuration and where it came from
//! - [`write_report`] - Atomic JSON report writer

mod config;
mod csv;
mod report;
mod task_file;

pub use config::{Config, ConfigError, ConfigSource, PROJECT_DIR};
pub use report::write_report;
pub use task_file::{load_tasks, TaskFileError, TaskFormat};
