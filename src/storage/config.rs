//! Configuration discovery for the planner CLI
//!
//! The layout configuration is a TOML rendition of [`LayoutConfig`]. It is
//! looked up in order:
//!
//! 1. an explicit `--config` path
//! 2. `.planner/config.toml` in the working directory or a parent
//! 3. `config.toml` in the user config directory
//!    (`~/.config/planner-layout/` on Linux)
//! 4. built-in defaults

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use thiserror::Error;

use crate::layout::LayoutConfig;

/// Name of the per-project directory
pub const PROJECT_DIR: &str = ".planner";

const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to parse configuration: {0}")]
    Parse(String),
}

/// Where the effective configuration came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    Explicit(PathBuf),
    Project(PathBuf),
    Global(PathBuf),
    Defaults,
}

impl ConfigSource {
    pub fn path(&self) -> Option<&Path> {
        match self {
            ConfigSource::Explicit(p) | ConfigSource::Project(p) | ConfigSource::Global(p) => {
                Some(p)
            }
            ConfigSource::Defaults => None,
        }
    }

    pub fn describe(&self) -> String {
        match self {
            ConfigSource::Explicit(p) => format!("{} (--config)", p.display()),
            ConfigSource::Project(p) => format!("{} (project)", p.display()),
            ConfigSource::Global(p) => format!("{} (user)", p.display()),
            ConfigSource::Defaults => "built-in defaults".to_string(),
        }
    }
}

/// Effective configuration plus its origin
#[derive(Debug, Clone)]
pub struct Config {
    pub layout: LayoutConfig,
    pub source: ConfigSource,
}

impl Config {
    /// Loads configuration from `explicit`, or from the default locations
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            let layout = Self::load_file(path)?;
            return Ok(Self {
                layout,
                source: ConfigSource::Explicit(path.to_path_buf()),
            });
        }

        if let Some(root) = Self::find_project_root() {
            let path = Self::project_config_path(&root);
            if path.is_file() {
                let layout = Self::load_file(&path)?;
                return Ok(Self {
                    layout,
                    source: ConfigSource::Project(path),
                });
            }
        }

        if let Some(dir) = Self::global_config_dir() {
            let path = dir.join(CONFIG_FILE);
            if path.is_file() {
                let layout = Self::load_file(&path)?;
                return Ok(Self {
                    layout,
                    source: ConfigSource::Global(path),
                });
            }
        }

        Ok(Self {
            layout: LayoutConfig::default(),
            source: ConfigSource::Defaults,
        })
    }

    /// Reads and validates one configuration file
    pub fn load_file(path: &Path) -> Result<LayoutConfig> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;

        let layout: LayoutConfig = toml::from_str(&content)
            .map_err(|e| ConfigError::Parse(e.to_string()))
            .with_context(|| format!("Failed to parse config: {}", path.display()))?;

        Self::validate(&layout)
            .with_context(|| format!("Rejected config: {}", path.display()))?;

        tracing::debug!(path = %path.display(), "loaded layout config");
        Ok(layout)
    }

    /// Rejects settings that no fallback can make sense of
    pub fn validate(layout: &LayoutConfig) -> Result<(), ConfigError> {
        if let (Some(start), Some(end)) = (layout.calendar_start, layout.calendar_end) {
            if end < start {
                return Err(ConfigError::Invalid(format!(
                    "calendar_end {} is before calendar_start {}",
                    end, start
                )));
            }
        }
        Ok(())
    }

    /// Returns the global config directory
    pub fn global_config_dir() -> Option<PathBuf> {
        ProjectDirs::from("dev", "planner", "planner-layout")
            .map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Path of the project config file under `root`
    pub fn project_config_path(root: &Path) -> PathBuf {
        root.join(PROJECT_DIR).join(CONFIG_FILE)
    }

    /// Finds the project root by looking for a `.planner/` directory
    pub fn find_project_root() -> Option<PathBuf> {
        let current = std::env::current_dir().ok()?;
        Self::find_project_root_from(&current)
    }

    /// Walks up from `start` looking for a `.planner/` directory
    pub fn find_project_root_from(start: &Path) -> Option<PathBuf> {
        let mut current = start.to_path_buf();

        loop {
            if current.join(PROJECT_DIR).is_dir() {
                return Some(current);
            }

            if !current.pop() {
                return None;
            }
        }
    }

    /// Serializes a layout configuration as TOML
    pub fn to_toml(layout: &LayoutConfig) -> Result<String> {
        toml::to_string_pretty(layout).context("Failed to serialize layout config")
    }

    /// Writes a default `.planner/config.toml` under `root`
    ///
    /// Refuses to overwrite an existing file unless `force` is set.
    pub fn init(root: &Path, force: bool) -> Result<PathBuf> {
        let dir = root.join(PROJECT_DIR);
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create directory: {}", dir.display()))?;

        let path = dir.join(CONFIG_FILE);
        if path.exists() && !force {
            anyhow::bail!(
                "Config already exists at {} (use --force to overwrite)",
                path.display()
            );
        }

        let body = Self::to_toml(&LayoutConfig::default())?;
        let content = format!("# planner layout configuration\n\n{}", body);

        fs::write(&path, content)
            .with_context(|| format!("Failed to write config: {}", path.display()))?;

        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    #[test]
    fn load_explicit_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("layout.toml");
        fs::write(&path, "day_width = 30.0\nmax_rows_per_day = 3\n").unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.layout.day_width, 30.0);
        assert_eq!(config.layout.max_rows_per_day, 3);
        assert_eq!(config.source, ConfigSource::Explicit(path));
    }

    #[test]
    fn parse_error_is_reported() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.toml");
        fs::write(&path, "day_width = \"wide\"\n").unwrap();

        let err = Config::load_file(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to parse configuration"));
    }

    #[test]
    fn inverted_window_is_invalid() {
        let layout = LayoutConfig {
            calendar_start: NaiveDate::from_ymd_opt(2024, 2, 1),
            calendar_end: NaiveDate::from_ymd_opt(2024, 1, 1),
            ..LayoutConfig::default()
        };
        assert!(matches!(
            Config::validate(&layout),
            Err(ConfigError::Invalid(_))
        ));
        assert!(Config::validate(&LayoutConfig::default()).is_ok());
    }

    #[test]
    fn find_project_root_walks_up() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join(PROJECT_DIR)).unwrap();
        let sub_dir = dir.path().join("sub").join("dir");
        fs::create_dir_all(&sub_dir).unwrap();

        let root = Config::find_project_root_from(&sub_dir);
        assert_eq!(root.as_deref(), Some(dir.path()));
    }

    #[test]
    fn init_writes_loadable_defaults() {
        let dir = TempDir::new().unwrap();
        let path = Config::init(dir.path(), false).unwrap();
        assert_eq!(path, Config::project_config_path(dir.path()));

        let layout = Config::load_file(&path).unwrap();
        assert_eq!(layout, LayoutConfig::default());

        assert!(Config::init(dir.path(), false).is_err());
        assert!(Config::init(dir.path(), true).is_ok());
    }

    #[test]
    fn source_description() {
        assert_eq!(ConfigSource::Defaults.describe(), "built-in defaults");
        assert!(ConfigSource::Defaults.path().is_none());
    }
}
