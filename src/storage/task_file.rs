//! Task file loading
//!
//! Tasks come from a single file whose format is picked by extension:
//!
//! | Extension | Contents |
//! |-----------|----------|
//! | `.json` | Array of tasks, or `{ "tasks": [...] }` |
//! | `.jsonl` | One task per line, blank lines skipped |
//! | `.yaml` / `.yml` | Sequence of tasks, or a `tasks:` mapping |
//! | `.csv` | Header row plus one task per row, columns matched by name |
//!
//! The file is read under a shared lock so a concurrent writer never hands
//! us a half-written document.

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use anyhow::{Context, Result};
use fs2::FileExt;
use serde::Deserialize;
use thiserror::Error;

use super::csv;
use crate::domain::Task;

#[derive(Debug, Error, PartialEq)]
pub enum TaskFileError {
    #[error("Unsupported task file format: {0} (expected .json, .jsonl, .yaml, .yml or .csv)")]
    UnsupportedFormat(String),

    #[error("Missing required column '{0}' in CSV header")]
    MissingColumn(&'static str),

    #[error("line {line}, column '{column}': {message}")]
    InvalidCell {
        line: usize,
        column: String,
        message: String,
    },

    #[error("line {0}: unterminated quoted cell")]
    UnterminatedQuote(usize),
}

/// Recognized task file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskFormat {
    Json,
    JsonLines,
    Yaml,
    Csv,
}

impl TaskFormat {
    /// Picks the format from the file extension
    pub fn from_path(path: &Path) -> Result<Self, TaskFileError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        match ext.as_str() {
            "json" => Ok(TaskFormat::Json),
            "jsonl" => Ok(TaskFormat::JsonLines),
            "yaml" | "yml" => Ok(TaskFormat::Yaml),
            "csv" => Ok(TaskFormat::Csv),
            _ => Err(TaskFileError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

/// Either a bare list or a document with a `tasks` key
#[derive(Deserialize)]
#[serde(untagged)]
enum TaskDocument {
    List(Vec<Task>),
    Wrapped { tasks: Vec<Task> },
}

impl TaskDocument {
    fn into_tasks(self) -> Vec<Task> {
        match self {
            TaskDocument::List(tasks) | TaskDocument::Wrapped { tasks } => tasks,
        }
    }
}

/// Loads tasks from `path`, keeping file order
pub fn load_tasks(path: &Path) -> Result<Vec<Task>> {
    let format = TaskFormat::from_path(path)?;

    let file = File::open(path)
        .with_context(|| format!("Failed to open task file: {}", path.display()))?;

    // Lock is released when file is dropped
    file.lock_shared()
        .context("Failed to acquire read lock on task file")?;

    let tasks = match format {
        TaskFormat::JsonLines => read_lines(&file)?,
        TaskFormat::Json => {
            let content = read_to_string(&file, path)?;
            serde_json::from_str::<TaskDocument>(&content)
                .with_context(|| format!("Failed to parse tasks from {}", path.display()))?
                .into_tasks()
        }
        TaskFormat::Yaml => {
            let content = read_to_string(&file, path)?;
            if content.trim().is_empty() {
                Vec::new()
            } else {
                serde_yaml::from_str::<TaskDocument>(&content)
                    .with_context(|| format!("Failed to parse tasks from {}", path.display()))?
                    .into_tasks()
            }
        }
        TaskFormat::Csv => {
            let content = read_to_string(&file, path)?;
            csv::parse_tasks(&content)
                .with_context(|| format!("Failed to parse tasks from {}", path.display()))?
        }
    };

    tracing::debug!(path = %path.display(), count = tasks.len(), "loaded tasks");
    Ok(tasks)
}

fn read_to_string(file: &File, path: &Path) -> Result<String> {
    let mut content = String::new();
    BufReader::new(file)
        .read_to_string(&mut content)
        .with_context(|| format!("Failed to read task file: {}", path.display()))?;
    Ok(content)
}

fn read_lines(file: &File) -> Result<Vec<Task>> {
    let reader = BufReader::new(file);
    let mut tasks = Vec::new();

    for (line_num, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("Failed to read line {}", line_num + 1))?;

        if line.trim().is_empty() {
            continue;
        }

        let task: Task = serde_json::from_str(&line)
            .with_context(|| format!("Failed to parse task at line {}", line_num + 1))?;
        tasks.push(task);
    }

    Ok(tasks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn format_from_extension() {
        assert_eq!(
            TaskFormat::from_path(Path::new("a.JSON")).unwrap(),
            TaskFormat::Json
        );
        assert_eq!(
            TaskFormat::from_path(Path::new("a.yml")).unwrap(),
            TaskFormat::Yaml
        );
        assert_eq!(
            TaskFormat::from_path(Path::new("plan.Csv")).unwrap(),
            TaskFormat::Csv
        );
        assert!(TaskFormat::from_path(Path::new("tasks.txt")).is_err());
        assert!(TaskFormat::from_path(Path::new("tasks")).is_err());
    }

    #[test]
    fn json_array_and_wrapped() {
        let dir = TempDir::new().unwrap();
        let array = write(
            &dir,
            "a.json",
            r#"[{"id":"A","name":"Draft","start":"2024-01-05","end":"2024-01-12"}]"#,
        );
        let wrapped = write(
            &dir,
            "b.json",
            r#"{"tasks":[{"id":"B","name":"Review","start":"2024-01-08","end":"2024-01-15","priority":4}]}"#,
        );

        let a = load_tasks(&array).unwrap();
        assert_eq!(a.len(), 1);
        assert_eq!(a[0].id.as_str(), "A");

        let b = load_tasks(&wrapped).unwrap();
        assert_eq!(b[0].priority, 4);
    }

    #[test]
    fn jsonl_skips_blank_lines() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "t.jsonl",
            "{\"id\":\"A\",\"name\":\"a\",\"start\":\"2024-01-01\",\"end\":\"2024-01-02\"}\n\n   \n{\"id\":\"B\",\"name\":\"b\",\"start\":\"2024-01-03\",\"end\":\"2024-01-04\"}\n",
        );
        let tasks = load_tasks(&path).unwrap();
        let ids: Vec<_> = tasks.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["A", "B"]);
    }

    #[test]
    fn jsonl_reports_line_number() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "t.jsonl",
            "{\"id\":\"A\",\"name\":\"a\",\"start\":\"2024-01-01\",\"end\":\"2024-01-02\"}\nnot json\n",
        );
        let err = load_tasks(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("line 2"));
    }

    #[test]
    fn yaml_sequence_and_mapping() {
        let dir = TempDir::new().unwrap();
        let seq = write(
            &dir,
            "s.yaml",
            "- id: A\n  name: Draft\n  start: 2024-01-05\n  end: 2024-01-12\n  milestone: true\n",
        );
        let map = write(
            &dir,
            "m.yml",
            "tasks:\n  - id: B\n    name: Review\n    start: 2024-01-08\n    end: 2024-01-15\n    assignee: kim\n    dependencies: [A]\n",
        );

        let s = load_tasks(&seq).unwrap();
        assert!(s[0].milestone);

        let m = load_tasks(&map).unwrap();
        assert_eq!(m[0].assignee.as_deref(), Some("kim"));
        assert_eq!(m[0].dependencies.len(), 1);
    }

    #[test]
    fn csv_with_header_mapping() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "plan.csv",
            "Task ID,Task,Start Date,End Date,Assignee\nA,Draft,2024-01-05,2024-01-12,kim\n",
        );
        let tasks = load_tasks(&path).unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].name, "Draft");
        assert_eq!(tasks[0].assignee.as_deref(), Some("kim"));
    }

    #[test]
    fn csv_reports_line_and_column() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "plan.csv",
            "id,start,end\nA,2024-01-01,2024-01-02\nB,soon,2024-01-02\n",
        );
        let err = format!("{:#}", load_tasks(&path).unwrap_err());
        assert!(err.contains("Failed to parse tasks from"));
        assert!(err.contains("line 3, column 'start': invalid date 'soon'"));
    }

    #[test]
    fn empty_yaml_is_no_tasks() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "e.yaml", "\n");
        assert!(load_tasks(&path).unwrap().is_empty());
    }

    #[test]
    fn blank_id_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "bad.json",
            r#"[{"id":"  ","name":"x","start":"2024-01-01","end":"2024-01-01"}]"#,
        );
        assert!(load_tasks(&path).is_err());
    }

    #[test]
    fn missing_file() {
        let dir = TempDir::new().unwrap();
        let err = load_tasks(&dir.path().join("nope.json")).unwrap_err();
        assert!(err.to_string().contains("Failed to open task file"));
    }
}
