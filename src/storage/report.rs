//! Layout report writer
//!
//! Reports are written to a temp file under an exclusive lock and renamed
//! into place, so readers see either the previous report or the new one.

use std::fs::{self, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use fs2::FileExt;
use serde::Serialize;

/// Writes `value` as pretty JSON to `path` atomically
pub fn write_report<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    let temp_path = path.with_extension("json.tmp");

    let written = write_temp(&temp_path, value).and_then(|()| {
        fs::rename(&temp_path, path).with_context(|| {
            format!(
                "Failed to rename {} to {}",
                temp_path.display(),
                path.display()
            )
        })
    });

    if written.is_err() {
        // Never leave a partial report behind
        let _ = fs::remove_file(&temp_path);
    }

    written
}

fn write_temp<T: Serialize>(temp_path: &Path, value: &T) -> Result<()> {
    let file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(temp_path)
        .with_context(|| format!("Failed to create temp file: {}", temp_path.display()))?;

    file.lock_exclusive()
        .context("Failed to acquire write lock on report")?;

    let mut writer = BufWriter::new(&file);
    serde_json::to_writer_pretty(&mut writer, value).context("Failed to serialize report")?;
    writeln!(writer).context("Failed to write report")?;
    writer.flush().context("Failed to flush report")?;
    Ok(())
}
