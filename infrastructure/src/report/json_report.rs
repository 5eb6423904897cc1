//! JSON report writer
//!
//! Layout of a batch report directory:
//!
//! ```text
//! <dir>/
//!   summary.json                  BatchSummary plus pack name
//!   episodes/<task>.<trial>.json  one EpisodeOutcome per file
//! ```

use changebench_application::{BatchReport, EpisodeOutcome};
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize report: {0}")]
    Serialize(#[from] serde_json::Error),
}

pub struct JsonReportWriter {
    dir: PathBuf,
}

impl JsonReportWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write one episode outcome; returns the file path
    pub fn write_episode(&self, outcome: &EpisodeOutcome) -> Result<PathBuf, ReportError> {
        let file = format!("{}.{}.json", sanitize(&outcome.task_id), outcome.trial);
        let path = self.dir.join("episodes").join(file);
        write_json(&path, outcome)?;
        Ok(path)
    }

    /// Write every episode and the summary; returns the summary path
    pub fn write_batch(&self, report: &BatchReport) -> Result<PathBuf, ReportError> {
        for outcome in &report.outcomes {
            self.write_episode(outcome)?;
        }

        #[derive(Serialize)]
        struct SummaryFile<'a> {
            pack: &'a str,
            generated_at: String,
            summary: &'a changebench_application::BatchSummary,
        }

        let path = self.dir.join("summary.json");
        write_json(
            &path,
            &SummaryFile {
                pack: &report.pack,
                generated_at: chrono::Utc::now().to_rfc3339(),
                summary: &report.summary,
            },
        )?;
        info!(
            dir = %self.dir.display(),
            episodes = report.outcomes.len(),
            "Batch report written"
        );
        Ok(path)
    }
}

/// Task ids become file names
fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), ReportError> {
    let io_error = |source| ReportError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(io_error)?;
    }
    let json = serde_json::to_string_pretty(value)?;
    std::fs::write(path, json).map_err(io_error)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_task_ids() {
        assert_eq!(sanitize("uni/register 1"), "uni_register_1");
        assert_eq!(sanitize("task-2_b"), "task-2_b");
    }

    #[test]
    fn test_write_json_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a").join("b.json");
        write_json(&path, &serde_json::json!({"ok": true})).unwrap();
        let value: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["ok"], true);
    }
}
