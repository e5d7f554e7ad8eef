//! Result persistence: per-profile and batch-summary JSON documents,
//! pretty-printed UTF-8.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use swimscout_common::{BatchSummary, ProfileResult};

const BATCH_DIR: &str = "batch_results";

pub struct ReportWriter {
    results_dir: PathBuf,
}

impl ReportWriter {
    pub fn new(results_dir: impl Into<PathBuf>) -> Self {
        Self {
            results_dir: results_dir.into(),
        }
    }

    fn batch_dir(&self) -> PathBuf {
        self.results_dir.join(BATCH_DIR)
    }

    /// Single-profile mode document, in the results dir root.
    pub fn write_single(&self, result: &ProfileResult) -> Result<PathBuf> {
        let path = self
            .results_dir
            .join(format!("{}_results.json", result.username));
        write_json(&path, result)?;
        info!(path = %path.display(), "Results saved");
        Ok(path)
    }

    /// Batch-mode per-profile document, written as soon as the profile
    /// completes so a later crash cannot lose it.
    pub fn write_profile(&self, result: &ProfileResult) -> Result<PathBuf> {
        let path = self
            .batch_dir()
            .join(format!("{}_results.json", result.username));
        write_json(&path, result)?;
        info!(path = %path.display(), "Profile results saved");
        Ok(path)
    }

    /// Run summary, named with the run timestamp.
    pub fn write_summary(&self, summary: &BatchSummary) -> Result<PathBuf> {
        let stamp = summary.timestamp.format("%Y%m%d_%H%M%S");
        let path = self.batch_dir().join(format!("batch_summary_{stamp}.json"));
        write_json(&path, summary)?;
        Ok(path)
    }

    pub fn read_profile(&self, path: &Path) -> Result<ProfileResult> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Ok(serde_json::from_str(&raw)?)
    }
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}
