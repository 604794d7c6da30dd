//! Run reports.
//!
//! A full run spans hours of GPU time across many subprocesses. The driver
//! persists the report after every completed iteration, so a crashed or
//! aborted run still leaves a record of which artifacts exist and where.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::PipelineResult;

/// Record of one completed pipeline iteration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IterationRecord {
    /// Iteration index; 0 is the initialization fit.
    pub index: usize,
    /// Trainer experiment name, `<system>/<tag>`.
    pub experiment: String,
    /// Fitted body mesh produced by this iteration.
    pub smpl_mesh: PathBuf,
    /// Fitted body parameters produced by this iteration.
    pub smpl_params: PathBuf,
    /// When the iteration finished.
    pub completed_at: DateTime<Utc>,
}

impl IterationRecord {
    /// Record an iteration that just completed.
    #[must_use]
    pub fn completed(index: usize, experiment: String, mesh: PathBuf, params: PathBuf) -> Self {
        Self {
            index,
            experiment,
            smpl_mesh: mesh,
            smpl_params: params,
            completed_at: Utc::now(),
        }
    }
}

/// Progress record of a full pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    /// Run tag shared by every iteration.
    pub tag: String,
    /// When the run started.
    pub started_at: DateTime<Utc>,
    /// When the run finished; `None` while in progress.
    pub finished_at: Option<DateTime<Utc>>,
    /// Completed iterations, oldest first.
    pub iterations: Vec<IterationRecord>,
}

impl RunReport {
    /// Start a new report for `tag`.
    #[must_use]
    pub fn begin(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            started_at: Utc::now(),
            finished_at: None,
            iterations: Vec::new(),
        }
    }

    /// Append a completed iteration.
    pub fn record(&mut self, record: IterationRecord) {
        self.iterations.push(record);
    }

    /// Mark the run finished.
    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    /// Write the report as pretty JSON, creating parent directories.
    ///
    /// # Errors
    ///
    /// Fails on I/O or encoding errors.
    pub fn save(&self, path: &Path) -> PipelineResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_vec_pretty(self)?)?;
        Ok(())
    }

    /// Read a report back.
    ///
    /// # Errors
    ///
    /// Fails when the file is missing or not a valid report.
    pub fn load(path: &Path) -> PipelineResult<Self> {
        Ok(serde_json::from_slice(&fs::read(path)?)?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn reports_round_trip_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("runs").join("chair.json");

        let mut report = RunReport::begin("chair");
        report.record(IterationRecord::completed(
            0,
            "mvdream-with-deepfloyd-with-mesh/chair_0".to_string(),
            PathBuf::from("/w/smplify/s/chair_0/smplh/smpl_mesh.obj"),
            PathBuf::from("/w/smplify/s/chair_0/smplh/smpl_param.pkl"),
        ));
        report.finish();
        report.save(&path).unwrap();

        let loaded = RunReport::load(&path).unwrap();
        assert_eq!(loaded, report);
        assert!(loaded.finished_at.is_some());
        assert_eq!(loaded.iterations[0].index, 0);
    }

    #[test]
    fn unfinished_reports_have_no_end_time() {
        let report = RunReport::begin("chair");
        assert!(report.finished_at.is_none());
        assert!(report.iterations.is_empty());
    }
}
