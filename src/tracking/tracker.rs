//! Experiment tracker: runs with parameters, metrics and status

use super::storage::{LocalStorage, StorageBackend};
use crate::error::{PipelineError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::{debug, info};

/// Status of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunStatus {
    Running,
    Finished,
    Failed,
}

/// A single tracked run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Run {
    pub run_id: String,
    pub run_name: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub params: BTreeMap<String, String>,
    pub metrics: BTreeMap<String, f64>,
    pub tags: BTreeMap<String, String>,
    pub status: RunStatus,
}

impl Run {
    pub fn new(run_name: impl Into<String>) -> Self {
        Self {
            run_id: uuid::Uuid::new_v4().to_string(),
            run_name: run_name.into(),
            started_at: Utc::now(),
            ended_at: None,
            params: BTreeMap::new(),
            metrics: BTreeMap::new(),
            tags: BTreeMap::new(),
            status: RunStatus::Running,
        }
    }

    pub fn duration_secs(&self) -> f64 {
        let end = self.ended_at.unwrap_or_else(Utc::now);
        (end - self.started_at).num_milliseconds() as f64 / 1000.0
    }
}

/// Named collection of runs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Experiment {
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub runs: Vec<Run>,
}

impl Experiment {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            created_at: Utc::now(),
            runs: Vec::new(),
        }
    }

    /// Finished run with the best value of `metric`
    pub fn best_run(&self, metric: &str, maximize: bool) -> Option<&Run> {
        self.runs
            .iter()
            .filter(|r| r.status == RunStatus::Finished)
            .filter_map(|r| r.metrics.get(metric).map(|v| (r, *v)))
            .max_by(|(_, a), (_, b)| {
                if maximize {
                    a.total_cmp(b)
                } else {
                    b.total_cmp(a)
                }
            })
            .map(|(r, _)| r)
    }
}

/// Records runs of one experiment through a storage backend
pub struct ExperimentTracker {
    experiment_name: String,
    storage: Box<dyn StorageBackend>,
    current_run: Option<Run>,
}

impl ExperimentTracker {
    pub fn new(experiment_name: impl Into<String>, storage: Box<dyn StorageBackend>) -> Self {
        Self {
            experiment_name: experiment_name.into(),
            storage,
            current_run: None,
        }
    }

    /// Track into JSON files under `dir`
    pub fn with_dir(experiment_name: impl Into<String>, dir: impl Into<PathBuf>) -> Self {
        Self::new(experiment_name, Box::new(LocalStorage::new(dir)))
    }

    pub fn experiment_name(&self) -> &str {
        &self.experiment_name
    }

    /// Begin a run. A run already in progress is replaced.
    pub fn start_run(&mut self, run_name: impl Into<String>) -> &Run {
        let run = Run::new(run_name);
        debug!(run_id = %run.run_id, experiment = %self.experiment_name, "Started run");
        self.current_run.insert(run)
    }

    pub fn log_param(&mut self, key: impl Into<String>, value: impl ToString) -> Result<()> {
        self.active_run()?.params.insert(key.into(), value.to_string());
        Ok(())
    }

    pub fn log_metric(&mut self, key: impl Into<String>, value: f64) -> Result<()> {
        self.active_run()?.metrics.insert(key.into(), value);
        Ok(())
    }

    pub fn set_tag(&mut self, key: impl Into<String>, value: impl Into<String>) -> Result<()> {
        self.active_run()?.tags.insert(key.into(), value.into());
        Ok(())
    }

    /// Close the active run and append it to the stored experiment
    pub fn end_run(&mut self, status: RunStatus) -> Result<Run> {
        let mut run = self
            .current_run
            .take()
            .ok_or_else(|| PipelineError::InvalidInput("no active run".to_string()))?;
        run.status = status;
        run.ended_at = Some(Utc::now());

        let mut experiment = self.storage.load_experiment(&self.experiment_name)?;
        experiment.runs.push(run.clone());
        self.storage.save_experiment(&experiment)?;

        info!(
            run_id = %run.run_id,
            experiment = %self.experiment_name,
            status = ?run.status,
            metrics = run.metrics.len(),
            "Recorded run"
        );
        Ok(run)
    }

    pub fn experiment(&self) -> Result<Experiment> {
        self.storage.load_experiment(&self.experiment_name)
    }

    fn active_run(&mut self) -> Result<&mut Run> {
        self.current_run
            .as_mut()
            .ok_or_else(|| PipelineError::InvalidInput("no active run".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_lifecycle() {
        let dir = tempfile::tempdir().unwrap();
        let mut tracker = ExperimentTracker::with_dir("houses", dir.path());

        tracker.start_run("first");
        tracker.log_param("test_size", 0.2).unwrap();
        tracker.log_metric("R-Squared", 0.8).unwrap();
        let run = tracker.end_run(RunStatus::Finished).unwrap();
        assert_eq!(run.params["test_size"], "0.2");
        assert!(run.ended_at.is_some());

        tracker.start_run("second");
        tracker.log_metric("R-Squared", 0.9).unwrap();
        tracker.end_run(RunStatus::Finished).unwrap();

        let experiment = tracker.experiment().unwrap();
        assert_eq!(experiment.runs.len(), 2);
        assert_eq!(experiment.best_run("R-Squared", true).unwrap().run_name, "second");
        assert!(dir.path().join("houses.json").exists());
    }

    #[test]
    fn test_logging_without_run() {
        let dir = tempfile::tempdir().unwrap();
        let mut tracker = ExperimentTracker::with_dir("houses", dir.path());
        assert!(tracker.log_metric("x", 1.0).is_err());
        assert!(tracker.end_run(RunStatus::Failed).is_err());
    }
}
