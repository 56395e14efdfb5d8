//! Experiment tracking
//!
//! Runs are stored as JSON, one file per experiment.

mod storage;
mod tracker;

pub use storage::{LocalStorage, StorageBackend};
pub use tracker::{Experiment, ExperimentTracker, Run, RunStatus};
