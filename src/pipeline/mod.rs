//! End-to-end pipelines
//!
//! Each pipeline is a linear sequence of named steps. [`StepRunner`] runs
//! every step inside an `info_span!("step")` and keeps a [`StepRecord`] of
//! how long it took and whether it succeeded. The first failing step aborts
//! the pipeline and its error is returned unchanged.

mod deployment;
mod inference;
mod training;

pub use deployment::{run_deployment_pipeline, DeploymentOutcome};
pub use inference::{
    dynamic_importer, model_loader, prediction_service_loader, predictor, run_inference_pipeline,
};
pub use training::{run_training_pipeline, TrainingOutcome};

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Instant;
use tracing::{error, info, info_span, Instrument};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepStatus {
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepRecord {
    pub name: String,
    pub duration_ms: u64,
    pub status: StepStatus,
}

/// Runs named steps and records their outcome
#[derive(Debug, Default)]
pub struct StepRunner {
    records: Vec<StepRecord>,
}

impl StepRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn run<T>(&mut self, name: &str, step: impl FnOnce() -> Result<T>) -> Result<T> {
        let span = info_span!("step", step = %name);
        let _entered = span.enter();
        let start = Instant::now();
        let result = step();
        self.record(name, start, result.is_ok());
        result
    }

    pub async fn run_async<T, F>(&mut self, name: &str, step: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        let start = Instant::now();
        let result = step.instrument(info_span!("step", step = %name)).await;
        self.record(name, start, result.is_ok());
        result
    }

    pub fn records(&self) -> &[StepRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<StepRecord> {
        self.records
    }

    fn record(&mut self, name: &str, start: Instant, ok: bool) {
        let duration_ms = start.elapsed().as_millis() as u64;
        let status = if ok {
            info!(step = %name, duration_ms, "Step finished");
            StepStatus::Succeeded
        } else {
            error!(step = %name, duration_ms, "Step failed");
            StepStatus::Failed
        };
        self.records.push(StepRecord {
            name: name.to_string(),
            duration_ms,
            status,
        });
    }
}
