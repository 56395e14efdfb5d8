//! Prices Predictor - house price prediction pipelines
//!
//! This crate trains a linear regression model on the Ames housing dataset
//! and serves it over HTTP:
//! - Zip archive ingestion into polars frames
//! - Exploratory analysis reports
//! - Missing value and outlier handling
//! - Feature engineering, splitting, model building and evaluation
//! - Versioned artifact store and experiment tracking
//! - Prediction service and CLI
//!
//! # Modules
//!
//! ## Data
//! - [`data`] - Ingestion and frame helpers
//! - [`analysis`] - Inspection, missing value, univariate, bivariate and
//!   multivariate analysis
//! - [`preprocessing`] - Imputation, scaling, encoding, outliers
//! - [`feature_engineering`] - Log, scaling and one-hot transforms
//!
//! ## Modeling
//! - [`training`] - Splitting, linear regression, model building
//! - [`evaluation`] - Regression metrics
//! - [`registry`] - Versioned model artifacts
//! - [`tracking`] - Experiment runs
//!
//! ## Services
//! - [`pipeline`] - Training, deployment and inference pipelines
//! - [`inference`] - Payload decoding and the prediction service
//! - [`server`] - HTTP endpoints
//! - [`cli`] - Command-line interface
//!
//! The library only emits `tracing` events; installing a subscriber is up to
//! the caller.

// Core error handling
pub mod error;
pub mod strategy;
pub mod config;

// Data processing
pub mod data;
pub mod analysis;
pub mod preprocessing;
pub mod feature_engineering;

// Modeling
pub mod training;
pub mod evaluation;
pub mod registry;
pub mod tracking;

// Services
pub mod pipeline;
pub mod inference;
pub mod server;
pub mod cli;

pub use error::{PipelineError, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::error::{PipelineError, Result};
    pub use crate::strategy::{Context, Strategy};
    pub use crate::config::{DeploymentPolicy, OutlierConfig, PipelineConfig, ServiceConfig};

    pub use crate::data::{DataIngestor, DataIngestorFactory, ZipDataIngestor};
    pub use crate::analysis::{
        BivariateAnalysisStrategy, InspectionStrategy, MissingValuesAnalysis, MultivariateAnalysis,
        SimpleMissingValuesAnalysis, SimpleMultivariateAnalysis, UnivariateAnalysisStrategy,
    };
    pub use crate::preprocessing::{
        MissingValueStrategy, OutlierDetectionStrategy, OutlierHandling,
    };
    pub use crate::feature_engineering::FeatureEngineeringStrategy;

    pub use crate::training::{ModelBuildingStrategy, ModelPipeline, SplitStrategy};
    pub use crate::evaluation::{EvaluationMetrics, EvaluationStrategy};
    pub use crate::registry::{
        ArtifactStore, InMemoryArtifactStore, LocalArtifactStore, Stage, VersionSelector,
    };
    pub use crate::tracking::ExperimentTracker;

    pub use crate::pipeline::{run_deployment_pipeline, run_inference_pipeline, run_training_pipeline};
    pub use crate::inference::{PredictionService, AMES_INFERENCE_COLUMNS};
}
