use super::{StepRecord, StepRunner};
use crate::config::PipelineConfig;
use crate::data::DataIngestorFactory;
use crate::error::Result;
use crate::evaluation::{EvaluationMetrics, EvaluationStrategy};
use crate::feature_engineering::{FeatureEngineeringStrategy, FittedFeatureTransform};
use crate::preprocessing::outlier;
use crate::tracking::{ExperimentTracker, RunStatus};
use crate::training::{ModelBuildingStrategy, ModelPipeline, TargetTransform};
use polars::prelude::DataFrame;
use tracing::{info, warn};

/// Everything a training run produces
#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    pub model: ModelPipeline,
    pub metrics: EvaluationMetrics,
    pub n_train: usize,
    pub n_test: usize,
    pub steps: Vec<StepRecord>,
    /// Experiment run the outcome was recorded under
    pub run_id: String,
}

/// Ingest, clean, engineer, split, train and evaluate.
///
/// The run is recorded in the experiment tracker whether it succeeds or not.
pub fn run_training_pipeline(config: &PipelineConfig) -> Result<TrainingOutcome> {
    let mut tracker = ExperimentTracker::with_dir(&config.experiment_name, config.experiments_dir());
    let run_id = tracker.start_run("training").run_id.clone();
    tracker.log_param("data_path", config.data_path.display())?;
    tracker.log_param("target_column", &config.target_column)?;
    tracker.log_param("test_size", config.test_size)?;
    tracker.log_param("random_state", config.random_state)?;
    tracker.log_param("log_features", config.log_features.join(","))?;

    let mut runner = StepRunner::new();
    match train(config, &mut runner) {
        Ok((model, metrics, n_train, n_test)) => {
            for (name, value) in metrics.iter() {
                tracker.log_metric(name, value)?;
            }
            tracker.set_tag("model_id", &model.metadata().model_id)?;
            tracker.end_run(RunStatus::Finished)?;

            info!(
                run_id = %run_id,
                n_train,
                n_test,
                mse = metrics.mse(),
                r_squared = metrics.r_squared(),
                "Training pipeline finished"
            );
            Ok(TrainingOutcome {
                model,
                metrics,
                n_train,
                n_test,
                steps: runner.into_records(),
                run_id,
            })
        }
        Err(e) => {
            if let Err(track_err) = tracker.end_run(RunStatus::Failed) {
                warn!(error = %track_err, "Could not record failed run");
            }
            Err(e)
        }
    }
}

fn train(
    config: &PipelineConfig,
    runner: &mut StepRunner,
) -> Result<(ModelPipeline, EvaluationMetrics, usize, usize)> {
    let df = runner.run("data_ingestion", || {
        DataIngestorFactory::for_path(&config.data_path)?
            .with_extract_dir(&config.extract_dir)
            .ingest(&config.data_path)
    })?;

    let df = runner.run("handle_missing_values", || config.missing_values.handle(&df))?;

    let (df, feature_transforms, target_transform) = if config.log_features.is_empty() {
        (df, Vec::new(), None)
    } else {
        runner.run("feature_engineering", || engineer_features(config, df))?
    };

    let df = match &config.outlier {
        Some(outlier_config) => runner.run("outlier_detection", || {
            outlier::validate(&outlier_config.strategy)?;
            outlier_config
                .strategy
                .handle(&df, &outlier_config.columns, outlier_config.handling)
        })?,
        None => df,
    };

    let split = runner.run("data_splitter", || {
        config.split_strategy().split(&df, &config.target_column)
    })?;

    let model = runner.run("model_building", || {
        ModelBuildingStrategy::default().build_and_train_with(
            &split.x_train,
            &split.y_train,
            feature_transforms,
            target_transform,
        )
    })?;

    let metrics = runner.run("model_evaluation", || {
        EvaluationStrategy::Regression.evaluate(&model, &split.x_test, &split.y_test)
    })?;

    Ok((model, metrics, split.n_train(), split.n_test()))
}

/// Log-transform the target in place and fit the feature transforms.
///
/// Feature columns are left raw in the returned frame: their fitted transform
/// travels with the model, so training, evaluation and serving all apply it.
fn engineer_features(
    config: &PipelineConfig,
    df: DataFrame,
) -> Result<(DataFrame, Vec<FittedFeatureTransform>, Option<TargetTransform>)> {
    let (target, features): (Vec<String>, Vec<String>) = config
        .log_features
        .iter()
        .cloned()
        .partition(|name| *name == config.target_column);

    let (df, target_transform) = if target.is_empty() {
        (df, None)
    } else {
        let logged = FeatureEngineeringStrategy::Log { features: target }.apply_transformation(&df)?;
        (logged, Some(TargetTransform::Log1p))
    };

    let feature_transforms = if features.is_empty() {
        Vec::new()
    } else {
        vec![FeatureEngineeringStrategy::Log { features }.fit(&df)?]
    };
    Ok((df, feature_transforms, target_transform))
}
