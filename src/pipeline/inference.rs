use super::StepRunner;
use crate::config::{PipelineConfig, ServiceConfig};
use crate::error::Result;
use crate::inference::{sample_payload, PredictionService};
use crate::registry::{ArtifactStore, Stage, VersionSelector};
use crate::training::ModelPipeline;
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

/// Load the production version of `name`
pub fn model_loader(store: &dyn ArtifactStore, name: &str) -> Result<ModelPipeline> {
    let model = store.load(name, VersionSelector::Stage(Stage::Production))?;
    info!(model = %name, model_id = %model.metadata().model_id, "Loaded production model");
    Ok(model)
}

/// Start a prediction service for `model`, bounded by the startup timeout
pub async fn prediction_service_loader(
    model: ModelPipeline,
    config: &ServiceConfig,
) -> Result<PredictionService> {
    PredictionService::start(Arc::new(model), config).await
}

/// Send `payload` to the service and return the raw predictions
pub async fn predictor(service: &PredictionService, payload: &Value) -> Result<Vec<f64>> {
    service.predict(payload).await
}

/// Sample batch in split orientation
pub fn dynamic_importer() -> Value {
    sample_payload()
}

/// Load the production model, serve it, predict `payload`, then stop the service
pub async fn run_inference_pipeline(
    config: &PipelineConfig,
    store: &dyn ArtifactStore,
    payload: &Value,
) -> Result<Vec<f64>> {
    let mut runner = StepRunner::new();
    let model = runner.run("model_loader", || model_loader(store, &config.model_name))?;
    let service = runner
        .run_async("prediction_service_loader", prediction_service_loader(model, &config.service))
        .await?;

    let predictions = runner.run_async("predictor", predictor(&service, payload)).await;
    service.stop().await;
    let predictions = predictions?;

    info!(
        model = %config.model_name,
        rows = predictions.len(),
        "Inference pipeline finished"
    );
    Ok(predictions)
}
