//! Model building: preprocessing plus regressor as one trained artifact

use super::linear_models::LinearRegression;
use crate::data::{frame_to_array2, target_to_array1, ColumnKind};
use crate::error::{PipelineError, Result};
use crate::feature_engineering::FittedFeatureTransform;
use crate::preprocessing::ColumnPreprocessor;
use crate::strategy::Strategy;
use chrono::{DateTime, Utc};
use ndarray::Array1;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Instant;
use tracing::{info, warn};

/// Descriptive metadata recorded at training time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetadata {
    pub model_id: String,
    pub algorithm: String,
    pub target_column: String,
    pub n_train_samples: usize,
    pub feature_names: Vec<String>,
    /// Transform the target was trained under; predictions are on that scale
    #[serde(default)]
    pub target_transform: Option<TargetTransform>,
    pub trained_at: DateTime<Utc>,
    pub training_time_secs: f64,
}

/// Invertible transform applied to the target before training
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetTransform {
    /// `ln(1 + y)`, inverted with `exp(p) - 1`
    Log1p,
}

impl TargetTransform {
    pub fn inverse(&self, value: f64) -> f64 {
        match self {
            TargetTransform::Log1p => value.exp_m1(),
        }
    }
}

/// A trained, immutable model: fitted feature transforms, then the column
/// preprocessor, then the regressor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelPipeline {
    #[serde(default)]
    feature_transforms: Vec<FittedFeatureTransform>,
    preprocessor: ColumnPreprocessor,
    regressor: LinearRegression,
    metadata: ModelMetadata,
}

impl ModelPipeline {
    pub fn metadata(&self) -> &ModelMetadata {
        &self.metadata
    }

    pub fn regressor(&self) -> &LinearRegression {
        &self.regressor
    }

    /// Raw columns the model reads, with their kinds, in training order
    pub fn input_schema(&self) -> Vec<(String, ColumnKind)> {
        self.preprocessor.input_schema()
    }

    /// Baseline category of each one-hot encoded input column
    pub fn reference_categories(&self) -> Vec<(&str, Option<&str>)> {
        self.preprocessor.reference_categories()
    }

    pub fn feature_transforms(&self) -> &[FittedFeatureTransform] {
        &self.feature_transforms
    }

    /// Predict for every row of raw features `x`. Extra columns are ignored.
    ///
    /// Predictions are on the scale of the training target; see
    /// [`ModelPipeline::inverse_target`].
    pub fn predict(&self, x: &DataFrame) -> Result<Array1<f64>> {
        let mut engineered = x.clone();
        for transform in &self.feature_transforms {
            engineered = transform.transform(&engineered)?;
        }
        let features = self.preprocessor.transform(&engineered)?;
        let matrix = frame_to_array2(&features, &self.metadata.feature_names)?;
        self.regressor.predict(&matrix)
    }

    /// Map predictions back to the original target units
    pub fn inverse_target(&self, predictions: &Array1<f64>) -> Array1<f64> {
        match self.metadata.target_transform {
            Some(t) => predictions.mapv(|p| t.inverse(p)),
            None => predictions.clone(),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }
}

/// Estimators available for model building
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ModelBuildingStrategy {
    LinearRegression { fit_intercept: bool },
}

impl Default for ModelBuildingStrategy {
    fn default() -> Self {
        ModelBuildingStrategy::LinearRegression {
            fit_intercept: true,
        }
    }
}

impl ModelBuildingStrategy {
    /// Fit a fresh preprocessor and regressor on the training data
    pub fn build_and_train(&self, x_train: &DataFrame, y_train: &Series) -> Result<ModelPipeline> {
        self.build_and_train_with(x_train, y_train, Vec::new(), None)
    }

    /// Like [`ModelBuildingStrategy::build_and_train`], with fitted feature
    /// transforms stored in the model and applied to every frame it predicts on.
    ///
    /// `x_train` holds raw features. `y_train` is already on the scale given
    /// by `target_transform`.
    pub fn build_and_train_with(
        &self,
        x_train: &DataFrame,
        y_train: &Series,
        feature_transforms: Vec<FittedFeatureTransform>,
        target_transform: Option<TargetTransform>,
    ) -> Result<ModelPipeline> {
        let start = Instant::now();

        if x_train.height() == 0 || x_train.width() == 0 {
            return Err(PipelineError::ShapeError {
                expected: "non-empty training features".to_string(),
                actual: format!("{} rows x {} columns", x_train.height(), x_train.width()),
            });
        }
        if y_train.len() != x_train.height() {
            return Err(PipelineError::ShapeError {
                expected: format!("{} target values", x_train.height()),
                actual: format!("{} target values", y_train.len()),
            });
        }
        let y = target_to_array1(y_train)?;

        let mut engineered = x_train.clone();
        for transform in &feature_transforms {
            engineered = transform.transform(&engineered)?;
        }

        let mut preprocessor = ColumnPreprocessor::new()?;
        let features = preprocessor.fit_transform(&engineered)?;
        let feature_names = preprocessor.feature_names();
        let x = frame_to_array2(&features, &feature_names)?;

        let ModelBuildingStrategy::LinearRegression { fit_intercept } = self;
        let mut regressor = LinearRegression::new().with_fit_intercept(*fit_intercept);
        regressor.fit(&x, &y).map_err(|e| {
            warn!(error = %e, "Model training failed");
            match e {
                PipelineError::Computation(msg) => PipelineError::Training(msg),
                other => other,
            }
        })?;

        let metadata = ModelMetadata {
            model_id: uuid::Uuid::new_v4().to_string(),
            algorithm: "linear_regression".to_string(),
            target_column: y_train.name().to_string(),
            n_train_samples: x_train.height(),
            feature_names,
            target_transform,
            trained_at: Utc::now(),
            training_time_secs: start.elapsed().as_secs_f64(),
        };

        info!(
            model_id = %metadata.model_id,
            samples = metadata.n_train_samples,
            features = metadata.feature_names.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Trained model"
        );

        Ok(ModelPipeline {
            feature_transforms,
            preprocessor,
            regressor,
            metadata,
        })
    }
}

impl Strategy for ModelBuildingStrategy {
    type Input<'a> = (&'a DataFrame, &'a Series);
    type Output = ModelPipeline;

    fn execute(&self, (x, y): (&DataFrame, &Series)) -> Result<ModelPipeline> {
        self.build_and_train(x, y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature_engineering::FeatureEngineeringStrategy;

    fn training_data() -> (DataFrame, Series) {
        let x = df! {
            "area" => [50.0, 60.0, 70.0, 80.0, 90.0, 100.0],
            "zone" => ["a", "b", "a", "b", "a", "b"],
        }
        .unwrap();
        // price = 2 * area + 10 if zone b
        let y = Series::new("price".into(), &[100.0, 130.0, 140.0, 170.0, 180.0, 210.0]);
        (x, y)
    }

    #[test]
    fn test_build_and_predict() {
        let (x, y) = training_data();
        let model = ModelBuildingStrategy::default().build_and_train(&x, &y).unwrap();

        assert_eq!(model.metadata().feature_names, vec!["area", "zone_b"]);
        assert_eq!(model.metadata().target_column, "price");

        let pred = model.predict(&x).unwrap();
        let truth = [100.0, 130.0, 140.0, 170.0, 180.0, 210.0];
        for (p, t) in pred.iter().zip(truth.iter()) {
            assert!((p - t).abs() < 1e-6, "predicted {} expected {}", p, t);
        }
    }

    #[test]
    fn test_length_mismatch() {
        let (x, _) = training_data();
        let y = Series::new("price".into(), &[1.0, 2.0]);
        let err = ModelBuildingStrategy::default().build_and_train(&x, &y).unwrap_err();
        assert!(matches!(err, PipelineError::ShapeError { .. }));
    }

    #[test]
    fn test_non_numeric_target() {
        let (x, _) = training_data();
        let y = Series::new("price".into(), &["a", "b", "c", "d", "e", "f"]);
        let err = ModelBuildingStrategy::default().build_and_train(&x, &y).unwrap_err();
        assert!(matches!(err, PipelineError::ColumnType { .. }));
    }

    #[test]
    fn test_empty_features() {
        let x = DataFrame::empty();
        let y = Series::new("price".into(), Vec::<f64>::new());
        let err = ModelBuildingStrategy::default().build_and_train(&x, &y).unwrap_err();
        assert!(matches!(err, PipelineError::ShapeError { .. }));
    }

    #[test]
    fn test_json_roundtrip_preserves_predictions() {
        let (x, y) = training_data();
        let model = ModelBuildingStrategy::default().build_and_train(&x, &y).unwrap();
        let restored = ModelPipeline::from_json(&model.to_json().unwrap()).unwrap();
        let before = model.predict(&x).unwrap();
        let after = restored.predict(&x).unwrap();
        for (a, b) in before.iter().zip(after.iter()) {
            assert!((a - b).abs() < 1e-9);
        }
        assert_eq!(restored.metadata().model_id, model.metadata().model_id);
        assert_eq!(restored.input_schema(), model.input_schema());
    }

    #[test]
    fn test_feature_transforms_apply_at_predict() {
        let (x, _) = training_data();
        // price = 3 * ln(1 + area) + 1
        let y: Vec<f64> = [50.0f64, 60.0, 70.0, 80.0, 90.0, 100.0]
            .iter()
            .map(|a| 3.0 * a.ln_1p() + 1.0)
            .collect();
        let y = Series::new("price".into(), y);
        let log_area = FeatureEngineeringStrategy::Log {
            features: vec!["area".to_string()],
        }
        .fit(&x)
        .unwrap();

        let model = ModelBuildingStrategy::default()
            .build_and_train_with(&x, &y, vec![log_area], Some(TargetTransform::Log1p))
            .unwrap();
        assert_eq!(model.feature_transforms().len(), 1);
        assert_eq!(model.metadata().target_transform, Some(TargetTransform::Log1p));

        let raw = df! { "area" => [75.0], "zone" => ["a"] }.unwrap();
        let pred = model.predict(&raw).unwrap();
        assert!((pred[0] - (3.0 * 75f64.ln_1p() + 1.0)).abs() < 1e-6);

        let restored = ModelPipeline::from_json(&model.to_json().unwrap()).unwrap();
        assert!((restored.predict(&raw).unwrap()[0] - pred[0]).abs() < 1e-9);
        let inverted = model.inverse_target(&pred);
        assert!((inverted[0] - pred[0].exp_m1()).abs() < 1e-9);
    }

    #[test]
    fn test_target_transform_roundtrip() {
        let t = TargetTransform::Log1p;
        assert!((t.inverse(215_000f64.ln_1p()) - 215_000.0).abs() < 1e-6);
        assert_eq!(serde_json::to_value(t).unwrap(), "log1p");
    }
}
