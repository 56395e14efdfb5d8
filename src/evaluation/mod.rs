//! Model evaluation

use crate::data::target_to_array1;
use crate::error::{PipelineError, Result};
use crate::strategy::Strategy;
use crate::training::ModelPipeline;
use ndarray::Array1;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::info;

pub const MEAN_SQUARED_ERROR: &str = "Mean Squared Error";
pub const R_SQUARED: &str = "R-Squared";
pub const ROOT_MEAN_SQUARED_ERROR: &str = "Root Mean Squared Error";
pub const MEAN_ABSOLUTE_ERROR: &str = "Mean Absolute Error";

/// Immutable, ordered metric name to value map
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EvaluationMetrics {
    values: BTreeMap<String, f64>,
}

impl EvaluationMetrics {
    /// Regression metrics for aligned truth and prediction vectors
    pub fn regression(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Result<Self> {
        if y_true.len() != y_pred.len() {
            return Err(PipelineError::ShapeError {
                expected: format!("{} predictions", y_true.len()),
                actual: format!("{} predictions", y_pred.len()),
            });
        }
        if y_true.is_empty() {
            return Err(PipelineError::InvalidInput("cannot evaluate on an empty test set".to_string()));
        }

        let n = y_true.len() as f64;
        let errors: Vec<f64> = y_true.iter().zip(y_pred.iter()).map(|(t, p)| t - p).collect();

        let ss_res: f64 = errors.iter().map(|e| e * e).sum();
        let mse = ss_res / n;
        let mae = errors.iter().map(|e| e.abs()).sum::<f64>() / n;

        let y_mean = y_true.iter().sum::<f64>() / n;
        let ss_tot: f64 = y_true.iter().map(|y| (y - y_mean).powi(2)).sum();
        let r2 = if ss_tot > 0.0 {
            1.0 - ss_res / ss_tot
        } else if ss_res == 0.0 {
            1.0
        } else {
            0.0
        };

        let mut values = BTreeMap::new();
        values.insert(MEAN_SQUARED_ERROR.to_string(), mse);
        values.insert(ROOT_MEAN_SQUARED_ERROR.to_string(), mse.sqrt());
        values.insert(MEAN_ABSOLUTE_ERROR.to_string(), mae);
        values.insert(R_SQUARED.to_string(), r2);
        Ok(Self { values })
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied()
    }

    pub fn mse(&self) -> f64 {
        self.values.get(MEAN_SQUARED_ERROR).copied().unwrap_or(f64::NAN)
    }

    pub fn r_squared(&self) -> f64 {
        self.values.get(R_SQUARED).copied().unwrap_or(f64::NAN)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.values.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn as_map(&self) -> &BTreeMap<String, f64> {
        &self.values
    }
}

impl fmt::Display for EvaluationMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, value) in &self.values {
            writeln!(f, "{:<24} {:.6}", name, value)?;
        }
        Ok(())
    }
}

/// Evaluation strategies
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub enum EvaluationStrategy {
    #[default]
    Regression,
}

impl EvaluationStrategy {
    /// Predict on the test features and score against the test target
    pub fn evaluate(&self, model: &ModelPipeline, x_test: &DataFrame, y_test: &Series) -> Result<EvaluationMetrics> {
        let y_true = target_to_array1(y_test)?;
        let y_pred = model.predict(x_test)?;

        let metrics = match self {
            EvaluationStrategy::Regression => EvaluationMetrics::regression(&y_true, &y_pred)?,
        };

        info!(
            mse = metrics.mse(),
            r_squared = metrics.r_squared(),
            samples = y_true.len(),
            "Evaluated model"
        );
        Ok(metrics)
    }
}

impl Strategy for EvaluationStrategy {
    type Input<'a> = (&'a ModelPipeline, &'a DataFrame, &'a Series);
    type Output = EvaluationMetrics;

    fn execute(&self, (model, x, y): (&ModelPipeline, &DataFrame, &Series)) -> Result<EvaluationMetrics> {
        self.evaluate(model, x, y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_regression_metrics() {
        let y_true = array![1.0, 2.0, 3.0, 4.0, 5.0];
        let y_pred = array![1.1, 2.0, 2.9, 4.1, 5.0];

        let metrics = EvaluationMetrics::regression(&y_true, &y_pred).unwrap();
        assert!((metrics.mse() - 0.006).abs() < 1e-12);
        assert!((metrics.get(MEAN_ABSOLUTE_ERROR).unwrap() - 0.06).abs() < 1e-12);
        assert!(metrics.r_squared() > 0.99);
        assert_eq!(metrics.iter().count(), 4);
    }

    #[test]
    fn test_constant_target_is_force_finite() {
        let y_true = array![2.0, 2.0, 2.0];
        let perfect = EvaluationMetrics::regression(&y_true, &y_true).unwrap();
        assert_eq!(perfect.r_squared(), 1.0);

        let off = EvaluationMetrics::regression(&y_true, &array![1.0, 2.0, 3.0]).unwrap();
        assert_eq!(off.r_squared(), 0.0);
    }

    #[test]
    fn test_serializes_as_object() {
        let metrics = EvaluationMetrics::regression(&array![1.0, 3.0], &array![1.0, 3.0]).unwrap();
        let json = serde_json::to_value(&metrics).unwrap();
        assert_eq!(json["Mean Squared Error"], 0.0);
        assert_eq!(json["R-Squared"], 1.0);
    }

    #[test]
    fn test_length_mismatch() {
        let err = EvaluationMetrics::regression(&array![1.0], &array![1.0, 2.0]).unwrap_err();
        assert!(matches!(err, PipelineError::ShapeError { .. }));
    }

    #[test]
    fn test_evaluate_is_pure() {
        let x_train = df! {
            "area" => [50.0, 60.0, 70.0, 80.0, 90.0, 100.0],
            "zone" => ["a", "b", "a", "b", "a", "b"],
        }
        .unwrap();
        let y_train = Series::new("price".into(), &[100.0, 130.0, 140.0, 170.0, 180.0, 210.0]);
        let model = crate::training::ModelBuildingStrategy::default()
            .build_and_train(&x_train, &y_train)
            .unwrap();

        // "c" was never seen in training
        let x_test = df! {
            "area" => [55.0, 75.0, 95.0],
            "zone" => ["a", "c", "b"],
        }
        .unwrap();
        let y_test = Series::new("price".into(), &[110.0, 150.0, 200.0]);
        let before = model.predict(&x_test).unwrap();

        let first = EvaluationStrategy::Regression.evaluate(&model, &x_test, &y_test).unwrap();
        let second = EvaluationStrategy::Regression.evaluate(&model, &x_test, &y_test).unwrap();
        assert_eq!(first, second);
        assert_eq!(model.predict(&x_test).unwrap(), before);
        assert_eq!(x_test.height(), 3);
        assert!(first.mse().is_finite());
    }
}
