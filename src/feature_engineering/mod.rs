//! Feature engineering strategies
//!
//! Each strategy learns its parameters in [`FeatureEngineeringStrategy::fit`],
//! producing a [`FittedFeatureTransform`] that can be applied unchanged to any
//! later dataset (for example a held-out split or an inference payload).
//! Row count and row order are always preserved.

use crate::data::{require_kind, ColumnKind};
use crate::error::Result;
use crate::preprocessing::{OneHotEncoder, Scaler, ScalerType};
use crate::strategy::Strategy;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Column transformations applied before splitting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FeatureEngineeringStrategy {
    /// `ln(1 + x)`
    Log { features: Vec<String> },
    /// `(x - mean) / std`, population std
    StandardScaling { features: Vec<String> },
    /// Linear rescale into `feature_range`
    MinMaxScaling {
        features: Vec<String>,
        feature_range: (f64, f64),
    },
    /// Drop-first one-hot encoding
    OneHotEncoding { features: Vec<String> },
}

impl FeatureEngineeringStrategy {
    /// Min-max scaling into `[0, 1]`
    pub fn min_max(features: Vec<String>) -> Self {
        FeatureEngineeringStrategy::MinMaxScaling {
            features,
            feature_range: (0.0, 1.0),
        }
    }

    pub fn features(&self) -> &[String] {
        match self {
            FeatureEngineeringStrategy::Log { features }
            | FeatureEngineeringStrategy::StandardScaling { features }
            | FeatureEngineeringStrategy::MinMaxScaling { features, .. }
            | FeatureEngineeringStrategy::OneHotEncoding { features } => features,
        }
    }

    /// Learn the transformation parameters from `df`
    pub fn fit(&self, df: &DataFrame) -> Result<FittedFeatureTransform> {
        match self {
            FeatureEngineeringStrategy::Log { features } => {
                for name in features {
                    require_kind(df, name, ColumnKind::Numeric)?;
                }
                Ok(FittedFeatureTransform::Log {
                    features: features.clone(),
                })
            }
            FeatureEngineeringStrategy::StandardScaling { features } => {
                let mut scaler = Scaler::new(ScalerType::Standard)?;
                scaler.fit(df, features)?;
                Ok(FittedFeatureTransform::Scaling(scaler))
            }
            FeatureEngineeringStrategy::MinMaxScaling {
                features,
                feature_range: (low, high),
            } => {
                let mut scaler = Scaler::new(ScalerType::MinMax {
                    low: *low,
                    high: *high,
                })?;
                scaler.fit(df, features)?;
                Ok(FittedFeatureTransform::Scaling(scaler))
            }
            FeatureEngineeringStrategy::OneHotEncoding { features } => {
                let mut encoder = OneHotEncoder::new().with_drop_first(true);
                encoder.fit(df, features)?;
                Ok(FittedFeatureTransform::OneHot(encoder))
            }
        }
    }

    /// Fit on `df` and transform it
    pub fn apply_transformation(&self, df: &DataFrame) -> Result<DataFrame> {
        let result = self.fit(df)?.transform(df)?;
        info!(
            strategy = self.name(),
            features = ?self.features(),
            columns = result.width(),
            "Applied feature engineering"
        );
        Ok(result)
    }

    fn name(&self) -> &'static str {
        match self {
            FeatureEngineeringStrategy::Log { .. } => "log",
            FeatureEngineeringStrategy::StandardScaling { .. } => "standard_scaling",
            FeatureEngineeringStrategy::MinMaxScaling { .. } => "min_max_scaling",
            FeatureEngineeringStrategy::OneHotEncoding { .. } => "one_hot_encoding",
        }
    }
}

impl Strategy for FeatureEngineeringStrategy {
    type Input<'a> = &'a DataFrame;
    type Output = DataFrame;

    fn execute(&self, df: &DataFrame) -> Result<DataFrame> {
        self.apply_transformation(df)
    }
}

/// Feature transformation with learned parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum FittedFeatureTransform {
    Log { features: Vec<String> },
    Scaling(Scaler),
    OneHot(OneHotEncoder),
}

impl FittedFeatureTransform {
    pub fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        match self {
            FittedFeatureTransform::Log { features } => {
                let mut result = df.clone();
                for name in features {
                    let series = require_kind(df, name, ColumnKind::Numeric)?;
                    let cast = series.cast(&DataType::Float64)?;
                    let logged: Float64Chunked = cast
                        .f64()?
                        .into_iter()
                        .map(|opt| opt.map(f64::ln_1p))
                        .collect();
                    result.with_column(logged.with_name(series.name().clone()).into_series())?;
                }
                Ok(result)
            }
            FittedFeatureTransform::Scaling(scaler) => scaler.transform(df),
            FittedFeatureTransform::OneHot(encoder) => encoder.transform(df),
        }
    }
}
