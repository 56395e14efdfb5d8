//! Data preprocessing
//!
//! - Missing value imputation and dataset-level missing value handling
//! - Feature scaling (standard, min-max)
//! - One-hot encoding
//! - Outlier detection and handling
//! - The column preprocessor placed in front of the regressor

mod encoder;
mod imputer;
pub mod missing_values;
pub mod outlier;
mod pipeline;
mod scaler;

pub use encoder::OneHotEncoder;
pub use imputer::{ImputeStrategy, Imputer};
pub use missing_values::{FillMethod, MissingValueStrategy};
pub use outlier::{OutlierBounds, OutlierDetectionStrategy, OutlierHandling};
pub use pipeline::ColumnPreprocessor;
pub use scaler::{Scaler, ScalerType};

pub(crate) use imputer::string_mode;
pub(crate) use outlier::linear_quantile;
