//! Model training
//!
//! - Train/test splitting with a seeded shuffle
//! - Ordinary least squares regression
//! - The model pipeline (fitted feature transforms, column preprocessor,
//!   regressor) and the strategy that builds it

mod engine;
pub mod linear_models;
pub mod splitter;

pub use engine::{ModelBuildingStrategy, ModelMetadata, ModelPipeline, TargetTransform};
pub use linear_models::LinearRegression;
pub use splitter::{SplitResult, SplitStrategy};
