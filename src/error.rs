//! Error types for the prices predictor pipeline

use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Main error type for the pipeline
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Data error: {0}")]
    Data(String),

    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    #[error("Column '{column}' has the wrong type: expected {expected}, got {actual}")]
    ColumnType {
        column: String,
        expected: String,
        actual: String,
    },

    #[error("Invalid shape: expected {expected}, got {actual}")]
    ShapeError { expected: String, actual: String },

    #[error("Invalid parameter: {name} = {value}, {reason}")]
    InvalidParameter {
        name: String,
        value: String,
        reason: String,
    },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("No ingestor available for file extension: {0}")]
    UnsupportedExtension(String),

    #[error("Unknown strategy: {0}")]
    UnknownStrategy(String),

    #[error("Archive error: {0}")]
    Archive(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Model not fitted")]
    ModelNotFitted,

    #[error("Training error: {0}")]
    Training(String),

    #[error("Computation error: {0}")]
    Computation(String),

    #[error("Artifact not found: {name} ({version})")]
    ArtifactNotFound { name: String, version: String },

    #[error("Service error: {0}")]
    Service(String),
}

impl PipelineError {
    /// Whether the error comes from a caller violating an input contract
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            PipelineError::ColumnNotFound(_)
                | PipelineError::ColumnType { .. }
                | PipelineError::ShapeError { .. }
                | PipelineError::InvalidParameter { .. }
                | PipelineError::InvalidInput(_)
                | PipelineError::UnsupportedFormat(_)
                | PipelineError::UnsupportedExtension(_)
                | PipelineError::UnknownStrategy(_)
        )
    }
}

impl From<polars::error::PolarsError> for PipelineError {
    fn from(err: polars::error::PolarsError) -> Self {
        PipelineError::Data(err.to_string())
    }
}

impl From<serde_json::Error> for PipelineError {
    fn from(err: serde_json::Error) -> Self {
        PipelineError::Serialization(err.to_string())
    }
}

impl From<ndarray::ShapeError> for PipelineError {
    fn from(err: ndarray::ShapeError) -> Self {
        PipelineError::ShapeError {
            expected: "valid shape".to_string(),
            actual: err.to_string(),
        }
    }
}

impl From<zip::result::ZipError> for PipelineError {
    fn from(err: zip::result::ZipError) -> Self {
        PipelineError::Archive(err.to_string())
    }
}

impl From<reqwest::Error> for PipelineError {
    fn from(err: reqwest::Error) -> Self {
        PipelineError::Service(err.to_string())
    }
}
