//! Pipeline configuration

use crate::error::Result;
use crate::preprocessing::{MissingValueStrategy, OutlierDetectionStrategy, OutlierHandling};
use crate::training::SplitStrategy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Outlier removal applied after feature engineering
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutlierConfig {
    pub strategy: OutlierDetectionStrategy,
    pub columns: Vec<String>,
    pub handling: OutlierHandling,
}

impl Default for OutlierConfig {
    fn default() -> Self {
        Self {
            strategy: OutlierDetectionStrategy::ZScore { threshold: 3.0 },
            columns: vec!["SalePrice".to_string()],
            handling: OutlierHandling::Remove,
        }
    }
}

/// Gates a freshly trained model must pass to be promoted to production
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeploymentPolicy {
    pub deploy: bool,
    pub max_mse: Option<f64>,
    pub min_r_squared: Option<f64>,
}

impl Default for DeploymentPolicy {
    fn default() -> Self {
        Self {
            deploy: true,
            max_mse: None,
            min_r_squared: None,
        }
    }
}

/// Prediction service settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub host: String,
    pub port: u16,
    pub startup_timeout_secs: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: std::env::var("API_HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: std::env::var("API_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8000),
            startup_timeout_secs: 10,
        }
    }
}

impl ServiceConfig {
    pub fn startup_timeout(&self) -> Duration {
        Duration::from_secs(self.startup_timeout_secs)
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_startup_timeout(mut self, secs: u64) -> Self {
        self.startup_timeout_secs = secs;
        self
    }
}

/// Configuration for the training, deployment and inference pipelines
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Input archive
    pub data_path: PathBuf,
    /// Directory the archive is extracted into
    pub extract_dir: PathBuf,
    pub target_column: String,
    pub missing_values: MissingValueStrategy,
    /// Columns receiving `ln(1 + x)`
    pub log_features: Vec<String>,
    /// Outlier removal, skipped when `None`
    pub outlier: Option<OutlierConfig>,
    pub test_size: f64,
    pub random_state: u64,
    /// Name models are registered under
    pub model_name: String,
    /// Root for the artifact store and experiment records
    pub artifact_root: PathBuf,
    pub experiment_name: String,
    pub deployment: DeploymentPolicy,
    pub service: ServiceConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("data/archive.zip"),
            extract_dir: PathBuf::from("extracted_data"),
            target_column: "SalePrice".to_string(),
            missing_values: MissingValueStrategy::default(),
            log_features: vec!["Gr Liv Area".to_string(), "SalePrice".to_string()],
            outlier: Some(OutlierConfig::default()),
            test_size: 0.2,
            random_state: 42,
            model_name: "prices_predictor".to_string(),
            artifact_root: PathBuf::from("mlruns"),
            experiment_name: "prices_predictor".to_string(),
            deployment: DeploymentPolicy::default(),
            service: ServiceConfig::default(),
        }
    }
}

impl PipelineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults with `PRICES_DATA_PATH`, `PRICES_ARTIFACT_ROOT` and
    /// `PRICES_MODEL_NAME` overrides applied
    pub fn from_env_or_default() -> Self {
        Self::default().with_env_overrides()
    }

    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(path) = std::env::var("PRICES_DATA_PATH") {
            self.data_path = PathBuf::from(path);
        }
        if let Ok(root) = std::env::var("PRICES_ARTIFACT_ROOT") {
            self.artifact_root = PathBuf::from(root);
        }
        if let Ok(name) = std::env::var("PRICES_MODEL_NAME") {
            self.model_name = name;
        }
        self
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn split_strategy(&self) -> SplitStrategy {
        SplitStrategy::SimpleTrainTest {
            test_size: self.test_size,
            random_state: self.random_state,
        }
    }

    /// Directory holding experiment run records
    pub fn experiments_dir(&self) -> PathBuf {
        self.artifact_root.join("experiments")
    }

    /// Directory holding registered models
    pub fn models_dir(&self) -> PathBuf {
        self.artifact_root.join("models")
    }

    pub fn with_data_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.data_path = path.into();
        self
    }

    pub fn with_extract_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.extract_dir = dir.into();
        self
    }

    pub fn with_target_column(mut self, target: impl Into<String>) -> Self {
        self.target_column = target.into();
        self
    }

    pub fn with_log_features(mut self, features: Vec<String>) -> Self {
        self.log_features = features;
        self
    }

    pub fn with_outlier(mut self, outlier: Option<OutlierConfig>) -> Self {
        self.outlier = outlier;
        self
    }

    pub fn with_split(mut self, test_size: f64, random_state: u64) -> Self {
        self.test_size = test_size;
        self.random_state = random_state;
        self
    }

    pub fn with_artifact_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.artifact_root = root.into();
        self
    }

    pub fn with_model_name(mut self, name: impl Into<String>) -> Self {
        self.model_name = name.into();
        self
    }

    pub fn with_deployment(mut self, policy: DeploymentPolicy) -> Self {
        self.deployment = policy;
        self
    }

    pub fn with_service(mut self, service: ServiceConfig) -> Self {
        self.service = service;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PipelineConfig::default();
        assert_eq!(config.target_column, "SalePrice");
        assert_eq!(config.test_size, 0.2);
        assert_eq!(config.random_state, 42);
        assert_eq!(config.service.startup_timeout_secs, 10);
        assert_eq!(config.log_features, vec!["Gr Liv Area", "SalePrice"]);
    }

    #[test]
    fn test_builder_pattern() {
        let config = PipelineConfig::new()
            .with_split(0.3, 7)
            .with_model_name("houses")
            .with_outlier(None);
        assert_eq!(
            config.split_strategy(),
            SplitStrategy::SimpleTrainTest {
                test_size: 0.3,
                random_state: 7
            }
        );
        assert_eq!(config.model_name, "houses");
        assert!(config.outlier.is_none());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let config = PipelineConfig::default().with_target_column("price");
        config.save(&path).unwrap();
        assert_eq!(PipelineConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: PipelineConfig = serde_json::from_str(r#"{"model_name": "m"}"#).unwrap();
        assert_eq!(config.model_name, "m");
        assert_eq!(config.target_column, "SalePrice");
    }
}
