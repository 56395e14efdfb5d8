//! Versioned artifact store for trained models
//!
//! Every registration under a name gets the next integer version, starting
//! at 1. A version moves through [`Stage`]s. Promoting a version to
//! `Production` archives whichever version held that stage before, so at
//! most one version per name is in production.

mod local;
mod memory;

pub use local::LocalArtifactStore;
pub use memory::InMemoryArtifactStore;

use crate::error::{PipelineError, Result};
use crate::training::ModelPipeline;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Lifecycle stage of a model version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stage {
    None,
    Staging,
    Production,
    Archived,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::None => "none",
            Stage::Staging => "staging",
            Stage::Production => "production",
            Stage::Archived => "archived",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for Stage {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(Stage::None),
            "staging" => Ok(Stage::Staging),
            "production" => Ok(Stage::Production),
            "archived" => Ok(Stage::Archived),
            other => Err(PipelineError::UnknownStrategy(format!("stage '{}'", other))),
        }
    }
}

/// Which version of a named model to load
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VersionSelector {
    Latest,
    Number(u32),
    Stage(Stage),
}

impl fmt::Display for VersionSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VersionSelector::Latest => write!(f, "latest"),
            VersionSelector::Number(n) => write!(f, "{}", n),
            VersionSelector::Stage(stage) => write!(f, "{}", stage),
        }
    }
}

impl FromStr for VersionSelector {
    type Err = PipelineError;

    /// Parses `"latest"`, a version number such as `"3"`, or a stage name
    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("latest") {
            return Ok(VersionSelector::Latest);
        }
        if let Ok(n) = trimmed.parse::<u32>() {
            return Ok(VersionSelector::Number(n));
        }
        trimmed.parse::<Stage>().map(VersionSelector::Stage)
    }
}

/// Index entry for one registered version
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelVersionInfo {
    pub name: String,
    pub version: u32,
    pub stage: Stage,
    pub model_id: String,
    pub registered_at: DateTime<Utc>,
}

/// Minimal contract for storing and retrieving versioned models
pub trait ArtifactStore: Send + Sync {
    /// Store a model under `name` and return its new version number
    fn register(&self, name: &str, model: &ModelPipeline) -> Result<u32>;

    /// Load the version of `name` picked by `selector`
    fn load(&self, name: &str, selector: VersionSelector) -> Result<ModelPipeline>;

    /// Move a version to `stage`
    fn transition(&self, name: &str, version: u32, stage: Stage) -> Result<()>;

    /// All versions of `name`, oldest first
    fn versions(&self, name: &str) -> Result<Vec<ModelVersionInfo>>;
}

/// Version bookkeeping shared by the store implementations
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct RegistryIndex {
    models: BTreeMap<String, Vec<ModelVersionInfo>>,
}

impl RegistryIndex {
    pub(crate) fn add(&mut self, name: &str, model: &ModelPipeline) -> Result<ModelVersionInfo> {
        validate_name(name)?;
        let entries = self.models.entry(name.to_string()).or_default();
        let version = entries.iter().map(|e| e.version).max().unwrap_or(0) + 1;
        let info = ModelVersionInfo {
            name: name.to_string(),
            version,
            stage: Stage::None,
            model_id: model.metadata().model_id.clone(),
            registered_at: Utc::now(),
        };
        entries.push(info.clone());
        Ok(info)
    }

    pub(crate) fn resolve(&self, name: &str, selector: VersionSelector) -> Result<&ModelVersionInfo> {
        let not_found = || PipelineError::ArtifactNotFound {
            name: name.to_string(),
            version: selector.to_string(),
        };
        let entries = self.models.get(name).ok_or_else(not_found)?;

        let found = match selector {
            VersionSelector::Latest => entries.iter().max_by_key(|e| e.version),
            VersionSelector::Number(n) => entries.iter().find(|e| e.version == n),
            VersionSelector::Stage(stage) => entries
                .iter()
                .filter(|e| e.stage == stage)
                .max_by_key(|e| e.version),
        };
        found.ok_or_else(not_found)
    }

    pub(crate) fn transition(&mut self, name: &str, version: u32, stage: Stage) -> Result<()> {
        self.resolve(name, VersionSelector::Number(version))?;
        let entries = self.models.get_mut(name).ok_or_else(|| PipelineError::ArtifactNotFound {
            name: name.to_string(),
            version: version.to_string(),
        })?;

        for entry in entries.iter_mut() {
            if entry.version == version {
                entry.stage = stage;
            } else if stage == Stage::Production && entry.stage == Stage::Production {
                entry.stage = Stage::Archived;
            }
        }
        Ok(())
    }

    pub(crate) fn versions(&self, name: &str) -> Vec<ModelVersionInfo> {
        let mut entries = self.models.get(name).cloned().unwrap_or_default();
        entries.sort_by_key(|e| e.version);
        entries
    }
}

/// Names become directory names, so path separators are rejected
fn validate_name(name: &str) -> Result<()> {
    let bad = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\'])
        || name.chars().any(char::is_control);
    if bad {
        return Err(PipelineError::InvalidParameter {
            name: "model_name".to_string(),
            value: name.to_string(),
            reason: "must be a non-empty name without path separators".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::training::{ModelBuildingStrategy, ModelPipeline};
    use polars::prelude::*;

    pub fn tiny_model() -> ModelPipeline {
        let x = df! { "a" => [1.0, 2.0, 3.0, 4.0] }.unwrap();
        let y = Series::new("y".into(), &[2.0, 4.0, 6.0, 8.0]);
        ModelBuildingStrategy::default().build_and_train(&x, &y).unwrap()
    }
}
