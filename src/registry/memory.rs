//! In-process artifact store

use super::{ArtifactStore, ModelVersionInfo, RegistryIndex, Stage, VersionSelector};
use crate::error::{PipelineError, Result};
use crate::training::ModelPipeline;
use parking_lot::RwLock;
use std::collections::HashMap;

#[derive(Default)]
struct Inner {
    index: RegistryIndex,
    models: HashMap<(String, u32), ModelPipeline>,
}

/// Keeps registered models in memory. Useful for tests and one-shot runs.
#[derive(Default)]
pub struct InMemoryArtifactStore {
    inner: RwLock<Inner>,
}

impl InMemoryArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ArtifactStore for InMemoryArtifactStore {
    fn register(&self, name: &str, model: &ModelPipeline) -> Result<u32> {
        let mut inner = self.inner.write();
        let entry = inner.index.add(name, model)?;
        inner.models.insert((name.to_string(), entry.version), model.clone());
        Ok(entry.version)
    }

    fn load(&self, name: &str, selector: VersionSelector) -> Result<ModelPipeline> {
        let inner = self.inner.read();
        let version = inner.index.resolve(name, selector)?.version;
        inner
            .models
            .get(&(name.to_string(), version))
            .cloned()
            .ok_or_else(|| PipelineError::ArtifactNotFound {
                name: name.to_string(),
                version: version.to_string(),
            })
    }

    fn transition(&self, name: &str, version: u32, stage: Stage) -> Result<()> {
        self.inner.write().index.transition(name, version, stage)
    }

    fn versions(&self, name: &str) -> Result<Vec<ModelVersionInfo>> {
        Ok(self.inner.read().index.versions(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::test_support::tiny_model;

    #[test]
    fn test_latest_and_number() {
        let store = InMemoryArtifactStore::new();
        let first = tiny_model();
        let second = tiny_model();
        store.register("m", &first).unwrap();
        store.register("m", &second).unwrap();

        let latest = store.load("m", VersionSelector::Latest).unwrap();
        assert_eq!(latest.metadata().model_id, second.metadata().model_id);
        let v1 = store.load("m", VersionSelector::Number(1)).unwrap();
        assert_eq!(v1.metadata().model_id, first.metadata().model_id);
        assert_eq!(store.versions("m").unwrap().len(), 2);
        assert!(store.versions("other").unwrap().is_empty());
    }

    #[test]
    fn test_promotion_archives_previous() {
        let store = InMemoryArtifactStore::new();
        store.register("m", &tiny_model()).unwrap();
        store.register("m", &tiny_model()).unwrap();
        store.transition("m", 1, Stage::Production).unwrap();
        store.transition("m", 2, Stage::Production).unwrap();

        let stages: Vec<Stage> = store.versions("m").unwrap().iter().map(|v| v.stage).collect();
        assert_eq!(stages, vec![Stage::Archived, Stage::Production]);
    }
}
