//! Filesystem-backed artifact store

use super::{ArtifactStore, ModelVersionInfo, RegistryIndex, Stage, VersionSelector};
use crate::error::Result;
use crate::training::ModelPipeline;
use parking_lot::RwLock;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use tracing::info;

const INDEX_FILE: &str = "index.json";

/// Stores each version as `<root>/<name>/v<N>.json` with a JSON index at
/// `<root>/index.json`
pub struct LocalArtifactStore {
    root: PathBuf,
    index: RwLock<RegistryIndex>,
}

impl LocalArtifactStore {
    /// Create or open a store rooted at `path`
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let root = path.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;

        let index_path = root.join(INDEX_FILE);
        let index = if index_path.exists() {
            let file = File::open(&index_path)?;
            serde_json::from_reader(BufReader::new(file))?
        } else {
            RegistryIndex::default()
        };

        Ok(Self {
            root,
            index: RwLock::new(index),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn model_path(&self, name: &str, version: u32) -> PathBuf {
        self.root.join(name).join(format!("v{}.json", version))
    }

    fn save_index(&self, index: &RegistryIndex) -> Result<()> {
        let file = File::create(self.root.join(INDEX_FILE))?;
        serde_json::to_writer_pretty(BufWriter::new(file), index)?;
        Ok(())
    }
}

impl ArtifactStore for LocalArtifactStore {
    fn register(&self, name: &str, model: &ModelPipeline) -> Result<u32> {
        let mut index = self.index.write();
        let mut staged = index.clone();
        let entry = staged.add(name, model)?;

        fs::create_dir_all(self.root.join(name))?;
        model.save(self.model_path(name, entry.version))?;
        self.save_index(&staged)?;
        *index = staged;

        info!(model = name, version = entry.version, root = %self.root.display(), "Registered model");
        Ok(entry.version)
    }

    fn load(&self, name: &str, selector: VersionSelector) -> Result<ModelPipeline> {
        let version = self.index.read().resolve(name, selector)?.version;
        ModelPipeline::load(self.model_path(name, version))
    }

    fn transition(&self, name: &str, version: u32, stage: Stage) -> Result<()> {
        let mut index = self.index.write();
        let mut staged = index.clone();
        staged.transition(name, version, stage)?;
        self.save_index(&staged)?;
        *index = staged;

        info!(model = name, version, stage = %stage, "Transitioned model version");
        Ok(())
    }

    fn versions(&self, name: &str) -> Result<Vec<ModelVersionInfo>> {
        Ok(self.index.read().versions(name))
    }
}
