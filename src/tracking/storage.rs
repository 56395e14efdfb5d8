//! Storage backends for experiment tracking

use super::tracker::Experiment;
use crate::error::Result;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

/// Persists experiments
pub trait StorageBackend: Send + Sync {
    /// Load an experiment, or an empty one if nothing is stored yet
    fn load_experiment(&self, name: &str) -> Result<Experiment>;

    fn save_experiment(&self, experiment: &Experiment) -> Result<()>;
}

/// One JSON file per experiment under a base directory
pub struct LocalStorage {
    base_dir: PathBuf,
}

impl LocalStorage {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn experiment_file(&self, name: &str) -> PathBuf {
        let safe: String = name
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.base_dir.join(format!("{}.json", safe))
    }
}

impl StorageBackend for LocalStorage {
    fn load_experiment(&self, name: &str) -> Result<Experiment> {
        let path = self.experiment_file(name);
        if !path.exists() {
            return Ok(Experiment::new(name));
        }
        let file = File::open(&path)?;
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }

    fn save_experiment(&self, experiment: &Experiment) -> Result<()> {
        fs::create_dir_all(&self.base_dir)?;
        let file = File::create(self.experiment_file(&experiment.name))?;
        serde_json::to_writer_pretty(BufWriter::new(file), experiment)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_experiment_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path());
        let exp = storage.load_experiment("houses").unwrap();
        assert_eq!(exp.name, "houses");
        assert!(exp.runs.is_empty());
    }

    #[test]
    fn test_unsafe_names_are_sanitized() {
        let storage = LocalStorage::new("/tmp/x");
        assert_eq!(
            storage.experiment_file("a/b c"),
            PathBuf::from("/tmp/x/a_b_c.json")
        );
    }
}
