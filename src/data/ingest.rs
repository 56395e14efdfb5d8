//! Archive ingestion

use crate::error::{PipelineError, Result};
use crate::strategy::Strategy;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Default directory that archives are unpacked into
pub const DEFAULT_EXTRACT_DIR: &str = "extracted_data";

/// Reads a `.zip` archive holding exactly one CSV file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZipDataIngestor {
    extract_dir: PathBuf,
}

impl Default for ZipDataIngestor {
    fn default() -> Self {
        Self::new()
    }
}

impl ZipDataIngestor {
    pub fn new() -> Self {
        Self {
            extract_dir: PathBuf::from(DEFAULT_EXTRACT_DIR),
        }
    }

    /// Set the directory the archive is extracted into
    pub fn with_extract_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.extract_dir = dir.into();
        self
    }

    pub fn extract_dir(&self) -> &Path {
        &self.extract_dir
    }

    /// Extract the archive and load its single CSV entry
    pub fn ingest(&self, path: &Path) -> Result<DataFrame> {
        let is_zip = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case("zip"))
            .unwrap_or(false);
        if !is_zip {
            return Err(PipelineError::UnsupportedFormat(format!(
                "{} is not a .zip file",
                path.display()
            )));
        }

        let file = File::open(path)?;
        let mut archive = ::zip::ZipArchive::new(file)?;

        let mut csv_entries = Vec::new();
        for i in 0..archive.len() {
            let entry = archive.by_index(i)?;
            if entry.is_dir() || entry.name().starts_with("__MACOSX/") {
                continue;
            }
            let Some(name) = entry.enclosed_name() else {
                debug!(entry = entry.name(), "Skipping entry with unsafe path");
                continue;
            };
            let is_csv = name
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| e.eq_ignore_ascii_case("csv"))
                .unwrap_or(false);
            if is_csv {
                csv_entries.push(name);
            }
        }

        let csv_entry = match csv_entries.len() {
            0 => {
                return Err(PipelineError::UnsupportedFormat(format!(
                    "no CSV file found in {}",
                    path.display()
                )))
            }
            1 => csv_entries.remove(0),
            n => {
                return Err(PipelineError::UnsupportedFormat(format!(
                    "multiple CSV files ({}) found in {}, specify which one to use",
                    n,
                    path.display()
                )))
            }
        };

        std::fs::create_dir_all(&self.extract_dir)?;
        archive.extract(&self.extract_dir)?;

        let csv_path = self.extract_dir.join(&csv_entry);
        let df = super::load_csv(&csv_path)?;
        info!(
            archive = %path.display(),
            csv = %csv_path.display(),
            rows = df.height(),
            columns = df.width(),
            "Ingested archive"
        );
        Ok(df)
    }
}

/// Available ingestion strategies
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataIngestor {
    Zip(ZipDataIngestor),
}

impl DataIngestor {
    /// Redirect extraction for ingestors that unpack to disk
    pub fn with_extract_dir(self, dir: impl Into<PathBuf>) -> Self {
        match self {
            DataIngestor::Zip(z) => DataIngestor::Zip(z.with_extract_dir(dir)),
        }
    }

    pub fn ingest(&self, path: &Path) -> Result<DataFrame> {
        match self {
            DataIngestor::Zip(z) => z.ingest(path),
        }
    }
}

impl Strategy for DataIngestor {
    type Input<'a> = &'a Path;
    type Output = DataFrame;

    fn execute(&self, path: &Path) -> Result<DataFrame> {
        self.ingest(path)
    }
}

/// Selects an ingestor from a file extension
pub struct DataIngestorFactory;

impl DataIngestorFactory {
    /// Ingestor for an extension such as `".zip"`
    pub fn for_extension(extension: &str) -> Result<DataIngestor> {
        match extension.to_ascii_lowercase().as_str() {
            ".zip" => Ok(DataIngestor::Zip(ZipDataIngestor::new())),
            _ => Err(PipelineError::UnsupportedExtension(extension.to_string())),
        }
    }

    /// Ingestor for the extension of `path`
    pub fn for_path(path: &Path) -> Result<DataIngestor> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{}", e))
            .unwrap_or_default();
        Self::for_extension(&ext)
    }
}
