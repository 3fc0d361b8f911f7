use crate::core::models::stem::RnaEntry;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum RnaDataError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("TOML parsing error for '{path}': {source}")]
    Toml {
        path: String,
        source: toml::de::Error,
    },
    #[error("RNA '{0}' is not present in the dataset")]
    UnknownRna(String),
}

/// A collection of RNA entries keyed by name, loaded from a TOML file with one table per RNA:
///
/// ```toml
/// [rna.hairpin]
/// sequence = "GGGAAACCC"
/// potential-stems = [[1, 9, 3, 1.0]]
/// actual-stems = [[1, 9, 3]]
/// ```
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RnaDataset {
    #[serde(default)]
    pub rna: BTreeMap<String, RnaEntry>,
}

impl RnaDataset {
    pub fn load(path: &Path) -> Result<Self, RnaDataError> {
        let content = std::fs::read_to_string(path).map_err(|e| RnaDataError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        let dataset = Self::from_toml_str(&content).map_err(|e| RnaDataError::Toml {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        debug!(entries = dataset.rna.len(), "Loaded RNA dataset.");
        Ok(dataset)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    pub fn entry(&self, name: &str) -> Result<&RnaEntry, RnaDataError> {
        self.rna
            .get(name)
            .ok_or_else(|| RnaDataError::UnknownRna(name.to_string()))
    }
}
