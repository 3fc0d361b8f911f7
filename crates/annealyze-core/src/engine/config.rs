use crate::core::io::results::{ResultSource, SolverBackend};
use crate::core::rna::energy::HamiltonianCosts;
use std::path::PathBuf;
use thiserror::Error;

/// Number of ranked samples examined when no window size is given.
pub const DEFAULT_TOP_N: usize = 100;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),
    #[error("Invalid value for parameter '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}

/// Where a solver result comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputConfig {
    pub backend: SolverBackend,
    pub source: ResultSource,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionConfig {
    /// Size of the ranked window, at least 1.
    pub top_n: usize,
    /// Reject candidates with non-bonded atoms closer than their radius sum.
    pub physical_check: bool,
}

/// Naming of the files written after an unfolding run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputConfig {
    /// Defaults to the directory holding the template.
    pub directory: Option<PathBuf>,
    pub save_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnfoldConfig {
    pub template_path: PathBuf,
    pub input: InputConfig,
    pub selection: SelectionConfig,
    pub output: OutputConfig,
}

#[derive(Default)]
pub struct UnfoldConfigBuilder {
    template_path: Option<PathBuf>,
    backend: Option<SolverBackend>,
    source: Option<ResultSource>,
    top_n: Option<usize>,
    physical_check: Option<bool>,
    output_directory: Option<PathBuf>,
    save_name: Option<String>,
}

impl UnfoldConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn template_path(mut self, path: PathBuf) -> Self {
        self.template_path = Some(path);
        self
    }
    pub fn backend(mut self, backend: SolverBackend) -> Self {
        self.backend = Some(backend);
        self
    }
    pub fn source(mut self, source: ResultSource) -> Self {
        self.source = Some(source);
        self
    }
    pub fn top_n(mut self, n: usize) -> Self {
        self.top_n = Some(n);
        self
    }
    pub fn physical_check(mut self, enabled: bool) -> Self {
        self.physical_check = Some(enabled);
        self
    }
    pub fn output_directory(mut self, directory: Option<PathBuf>) -> Self {
        self.output_directory = directory;
        self
    }
    pub fn save_name(mut self, name: impl Into<String>) -> Self {
        self.save_name = Some(name.into());
        self
    }

    pub fn build(self) -> Result<UnfoldConfig, ConfigError> {
        let save_name = self
            .save_name
            .ok_or(ConfigError::MissingParameter("save_name"))?;
        if save_name.trim().is_empty() {
            return Err(ConfigError::InvalidParameter {
                name: "save_name",
                reason: "must not be empty".to_string(),
            });
        }
        Ok(UnfoldConfig {
            template_path: self
                .template_path
                .ok_or(ConfigError::MissingParameter("template_path"))?,
            input: build_input(self.backend, self.source)?,
            selection: SelectionConfig {
                top_n: validate_top_n(self.top_n.unwrap_or(DEFAULT_TOP_N))?,
                physical_check: self.physical_check.unwrap_or(true),
            },
            output: OutputConfig {
                directory: self.output_directory,
                save_name,
            },
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FoldConfig {
    pub dataset_path: PathBuf,
    pub input: InputConfig,
    pub top_n: usize,
    pub costs: HamiltonianCosts,
}

#[derive(Default)]
pub struct FoldConfigBuilder {
    dataset_path: Option<PathBuf>,
    backend: Option<SolverBackend>,
    source: Option<ResultSource>,
    top_n: Option<usize>,
    costs: Option<HamiltonianCosts>,
}

impl FoldConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dataset_path(mut self, path: PathBuf) -> Self {
        self.dataset_path = Some(path);
        self
    }
    pub fn backend(mut self, backend: SolverBackend) -> Self {
        self.backend = Some(backend);
        self
    }
    pub fn source(mut self, source: ResultSource) -> Self {
        self.source = Some(source);
        self
    }
    pub fn top_n(mut self, n: usize) -> Self {
        self.top_n = Some(n);
        self
    }
    pub fn costs(mut self, costs: HamiltonianCosts) -> Self {
        self.costs = Some(costs);
        self
    }

    pub fn build(self) -> Result<FoldConfig, ConfigError> {
        Ok(FoldConfig {
            dataset_path: self
                .dataset_path
                .ok_or(ConfigError::MissingParameter("dataset_path"))?,
            input: build_input(self.backend, self.source)?,
            top_n: validate_top_n(self.top_n.unwrap_or(DEFAULT_TOP_N))?,
            costs: self.costs.unwrap_or_default(),
        })
    }
}

fn build_input(
    backend: Option<SolverBackend>,
    source: Option<ResultSource>,
) -> Result<InputConfig, ConfigError> {
    let backend = backend.ok_or(ConfigError::MissingParameter("backend"))?;
    let source = source.ok_or(ConfigError::MissingParameter("source"))?;
    let source_is_remote = matches!(source, ResultSource::Remote { .. });
    if source_is_remote != backend.is_remote() {
        return Err(ConfigError::InvalidParameter {
            name: "source",
            reason: format!(
                "backend '{}' expects a {} source",
                backend,
                if backend.is_remote() { "remote" } else { "local" }
            ),
        });
    }
    Ok(InputConfig { backend, source })
}

fn validate_top_n(n: usize) -> Result<usize, ConfigError> {
    if n == 0 {
        return Err(ConfigError::InvalidParameter {
            name: "top_n",
            reason: "must be at least 1".to_string(),
        });
    }
    Ok(n)
}
