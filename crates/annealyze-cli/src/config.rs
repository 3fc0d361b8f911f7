use crate::cli::{FoldArgs, InputArgs, PhysicalCheck, UnfoldArgs};
use crate::error::{CliError, Result};
use annealyze::core::io::results::{FsObjectStore, ResultSource, SolverBackend};
use annealyze::core::rna::energy::HamiltonianCosts;
use annealyze::engine::config::{self as core_config, DEFAULT_TOP_N};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

const DEFAULT_SAVE_NAME: &str = "latest";

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialInputConfig {
    method: Option<SolverBackend>,
    results_dir: Option<PathBuf>,
    bucket: Option<String>,
    prefix: Option<String>,
    task_id: Option<String>,
    store_root: Option<PathBuf>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialUnfoldingConfig {
    template: Option<PathBuf>,
    top_n: Option<usize>,
    physical_check: Option<bool>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialFoldingConfig {
    dataset: Option<PathBuf>,
    top_n: Option<usize>,
    cl: Option<f64>,
    cb: Option<f64>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialOutputConfig {
    directory: Option<PathBuf>,
    save_name: Option<String>,
}

/// Settings read from a TOML file, later overridden by command-line arguments.
#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct PartialConfig {
    input: Option<PartialInputConfig>,
    unfolding: Option<PartialUnfoldingConfig>,
    folding: Option<PartialFoldingConfig>,
    output: Option<PartialOutputConfig>,
}

/// A resolved result source plus the store needed to read it.
pub struct ResolvedInput {
    pub backend: SolverBackend,
    pub source: ResultSource,
    pub store: Option<FsObjectStore>,
}

impl PartialConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }

    /// Loads `path` if given, otherwise starts from an empty configuration.
    pub fn load_optional(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    pub fn resolve_input(&self, args: &InputArgs) -> Result<ResolvedInput> {
        let file = self.input.clone().unwrap_or_default();
        let backend = args.method.or(file.method).ok_or_else(|| {
            CliError::Config(
                "`input.method` is required either in the config file or via --method.".to_string(),
            )
        })?;

        if !backend.is_remote() {
            let dir = args
                .results_dir
                .clone()
                .or(file.results_dir)
                .unwrap_or_else(|| PathBuf::from("."));
            return Ok(ResolvedInput {
                backend,
                source: ResultSource::Local { dir },
                store: None,
            });
        }

        let require = |cli: &Option<String>, file: Option<String>, key: &str| -> Result<String> {
            cli.clone().or(file).ok_or_else(|| {
                CliError::Config(format!(
                    "`input.{}` is required for the '{}' backend.",
                    key, backend
                ))
            })
        };
        let source = ResultSource::Remote {
            bucket: require(&args.bucket, file.bucket, "bucket")?,
            prefix: require(&args.prefix, file.prefix, "prefix")?,
            task_id: require(&args.task_id, file.task_id, "task-id")?,
        };
        let store_root = args
            .store_root
            .clone()
            .or(file.store_root)
            .ok_or_else(|| {
                CliError::Config(format!(
                    "`input.store-root` is required for the '{}' backend.",
                    backend
                ))
            })?;
        Ok(ResolvedInput {
            backend,
            source,
            store: Some(FsObjectStore::new(store_root)),
        })
    }

    pub fn merge_unfold(
        &self,
        args: &UnfoldArgs,
    ) -> Result<(core_config::UnfoldConfig, Option<FsObjectStore>)> {
        let unfolding = self.unfolding.clone().unwrap_or_default();
        let output = self.output.clone().unwrap_or_default();
        let input = self.resolve_input(&args.input)?;

        let template = args.template.clone().or(unfolding.template).ok_or_else(|| {
            CliError::Config(
                "`unfolding.template` is required either in the config file or via --template."
                    .to_string(),
            )
        })?;

        let config = core_config::UnfoldConfigBuilder::new()
            .template_path(template)
            .backend(input.backend)
            .source(input.source)
            .top_n(args.top_n.or(unfolding.top_n).unwrap_or(DEFAULT_TOP_N))
            .physical_check(Self::merge_physical_check(
                args.physical_check,
                unfolding.physical_check,
            ))
            .output_directory(args.output_dir.clone().or(output.directory))
            .save_name(
                args.save_name
                    .clone()
                    .or(output.save_name)
                    .unwrap_or_else(|| DEFAULT_SAVE_NAME.to_string()),
            )
            .build()
            .map_err(|e| CliError::Config(e.to_string()))?;
        Ok((config, input.store))
    }

    pub fn merge_fold(
        &self,
        args: &FoldArgs,
    ) -> Result<(core_config::FoldConfig, Option<FsObjectStore>)> {
        let folding = self.folding.clone().unwrap_or_default();
        let input = self.resolve_input(&args.input)?;

        let dataset = args.dataset.clone().or(folding.dataset).ok_or_else(|| {
            CliError::Config(
                "`folding.dataset` is required either in the config file or via --dataset."
                    .to_string(),
            )
        })?;
        let defaults = HamiltonianCosts::default();

        let config = core_config::FoldConfigBuilder::new()
            .dataset_path(dataset)
            .backend(input.backend)
            .source(input.source)
            .top_n(args.top_n.or(folding.top_n).unwrap_or(DEFAULT_TOP_N))
            .costs(HamiltonianCosts {
                cl: folding.cl.unwrap_or(defaults.cl),
                cb: folding.cb.unwrap_or(defaults.cb),
            })
            .build()
            .map_err(|e| CliError::Config(e.to_string()))?;
        Ok((config, input.store))
    }

    fn merge_physical_check(cli_flags: PhysicalCheck, file_val: Option<bool>) -> bool {
        if cli_flags.physical_check {
            true
        } else if cli_flags.no_physical_check {
            false
        } else {
            file_val.unwrap_or(true)
        }
    }
}
