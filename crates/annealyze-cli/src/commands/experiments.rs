use crate::cli::{ExperimentsArgs, ExperimentsCommands};
use crate::error::{CliError, Result};
use annealyze::core::experiments::{
    DeviceCatalog, ExperimentResult, expand_grid, resolve_device_arn, sort_by_device,
    write_table,
};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};
use tracing::info;

/// Device names mapped to identifiers, read from a TOML table.
#[derive(Debug, Default)]
pub struct FileDeviceCatalog {
    devices: BTreeMap<String, String>,
}

impl FileDeviceCatalog {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let devices = toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: anyhow::Error::from(e),
        })?;
        Ok(Self { devices })
    }
}

impl DeviceCatalog for FileDeviceCatalog {
    type Error = String;

    fn find_arn(&self, name: &str) -> std::result::Result<String, Self::Error> {
        self.devices
            .get(name)
            .cloned()
            .ok_or_else(|| format!("device '{}' is not in the catalog", name))
    }
}

pub fn run(args: ExperimentsArgs) -> Result<()> {
    match args.command {
        ExperimentsCommands::Table { input, output } => table(&input, output.as_deref()),
        ExperimentsCommands::Grid {
            params,
            device,
            device_catalog,
        } => grid(&params, device.as_deref(), device_catalog),
    }
}

fn table(input: &Path, output: Option<&Path>) -> Result<()> {
    let content = fs::read_to_string(input)?;
    let results: Vec<ExperimentResult> =
        serde_json::from_str(&content).map_err(|e| CliError::FileParsing {
            path: input.to_path_buf(),
            source: e.into(),
        })?;
    let grouped = sort_by_device(&results);
    info!(
        experiments = results.len(),
        devices = grouped.len(),
        "Sorted experiment results."
    );

    match output {
        Some(path) => {
            let file = File::create(path)?;
            write_table(&grouped, BufWriter::new(file)).map_err(|e| CliError::Other(e.into()))?;
            println!("Table written to: {}", path.display());
        }
        None => {
            write_table(&grouped, io::stdout().lock()).map_err(|e| CliError::Other(e.into()))?
        }
    }
    Ok(())
}

fn grid(params: &[String], device: Option<&str>, catalog: Option<PathBuf>) -> Result<()> {
    let axes = params
        .iter()
        .map(|p| parse_axis(p))
        .collect::<Result<Vec<_>>>()?;
    let device_arn = match device {
        Some(name) => {
            let catalog = match catalog {
                Some(path) => FileDeviceCatalog::from_file(&path)?,
                None => FileDeviceCatalog::default(),
            };
            Some(resolve_device_arn(&catalog, name))
        }
        None => None,
    };

    let combinations = expand_grid(&axes);
    info!(combinations = combinations.len(), "Expanded hyperparameter grid.");
    for mut combination in combinations {
        if let Some(arn) = &device_arn {
            combination.insert("device".to_string(), Value::String(arn.clone()));
        }
        let line = serde_json::to_string(&combination).map_err(|e| CliError::Other(e.into()))?;
        println!("{}", line);
    }
    Ok(())
}

/// Parses `NAME=V1,V2,...`; values that are valid JSON keep their type, others become strings.
fn parse_axis(value: &str) -> Result<(String, Vec<Value>)> {
    let (name, values) = value.split_once('=').ok_or_else(|| {
        CliError::Argument(format!(
            "Invalid grid axis '{}'. Expected 'NAME=V1,V2,...'.",
            value
        ))
    })?;
    let name = name.trim();
    if name.is_empty() || values.trim().is_empty() {
        return Err(CliError::Argument(format!(
            "Grid axis '{}' needs a name and at least one value.",
            value
        )));
    }
    let values = values
        .split(',')
        .map(str::trim)
        .map(|v| serde_json::from_str(v).unwrap_or_else(|_| Value::String(v.to_string())))
        .collect();
    Ok((name.to_string(), values))
}
