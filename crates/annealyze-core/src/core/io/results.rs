use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;
use tracing::{debug, info};

/// Object name of the structured task result stored next to the raw samples.
pub const TASK_RESULT_FILE: &str = "results.json";
/// Object name of the raw sample payload written by the quantum annealer job.
pub const QA_RAW_RESULT_FILE: &str = "qa_result.json";

/// The annealing backend that produced a result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SolverBackend {
    /// Local simulated annealer from the `neal` package.
    NealSa,
    /// D-Wave's simulated annealing sampler, run locally.
    DwaveSa,
    /// D-Wave quantum annealer, results stored in an object store by the job.
    DwaveQa,
}

impl SolverBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            SolverBackend::NealSa => "neal-sa",
            SolverBackend::DwaveSa => "dwave-sa",
            SolverBackend::DwaveQa => "dwave-qa",
        }
    }

    /// True if results for this backend live in a remote object store.
    pub fn is_remote(&self) -> bool {
        matches!(self, SolverBackend::DwaveQa)
    }

    /// File name of the locally cached raw result.
    pub fn local_file_name(&self) -> String {
        format!("{}_result.json", self.as_str())
    }
}

impl fmt::Display for SolverBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SolverBackend {
    type Err = ResultLoadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "neal-sa" => Ok(SolverBackend::NealSa),
            "dwave-sa" => Ok(SolverBackend::DwaveSa),
            "dwave-qa" => Ok(SolverBackend::DwaveQa),
            _ => Err(ResultLoadError::UnknownBackend(s.to_string())),
        }
    }
}

/// One aggregated row of annealer output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleRow {
    /// Binary assignment keyed by variable name.
    pub sample: BTreeMap<String, u8>,
    /// Energy reported by the solver.
    pub energy: f64,
    #[serde(default = "default_occurrences")]
    pub num_occurrences: u64,
}

fn default_occurrences() -> u64 {
    1
}

impl SampleRow {
    pub fn is_active(&self, variable: &str) -> bool {
        self.sample.get(variable) == Some(&1)
    }

    /// Names of the variables set to 1, in lexical order.
    pub fn active_variables(&self) -> impl Iterator<Item = &str> {
        self.sample
            .iter()
            .filter(|(_, v)| **v == 1)
            .map(|(k, _)| k.as_str())
    }
}

/// Model description recorded by the job that built the QUBO.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ModelInfo {
    pub model_name: String,
    /// Torsion group size of the unfolding model.
    #[serde(rename = "M", default)]
    pub m: Option<usize>,
    /// Number of discrete angles per torsion.
    #[serde(rename = "D", default)]
    pub d: Option<usize>,
    /// Unfolding variable name to rotatable bond, written `"a+b"`.
    #[serde(default)]
    pub var_rb_map: BTreeMap<String, String>,
    /// Angles in degrees for angle indices `1..=D`.
    #[serde(default)]
    pub theta_option: Option<Vec<f64>>,
}

impl ModelInfo {
    /// Splits `model_name` into its fields.
    ///
    /// The final character of the name is the separator: `"rna_0.5_"` yields
    /// `["rna", "0.5"]`.
    pub fn name_fields(&self) -> Result<Vec<&str>, ResultLoadError> {
        let mut chars = self.model_name.chars();
        let separator = chars
            .next_back()
            .ok_or_else(|| ResultLoadError::InvalidModelName(self.model_name.clone()))?;
        let body = chars.as_str();
        if body.is_empty() {
            return Err(ResultLoadError::InvalidModelName(self.model_name.clone()));
        }
        Ok(body.split(separator).collect())
    }

    /// The first field of the model name, identifying the input data set.
    pub fn data_name(&self) -> Result<&str, ResultLoadError> {
        Ok(self.name_fields()?[0])
    }

    /// RNA entry name and pseudoknot penalty encoded in the model name.
    pub fn rna_target(&self) -> Result<(String, f64), ResultLoadError> {
        let fields = self.name_fields()?;
        let penalty_field = fields
            .get(1)
            .ok_or_else(|| ResultLoadError::InvalidModelName(self.model_name.clone()))?;
        let penalty = penalty_field
            .parse::<f64>()
            .map_err(|_| ResultLoadError::InvalidModelName(self.model_name.clone()))?;
        Ok((fields[0].to_string(), penalty))
    }
}

/// The raw sampler payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolverPayload {
    /// Wall-clock time of the local sampling call, in seconds.
    pub time: f64,
    pub model_info: ModelInfo,
    pub samples: Vec<SampleRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskMetadata {
    pub created_at: String,
    #[serde(default)]
    pub ended_at: Option<String>,
}

/// QPU timing breakdown, in microseconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DwaveTiming {
    pub qpu_programming_time: f64,
    pub qpu_sampling_time: f64,
    pub qpu_access_overhead_time: f64,
    pub total_post_processing_time: f64,
    pub qpu_access_time: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DwaveMetadata {
    pub timing: DwaveTiming,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdditionalMetadata {
    #[serde(default)]
    pub dwave_metadata: Option<DwaveMetadata>,
}

/// The structured task result (`results.json`) of a remote job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskResult {
    pub task_metadata: TaskMetadata,
    #[serde(default)]
    pub additional_metadata: AdditionalMetadata,
}

/// Where a result set is read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResultSource {
    /// A directory holding `{method}_result.json`.
    Local { dir: PathBuf },
    /// Objects under `{prefix}/{task_id}/` in `bucket`.
    Remote {
        bucket: String,
        prefix: String,
        task_id: String,
    },
}

impl ResultSource {
    fn object_key(prefix: &str, task_id: &str, file_name: &str) -> String {
        format!("{}/{}/{}", prefix, task_id, file_name)
    }
}

/// Read access to an object store.
pub trait ObjectStore {
    /// Fetches the full body of `key` in `bucket`.
    fn get_object(&self, bucket: &str, key: &str) -> io::Result<Vec<u8>>;
}

/// An object store mirrored onto the local filesystem as `{root}/{bucket}/{key}`.
#[derive(Debug, Clone)]
pub struct FsObjectStore {
    root: PathBuf,
}

impl FsObjectStore {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }
}

impl ObjectStore for FsObjectStore {
    fn get_object(&self, bucket: &str, key: &str) -> io::Result<Vec<u8>> {
        fs::read(self.root.join(bucket).join(key))
    }
}

#[derive(Debug, Error)]
pub enum ResultLoadError {
    #[error("Unknown solver backend '{0}'. Expected 'neal-sa', 'dwave-sa' or 'dwave-qa'.")]
    UnknownBackend(String),
    #[error("Backend '{backend}' cannot be loaded from a {source_kind} source")]
    SourceMismatch {
        backend: SolverBackend,
        source_kind: &'static str,
    },
    #[error("A remote source requires an object store")]
    MissingStore,
    #[error("Failed to read '{location}': {source}")]
    Read {
        location: String,
        #[source]
        source: io::Error,
    },
    #[error("Failed to decode '{location}': {source}")]
    Decode {
        location: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("Model name '{0}' does not follow '<data><sep><penalty><sep>'")]
    InvalidModelName(String),
}

/// A result set as loaded from disk or from the object store.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedResult {
    pub backend: SolverBackend,
    pub payload: SolverPayload,
    /// Present only for remote results.
    pub task_result: Option<TaskResult>,
}

fn decode<T: for<'de> Deserialize<'de>>(bytes: &[u8], location: &str) -> Result<T, ResultLoadError> {
    serde_json::from_slice(bytes).map_err(|source| ResultLoadError::Decode {
        location: location.to_string(),
        source,
    })
}

/// Loads the raw result cached by a local simulated annealer run.
pub fn load_local(backend: SolverBackend, dir: &Path) -> Result<LoadedResult, ResultLoadError> {
    if backend.is_remote() {
        return Err(ResultLoadError::SourceMismatch {
            backend,
            source_kind: "local",
        });
    }
    let path = dir.join(backend.local_file_name());
    let location = path.display().to_string();
    info!(backend = %backend, path = %location, "Loading simulated annealer raw result.");
    let bytes = fs::read(&path).map_err(|source| ResultLoadError::Read {
        location: location.clone(),
        source,
    })?;
    Ok(LoadedResult {
        backend,
        payload: decode(&bytes, &location)?,
        task_result: None,
    })
}

/// Loads the raw samples and the task result of a remote quantum annealer job.
pub fn load_remote(
    backend: SolverBackend,
    store: &dyn ObjectStore,
    bucket: &str,
    prefix: &str,
    task_id: &str,
) -> Result<LoadedResult, ResultLoadError> {
    if !backend.is_remote() {
        return Err(ResultLoadError::SourceMismatch {
            backend,
            source_kind: "remote",
        });
    }
    let read_object = |file_name: &str| -> Result<(Vec<u8>, String), ResultLoadError> {
        let key = ResultSource::object_key(prefix, task_id, file_name);
        let location = format!("{}/{}", bucket, key);
        debug!(%location, "Reading result object.");
        let bytes = store
            .get_object(bucket, &key)
            .map_err(|source| ResultLoadError::Read {
                location: location.clone(),
                source,
            })?;
        Ok((bytes, location))
    };

    info!(backend = %backend, task_id, "Loading quantum annealer raw result.");
    let (raw, raw_location) = read_object(QA_RAW_RESULT_FILE)?;
    let (task, task_location) = read_object(TASK_RESULT_FILE)?;
    Ok(LoadedResult {
        backend,
        payload: decode(&raw, &raw_location)?,
        task_result: Some(decode(&task, &task_location)?),
    })
}

/// Loads a result set, dispatching on the source kind.
pub fn load(
    backend: SolverBackend,
    source: &ResultSource,
    store: Option<&dyn ObjectStore>,
) -> Result<LoadedResult, ResultLoadError> {
    match source {
        ResultSource::Local { dir } => load_local(backend, dir),
        ResultSource::Remote {
            bucket,
            prefix,
            task_id,
        } => {
            let store = store.ok_or(ResultLoadError::MissingStore)?;
            load_remote(backend, store, bucket, prefix, task_id)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const PAYLOAD: &str = r#"{
        "time": 1.5,
        "model_info": {"model_name": "hairpin_0.5_"},
        "samples": [
            {"sample": {"0": 1, "1": 0}, "energy": -3.0},
            {"sample": {"0": 0, "1": 1}, "energy": -1.0, "num_occurrences": 4}
        ]
    }"#;

    const TASK_RESULT: &str = r#"{
        "taskMetadata": {
            "createdAt": "2022-01-01T00:00:00.000Z",
            "endedAt": "2022-01-01T00:00:02.500Z"
        },
        "additionalMetadata": {
            "dwaveMetadata": {
                "timing": {
                    "qpuProgrammingTime": 15000.0,
                    "qpuSamplingTime": 4000.0,
                    "qpuAccessOverheadTime": 1000.0,
                    "totalPostProcessingTime": 500.0,
                    "qpuAccessTime": 19000.0
                }
            }
        }
    }"#;

    #[test]
    fn backend_parses_and_displays() {
        assert_eq!("neal-sa".parse::<SolverBackend>().unwrap(), SolverBackend::NealSa);
        assert_eq!("DWAVE-QA".parse::<SolverBackend>().unwrap(), SolverBackend::DwaveQa);
        assert!(matches!(
            "braket".parse::<SolverBackend>(),
            Err(ResultLoadError::UnknownBackend(_))
        ));
        assert_eq!(SolverBackend::DwaveSa.to_string(), "dwave-sa");
        assert_eq!(SolverBackend::DwaveSa.local_file_name(), "dwave-sa_result.json");
    }

    #[test]
    fn model_name_splits_on_trailing_separator() {
        let info = ModelInfo {
            model_name: "hairpin_0.5_".into(),
            ..Default::default()
        };
        assert_eq!(info.name_fields().unwrap(), vec!["hairpin", "0.5"]);
        assert_eq!(info.rna_target().unwrap(), ("hairpin".to_string(), 0.5));

        let dashed = ModelInfo {
            model_name: "117_ideal-1-8-".into(),
            ..Default::default()
        };
        assert_eq!(dashed.data_name().unwrap(), "117_ideal");
    }

    #[test]
    fn malformed_model_names_are_rejected() {
        for name in ["", "_", "hairpin_"] {
            let info = ModelInfo {
                model_name: name.into(),
                ..Default::default()
            };
            assert!(info.rna_target().is_err(), "accepted '{name}'");
        }
    }

    #[test]
    fn load_local_reads_method_specific_file() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("neal-sa_result.json"), PAYLOAD).unwrap();

        let loaded = load_local(SolverBackend::NealSa, dir.path()).unwrap();
        assert_eq!(loaded.payload.time, 1.5);
        assert_eq!(loaded.payload.samples.len(), 2);
        assert_eq!(loaded.payload.samples[0].num_occurrences, 1);
        assert_eq!(loaded.payload.samples[1].num_occurrences, 4);
        assert!(loaded.payload.samples[1].is_active("1"));
        assert!(loaded.task_result.is_none());
    }

    #[test]
    fn load_local_fails_for_missing_file() {
        let dir = tempdir().unwrap();
        let result = load_local(SolverBackend::DwaveSa, dir.path());
        assert!(matches!(result, Err(ResultLoadError::Read { .. })));
    }

    #[test]
    fn load_local_rejects_remote_backend() {
        let dir = tempdir().unwrap();
        let result = load_local(SolverBackend::DwaveQa, dir.path());
        assert!(matches!(result, Err(ResultLoadError::SourceMismatch { .. })));
    }

    #[test]
    fn load_remote_reads_both_objects() {
        let root = tempdir().unwrap();
        let task_dir = root.path().join("bucket").join("runs/task-1");
        fs::create_dir_all(&task_dir).unwrap();
        fs::write(task_dir.join(QA_RAW_RESULT_FILE), PAYLOAD).unwrap();
        fs::write(task_dir.join(TASK_RESULT_FILE), TASK_RESULT).unwrap();

        let store = FsObjectStore::new(root.path());
        let source = ResultSource::Remote {
            bucket: "bucket".into(),
            prefix: "runs".into(),
            task_id: "task-1".into(),
        };
        let loaded = load(SolverBackend::DwaveQa, &source, Some(&store)).unwrap();
        let task = loaded.task_result.unwrap();
        assert_eq!(task.task_metadata.created_at, "2022-01-01T00:00:00.000Z");
        let timing = task.additional_metadata.dwave_metadata.unwrap().timing;
        assert_eq!(timing.qpu_access_time, 19000.0);
    }

    #[test]
    fn load_remote_reports_missing_key() {
        let root = tempdir().unwrap();
        let store = FsObjectStore::new(root.path());
        let result = load_remote(SolverBackend::DwaveQa, &store, "bucket", "runs", "nope");
        match result {
            Err(ResultLoadError::Read { location, .. }) => {
                assert_eq!(location, "bucket/runs/nope/qa_result.json");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn remote_source_without_store_is_an_error() {
        let source = ResultSource::Remote {
            bucket: "b".into(),
            prefix: "p".into(),
            task_id: "t".into(),
        };
        assert!(matches!(
            load(SolverBackend::DwaveQa, &source, None),
            Err(ResultLoadError::MissingStore)
        ));
    }

    #[test]
    fn corrupt_payload_is_a_decode_error() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("neal-sa_result.json"), "{not json").unwrap();
        assert!(matches!(
            load_local(SolverBackend::NealSa, dir.path()),
            Err(ResultLoadError::Decode { .. })
        ));
    }
}
