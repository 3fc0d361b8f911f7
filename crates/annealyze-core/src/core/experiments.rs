use crate::core::utils::product::cartesian_product;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Display;
use std::io::Write;
use tracing::warn;

/// Device used when a requested device cannot be resolved.
pub const FALLBACK_DEVICE_ARN: &str = "arn:aws:braket:::device/quantum-simulator/amazon/sv1";

/// Resolves device names to identifiers.
pub trait DeviceCatalog {
    type Error: Display;

    fn find_arn(&self, name: &str) -> Result<String, Self::Error>;
}

/// Looks up `name` in `catalog`, falling back to [`FALLBACK_DEVICE_ARN`] on failure.
pub fn resolve_device_arn<C: DeviceCatalog>(catalog: &C, name: &str) -> String {
    match catalog.find_arn(name) {
        Ok(arn) => arn,
        Err(e) => {
            warn!(device = name, error = %e, "Failed to resolve device, using SV1 instead.");
            FALLBACK_DEVICE_ARN.to_string()
        }
    }
}

/// Every combination of a hyperparameter grid, in the order the axes are given.
pub fn expand_grid<V: Clone>(axes: &[(String, Vec<V>)]) -> Vec<BTreeMap<String, V>> {
    cartesian_product(axes, None)
        .into_iter()
        .map(|combo| combo.into_iter().collect())
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HyperParameters {
    #[serde(rename = "D")]
    pub d: usize,
    #[serde(rename = "M")]
    pub m: usize,
    pub device: String,
}

/// One finished experiment as reported by a job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentResult {
    #[serde(rename = "hypermeter")]
    pub hyper: HyperParameters,
    pub time: f64,
}

/// A row of the per-device experiment table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExperimentRow {
    pub device: String,
    #[serde(rename = "D")]
    pub d: usize,
    #[serde(rename = "M")]
    pub m: usize,
    #[serde(rename = "DxM")]
    pub problem_size: usize,
    pub time: f64,
}

impl ExperimentRow {
    /// Ordering key: problem size first, then angle count.
    pub fn sort_key(&self) -> (usize, usize) {
        (self.problem_size, self.d)
    }
}

/// Groups results by device and orders each group by `(D*M, D)`.
///
/// Rows with identical keys keep their input order.
pub fn sort_by_device(results: &[ExperimentResult]) -> BTreeMap<String, Vec<ExperimentRow>> {
    let mut grouped: BTreeMap<String, Vec<ExperimentRow>> = BTreeMap::new();
    for result in results {
        let HyperParameters { d, m, device } = &result.hyper;
        grouped.entry(device.clone()).or_default().push(ExperimentRow {
            device: device.clone(),
            d: *d,
            m: *m,
            problem_size: d.saturating_mul(*m),
            time: result.time,
        });
    }
    for rows in grouped.values_mut() {
        rows.sort_by_key(ExperimentRow::sort_key);
    }
    grouped
}

/// Writes grouped rows as CSV with a `device,D,M,DxM,time` header.
pub fn write_table<W: Write>(
    grouped: &BTreeMap<String, Vec<ExperimentRow>>,
    writer: W,
) -> Result<(), csv::Error> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for row in grouped.values().flatten() {
        csv_writer.serialize(row)?;
    }
    csv_writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StaticCatalog;

    impl DeviceCatalog for StaticCatalog {
        type Error = String;

        fn find_arn(&self, name: &str) -> Result<String, Self::Error> {
            match name {
                "Advantage_system4.1" => Ok("arn:aws:braket:::device/qpu/d-wave/Advantage_system4".into()),
                _ => Err(format!("no device named {name}")),
            }
        }
    }

    fn result(d: usize, m: usize, device: &str, time: f64) -> ExperimentResult {
        ExperimentResult {
            hyper: HyperParameters {
                d,
                m,
                device: device.into(),
            },
            time,
        }
    }

    #[test]
    fn device_lookup_falls_back_to_simulator() {
        assert_eq!(
            resolve_device_arn(&StaticCatalog, "Advantage_system4.1"),
            "arn:aws:braket:::device/qpu/d-wave/Advantage_system4"
        );
        assert_eq!(resolve_device_arn(&StaticCatalog, "unknown"), FALLBACK_DEVICE_ARN);
    }

    #[test]
    fn grid_expands_every_combination() {
        let axes = vec![
            ("M".to_string(), vec![1, 2]),
            ("D".to_string(), vec![4, 8]),
        ];
        let grid = expand_grid(&axes);
        assert_eq!(grid.len(), 4);
        assert_eq!(grid[1]["M"], 1);
        assert_eq!(grid[1]["D"], 8);
        assert_eq!(grid[2]["M"], 2);
    }

    #[test]
    fn results_sort_by_problem_size_then_angles() {
        let results = vec![
            result(8, 2, "sa", 3.0),
            result(4, 1, "sa", 1.0),
            result(2, 4, "sa", 2.0),
            result(4, 1, "qa", 9.0),
        ];
        let sorted = sort_by_device(&results);
        let sa: Vec<_> = sorted["sa"].iter().map(|r| (r.d, r.m)).collect();
        assert_eq!(sa, vec![(4, 1), (2, 4), (8, 2)]);
        assert_eq!(sorted["qa"].len(), 1);
    }

    #[test]
    fn oversized_problem_size_saturates() {
        let sorted = sort_by_device(&[result(usize::MAX, 2, "qa", 1.0), result(2, 2, "qa", 0.5)]);
        let qa = &sorted["qa"];
        assert_eq!(qa[0].problem_size, 4);
        assert_eq!(qa[1].problem_size, usize::MAX);
    }

    #[test]
    fn experiments_deserialize_from_job_output() {
        let parsed: Vec<ExperimentResult> = serde_json::from_str(
            r#"[{"hypermeter": {"D": 4, "M": 2, "device": "sa"}, "time": 0.5}]"#,
        )
        .unwrap();
        assert_eq!(parsed[0], result(4, 2, "sa", 0.5));
    }

    #[test]
    fn table_is_written_as_csv() {
        let sorted = sort_by_device(&[result(4, 2, "sa", 0.5)]);
        let mut out = Vec::new();
        write_table(&sorted, &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "device,D,M,DxM,time\nsa,4,2,8,0.5\n");
    }
}
