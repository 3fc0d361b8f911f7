use crate::core::io::results::{self, LoadedResult, ObjectStore, SolverBackend};
use crate::core::io::rna::RnaDataset;
use crate::core::models::stem::{RnaEntry, Stem};
use crate::core::rna::dotbracket::{DotBracket, DotBracketError, pairs_to_dot_bracket};
use crate::core::rna::energy::{HamiltonianCosts, max_stem_length, reference_energy, stem_energy};
use crate::engine::config::FoldConfig;
use crate::engine::decode::decode_stems;
use crate::engine::error::EngineError;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::ranking::top_samples;
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::{info, instrument, warn};

/// One ranked sample interpreted as a stem selection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FoldCandidate {
    pub rank: usize,
    /// Energy reported by the solver.
    pub sample_energy: f64,
    pub stems: Vec<Stem>,
    /// Hamiltonian energy of `stems` with the reference `mu`.
    pub energy: f64,
    pub dot_bracket: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FoldReport {
    pub backend: SolverBackend,
    pub rna_name: String,
    pub pseudoknot_penalty: f64,
    /// Longest reference stem, used as `mu` for every energy in the report.
    pub mu: f64,
    /// `None` when the dataset has no reference stems.
    pub reference_energy: Option<f64>,
    pub reference_dot_bracket: String,
    /// Reference stems that also appear among the potential stems.
    pub reachable_reference_stems: usize,
    /// Candidates in rank order.
    pub candidates: Vec<FoldCandidate>,
}

impl FoldReport {
    /// Candidate with the lowest Hamiltonian energy; the first in rank order wins ties.
    pub fn lowest_energy(&self) -> Option<&FoldCandidate> {
        self.candidates
            .iter()
            .reduce(|best, c| if c.energy < best.energy { c } else { best })
    }
}

#[instrument(skip_all, name = "fold_workflow")]
pub fn run(
    config: &FoldConfig,
    store: Option<&dyn ObjectStore>,
    reporter: &ProgressReporter,
) -> Result<FoldReport, EngineError> {
    reporter.report(Progress::PhaseStart {
        name: "Loading Inputs",
    });
    let dataset = RnaDataset::load(&config.dataset_path)?;
    let loaded = results::load(config.input.backend, &config.input.source, store)?;
    let (rna_name, penalty) = loaded.payload.model_info.rna_target()?;
    let entry = dataset.entry(&rna_name)?;
    info!(rna = %rna_name, penalty, backend = %loaded.backend, "Loaded folding inputs.");
    reporter.report(Progress::PhaseFinish);

    evaluate(entry, &rna_name, penalty, &loaded, config.top_n, &config.costs, reporter)
}

/// Scores the top `top_n` samples of `loaded` against `entry`.
///
/// Candidates are reported, not filtered: every retained sample appears in the report with
/// its stems, energy and annotation.
#[instrument(skip_all, name = "fold_scoring")]
pub fn evaluate(
    entry: &RnaEntry,
    rna_name: &str,
    penalty: f64,
    loaded: &LoadedResult,
    top_n: usize,
    costs: &HamiltonianCosts,
    reporter: &ProgressReporter,
) -> Result<FoldReport, EngineError> {
    let length = entry.sequence_length();
    let mu = max_stem_length(&entry.actual_stems)
        .or_else(|| max_stem_length(&entry.potential_stems))
        .unwrap_or(0) as f64;
    let reference = reference_energy(&entry.actual_stems, penalty, costs);
    let reference_dot_bracket = annotate(&entry.actual_stems, length)?.notation;
    let reachable_reference_stems = entry.matched_actual_stems().len();
    if reachable_reference_stems < entry.actual_stems.len() {
        warn!(
            reachable = reachable_reference_stems,
            reference = entry.actual_stems.len(),
            "Some reference stems are not among the potential stems."
        );
    }
    info!(
        reference_energy = ?reference,
        reference = %reference_dot_bracket,
        mu,
        "Computed reference structure energy."
    );

    let ranked = top_samples(&loaded.payload.samples, top_n);
    reporter.report(Progress::PhaseStart {
        name: "Scoring Candidates",
    });
    reporter.report(Progress::ScanStart {
        samples: ranked.len() as u64,
    });
    let mut candidates = Vec::with_capacity(ranked.len());
    let mut lowest = f64::INFINITY;
    for sample in ranked {
        let stems = decode_stems(sample.row, &entry.potential_stems);
        let energy = stem_energy(&stems, penalty, mu, costs);
        let annotation = annotate(&stems, length)?;
        info!(
            rank = sample.rank,
            stems = stems.len(),
            energy,
            structure = %annotation.notation,
            "Scored candidate."
        );
        if energy < lowest {
            lowest = energy;
            reporter.report(Progress::LowestEnergy {
                rank: sample.rank,
                energy,
            });
        }
        candidates.push(FoldCandidate {
            rank: sample.rank,
            sample_energy: sample.row.energy,
            stems,
            energy,
            dot_bracket: annotation.notation,
        });
        reporter.report(Progress::SampleScanned { rank: sample.rank });
    }
    reporter.report(Progress::ScanFinish);
    reporter.report(Progress::PhaseFinish);

    Ok(FoldReport {
        backend: loaded.backend,
        rna_name: rna_name.to_string(),
        pseudoknot_penalty: penalty,
        mu,
        reference_energy: reference,
        reference_dot_bracket,
        reachable_reference_stems,
        candidates,
    })
}

/// Dot-bracket annotation of a stem set over a sequence of `length` bases.
pub fn annotate(stems: &[Stem], length: usize) -> Result<DotBracket, DotBracketError> {
    let mut pairs: Vec<(usize, usize)> = stems.iter().flat_map(Stem::base_pairs).collect();
    pairs.sort_unstable();
    pairs_to_dot_bracket(&pairs, length)
}

pub fn save_report(report: &FoldReport, path: &Path) -> Result<(), EngineError> {
    let output_error = |source| EngineError::Output {
        path: path.to_path_buf(),
        source,
    };
    let mut writer = BufWriter::new(File::create(path).map_err(output_error)?);
    serde_json::to_writer_pretty(&mut writer, report)?;
    writer.flush().map_err(output_error)?;
    info!(path = %path.display(), "Saved folding report.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::io::results::{ModelInfo, ResultSource, SampleRow, SolverPayload};
    use crate::engine::config::FoldConfigBuilder;
    use std::collections::BTreeMap;
    use std::fs;
    use tempfile::tempdir;

    const DATASET: &str = r#"
[rna.toy]
potential-stems = [[1, 10, 3, 1.0], [5, 14, 2, 1.0], [4, 7, 1, 1.0]]
actual-stems = [[1, 10, 3], [5, 14, 2]]
"#;

    const PAYLOAD: &str = r#"{
        "time": 0.2,
        "model_info": {"model_name": "toy_0.6_"},
        "samples": [
            {"sample": {"0": 1, "1": 0, "2": 1}, "energy": -10.0},
            {"sample": {"0": 1, "1": 1, "2": 0}, "energy": -12.0}
        ]
    }"#;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn toy_entry() -> RnaEntry {
        RnaDataset::from_toml_str(DATASET).unwrap().rna["toy"].clone()
    }

    fn loaded() -> LoadedResult {
        LoadedResult {
            backend: SolverBackend::DwaveSa,
            payload: serde_json::from_str(PAYLOAD).unwrap(),
            task_result: None,
        }
    }

    #[test]
    fn candidates_are_scored_in_rank_order() {
        let report = evaluate(
            &toy_entry(),
            "toy",
            0.6,
            &loaded(),
            100,
            &HamiltonianCosts::default(),
            &ProgressReporter::new(),
        )
        .unwrap();

        assert_eq!(report.mu, 3.0);
        // linear terms -9 and -3, crossing coupling 2 * 3 * 2 * 0.6
        assert!(approx_eq(report.reference_energy.unwrap(), -19.2));
        assert_eq!(report.reference_dot_bracket, "(((.<<.)))..>>");
        assert_eq!(report.reachable_reference_stems, 2);

        assert_eq!(report.candidates.len(), 2);
        let first = &report.candidates[0];
        assert_eq!(first.rank, 1);
        assert_eq!(first.sample_energy, -12.0);
        assert!(approx_eq(first.energy, -19.2));

        let second = &report.candidates[1];
        assert_eq!(second.stems, vec![Stem::new(1, 10, 3).with_weight(1.0), Stem::new(4, 7, 1).with_weight(1.0)]);
        assert!(approx_eq(second.energy, -12.0));
        assert_eq!(second.dot_bracket, "((((..))))....");
        assert_eq!(report.lowest_energy().map(|c| c.rank), Some(1));
    }

    #[test]
    fn lowest_energy_is_reported_while_scanning() {
        let events = std::sync::Mutex::new(Vec::new());
        {
            let reporter = ProgressReporter::with_callback(Box::new(|event| {
                events.lock().unwrap().push(event);
            }));
            evaluate(
                &toy_entry(),
                "toy",
                0.6,
                &loaded(),
                100,
                &HamiltonianCosts::default(),
                &reporter,
            )
            .unwrap();
        }
        let events = events.into_inner().unwrap();
        let lowest: Vec<usize> = events
            .iter()
            .filter_map(|e| match e {
                Progress::LowestEnergy { rank, .. } => Some(*rank),
                _ => None,
            })
            .collect();
        assert_eq!(lowest, vec![1]);
        assert!(events.contains(&Progress::ScanStart { samples: 2 }));
        assert!(events.contains(&Progress::SampleScanned { rank: 2 }));
        assert_eq!(events.last(), Some(&Progress::PhaseFinish));
    }

    #[test]
    fn window_bounds_the_report() {
        let report = evaluate(
            &toy_entry(),
            "toy",
            0.6,
            &loaded(),
            1,
            &HamiltonianCosts::default(),
            &ProgressReporter::new(),
        )
        .unwrap();
        assert_eq!(report.candidates.len(), 1);
    }

    #[test]
    fn entry_without_reference_uses_potential_stems_for_mu() {
        let mut entry = toy_entry();
        entry.actual_stems.clear();
        let row = SampleRow {
            sample: BTreeMap::from([("0".to_string(), 1)]),
            energy: -1.0,
            num_occurrences: 1,
        };
        let result = LoadedResult {
            backend: SolverBackend::NealSa,
            payload: SolverPayload {
                time: 0.0,
                model_info: ModelInfo::default(),
                samples: vec![row],
            },
            task_result: None,
        };
        let report = evaluate(
            &entry,
            "toy",
            0.6,
            &result,
            10,
            &HamiltonianCosts::default(),
            &ProgressReporter::new(),
        )
        .unwrap();
        assert!(report.reference_energy.is_none());
        assert_eq!(report.reachable_reference_stems, 0);
        assert_eq!(report.mu, 3.0);
        assert_eq!(report.reference_dot_bracket, "..............");
        assert!(approx_eq(report.candidates[0].energy, -9.0));
    }

    #[test]
    fn run_reads_dataset_and_results_then_saves_report() {
        let dir = tempdir().unwrap();
        let dataset_path = dir.path().join("rna.toml");
        fs::write(&dataset_path, DATASET).unwrap();
        fs::write(dir.path().join("dwave-sa_result.json"), PAYLOAD).unwrap();

        let config = FoldConfigBuilder::new()
            .dataset_path(dataset_path)
            .backend(SolverBackend::DwaveSa)
            .source(ResultSource::Local {
                dir: dir.path().to_path_buf(),
            })
            .build()
            .unwrap();
        let report = run(&config, None, &ProgressReporter::new()).unwrap();
        assert_eq!(report.rna_name, "toy");
        assert_eq!(report.pseudoknot_penalty, 0.6);

        let out = dir.path().join("report.json");
        save_report(&report, &out).unwrap();
        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
        assert_eq!(value["backend"], "dwave-sa");
        assert_eq!(value["candidates"][0]["stems"][0], serde_json::json!([1, 10, 3, 1.0]));
    }

    #[test]
    fn unknown_rna_is_a_dataset_error() {
        let dir = tempdir().unwrap();
        let dataset_path = dir.path().join("rna.toml");
        fs::write(&dataset_path, DATASET).unwrap();
        fs::write(
            dir.path().join("neal-sa_result.json"),
            PAYLOAD.replace("toy_0.6_", "other_0.6_"),
        )
        .unwrap();

        let config = FoldConfigBuilder::new()
            .dataset_path(dataset_path)
            .backend(SolverBackend::NealSa)
            .source(ResultSource::Local {
                dir: dir.path().to_path_buf(),
            })
            .build()
            .unwrap();
        assert!(matches!(
            run(&config, None, &ProgressReporter::new()),
            Err(EngineError::Dataset { .. })
        ));
    }
}
