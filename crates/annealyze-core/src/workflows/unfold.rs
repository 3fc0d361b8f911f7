use crate::core::io::mol2::Mol2File;
use crate::core::io::results::{self, LoadedResult, ObjectStore, SampleRow, SolverBackend};
use crate::core::io::traits::MoleculeFile;
use crate::core::models::molecule::{Molecule, PositionTable};
use crate::engine::config::{OutputConfig, SelectionConfig, UnfoldConfig};
use crate::engine::decode::{TorsionAssignment, TorsionModel, decode_torsions};
use crate::engine::error::EngineError;
use crate::engine::params::{OptimizeInfo, Parameters, VolumeParameters};
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::ranking::top_samples;
use crate::engine::volume::VolumeEvaluator;
use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument, warn};

#[derive(Debug, Clone)]
pub struct UnfoldResult {
    pub backend: SolverBackend,
    pub parameters: Parameters,
    /// Final coordinates: the accepted geometry, or the template geometry on fallback.
    pub positions: PositionTable,
}

impl UnfoldResult {
    pub fn accepted(&self) -> bool {
        self.parameters.volume.optimize_info.optimize_state
    }
}

/// Paths written by [`save`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedFiles {
    pub structure: PathBuf,
    pub parameters: PathBuf,
}

#[derive(Debug)]
struct Accepted {
    gain: f64,
    volume: f64,
    chosen: Vec<String>,
    assignment: TorsionAssignment,
    positions: PositionTable,
}

#[instrument(skip_all, name = "unfold_workflow")]
pub fn run(
    config: &UnfoldConfig,
    store: Option<&dyn ObjectStore>,
    reporter: &ProgressReporter,
) -> Result<UnfoldResult, EngineError> {
    reporter.report(Progress::PhaseStart {
        name: "Loading Inputs",
    });
    info!(
        template = %config.template_path.display(),
        backend = %config.input.backend,
        "Loading structure template and solver results."
    );
    let molecule = Mol2File::read_from_path(&config.template_path)?;
    let loaded = results::load(config.input.backend, &config.input.source, store)?;
    reporter.report(Progress::PhaseFinish);

    evaluate(&molecule, &loaded, &config.selection, reporter)
}

/// Scans the ranked samples of `loaded` and selects the geometry to keep.
///
/// Rows are visited best energy first. Within a row every untried assignment is evaluated and
/// the one with the largest gain above 1.0 that passes the steric check is kept; scanning stops
/// after the first row that produced one. Without any accepted assignment the template geometry
/// is kept with every torsion at angle 1.
#[instrument(skip_all, name = "unfold_selection")]
pub fn evaluate(
    molecule: &Molecule,
    loaded: &LoadedResult,
    selection: &SelectionConfig,
    reporter: &ProgressReporter,
) -> Result<UnfoldResult, EngineError> {
    let model = TorsionModel::from_model_info(&loaded.payload.model_info)?;
    let evaluator = VolumeEvaluator::new(molecule, &model)?;
    let initial_volume = evaluator.initial_volume();
    let ranked = top_samples(&loaded.payload.samples, selection.top_n);
    info!(
        samples = loaded.payload.samples.len(),
        window = ranked.len(),
        torsions = model.bonds.len(),
        initial_volume,
        "Evaluating ranked samples."
    );

    reporter.report(Progress::PhaseStart {
        name: "Evaluating Candidates",
    });
    reporter.report(Progress::ScanStart {
        samples: ranked.len() as u64,
    });

    let mut tried = HashSet::new();
    let mut accepted = None;
    let mut last_rank = 0;
    for sample in &ranked {
        last_rank = sample.rank;
        accepted = best_in_row(
            &evaluator,
            &model,
            sample.row,
            selection.physical_check,
            &mut tried,
        )?;
        reporter.report(Progress::SampleScanned { rank: sample.rank });
        if let Some(found) = &accepted {
            info!(rank = sample.rank, gain = found.gain, "Accepted candidate.");
            reporter.report(Progress::CandidateAccepted {
                rank: sample.rank,
                gain: found.gain,
            });
            break;
        }
    }
    reporter.report(Progress::ScanFinish);
    reporter.report(Progress::PhaseFinish);

    let (volume, positions) = match accepted {
        Some(found) => (
            VolumeParameters {
                initial: initial_volume,
                optimize: found.volume,
                gain: found.gain,
                unfolding_results: found.assignment.variable_names(),
                annealing_results: found.chosen,
                optimize_info: OptimizeInfo {
                    optimize_state: true,
                    result_rank: last_rank,
                },
            },
            found.positions,
        ),
        None => {
            warn!(
                window = ranked.len(),
                "No ranked sample improved the volume; keeping the initial geometry."
            );
            let initial = TorsionAssignment::uniform(model.bonds.keys(), 1).variable_names();
            (
                VolumeParameters {
                    initial: initial_volume,
                    optimize: initial_volume,
                    gain: 1.0,
                    unfolding_results: initial.clone(),
                    annealing_results: initial,
                    optimize_info: OptimizeInfo {
                        optimize_state: false,
                        result_rank: last_rank,
                    },
                },
                molecule.initial_positions(),
            )
        }
    };

    Ok(UnfoldResult {
        backend: loaded.backend,
        parameters: Parameters { volume },
        positions,
    })
}

fn best_in_row(
    evaluator: &VolumeEvaluator,
    model: &TorsionModel,
    row: &SampleRow,
    physical_check: bool,
    tried: &mut HashSet<TorsionAssignment>,
) -> Result<Option<Accepted>, EngineError> {
    let decoded = decode_torsions(row, model);
    let mut best: Option<Accepted> = None;
    let mut best_gain = 1.0;

    for assignment in decoded.assignments {
        if !tried.insert(assignment.clone()) {
            debug!("Skipping an assignment that was already evaluated.");
            continue;
        }
        let evaluation = evaluator.evaluate(&assignment)?;
        debug!(
            assignment = ?assignment.variable_names(),
            gain = evaluation.gain,
            volume = evaluation.volume,
            "Evaluated torsion assignment."
        );
        if evaluation.gain <= best_gain {
            continue;
        }
        if physical_check {
            if let Some((a, b)) = evaluator.steric_violation(&evaluation.positions) {
                info!(atom_a = a, atom_b = b, "Physical check failed.");
                continue;
            }
        }
        best_gain = evaluation.gain;
        best = Some(Accepted {
            gain: evaluation.gain,
            volume: evaluation.volume,
            chosen: decoded.chosen.clone(),
            assignment,
            positions: evaluation.positions,
        });
    }
    Ok(best)
}

/// Output paths `{stem}_{method}_{save_name}.mol2` and `.json` for a template.
pub fn output_paths(template_path: &Path, backend: SolverBackend, output: &OutputConfig) -> SavedFiles {
    let stem = template_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "structure".to_string());
    let directory = output
        .directory
        .clone()
        .or_else(|| template_path.parent().map(Path::to_path_buf))
        .unwrap_or_default();
    let base = format!("{}_{}_{}", stem, backend, output.save_name);
    SavedFiles {
        structure: directory.join(format!("{}.mol2", base)),
        parameters: directory.join(format!("{}.json", base)),
    }
}

/// Writes the rewritten template and the parameters record.
pub fn save(result: &UnfoldResult, config: &UnfoldConfig) -> Result<SavedFiles, EngineError> {
    let paths = output_paths(&config.template_path, result.backend, &config.output);
    if let Some(directory) = &config.output.directory {
        fs::create_dir_all(directory).map_err(|source| EngineError::Output {
            path: directory.clone(),
            source,
        })?;
    }

    let rewritten =
        Mol2File::write_positions_to_path(&config.template_path, &result.positions, &paths.structure)?;

    let output_error = |source| EngineError::Output {
        path: paths.parameters.clone(),
        source,
    };
    let file = File::create(&paths.parameters).map_err(output_error)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, &result.parameters)?;
    writer.flush().map_err(output_error)?;

    info!(
        structure = %paths.structure.display(),
        parameters = %paths.parameters.display(),
        atoms = rewritten,
        "Saved unfolding results."
    );
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::io::results::{ModelInfo, ResultSource, SolverPayload};
    use crate::core::models::atom::Atom;
    use crate::engine::config::UnfoldConfigBuilder;
    use nalgebra::Point3;
    use std::collections::BTreeMap;
    use std::io::{BufReader, Cursor};
    use std::sync::Mutex;
    use tempfile::tempdir;

    const CHAIN: &str = "\
@<TRIPOS>MOLECULE
chain
 4 3 0 0 0
SMALL
NO_CHARGES

@<TRIPOS>ATOM
      1 H1          0.0000    3.0000    0.0000 H       1  LIG1        0.0000
      2 H2          0.0000    0.0000    0.0000 H       1  LIG1        0.0000
      3 H3          3.0000    0.0000    0.0000 H       1  LIG1        0.0000
      4 H4          3.0000    3.0000    0.0000 H       1  LIG1        0.0000
@<TRIPOS>BOND
     1     1     2    1
     2     2     3    1
     3     3     4    1
";

    const PAYLOAD: &str = r#"{
        "time": 0.1,
        "model_info": {"model_name": "chain_1_4_", "M": 1, "D": 4, "var_rb_map": {"1": "2+3"}},
        "samples": [
            {"sample": {"X_1_1": 0, "X_1_3": 1}, "energy": -3.0},
            {"sample": {"X_1_1": 1, "X_1_3": 0}, "energy": -5.0}
        ]
    }"#;

    fn chain() -> Molecule {
        Mol2File::read_from(&mut BufReader::new(Cursor::new(CHAIN))).unwrap()
    }

    fn compact_chain() -> Molecule {
        let mut mol = Molecule::new("compact");
        let coords = [(0.0, 1.0), (0.0, 0.0), (1.5, 0.0), (1.5, 1.0)];
        for (i, (x, y)) in coords.into_iter().enumerate() {
            mol.add_atom(Atom::new(i + 1, "H", "H", Point3::new(x, y, 0.0)))
                .unwrap();
        }
        for (a, b) in [(1, 2), (2, 3), (3, 4)] {
            mol.add_bond(a, b).unwrap();
        }
        mol
    }

    // each row lists its active variables separated by spaces
    fn loaded(rows: &[(&str, f64)]) -> LoadedResult {
        LoadedResult {
            backend: SolverBackend::NealSa,
            payload: SolverPayload {
                time: 0.1,
                model_info: ModelInfo {
                    model_name: "chain_1_4_".into(),
                    m: Some(1),
                    d: Some(4),
                    var_rb_map: BTreeMap::from([("1".to_string(), "2+3".to_string())]),
                    theta_option: None,
                },
                samples: rows
                    .iter()
                    .map(|(active, energy)| SampleRow {
                        sample: active
                            .split_whitespace()
                            .map(|name| (name.to_string(), 1))
                            .collect(),
                        energy: *energy,
                        num_occurrences: 1,
                    })
                    .collect(),
            },
            task_result: None,
        }
    }

    fn selection(physical_check: bool) -> SelectionConfig {
        SelectionConfig {
            top_n: 100,
            physical_check,
        }
    }

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn first_improving_row_is_accepted() {
        let mol = chain();
        let result = evaluate(
            &mol,
            &loaded(&[("X_1_1", -5.0), ("X_1_3", -3.0), ("X_1_2", -1.0)]),
            &selection(true),
            &ProgressReporter::new(),
        )
        .unwrap();

        let volume = &result.parameters.volume;
        assert!(result.accepted());
        assert_eq!(volume.optimize_info.result_rank, 2);
        assert_eq!(volume.unfolding_results, vec!["X_1_3"]);
        assert_eq!(volume.annealing_results, vec!["X_1_3"]);
        assert!(volume.gain > 1.0);
        assert!(approx_eq(volume.optimize, volume.initial * volume.gain));

        let moved = result.positions[&4].position;
        assert!(approx_eq(moved.x, 3.0));
        assert!(approx_eq(moved.y, -3.0));
    }

    #[test]
    fn best_expansion_of_a_row_wins() {
        let mol = chain();
        let result = evaluate(
            &mol,
            &loaded(&[("X_1_2 X_1_3", -5.0)]),
            &selection(true),
            &ProgressReporter::new(),
        )
        .unwrap();
        let volume = &result.parameters.volume;
        assert_eq!(volume.unfolding_results, vec!["X_1_3"]);
        assert_eq!(volume.annealing_results, vec!["X_1_2", "X_1_3"]);
    }

    #[test]
    fn no_improvement_falls_back_to_initial_geometry() {
        let mol = chain();
        let result = evaluate(
            &mol,
            &loaded(&[("X_1_1", -5.0), ("X_1_1", -4.0)]),
            &selection(true),
            &ProgressReporter::new(),
        )
        .unwrap();

        let volume = &result.parameters.volume;
        assert!(!result.accepted());
        assert_eq!(volume.gain, 1.0);
        assert_eq!(volume.optimize, volume.initial);
        assert_eq!(volume.unfolding_results, vec!["X_1_1"]);
        assert_eq!(volume.optimize_info.result_rank, 2);
        assert_eq!(result.positions, mol.initial_positions());
    }

    #[test]
    fn physical_check_can_reject_every_candidate() {
        let mol = compact_chain();
        let samples = loaded(&[("X_1_3", -5.0)]);

        let checked = evaluate(&mol, &samples, &selection(true), &ProgressReporter::new()).unwrap();
        assert!(!checked.accepted());

        let unchecked =
            evaluate(&mol, &samples, &selection(false), &ProgressReporter::new()).unwrap();
        assert!(unchecked.accepted());
        assert_eq!(unchecked.parameters.volume.unfolding_results, vec!["X_1_3"]);
    }

    #[test]
    fn window_limits_the_scan() {
        let mol = chain();
        let result = evaluate(
            &mol,
            &loaded(&[("X_1_1", -5.0), ("X_1_3", -3.0)]),
            &SelectionConfig {
                top_n: 1,
                physical_check: true,
            },
            &ProgressReporter::new(),
        )
        .unwrap();
        assert!(!result.accepted());
        assert_eq!(result.parameters.volume.optimize_info.result_rank, 1);
    }

    #[test]
    fn acceptance_is_reported() {
        let mol = chain();
        let events = Mutex::new(Vec::new());
        {
            let reporter = ProgressReporter::with_callback(Box::new(|event| {
                events.lock().unwrap().push(event);
            }));
            evaluate(
                &mol,
                &loaded(&[("X_1_1", -5.0), ("X_1_3", -3.0)]),
                &selection(true),
                &reporter,
            )
            .unwrap();
        }
        let events = events.into_inner().unwrap();
        assert!(events.contains(&Progress::ScanStart { samples: 2 }));
        assert!(events.contains(&Progress::SampleScanned { rank: 1 }));
        assert!(events.contains(&Progress::SampleScanned { rank: 2 }));
        assert!(
            events
                .iter()
                .any(|e| matches!(e, Progress::CandidateAccepted { rank: 2, .. }))
        );
    }

    #[test]
    fn output_names_combine_template_method_and_save_name() {
        let paths = output_paths(
            Path::new("data/117_ideal.mol2"),
            SolverBackend::DwaveQa,
            &OutputConfig {
                directory: None,
                save_name: "latest".into(),
            },
        );
        assert_eq!(paths.structure, PathBuf::from("data/117_ideal_dwave-qa_latest.mol2"));
        assert_eq!(paths.parameters, PathBuf::from("data/117_ideal_dwave-qa_latest.json"));
    }

    #[test]
    fn run_and_save_write_structure_and_parameters() {
        let dir = tempdir().unwrap();
        let template = dir.path().join("chain.mol2");
        fs::write(&template, CHAIN).unwrap();
        fs::write(dir.path().join("neal-sa_result.json"), PAYLOAD).unwrap();

        let config = UnfoldConfigBuilder::new()
            .template_path(template)
            .backend(SolverBackend::NealSa)
            .source(ResultSource::Local {
                dir: dir.path().to_path_buf(),
            })
            .output_directory(Some(dir.path().join("out")))
            .save_name("best")
            .build()
            .unwrap();

        let result = run(&config, None, &ProgressReporter::new()).unwrap();
        assert!(result.accepted());
        assert_eq!(result.parameters.volume.optimize_info.result_rank, 2);

        let saved = save(&result, &config).unwrap();
        assert_eq!(saved.structure, dir.path().join("out/chain_neal-sa_best.mol2"));

        let rewritten = Mol2File::read_from_path(&saved.structure).unwrap();
        let moved = rewritten.atom(4).unwrap().position;
        assert!(approx_eq(moved.y, -3.0));

        let params: Parameters =
            serde_json::from_str(&fs::read_to_string(&saved.parameters).unwrap()).unwrap();
        assert!(params.volume.optimize_info.optimize_state);
        assert_eq!(params.volume.unfolding_results, vec!["X_1_3"]);
        assert!(approx_eq(params.volume.gain, result.parameters.volume.gain));
    }
}
