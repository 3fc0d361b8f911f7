use serde::{Deserialize, Serialize};

/// Summary of an unfolding run, written next to the rewritten structure.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Parameters {
    pub volume: VolumeParameters,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct VolumeParameters {
    /// Volume metric of the template geometry.
    pub initial: f64,
    /// Volume metric of the accepted geometry, or `initial` when nothing was accepted.
    pub optimize: f64,
    pub gain: f64,
    /// Torsion variables of the applied assignment.
    pub unfolding_results: Vec<String>,
    /// Torsion variables the solver set in the selected sample.
    pub annealing_results: Vec<String>,
    pub optimize_info: OptimizeInfo,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct OptimizeInfo {
    /// True if a candidate was accepted.
    pub optimize_state: bool,
    /// Rank of the last sample examined.
    pub result_rank: usize,
}
