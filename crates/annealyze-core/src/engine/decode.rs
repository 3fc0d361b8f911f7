//! Interpretation of binary sample rows.
//!
//! Unfolding models encode one binary variable per `(torsion, angle)` pair, named
//! `X_{var}_{angle}` with a 1-based angle index. Folding models encode one variable per
//! potential stem, named by the stem's index.

use crate::core::io::results::{ModelInfo, SampleRow};
use crate::core::models::stem::Stem;
use crate::core::utils::product::cartesian_product;
use crate::engine::error::EngineError;
use crate::engine::volume::{BondParseError, RotatableBond};
use std::collections::BTreeMap;
use tracing::debug;

/// The torsion model an unfolding QUBO was built from.
#[derive(Debug, Clone, PartialEq)]
pub struct TorsionModel {
    /// Torsion group size `M`.
    pub group_size: usize,
    /// Number of discrete angles `D`.
    pub angle_count: usize,
    /// Torsion variable to the bond it rotates.
    pub bonds: BTreeMap<String, RotatableBond>,
    angles: Vec<f64>,
}

impl TorsionModel {
    pub fn from_model_info(info: &ModelInfo) -> Result<Self, EngineError> {
        let angle_count = info.d.ok_or(EngineError::MissingMetadata("model_info.D"))?;
        if angle_count == 0 {
            return Err(EngineError::Initialization(
                "model_info.D must be at least 1".to_string(),
            ));
        }
        let bonds = info
            .var_rb_map
            .iter()
            .map(|(var, bond)| Ok((var.clone(), bond.parse::<RotatableBond>()?)))
            .collect::<Result<BTreeMap<_, _>, BondParseError>>()?;
        let angles = match &info.theta_option {
            Some(theta) if theta.len() == angle_count => theta.clone(),
            Some(theta) => {
                return Err(EngineError::Initialization(format!(
                    "theta_option lists {} angles but D is {}",
                    theta.len(),
                    angle_count
                )));
            }
            None => default_angles(angle_count),
        };
        Ok(Self {
            group_size: info.m.unwrap_or(1),
            angle_count,
            bonds,
            angles,
        })
    }

    /// Rotation in degrees for a 1-based angle index.
    pub fn angle_degrees(&self, index: usize) -> Option<f64> {
        index
            .checked_sub(1)
            .and_then(|i| self.angles.get(i))
            .copied()
    }

    pub fn angles(&self) -> &[f64] {
        &self.angles
    }
}

/// Evenly spaced angles `360 / d * k` for `k in 0..d`.
pub fn default_angles(d: usize) -> Vec<f64> {
    (0..d).map(|k| 360.0 / d as f64 * k as f64).collect()
}

/// Splits `X_{var}_{angle}` into the variable and its 1-based angle index.
pub fn parse_torsion_variable(name: &str) -> Option<(&str, usize)> {
    let rest = name
        .strip_prefix("X_")
        .or_else(|| name.strip_prefix("x_"))?;
    let (var, angle) = rest.rsplit_once('_')?;
    if var.is_empty() {
        return None;
    }
    Some((var, angle.parse().ok()?))
}

pub fn torsion_variable_name(var: &str, angle: usize) -> String {
    format!("X_{}_{}", var, angle)
}

/// One angle index per torsion variable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct TorsionAssignment(BTreeMap<String, usize>);

impl TorsionAssignment {
    /// Every variable set to the same angle index.
    pub fn uniform<'a>(variables: impl IntoIterator<Item = &'a String>, angle: usize) -> Self {
        variables.into_iter().map(|v| (v.clone(), angle)).collect()
    }

    pub fn angle(&self, var: &str) -> Option<usize> {
        self.0.get(var).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The assignment as `X_{var}_{angle}` names.
    pub fn variable_names(&self) -> Vec<String> {
        self.iter()
            .map(|(var, angle)| torsion_variable_name(var, angle))
            .collect()
    }
}

impl FromIterator<(String, usize)> for TorsionAssignment {
    fn from_iter<I: IntoIterator<Item = (String, usize)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Everything one sample row says about torsions.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedTorsions {
    /// Active, recognised variables of the row.
    pub chosen: Vec<String>,
    /// Complete assignments consistent with the row, at most `D` of them.
    pub assignments: Vec<TorsionAssignment>,
}

/// Expands a sample row into complete torsion assignments.
///
/// Active variables naming an unknown torsion or an angle outside `1..=D` are ignored.
/// A torsion with several active angles contributes each of them. When exactly one torsion
/// has no active angle it is tried at every angle; when more are missing, each of them stays
/// at angle 1. The combinations are enumerated with the first torsion varying slowest and
/// capped at `D`.
pub fn decode_torsions(row: &SampleRow, model: &TorsionModel) -> DecodedTorsions {
    let mut options: BTreeMap<String, Vec<usize>> = BTreeMap::new();
    let mut chosen = Vec::new();
    for name in row.active_variables() {
        let Some((var, angle)) = parse_torsion_variable(name) else {
            continue;
        };
        if !model.bonds.contains_key(var) || angle == 0 || angle > model.angle_count {
            continue;
        }
        chosen.push(name.to_string());
        options.entry(var.to_string()).or_default().push(angle);
    }

    let missing: Vec<String> = model
        .bonds
        .keys()
        .filter(|var| !options.contains_key(*var))
        .cloned()
        .collect();
    let fill: Vec<usize> = if missing.len() == 1 {
        (1..=model.angle_count).collect()
    } else {
        vec![1]
    };
    for var in missing {
        options.insert(var, fill.clone());
    }

    let axes: Vec<(String, Vec<usize>)> = options.into_iter().collect();
    let assignments: Vec<TorsionAssignment> = cartesian_product(&axes, Some(model.angle_count))
        .into_iter()
        .map(|combo| combo.into_iter().collect())
        .collect();
    debug!(
        chosen = chosen.len(),
        assignments = assignments.len(),
        "Decoded torsion sample."
    );
    DecodedTorsions {
        chosen,
        assignments,
    }
}

/// Potential stems whose index variable is set in the row.
pub fn decode_stems(row: &SampleRow, potential: &[Stem]) -> Vec<Stem> {
    potential
        .iter()
        .enumerate()
        .filter(|(j, _)| row.is_active(&j.to_string()))
        .map(|(_, stem)| *stem)
        .collect()
}
