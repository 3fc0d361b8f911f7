use crate::core::models::molecule::{Molecule, PositionTable, TopologyError};
use crate::core::utils::geometry::{distance, rotate_about_axis, sum_of_cross_distances};
use crate::engine::decode::{TorsionAssignment, TorsionModel};
use crate::engine::error::EngineError;
use nalgebra::Point3;
use std::cell::OnceCell;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Invalid rotatable bond '{0}', expected '<atom>+<atom>'")]
pub struct BondParseError(pub String);

/// A bond rotated about the axis `from -> to`; atoms on the `to` side move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RotatableBond {
    pub from: usize,
    pub to: usize,
}

impl FromStr for RotatableBond {
    type Err = BondParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || BondParseError(s.to_string());
        let (from, to) = s.split_once('+').ok_or_else(invalid)?;
        Ok(Self {
            from: from.trim().parse().map_err(|_| invalid())?,
            to: to.trim().parse().map_err(|_| invalid())?,
        })
    }
}

impl fmt::Display for RotatableBond {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}+{}", self.from, self.to)
    }
}

#[derive(Debug, Clone)]
struct BondSides {
    bond: RotatableBond,
    upstream: Vec<usize>,
    downstream: Vec<usize>,
}

/// Outcome of applying one torsion assignment.
#[derive(Debug, Clone)]
pub struct VolumeEvaluation {
    pub volume: f64,
    pub gain: f64,
    pub positions: PositionTable,
}

/// Applies torsion assignments to a molecule and scores the resulting geometry.
///
/// The volume metric sums, over every rotatable bond of the model, the distances between
/// each atom upstream of the bond and each atom downstream of it. The volume of the template
/// geometry is computed on first use and reused for every gain.
pub struct VolumeEvaluator<'a> {
    molecule: &'a Molecule,
    model: &'a TorsionModel,
    sides: BTreeMap<String, BondSides>,
    non_bonded: Vec<(usize, usize)>,
    initial_volume: OnceCell<f64>,
}

impl<'a> VolumeEvaluator<'a> {
    /// # Errors
    ///
    /// Fails if a model bond names an unknown atom, joins unbonded atoms or lies in a ring.
    pub fn new(molecule: &'a Molecule, model: &'a TorsionModel) -> Result<Self, TopologyError> {
        let mut sides = BTreeMap::new();
        for (var, bond) in &model.bonds {
            let downstream = molecule.downstream_atoms(bond.from, bond.to)?;
            let upstream = molecule
                .atoms()
                .map(|atom| atom.id)
                .filter(|id| !downstream.contains(id))
                .collect();
            sides.insert(
                var.clone(),
                BondSides {
                    bond: *bond,
                    upstream,
                    downstream: downstream.into_iter().collect(),
                },
            );
        }
        Ok(Self {
            molecule,
            model,
            sides,
            non_bonded: molecule.non_bonded_pairs(),
            initial_volume: OnceCell::new(),
        })
    }

    /// Volume of the unrotated template, computed once.
    pub fn initial_volume(&self) -> f64 {
        *self
            .initial_volume
            .get_or_init(|| self.volume_of(&self.molecule.initial_positions()))
    }

    pub fn volume_of(&self, positions: &PositionTable) -> f64 {
        let gather = |ids: &[usize]| -> Vec<Point3<f64>> {
            ids.iter()
                .filter_map(|id| positions.get(id).map(|p| p.position))
                .collect()
        };
        self.sides
            .values()
            .map(|side| sum_of_cross_distances(&gather(&side.upstream), &gather(&side.downstream)))
            .sum()
    }

    /// Template positions with every torsion of `assignment` applied in variable order.
    ///
    /// Each rotation uses the current positions of the bond atoms, so earlier rotations carry
    /// later bonds along. Angles that are whole turns leave the atoms untouched. Variables the
    /// model does not know are skipped.
    pub fn apply(&self, assignment: &TorsionAssignment) -> Result<PositionTable, EngineError> {
        let mut positions = self.molecule.initial_positions();
        for (var, angle_index) in assignment.iter() {
            let Some(side) = self.sides.get(var) else {
                debug!(variable = var, "Skipping torsion variable without a bond.");
                continue;
            };
            let degrees = self.model.angle_degrees(angle_index).ok_or_else(|| {
                EngineError::Internal(format!(
                    "angle index {} of '{}' is outside 1..={}",
                    angle_index, var, self.model.angle_count
                ))
            })?;
            if degrees.rem_euclid(360.0) == 0.0 {
                continue;
            }

            let RotatableBond { from, to } = side.bond;
            let axis_point = |id: usize| {
                positions
                    .get(&id)
                    .map(|p| p.position)
                    .ok_or(TopologyError::UnknownAtom(id))
            };
            let (start, end) = (axis_point(from)?, axis_point(to)?);
            for id in &side.downstream {
                let Some(entry) = positions.get_mut(id) else {
                    continue;
                };
                entry.position = rotate_about_axis(&entry.position, &start, &end, degrees)
                    .ok_or(EngineError::DegenerateAxis { from, to })?;
                entry.record_torsion(from, to, angle_index);
            }
        }
        Ok(positions)
    }

    pub fn evaluate(&self, assignment: &TorsionAssignment) -> Result<VolumeEvaluation, EngineError> {
        let positions = self.apply(assignment)?;
        let volume = self.volume_of(&positions);
        let initial = self.initial_volume();
        let gain = if initial > 0.0 { volume / initial } else { 1.0 };
        Ok(VolumeEvaluation {
            volume,
            gain,
            positions,
        })
    }

    /// First non-bonded pair closer than the sum of its van der Waals radii.
    pub fn steric_violation(&self, positions: &PositionTable) -> Option<(usize, usize)> {
        self.non_bonded.iter().copied().find(|(a, b)| {
            match (positions.get(a), positions.get(b)) {
                (Some(pa), Some(pb)) => {
                    distance(&pa.position, &pb.position) < pa.vdw_radius + pb.vdw_radius
                }
                _ => false,
            }
        })
    }
}
