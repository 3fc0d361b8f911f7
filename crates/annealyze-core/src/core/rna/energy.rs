use crate::core::models::stem::Stem;

/// Coupling constants of the stem Hamiltonian.
///
/// `cl` weighs the quadratic length term and `cb` the pairwise stacking reward.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HamiltonianCosts {
    pub cl: f64,
    pub cb: f64,
}

impl Default for HamiltonianCosts {
    fn default() -> Self {
        Self { cl: 1.0, cb: 1.0 }
    }
}

/// Penalty factor between two stems: `penalty` if they cross, otherwise 1.
pub fn pseudoknot_penalty(a: &Stem, b: &Stem, penalty: f64) -> f64 {
    if a.crosses(b) { penalty } else { 1.0 }
}

/// Penalty factor for one unordered pair of stems, by index into the stem list.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PseudoknotPair {
    pub first: usize,
    pub second: usize,
    pub factor: f64,
}

/// Penalty factors for every pair `i < j`, in row-major order.
pub fn potential_pseudoknots(stems: &[Stem], penalty: f64) -> Vec<PseudoknotPair> {
    let mut pairs = Vec::with_capacity(stems.len() * stems.len().saturating_sub(1) / 2);
    for (i, a) in stems.iter().enumerate() {
        for (j, b) in stems.iter().enumerate().skip(i + 1) {
            pairs.push(PseudoknotPair {
                first: i,
                second: j,
                factor: pseudoknot_penalty(a, b, penalty),
            });
        }
    }
    pairs
}

pub fn max_stem_length(stems: &[Stem]) -> Option<usize> {
    stems.iter().map(|s| s.length).max()
}

/// Hamiltonian energy of a stem set with `mu` as the reference maximum stem length.
pub fn stem_energy(stems: &[Stem], penalty: f64, mu: f64, costs: &HamiltonianCosts) -> f64 {
    let HamiltonianCosts { cl, cb } = *costs;
    let linear: f64 = stems
        .iter()
        .map(|s| {
            let l = s.length as f64;
            cl * (l * l - 2.0 * mu * l + mu * mu) - cb * l * l
        })
        .sum();
    let coupling: f64 = potential_pseudoknots(stems, penalty)
        .iter()
        .map(|p| {
            2.0 * cb * stems[p.first].length as f64 * stems[p.second].length as f64 * p.factor
        })
        .sum();
    linear - coupling
}

/// Energy of a reference structure, using its own longest stem as `mu`.
///
/// Returns `None` for an empty structure.
pub fn reference_energy(stems: &[Stem], penalty: f64, costs: &HamiltonianCosts) -> Option<f64> {
    let mu = max_stem_length(stems)? as f64;
    Some(stem_energy(stems, penalty, mu, costs))
}
