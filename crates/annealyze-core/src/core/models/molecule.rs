use super::atom::{Atom, AtomPosition};
use itertools::Itertools;
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use thiserror::Error;

/// Working coordinates keyed by atom serial.
pub type PositionTable = BTreeMap<usize, AtomPosition>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TopologyError {
    #[error("Atom {0} is not present in the molecule")]
    UnknownAtom(usize),
    #[error("Duplicate atom serial: {0}")]
    DuplicateAtom(usize),
    #[error("Atoms {from} and {to} are not bonded")]
    NotBonded { from: usize, to: usize },
    #[error("Bond {from}-{to} is part of a ring and cannot be rotated")]
    RingBond { from: usize, to: usize },
}

/// A molecule as an atom table plus an undirected bond graph.
#[derive(Debug, Clone, Default)]
pub struct Molecule {
    name: String,
    atoms: BTreeMap<usize, Atom>,
    bonds: Vec<(usize, usize)>,
    adjacency: BTreeMap<usize, BTreeSet<usize>>,
}

impl Molecule {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn add_atom(&mut self, atom: Atom) -> Result<(), TopologyError> {
        if self.atoms.contains_key(&atom.id) {
            return Err(TopologyError::DuplicateAtom(atom.id));
        }
        self.adjacency.entry(atom.id).or_default();
        self.atoms.insert(atom.id, atom);
        Ok(())
    }

    /// Adds an undirected bond. Repeated bonds are ignored.
    pub fn add_bond(&mut self, a: usize, b: usize) -> Result<(), TopologyError> {
        for id in [a, b] {
            if !self.atoms.contains_key(&id) {
                return Err(TopologyError::UnknownAtom(id));
            }
        }
        if self.is_bonded(a, b) {
            return Ok(());
        }
        self.bonds.push((a.min(b), a.max(b)));
        self.adjacency.entry(a).or_default().insert(b);
        self.adjacency.entry(b).or_default().insert(a);
        Ok(())
    }

    pub fn atom(&self, id: usize) -> Option<&Atom> {
        self.atoms.get(&id)
    }

    pub fn atoms(&self) -> impl Iterator<Item = &Atom> {
        self.atoms.values()
    }

    pub fn atom_count(&self) -> usize {
        self.atoms.len()
    }

    pub fn bonds(&self) -> &[(usize, usize)] {
        &self.bonds
    }

    pub fn neighbors(&self, id: usize) -> impl Iterator<Item = usize> + '_ {
        self.adjacency.get(&id).into_iter().flatten().copied()
    }

    pub fn is_bonded(&self, a: usize, b: usize) -> bool {
        self.adjacency.get(&a).is_some_and(|n| n.contains(&b))
    }

    /// Every unordered pair of distinct atoms that are not directly bonded.
    pub fn non_bonded_pairs(&self) -> Vec<(usize, usize)> {
        self.atoms
            .keys()
            .copied()
            .tuple_combinations()
            .filter(|&(a, b)| !self.is_bonded(a, b))
            .collect()
    }

    /// Atoms on the `to` side of the bond `from`-`to`, including `to` itself.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::NotBonded`] if the atoms share no bond and
    /// [`TopologyError::RingBond`] if `from` is reachable from `to` without the bond.
    pub fn downstream_atoms(&self, from: usize, to: usize) -> Result<BTreeSet<usize>, TopologyError> {
        for id in [from, to] {
            if !self.atoms.contains_key(&id) {
                return Err(TopologyError::UnknownAtom(id));
            }
        }
        if !self.is_bonded(from, to) {
            return Err(TopologyError::NotBonded { from, to });
        }

        let mut visited = BTreeSet::from([to]);
        let mut queue = VecDeque::from([to]);
        while let Some(current) = queue.pop_front() {
            for next in self.neighbors(current) {
                if current == to && next == from {
                    continue;
                }
                if next == from {
                    return Err(TopologyError::RingBond { from, to });
                }
                if visited.insert(next) {
                    queue.push_back(next);
                }
            }
        }
        Ok(visited)
    }

    /// Fresh working coordinates taken from the template geometry.
    pub fn initial_positions(&self) -> PositionTable {
        self.atoms
            .iter()
            .map(|(&id, atom)| (id, AtomPosition::from_atom(atom)))
            .collect()
    }
}
