use nalgebra::Point3;
use phf::{Map, phf_map};

/// Radius used for elements missing from the table, in Angstroms.
pub const DEFAULT_VDW_RADIUS: f64 = 1.70;

// Bondi radii, Angstroms.
#[rustfmt::skip]
static VDW_RADII: Map<&'static str, f64> = phf_map! {
    "H"  => 1.20, "He" => 1.40,
    "B"  => 1.92, "C"  => 1.70, "N"  => 1.55, "O"  => 1.52, "F"  => 1.47,
    "Si" => 2.10, "P"  => 1.80, "S"  => 1.80, "Cl" => 1.75,
    "Se" => 1.90, "Br" => 1.85, "I"  => 1.98,
};

/// Looks up the van der Waals radius of an element symbol.
///
/// Unknown symbols fall back to [`DEFAULT_VDW_RADIUS`].
pub fn vdw_radius_for(element: &str) -> f64 {
    VDW_RADII.get(element).copied().unwrap_or(DEFAULT_VDW_RADIUS)
}

/// Element symbol of atoms whose SYBYL type names no element.
pub const UNKNOWN_ELEMENT: &str = "X";

// SYBYL types that stand for dummies, lone pairs or wildcards.
const PSEUDO_SYBYL_TYPES: [&str; 6] = ["Du", "LP", "Any", "Hal", "Het", "Hev"];

/// Derives an element symbol from a SYBYL atom type (`C.ar`, `N.3`, `Cl`) or, failing that,
/// from the leading letters of the atom name (`C12`, `H3`).
pub fn element_from_labels(sybyl_type: &str, name: &str) -> String {
    let from_type = sybyl_type.split('.').next().unwrap_or("");
    if PSEUDO_SYBYL_TYPES
        .iter()
        .any(|pseudo| pseudo.eq_ignore_ascii_case(from_type))
    {
        return UNKNOWN_ELEMENT.to_string();
    }
    let candidate = if from_type.chars().all(|c| c.is_ascii_alphabetic()) && !from_type.is_empty()
    {
        from_type
    } else {
        name.trim_end_matches(|c: char| !c.is_ascii_alphabetic())
    };
    normalize_symbol(candidate)
}

fn normalize_symbol(raw: &str) -> String {
    let letters: String = raw.chars().take_while(|c| c.is_ascii_alphabetic()).collect();
    let mut chars = letters.chars();
    let Some(first) = chars.next() else {
        return String::new();
    };
    let two_letter: String = std::iter::once(first.to_ascii_uppercase())
        .chain(chars.next().map(|c| c.to_ascii_lowercase()))
        .collect();
    if two_letter.len() == 2 && VDW_RADII.contains_key(two_letter.as_str()) {
        two_letter
    } else {
        first.to_ascii_uppercase().to_string()
    }
}

/// An atom read from a structure template.
#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    /// Serial number as it appears in the template's atom section.
    pub id: usize,
    /// Atom name (e.g. `C12`).
    pub name: String,
    /// Element symbol derived from the SYBYL type or the name.
    pub element: String,
    /// SYBYL atom type (e.g. `C.3`), empty if the template did not carry one.
    pub sybyl_type: String,
    /// Coordinates in Angstroms.
    pub position: Point3<f64>,
    /// Van der Waals radius in Angstroms.
    pub vdw_radius: f64,
}

impl Atom {
    pub fn new(id: usize, name: &str, sybyl_type: &str, position: Point3<f64>) -> Self {
        let element = element_from_labels(sybyl_type, name);
        let vdw_radius = vdw_radius_for(&element);
        Self {
            id,
            name: name.to_string(),
            element,
            sybyl_type: sybyl_type.to_string(),
            position,
            vdw_radius,
        }
    }
}

/// Mutable per-atom state used while candidate torsions are applied.
///
/// `index_state.0` holds `(from, to, angle)` of the last torsion that moved the atom and
/// `index_state.1[0]` counts how many torsions moved it since the last reset.
#[derive(Debug, Clone, PartialEq)]
pub struct AtomPosition {
    pub position: Point3<f64>,
    pub vdw_radius: f64,
    pub index_state: ([usize; 3], [usize; 3]),
}

impl AtomPosition {
    pub fn from_atom(atom: &Atom) -> Self {
        Self {
            position: atom.position,
            vdw_radius: atom.vdw_radius,
            index_state: ([0; 3], [0; 3]),
        }
    }

    pub fn record_torsion(&mut self, from: usize, to: usize, angle: usize) {
        self.index_state.0 = [from, to, angle];
        self.index_state.1[0] += 1;
    }

    pub fn rotation_count(&self) -> usize {
        self.index_state.1[0]
    }
}
