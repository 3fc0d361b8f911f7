use crate::core::io::traits::MoleculeFile;
use crate::core::models::atom::Atom;
use crate::core::models::molecule::{Molecule, PositionTable, TopologyError};
use nalgebra::Point3;
use regex::{NoExpand, Regex};
use std::io::{self, BufRead, Write};
use std::sync::LazyLock;
use thiserror::Error;
use tracing::debug;

const MOLECULE_SECTION: &str = "@<TRIPOS>MOLECULE";
const ATOM_SECTION: &str = "@<TRIPOS>ATOM";
const BOND_SECTION: &str = "@<TRIPOS>BOND";

// The atom id is the first field of the record, never the `subst_id` column.
static ATOM_ID_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(\d+)\s+[A-Za-z]\S*").expect("valid atom id pattern"));

static COORDINATE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[-+]?\d+\.\d+ +[-+]?\d+\.\d+ +[-+]?\d+\.\d+").expect("valid coordinate pattern")
});

#[derive(Debug, Error)]
pub enum Mol2Error {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Parse error on line {line}: {kind}")]
    Parse { line: usize, kind: Mol2ParseErrorKind },
    #[error("Topology error on line {line}: {source}")]
    Topology {
        line: usize,
        #[source]
        source: TopologyError,
    },
    #[error("Missing required record: {0}")]
    MissingRecord(String),
    #[error("No position available for atom {0}")]
    MissingPosition(usize),
}

#[derive(Debug, Error)]
pub enum Mol2ParseErrorKind {
    #[error("Expected at least {expected} fields, found {found}")]
    TooFewFields { expected: usize, found: usize },
    #[error("Invalid integer in field '{field}' (value: '{value}')")]
    InvalidInt { field: &'static str, value: String },
    #[error("Invalid float in field '{field}' (value: '{value}')")]
    InvalidFloat { field: &'static str, value: String },
    #[error("Atom record does not match '<index> <name>' followed by three coordinates")]
    UnrecognizedAtomRecord,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Preamble,
    Molecule,
    Atom,
    Bond,
    Other,
}

impl Section {
    fn from_marker(line: &str) -> Option<Self> {
        let marker = line.trim();
        if !marker.starts_with("@<TRIPOS>") {
            return None;
        }
        Some(if marker.eq_ignore_ascii_case(MOLECULE_SECTION) {
            Section::Molecule
        } else if marker.eq_ignore_ascii_case(ATOM_SECTION) {
            Section::Atom
        } else if marker.eq_ignore_ascii_case(BOND_SECTION) {
            Section::Bond
        } else {
            Section::Other
        })
    }
}

fn parse_usize(value: &str, field: &'static str, line: usize) -> Result<usize, Mol2Error> {
    value.parse().map_err(|_| Mol2Error::Parse {
        line,
        kind: Mol2ParseErrorKind::InvalidInt {
            field,
            value: value.to_string(),
        },
    })
}

fn parse_f64(value: &str, field: &'static str, line: usize) -> Result<f64, Mol2Error> {
    value.parse().map_err(|_| Mol2Error::Parse {
        line,
        kind: Mol2ParseErrorKind::InvalidFloat {
            field,
            value: value.to_string(),
        },
    })
}

fn require_fields<'a>(
    line: &'a str,
    expected: usize,
    line_num: usize,
) -> Result<Vec<&'a str>, Mol2Error> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.len() < expected {
        return Err(Mol2Error::Parse {
            line: line_num,
            kind: Mol2ParseErrorKind::TooFewFields {
                expected,
                found: parts.len(),
            },
        });
    }
    Ok(parts)
}

fn substitute_coordinates(
    line: &str,
    line_num: usize,
    positions: &PositionTable,
) -> Result<String, Mol2Error> {
    let unrecognized = || Mol2Error::Parse {
        line: line_num,
        kind: Mol2ParseErrorKind::UnrecognizedAtomRecord,
    };
    let captures = ATOM_ID_PATTERN.captures(line).ok_or_else(unrecognized)?;
    let atom_id = parse_usize(&captures[1], "atom_id", line_num)?;
    if !COORDINATE_PATTERN.is_match(line) {
        return Err(unrecognized());
    }
    let position = positions
        .get(&atom_id)
        .ok_or(Mol2Error::MissingPosition(atom_id))?
        .position;
    let replacement = format!(
        "{:.4}    {:.4}    {:.4}",
        position.x, position.y, position.z
    );
    Ok(COORDINATE_PATTERN
        .replace(line, NoExpand(&replacement))
        .into_owned())
}

pub struct Mol2File;

impl MoleculeFile for Mol2File {
    type Error = Mol2Error;

    fn read_from(reader: &mut impl BufRead) -> Result<Molecule, Self::Error> {
        let mut section = Section::Preamble;
        let mut name: Option<String> = None;
        let mut atoms: Vec<(usize, Atom)> = Vec::new();
        let mut bonds: Vec<(usize, usize, usize)> = Vec::new();

        for (line_num, line_res) in reader.lines().enumerate() {
            let line = line_res?;
            let line_num = line_num + 1;

            if let Some(next) = Section::from_marker(&line) {
                section = next;
                continue;
            }
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            match section {
                Section::Molecule if name.is_none() => name = Some(trimmed.to_string()),
                Section::Atom => {
                    let parts = require_fields(trimmed, 5, line_num)?;
                    let id = parse_usize(parts[0], "atom_id", line_num)?;
                    let x = parse_f64(parts[2], "x", line_num)?;
                    let y = parse_f64(parts[3], "y", line_num)?;
                    let z = parse_f64(parts[4], "z", line_num)?;
                    let sybyl_type = parts.get(5).copied().unwrap_or("");
                    atoms.push((
                        line_num,
                        Atom::new(id, parts[1], sybyl_type, Point3::new(x, y, z)),
                    ));
                }
                Section::Bond => {
                    let parts = require_fields(trimmed, 3, line_num)?;
                    let a = parse_usize(parts[1], "origin_atom_id", line_num)?;
                    let b = parse_usize(parts[2], "target_atom_id", line_num)?;
                    bonds.push((line_num, a, b));
                }
                _ => {}
            }
        }

        if atoms.is_empty() {
            return Err(Mol2Error::MissingRecord(ATOM_SECTION.into()));
        }

        let mut molecule = Molecule::new(name.as_deref().unwrap_or("MOL2"));
        for (line, atom) in atoms {
            molecule
                .add_atom(atom)
                .map_err(|source| Mol2Error::Topology { line, source })?;
        }
        for (line, a, b) in bonds {
            molecule
                .add_bond(a, b)
                .map_err(|source| Mol2Error::Topology { line, source })?;
        }
        debug!(
            atoms = molecule.atom_count(),
            bonds = molecule.bonds().len(),
            "Parsed mol2 template."
        );
        Ok(molecule)
    }

    fn write_positions(
        template: &mut impl BufRead,
        positions: &PositionTable,
        writer: &mut impl Write,
    ) -> Result<usize, Self::Error> {
        let mut in_atoms = false;
        let mut rewritten = 0;

        for (line_num, line_res) in template.lines().enumerate() {
            let line = line_res?;
            let line_num = line_num + 1;

            if let Some(section) = Section::from_marker(&line) {
                in_atoms = section == Section::Atom;
                writeln!(writer, "{}", line)?;
                continue;
            }

            if in_atoms && !line.trim().is_empty() {
                writeln!(writer, "{}", substitute_coordinates(&line, line_num, positions)?)?;
                rewritten += 1;
            } else {
                writeln!(writer, "{}", line)?;
            }
        }
        Ok(rewritten)
    }
}
