//! # Core Module
//!
//! Fundamental data structures and pure algorithms shared by the engine and the workflows.
//!
//! - **Molecular Representation** ([`models`]) - Atoms, the bond graph, RNA stems
//! - **File I/O** ([`io`]) - mol2 templates, solver payloads, RNA datasets, CT files
//! - **RNA Scoring** ([`rna`]) - Pseudoknot penalties, stem Hamiltonian, dot-bracket notation
//! - **Utilities** ([`utils`]) - Torsion geometry and bounded Cartesian products
//! - **Experiments** ([`experiments`]) - Hyperparameter grids, result tables, device lookup

pub mod experiments;
pub mod io;
pub mod models;
pub mod rna;
pub mod utils;
