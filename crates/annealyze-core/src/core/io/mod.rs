//! Provides input/output for the files this crate consumes and produces.
//!
//! Structure templates are Tripos mol2 files read through the [`traits::MoleculeFile`]
//! interface; solver payloads, RNA datasets and CT structures each have a dedicated loader.

pub mod ct;
pub mod mol2;
pub mod results;
pub mod rna;
pub mod traits;
