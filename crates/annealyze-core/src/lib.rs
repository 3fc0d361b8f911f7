//! # Annealyze Core Library
//!
//! Post-processing for annealer samples produced on two molecular problems: 3D molecular
//! unfolding (torsion choices that maximize molecular volume) and RNA secondary structure
//! prediction (stem selections under a pseudoknot-penalized Hamiltonian).
//!
//! ## Architectural Philosophy
//!
//! The library keeps the same three-layer split used throughout the project:
//!
//! - **[`core`]: The Foundation.** Stateless data models (`Molecule`, `Stem`), file I/O for
//!   mol2 templates, solver payloads, RNA datasets and CT files, plus the pure arithmetic of
//!   RNA energies and dot-bracket annotation.
//!
//! - **[`engine`]: The Logic Core.** Sample ranking, candidate decoding, volume evaluation with
//!   steric checks, the parameters record and configuration types.
//!
//! - **[`workflows`]: The Public API.** `unfold` and `fold` tie loaders, ranker, evaluators and
//!   writers together into complete post-processing runs.

pub mod core;
pub mod engine;
pub mod workflows;
