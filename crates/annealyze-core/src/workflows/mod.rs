//! # Workflows Module
//!
//! End-to-end post-processing runs built from the [`crate::core`] loaders and the
//! [`crate::engine`] evaluators.
//!
//! - **Unfolding** ([`unfold`]) - Picks the first ranked torsion assignment that increases the
//!   volume metric and passes the steric check, then rewrites the structure template.
//! - **Folding** ([`fold`]) - Scores the stem selections of the ranked samples against a
//!   reference structure and reports energies and dot-bracket annotations.
//!
//! Both workflows take a [`ProgressReporter`](crate::engine::progress::ProgressReporter) and
//! report their phases through it.

pub mod fold;
pub mod unfold;
