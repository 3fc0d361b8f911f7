//! Small numeric helpers shared across the crate.

pub mod geometry;
pub mod product;
