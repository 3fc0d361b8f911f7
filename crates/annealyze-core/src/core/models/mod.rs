//! Data structures describing molecules and RNA secondary structures.

pub mod atom;
pub mod molecule;
pub mod stem;
