//! RNA secondary-structure scoring and annotation.

pub mod dotbracket;
pub mod energy;
