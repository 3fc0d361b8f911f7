//! # Engine Module
//!
//! Turns raw annealer samples into evaluated structural candidates.
//!
//! ## Overview
//!
//! A solver returns many sampled assignments over binary decision variables. The engine
//! orders them by reported energy, interprets each retained assignment as torsion choices
//! (unfolding) or stem selections (folding), and scores the interpretations. The selection
//! policy itself lives in [`crate::workflows`]; the pieces here are reusable on their own.
//!
//! ## Architecture
//!
//! - **Configuration** ([`config`]) - Run settings and their builders
//! - **Ranking** ([`ranking`]) - Stable energy ordering and the top-N window
//! - **Decoding** ([`decode`]) - Variable names to torsion assignments or stems
//! - **Volume Evaluation** ([`volume`]) - Torsion application, volume metric and steric check
//! - **Parameters Record** ([`params`]) - The persisted summary of an unfolding run
//! - **Timing** ([`timing`]) - Wall-clock and QPU timing extracted from job metadata
//! - **Progress Monitoring** ([`progress`]) - Callback based progress reporting
//! - **Error Handling** ([`error`]) - Engine-level error type wrapping the I/O errors

pub mod config;
pub mod decode;
pub mod error;
pub mod params;
pub mod progress;
pub mod ranking;
pub mod timing;
pub mod volume;
