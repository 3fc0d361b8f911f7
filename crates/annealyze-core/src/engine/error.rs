use crate::core::io::mol2::Mol2Error;
use crate::core::io::results::ResultLoadError;
use crate::core::io::rna::RnaDataError;
use crate::core::models::molecule::TopologyError;
use crate::core::rna::dotbracket::DotBracketError;
use crate::engine::volume::BondParseError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Initialization failed: {0}")]
    Initialization(String),

    #[error("Failed to load solver results: {source}")]
    Results {
        #[from]
        source: ResultLoadError,
    },

    #[error("Structure template error: {source}")]
    Template {
        #[from]
        source: Mol2Error,
    },

    #[error("Molecule topology error: {source}")]
    Topology {
        #[from]
        source: TopologyError,
    },

    #[error("Invalid model description: {source}")]
    Bond {
        #[from]
        source: BondParseError,
    },

    #[error("RNA dataset error: {source}")]
    Dataset {
        #[from]
        source: RnaDataError,
    },

    #[error("Dot-bracket conversion failed: {source}")]
    DotBracket {
        #[from]
        source: DotBracketError,
    },

    #[error("Rotation axis {from}-{to} is degenerate: both atoms share a position")]
    DegenerateAxis { from: usize, to: usize },

    #[error("Job metadata is missing '{0}'")]
    MissingMetadata(&'static str),

    #[error("Invalid timestamp '{value}': {source}")]
    Timestamp {
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("Failed to write '{path}': {source}", path = path.display())]
    Output {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize results: {source}")]
    Serialization {
        #[from]
        source: serde_json::Error,
    },

    #[error("Internal logic error: {0}")]
    Internal(String),
}
