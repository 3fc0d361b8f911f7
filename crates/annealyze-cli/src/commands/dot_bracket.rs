use crate::cli::{DotBracketArgs, DotBracketCommands};
use crate::error::{CliError, Result};
use annealyze::core::io::ct::read_ct;
use annealyze::core::rna::dotbracket::{DotBracket, dot_bracket_to_pairs, pairs_to_dot_bracket};
use annealyze::engine::error::EngineError;
use std::fs::File;
use std::io::BufReader;
use tracing::{info, warn};

pub fn run(args: DotBracketArgs) -> Result<()> {
    match args.command {
        DotBracketCommands::FromCt { path } => {
            let file = File::open(&path)?;
            let structure =
                read_ct(&mut BufReader::new(file)).map_err(|e| CliError::FileParsing {
                    path: path.clone(),
                    source: e.into(),
                })?;
            info!(
                bases = structure.len(),
                pairs = structure.pairs.len(),
                "Read connectivity table."
            );
            let annotation = annotate(&structure.pairs, structure.len())?;
            println!("{}", structure.sequence);
            print_annotation(&annotation);
        }
        DotBracketCommands::FromPairs { pairs, length } => {
            let pairs = pairs
                .iter()
                .map(|p| parse_pair(p))
                .collect::<Result<Vec<_>>>()?;
            print_annotation(&annotate(&pairs, length)?);
        }
        DotBracketCommands::ToPairs { notation } => {
            let pairs = dot_bracket_to_pairs(&notation).map_err(EngineError::from)?;
            for (left, right) in pairs {
                println!("{}\t{}", left, right);
            }
        }
    }
    Ok(())
}

fn annotate(pairs: &[(usize, usize)], length: usize) -> Result<DotBracket> {
    Ok(pairs_to_dot_bracket(pairs, length).map_err(EngineError::from)?)
}

fn print_annotation(annotation: &DotBracket) {
    if annotation.glyphs_reused() {
        warn!(
            layers = annotation.pseudoknot_layers,
            "Pseudoknot layers exceed the available glyph sets; glyphs are reused."
        );
    }
    println!("{}", annotation.notation);
}

/// Parses `LEFT:RIGHT` into an ordered 1-based base pair.
fn parse_pair(value: &str) -> Result<(usize, usize)> {
    let invalid = || CliError::Argument(format!("Invalid base pair '{}'. Expected 'LEFT:RIGHT'.", value));
    let (left, right) = value.split_once(':').ok_or_else(invalid)?;
    let left: usize = left.trim().parse().map_err(|_| invalid())?;
    let right: usize = right.trim().parse().map_err(|_| invalid())?;
    if left == 0 || right == 0 || left == right {
        return Err(invalid());
    }
    Ok((left.min(right), left.max(right)))
}
