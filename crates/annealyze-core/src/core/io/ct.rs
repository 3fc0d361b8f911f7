use std::io::{self, BufRead};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CtError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Line {line}: expected at least 6 columns, found {found}")]
    TooFewColumns { line: usize, found: usize },
    #[error("Line {line}: invalid integer '{value}'")]
    InvalidInt { line: usize, value: String },
}

/// A secondary structure read from a connectivity table.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CtStructure {
    pub sequence: String,
    /// 1-based base pairs with `left < right`, ordered by the left base.
    pub pairs: Vec<(usize, usize)>,
}

impl CtStructure {
    pub fn len(&self) -> usize {
        self.sequence.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }
}

/// Parses a CT file: a header line, then one line per base with
/// `index base prev next partner natural_index`. A partner of 0 means unpaired.
pub fn read_ct(reader: &mut impl BufRead) -> Result<CtStructure, CtError> {
    let mut structure = CtStructure::default();
    let mut header_seen = false;

    for (line_num, line_res) in reader.lines().enumerate() {
        let line = line_res?;
        let line_num = line_num + 1;
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.is_empty() {
            continue;
        }
        if !header_seen {
            header_seen = true;
            if parts.len() < 6 {
                continue;
            }
        }
        if parts.len() < 6 {
            return Err(CtError::TooFewColumns {
                line: line_num,
                found: parts.len(),
            });
        }
        let parse = |value: &str| {
            value.parse::<usize>().map_err(|_| CtError::InvalidInt {
                line: line_num,
                value: value.to_string(),
            })
        };
        let index = parse(parts[0])?;
        let partner = parse(parts[4])?;
        structure.sequence.push_str(parts[1]);
        if partner > index {
            structure.pairs.push((index, partner));
        }
    }
    Ok(structure)
}
