use thiserror::Error;
use tracing::warn;

/// Glyphs of the nested (non-pseudoknotted) layer.
pub const BASE_GLYPHS: (char, char) = ('(', ')');

/// Glyph sets cycled across pseudoknot layers.
pub const PSEUDOKNOT_GLYPHS: [(char, char); 3] = [('<', '>'), ('{', '}'), ('[', ']')];

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DotBracketError {
    #[error("Base pair ({0}, {1}) lies outside a sequence of length {2}")]
    PairOutOfRange(usize, usize, usize),
    #[error("Unmatched '{glyph}' at position {position}")]
    Unmatched { glyph: char, position: usize },
    #[error("Unrecognized character '{glyph}' at position {position}")]
    UnknownGlyph { glyph: char, position: usize },
}

/// A dot-bracket annotation together with the number of pseudoknot layers it needed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DotBracket {
    pub notation: String,
    pub pseudoknot_layers: usize,
}

impl DotBracket {
    /// True when glyph sets had to be reused because of too many pseudoknot layers.
    pub fn glyphs_reused(&self) -> bool {
        self.pseudoknot_layers > PSEUDOKNOT_GLYPHS.len()
    }
}

fn pairs_cross(a: (usize, usize), b: (usize, usize)) -> bool {
    (a.0 < b.0 && b.0 < a.1 && a.1 < b.1) || (b.0 < a.0 && a.0 < b.1 && b.1 < a.1)
}

/// Splits base pairs into layers in which no two pairs cross.
///
/// Pairs are visited by ascending opening position and placed in the first layer they do not
/// cross. Layer 0 is the nested structure; every further layer is an independent pseudoknot
/// group. Pairs with `left >= right` are discarded.
pub fn pseudoknot_layers(pairs: &[(usize, usize)]) -> Vec<Vec<(usize, usize)>> {
    let mut sorted: Vec<_> = pairs.iter().copied().filter(|&(l, r)| l < r).collect();
    sorted.sort_by_key(|&(l, _)| l);

    let mut layers: Vec<Vec<(usize, usize)>> = Vec::new();
    for pair in sorted {
        match layers
            .iter_mut()
            .find(|layer| layer.iter().all(|&other| !pairs_cross(pair, other)))
        {
            Some(layer) => layer.push(pair),
            None => layers.push(vec![pair]),
        }
    }
    layers
}

/// Converts 1-based base pairs into dot-bracket notation for a sequence of `length` bases.
///
/// `[(3, 8), (4, 7)]` with length 10 becomes `..((..))..`. Pseudoknot layers beyond the
/// available glyph sets reuse glyphs cyclically and log a warning.
pub fn pairs_to_dot_bracket(
    pairs: &[(usize, usize)],
    length: usize,
) -> Result<DotBracket, DotBracketError> {
    let mut dots = vec!['.'; length];
    for &(l, r) in pairs {
        if l < r && (l == 0 || r > length) {
            return Err(DotBracketError::PairOutOfRange(l, r, length));
        }
    }

    let layers = pseudoknot_layers(pairs);
    let pseudoknot_count = layers.len().saturating_sub(1);
    if pseudoknot_count > PSEUDOKNOT_GLYPHS.len() {
        warn!(
            layers = pseudoknot_count,
            glyph_sets = PSEUDOKNOT_GLYPHS.len(),
            "Too many pseudoknot layers; bracket glyphs will be reused."
        );
    }

    for (depth, layer) in layers.iter().enumerate() {
        let (open, close) = match depth {
            0 => BASE_GLYPHS,
            d => PSEUDOKNOT_GLYPHS[(d - 1) % PSEUDOKNOT_GLYPHS.len()],
        };
        for &(l, r) in layer {
            dots[l - 1] = open;
            dots[r - 1] = close;
        }
    }

    Ok(DotBracket {
        notation: dots.into_iter().collect(),
        pseudoknot_layers: pseudoknot_count,
    })
}

/// Recovers 1-based base pairs from dot-bracket notation, sorted by opening position.
pub fn dot_bracket_to_pairs(notation: &str) -> Result<Vec<(usize, usize)>, DotBracketError> {
    let glyph_sets: Vec<(char, char)> = std::iter::once(BASE_GLYPHS)
        .chain(PSEUDOKNOT_GLYPHS)
        .collect();
    let mut stacks: Vec<Vec<usize>> = vec![Vec::new(); glyph_sets.len()];
    let mut pairs = Vec::new();

    for (i, glyph) in notation.chars().enumerate() {
        let position = i + 1;
        if glyph == '.' {
            continue;
        }
        if let Some(set) = glyph_sets.iter().position(|&(open, _)| open == glyph) {
            stacks[set].push(position);
        } else if let Some(set) = glyph_sets.iter().position(|&(_, close)| close == glyph) {
            let open = stacks[set]
                .pop()
                .ok_or(DotBracketError::Unmatched { glyph, position })?;
            pairs.push((open, position));
        } else {
            return Err(DotBracketError::UnknownGlyph { glyph, position });
        }
    }

    for (set, stack) in stacks.iter().enumerate() {
        if let Some(&position) = stack.last() {
            return Err(DotBracketError::Unmatched {
                glyph: glyph_sets[set].0,
                position,
            });
        }
    }

    pairs.sort_unstable();
    Ok(pairs)
}
