use serde::{Deserialize, Serialize};

/// A contiguous run of paired bases: `start` pairs with `end`, `start + 1` with `end - 1`,
/// and so on for `length` pairs. Positions are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawStem", into = "RawStem")]
pub struct Stem {
    pub start: usize,
    pub end: usize,
    pub length: usize,
    pub weight: Option<f64>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(untagged)]
enum RawStem {
    Weighted(usize, usize, usize, f64),
    Plain(usize, usize, usize),
}

impl From<RawStem> for Stem {
    fn from(raw: RawStem) -> Self {
        match raw {
            RawStem::Weighted(start, end, length, weight) => Self {
                start,
                end,
                length,
                weight: Some(weight),
            },
            RawStem::Plain(start, end, length) => Self::new(start, end, length),
        }
    }
}

impl From<Stem> for RawStem {
    fn from(stem: Stem) -> Self {
        match stem.weight {
            Some(w) => RawStem::Weighted(stem.start, stem.end, stem.length, w),
            None => RawStem::Plain(stem.start, stem.end, stem.length),
        }
    }
}

impl Stem {
    pub fn new(start: usize, end: usize, length: usize) -> Self {
        Self {
            start,
            end,
            length,
            weight: None,
        }
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = Some(weight);
        self
    }

    /// True if the `(start, end)` spans of the two stems interleave.
    ///
    /// Nested and disjoint spans do not cross; the relation is symmetric.
    pub fn crosses(&self, other: &Stem) -> bool {
        let (ia, ja, ib, jb) = (self.start, self.end, other.start, other.end);
        (ia < ib && ib < ja && ja < jb) || (ib < ia && ia < jb && jb < ja)
    }

    /// Compares start, end and length, ignoring the weight.
    pub fn same_span(&self, other: &Stem) -> bool {
        self.start == other.start && self.end == other.end && self.length == other.length
    }

    /// The individual base pairs of the stem, outermost first.
    pub fn base_pairs(&self) -> Vec<(usize, usize)> {
        (0..self.length)
            .filter_map(|i| Some((self.start + i, self.end.checked_sub(i)?)))
            .collect()
    }
}

/// One RNA entry of a dataset: candidate stems for the annealer and the reference structure.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct RnaEntry {
    #[serde(default)]
    pub sequence: Option<String>,
    pub potential_stems: Vec<Stem>,
    #[serde(default)]
    pub actual_stems: Vec<Stem>,
}

impl RnaEntry {
    /// Sequence length, or the furthest stem end when no sequence is recorded.
    pub fn sequence_length(&self) -> usize {
        match &self.sequence {
            Some(seq) => seq.len(),
            None => self
                .potential_stems
                .iter()
                .chain(&self.actual_stems)
                .map(|s| s.end)
                .max()
                .unwrap_or(0),
        }
    }

    /// Reference stems with the weights of the matching potential stems.
    ///
    /// Reference stems with no potential counterpart are dropped.
    pub fn matched_actual_stems(&self) -> Vec<Stem> {
        self.actual_stems
            .iter()
            .filter_map(|actual| {
                self.potential_stems
                    .iter()
                    .find(|potential| potential.same_span(actual))
                    .copied()
            })
            .collect()
    }
}
