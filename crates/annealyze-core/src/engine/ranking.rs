use crate::core::io::results::SampleRow;

/// A sample together with its 1-based position in the energy ordering.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankedSample<'a> {
    pub rank: usize,
    pub row: &'a SampleRow,
}

/// Orders samples by ascending energy and keeps the first `n`.
///
/// The sort is stable, so rows with equal energy keep their input order.
pub fn top_samples(rows: &[SampleRow], n: usize) -> Vec<RankedSample<'_>> {
    let mut ordered: Vec<&SampleRow> = rows.iter().collect();
    ordered.sort_by(|a, b| a.energy.total_cmp(&b.energy));
    ordered
        .into_iter()
        .take(n)
        .enumerate()
        .map(|(i, row)| RankedSample { rank: i + 1, row })
        .collect()
}
