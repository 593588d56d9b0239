//! Result reduction: pick the global winner from the published set.

use crate::types::ScoredCandidate;

/// The minimum-score candidate, or `None` for an empty set.
///
/// Must only run after every evaluation has finished. Exactly equal
/// scores resolve to the earliest entry, which for a set collected in
/// grid order means the earliest grid cell.
#[must_use]
pub fn best_candidate(candidates: &[ScoredCandidate]) -> Option<&ScoredCandidate> {
    candidates
        .iter()
        .min_by(|a, b| a.score.total_cmp(&b.score))
}

/// Good matches for diagnostic export, best first.
///
/// Keeps candidates scoring strictly below `cutoff`, sorts them by
/// ascending score (stable, so ties keep grid order) and truncates to
/// `limit` when one is given.
#[must_use]
pub fn export_candidates(
    candidates: &[ScoredCandidate],
    cutoff: f64,
    limit: Option<usize>,
) -> Vec<ScoredCandidate> {
    let mut good: Vec<ScoredCandidate> = candidates
        .iter()
        .filter(|c| c.score < cutoff)
        .copied()
        .collect();
    good.sort_by(|a, b| a.score.total_cmp(&b.score));
    if let Some(limit) = limit {
        good.truncate(limit);
    }
    good
}
