//! Assertions on query responses.

use recon_persistence::core::scoring::is_match;
use recon_persistence::types::QueryResponse;

/// Asserts that candidates are ordered by non-increasing score.
pub fn assert_sorted_by_score(response: &QueryResponse) {
    for pair in response.results.windows(2) {
        assert!(
            pair[0].score >= pair[1].score,
            "{} ({}) ranked above {} ({})",
            pair[0].id,
            pair[0].score,
            pair[1].id,
            pair[1].score
        );
    }
}

/// Asserts that every candidate's match flag follows its score.
pub fn assert_match_flags(response: &QueryResponse) {
    for c in &response.results {
        assert_eq!(c.is_match, is_match(c.score), "match flag of {}", c.id);
    }
}

/// Returns the candidate ids, sorted.
pub fn sorted_ids(response: &QueryResponse) -> Vec<String> {
    let mut ids: Vec<String> = response
        .results
        .iter()
        .map(|c| c.id.to_string())
        .collect();
    ids.sort();
    ids
}
