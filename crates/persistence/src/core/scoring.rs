//! Candidate scoring shared by all backends.
//!
//! The in-memory engine scores with [`heuristic_score`] and [`type_bonus`].
//! The relational engine gets a native relevance score from the full-text
//! index and maps it onto the same scale with a [`ScoreNormalizer`], so a
//! caller sees comparable scores and the same [`is_match`] rule whichever
//! backend answered.

use std::cmp::Ordering;

use crate::types::{Candidate, Entity};

/// Scores strictly above this value count as a confident match.
pub const MATCH_THRESHOLD: f64 = 80.0;

/// Score given to exact raw-key matches.
pub const EXACT_KEY_SCORE: f64 = 100.0;

/// Score given when the query equals the raw key ignoring case.
pub const CASELESS_KEY_SCORE: f64 = 95.0;

/// Added when the entity holds the requested type.
pub const TYPE_BONUS: f64 = 10.0;

/// Returns whether a score counts as a confident match.
///
/// # Examples
///
/// ```
/// use recon_persistence::core::scoring::is_match;
///
/// assert!(!is_match(80.0));
/// assert!(is_match(80.0001));
/// ```
pub fn is_match(score: f64) -> bool {
    score > MATCH_THRESHOLD
}

/// Length of a string as used by the scoring ratios.
pub fn text_len(s: &str) -> usize {
    s.chars().count()
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

/// Text-similarity score of an entity for a query, before any type bonus.
///
/// `query_lower` must already be lowercased. A caseless match on the raw key
/// scores 95. Otherwise, when the lowercased name contains the query, the
/// score is the share of the name covered by the query, times 100. The
/// ratio is not clamped.
pub fn heuristic_score(query_lower: &str, entity: &Entity) -> f64 {
    if query_lower.is_empty() {
        return 0.0;
    }
    if entity.raw_key().to_lowercase() == query_lower {
        return CASELESS_KEY_SCORE;
    }
    if entity.name.to_lowercase().contains(query_lower) {
        return ratio(text_len(query_lower), text_len(&entity.name)) * 100.0;
    }
    0.0
}

/// Returns [`TYPE_BONUS`] when a type is requested and the entity holds it.
pub fn type_bonus(type_filter: Option<&str>, entity: &Entity) -> f64 {
    match type_filter {
        Some(type_id) if entity.has_type(type_id) => TYPE_BONUS,
        _ => 0.0,
    }
}

/// Maps native full-text relevance scores onto the heuristic scale.
///
/// The factor is computed once, from the first hit that can seed it:
///
/// ```text
/// scale = max(len(query) / len(id), len(query) / len(name)) * 100 / native
/// ```
///
/// and every hit's native score is multiplied by it. Hits seen before the
/// factor is known (a native score of 0 cannot seed it) normalize to 0.
///
/// # Examples
///
/// ```
/// use recon_persistence::core::scoring::ScoreNormalizer;
///
/// let mut n = ScoreNormalizer::new("doug");
/// // first hit: "doug" covers 4 of the 8 characters of "person:1"
/// assert_eq!(n.normalize("person:1", "Douglas Adams", -2.0), 50.0);
/// assert_eq!(n.normalize("person:2", "Doug", -1.0), 25.0);
/// ```
#[derive(Debug, Clone)]
pub struct ScoreNormalizer {
    query_len: usize,
    scale: f64,
}

impl ScoreNormalizer {
    /// Creates a normalizer for a query text.
    pub fn new(query: &str) -> Self {
        Self {
            query_len: text_len(query),
            scale: 0.0,
        }
    }

    /// Returns the factor, once it has been seeded.
    pub fn scale(&self) -> Option<f64> {
        (self.scale != 0.0).then_some(self.scale)
    }

    /// Normalizes one hit's native score.
    pub fn normalize(&mut self, id: &str, name: &str, native: f64) -> f64 {
        if self.scale == 0.0 && native != 0.0 {
            let by_id = ratio(self.query_len, text_len(id));
            let by_name = ratio(self.query_len, text_len(name));
            self.scale = by_id.max(by_name) * 100.0 / native;
        }
        native * self.scale
    }
}

/// Orders candidates by descending score, breaking ties by id.
pub fn sort_candidates(candidates: &mut [Candidate]) {
    candidates.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.id.cmp(&b.id))
    });
}
