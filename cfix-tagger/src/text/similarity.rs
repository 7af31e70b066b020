//! Fuzzy name equality
//!
//! Soft matching only: used to spot a conductor or orchestra already credited
//! in an artist list under a slightly different spelling. Registry lookups
//! never go through here; they use exact keys.

use cfix_common::config::DEFAULT_SIMILARITY_THRESHOLD;

/// Normalized-Levenshtein similarity test with a fixed threshold
#[derive(Debug, Clone, Copy)]
pub struct SimilarityMatcher {
    threshold: f64,
}

impl Default for SimilarityMatcher {
    fn default() -> Self {
        Self::new(DEFAULT_SIMILARITY_THRESHOLD)
    }
}

impl SimilarityMatcher {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Similarity score (0.0-1.0), exact comparison of the inputs as given
    pub fn score(&self, a: &str, b: &str) -> f64 {
        strsim::normalized_levenshtein(a, b)
    }

    /// True iff the score strictly exceeds the threshold
    ///
    /// An empty side never matches, so an unset field cannot look similar to
    /// another unset field.
    pub fn is_similar(&self, a: &str, b: &str) -> bool {
        if a.is_empty() || b.is_empty() {
            return false;
        }
        self.score(a, b) > self.threshold
    }
}

/// [`SimilarityMatcher::is_similar`] at the default 0.85 threshold
pub fn are_similar(a: &str, b: &str) -> bool {
    SimilarityMatcher::default().is_similar(a, b)
}
