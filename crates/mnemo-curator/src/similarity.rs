//! Text similarity for duplicate detection.
//!
//! The backend is an injected strategy. `TokenOverlap` is the dependency-free
//! default: Jaccard overlap of lowercased word sets. Deployments with an
//! embedding backend plug in a cosine-based implementation instead.

use std::collections::BTreeSet;

/// Pairwise text similarity in [0, 1].
pub trait TextSimilarity: Send + Sync {
    /// Similarity of two content strings; 1.0 means effectively identical.
    fn similarity(&self, a: &str, b: &str) -> f32;
}

/// Jaccard overlap of word sets.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokenOverlap;

impl TokenOverlap {
    fn words(text: &str) -> BTreeSet<String> {
        text.split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .map(|w| w.to_lowercase())
            .collect()
    }
}

impl TextSimilarity for TokenOverlap {
    fn similarity(&self, a: &str, b: &str) -> f32 {
        let wa = Self::words(a);
        let wb = Self::words(b);
        if wa.is_empty() && wb.is_empty() {
            return 1.0;
        }
        if wa.is_empty() || wb.is_empty() {
            return 0.0;
        }
        let shared = wa.intersection(&wb).count();
        let union = wa.union(&wb).count();
        shared as f32 / union as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_text() {
        let sim = TokenOverlap.similarity("the same note", "the same note");
        assert!((sim - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_case_and_punctuation_insensitive() {
        let sim = TokenOverlap.similarity("Fix the JWT bug!", "fix the jwt bug");
        assert!((sim - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_disjoint_text() {
        let sim = TokenOverlap.similarity("apples oranges", "borrow checker");
        assert!(sim.abs() < f32::EPSILON);
    }

    #[test]
    fn test_partial_overlap() {
        let sim = TokenOverlap.similarity("rust borrow checker", "rust borrow rules");
        // 2 shared of 4 distinct words.
        assert!((sim - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_empty_inputs() {
        assert!((TokenOverlap.similarity("", "") - 1.0).abs() < f32::EPSILON);
        assert!(TokenOverlap.similarity("", "note").abs() < f32::EPSILON);
    }
}
